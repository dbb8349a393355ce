use crate::transcript::{Speaker, TranscriptLog, Utterance};

/// Words that mark an agent utterance as a posed coding question.
pub const DEFAULT_KEYWORDS: [&str; 5] = ["question", "solve", "implement", "write", "code"];

/// Decides whether a piece of agent speech is a coding prompt.
pub trait QuestionClassifier: Send + Sync {
    fn is_coding_prompt(&self, text: &str) -> bool;
}

impl<F> QuestionClassifier for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_coding_prompt(&self, text: &str) -> bool {
        self(text)
    }
}

/// Case-insensitive substring match against a fixed vocabulary.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    keywords: Vec<String>,
}

impl KeywordClassifier {
    /// Blank entries are skipped; an empty vocabulary matches nothing.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }
}

impl QuestionClassifier for KeywordClassifier {
    fn is_coding_prompt(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

/// Returns the most recent agent utterance the classifier accepts.
///
/// The agent may ask several questions in one session and only the latest one
/// drives the coding panel, so the scan runs newest-first and stops at the
/// first match.
pub fn latest_question<'a>(
    log: &'a TranscriptLog,
    classifier: &dyn QuestionClassifier,
) -> Option<&'a Utterance> {
    log.iter()
        .rev()
        .find(|u| u.speaker() == Speaker::Agent && classifier.is_coding_prompt(u.text()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_of(lines: &[(Speaker, &str)]) -> TranscriptLog {
        let mut log = TranscriptLog::new();
        for (speaker, text) in lines {
            log.append(*speaker, *text);
        }
        log
    }

    #[test]
    fn picks_most_recent_agent_question() {
        let log = log_of(&[
            (Speaker::Agent, "hello"),
            (Speaker::Agent, "implement a stack"),
            (Speaker::User, "ok"),
            (Speaker::Agent, "now write a queue"),
        ]);
        let classifier = KeywordClassifier::default();

        let question = latest_question(&log, &classifier).map(Utterance::text);
        assert_eq!(question, Some("now write a queue"));
    }

    #[test]
    fn repeated_scans_agree() {
        let log = log_of(&[
            (Speaker::Agent, "Can you solve two-sum?"),
            (Speaker::User, "sure"),
        ]);
        let classifier = KeywordClassifier::default();

        let first = latest_question(&log, &classifier).cloned();
        let second = latest_question(&log, &classifier).cloned();
        assert_eq!(first, second);
        assert_eq!(first.map(|u| u.sequence()), Some(0));
    }

    #[test]
    fn no_question_without_matching_agent_text() {
        let classifier = KeywordClassifier::default();

        let small_talk = log_of(&[(Speaker::Agent, "hi there"), (Speaker::User, "hi")]);
        assert!(latest_question(&small_talk, &classifier).is_none());

        let user_only = log_of(&[(Speaker::User, "let me write some code")]);
        assert!(latest_question(&user_only, &classifier).is_none());

        assert!(latest_question(&TranscriptLog::new(), &classifier).is_none());
    }

    #[test]
    fn matching_ignores_case() {
        let classifier = KeywordClassifier::default();
        assert!(classifier.is_coding_prompt("IMPLEMENT an LRU cache"));
        assert!(classifier.is_coding_prompt("Here's your next Question"));
        assert!(!classifier.is_coding_prompt("Tell me about yourself"));
    }

    #[test]
    fn custom_vocabulary_replaces_defaults() {
        let classifier = KeywordClassifier::new(["Design", " ", "algorithm"]);
        assert_eq!(classifier.keywords(), ["design", "algorithm"]);
        assert!(classifier.is_coding_prompt("Design a rate limiter"));
        assert!(!classifier.is_coding_prompt("Please write a parser"));
    }

    #[test]
    fn closures_work_as_classifiers() {
        let log = log_of(&[
            (Speaker::Agent, "Reverse a string?"),
            (Speaker::Agent, "Thanks for joining"),
        ]);
        let ends_with_question_mark = |text: &str| text.trim_end().ends_with('?');

        let question = latest_question(&log, &ends_with_question_mark).map(Utterance::text);
        assert_eq!(question, Some("Reverse a string?"));
    }
}
