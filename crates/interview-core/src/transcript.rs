use serde::Serialize;

/// Who produced an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Agent,
    User,
}

impl Speaker {
    /// Maps an adapter role string to a speaker.
    ///
    /// Voice agents disagree on what to call themselves, so the agent side
    /// accepts `assistant`, `agent` and `bot`. Unknown roles return `None`.
    pub fn from_role(role: &str) -> Option<Self> {
        match role.trim().to_ascii_lowercase().as_str() {
            "assistant" | "agent" | "bot" => Some(Speaker::Agent),
            "user" => Some(Speaker::User),
            _ => None,
        }
    }
}

/// One recorded unit of speech-to-text output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Utterance {
    speaker: Speaker,
    text: String,
    sequence: u64,
}

impl Utterance {
    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Arrival order within the current log, starting at 0.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Append-only record of the current conversation.
///
/// Sequence numbers are assigned here rather than by the adapter, which gives
/// no ordering guarantee across speaker turns. They stay contiguous from 0
/// until the next `clear`.
#[derive(Debug, Default, Clone)]
pub struct TranscriptLog {
    entries: Vec<Utterance>,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an utterance. Repeated text is kept as a separate entry.
    pub fn append(&mut self, speaker: Speaker, text: impl Into<String>) -> &Utterance {
        let sequence = self.entries.len() as u64;
        self.entries.push(Utterance {
            speaker,
            text: text.into(),
            sequence,
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Utterance> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[Utterance] {
        &self.entries
    }
}

impl<'a> IntoIterator for &'a TranscriptLog {
    type Item = &'a Utterance;
    type IntoIter = std::slice::Iter<'a, Utterance>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequences_follow_append_order() {
        let mut log = TranscriptLog::new();
        let speakers = [Speaker::Agent, Speaker::User, Speaker::User, Speaker::Agent, Speaker::Agent];
        for (i, speaker) in speakers.iter().enumerate() {
            let appended = log.append(*speaker, format!("line {i}"));
            assert_eq!(appended.sequence(), i as u64);
        }

        let sequences: Vec<u64> = log.iter().map(Utterance::sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2, 3, 4]);
        assert_eq!(log.entries()[2].text(), "line 2");
        assert_eq!(log.entries()[2].speaker(), Speaker::User);
    }

    #[test]
    fn duplicate_fragments_are_kept() {
        let mut log = TranscriptLog::new();
        log.append(Speaker::Agent, "Please solve");
        log.append(Speaker::Agent, "Please solve");

        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[1].sequence(), 1);
    }

    #[test]
    fn clear_restarts_sequence_at_zero() {
        let mut log = TranscriptLog::new();
        log.append(Speaker::Agent, "first");
        log.append(Speaker::User, "second");
        log.clear();

        assert!(log.is_empty());
        assert_eq!(log.append(Speaker::User, "again").sequence(), 0);
    }

    #[test]
    fn roles_map_to_speakers() {
        assert_eq!(Speaker::from_role("assistant"), Some(Speaker::Agent));
        assert_eq!(Speaker::from_role("Agent"), Some(Speaker::Agent));
        assert_eq!(Speaker::from_role("bot"), Some(Speaker::Agent));
        assert_eq!(Speaker::from_role("user"), Some(Speaker::User));
        assert_eq!(Speaker::from_role("system"), None);
        assert_eq!(Speaker::from_role(""), None);
    }
}
