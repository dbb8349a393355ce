use interview_core::SessionSnapshot;
use interview_core::transcript::{Speaker, Utterance};

/// Lines to print for the difference between two snapshots.
pub fn changes(previous: &SessionSnapshot, next: &SessionSnapshot) -> Vec<String> {
    let mut lines = Vec::new();

    if next.status != previous.status {
        lines.push(format!("[{}]", next.status));
    }

    // A shorter or re-sequenced transcript means it was cleared.
    let continues = next.transcript.len() >= previous.transcript.len()
        && next.transcript.iter().zip(&previous.transcript).all(|(a, b)| a == b);
    if !continues && !previous.transcript.is_empty() {
        lines.push("--- transcript cleared ---".to_string());
    }
    let already_shown = if continues { previous.transcript.len() } else { 0 };
    lines.extend(next.transcript[already_shown..].iter().map(utterance_line));

    if next.question != previous.question {
        match &next.question {
            Some(question) => lines.push(format!("=== Coding question ===\n{question}")),
            None if previous.question.is_some() => lines.push("=== No coding question ===".to_string()),
            None => {}
        }
    }
    lines
}

/// Full rendering of a snapshot, for the `status` command.
pub fn render(snapshot: &SessionSnapshot) -> String {
    let mut out = format!("State: {:?}\nStatus: {}\n", snapshot.state, snapshot.status);
    if snapshot.transcript.is_empty() {
        out.push_str("Transcript: (empty)\n");
    } else {
        out.push_str("Transcript:\n");
        for utterance in &snapshot.transcript {
            out.push_str("  ");
            out.push_str(&utterance_line(utterance));
            out.push('\n');
        }
    }
    match &snapshot.question {
        Some(question) => out.push_str(&format!("Question: {question}\n")),
        None => out.push_str("Question: waiting for the interviewer\n"),
    }
    if snapshot.answer.is_empty() {
        out.push_str("Answer: (empty)");
    } else {
        out.push_str(&format!("Answer:\n{}", snapshot.answer));
    }
    out
}

fn utterance_line(utterance: &Utterance) -> String {
    let who = match utterance.speaker() {
        Speaker::Agent => "interviewer",
        Speaker::User => "you",
    };
    format!("{who}: {}", utterance.text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_core::CallState;
    use interview_core::transcript::TranscriptLog;

    fn snapshot(log: &TranscriptLog, question: Option<&str>) -> SessionSnapshot {
        SessionSnapshot {
            state: CallState::Active,
            status: "Interview started".to_string(),
            transcript: log.entries().to_vec(),
            question: question.map(str::to_string),
            answer: String::new(),
        }
    }

    #[test]
    fn prints_only_new_utterances_and_question() {
        let mut log = TranscriptLog::new();
        log.append(Speaker::Agent, "Hello");
        let before = snapshot(&log, None);
        log.append(Speaker::User, "hi");
        log.append(Speaker::Agent, "Write fizzbuzz");
        let after = snapshot(&log, Some("Write fizzbuzz"));

        assert_eq!(
            changes(&before, &after),
            vec![
                "you: hi".to_string(),
                "interviewer: Write fizzbuzz".to_string(),
                "=== Coding question ===\nWrite fizzbuzz".to_string(),
            ]
        );
    }

    #[test]
    fn reports_clearing_and_status() {
        let mut log = TranscriptLog::new();
        log.append(Speaker::Agent, "Implement a trie");
        let before = snapshot(&log, Some("Implement a trie"));
        let mut after = snapshot(&TranscriptLog::new(), None);
        after.status = "Restarting interview...".to_string();

        assert_eq!(
            changes(&before, &after),
            vec![
                "[Restarting interview...]".to_string(),
                "--- transcript cleared ---".to_string(),
                "=== No coding question ===".to_string(),
            ]
        );
    }

    #[test]
    fn render_shows_placeholders() {
        let text = render(&SessionSnapshot::default());
        assert!(text.contains("Transcript: (empty)"));
        assert!(text.contains("Question: waiting for the interviewer"));
        assert!(text.ends_with("Answer: (empty)"));
    }
}
