use interview_core::Input;

/// One line of console input, parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Session(Input),
    Status,
    Help,
    Quit,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command: {0} (type 'help' for a list)")]
    Unknown(String),
}

pub const HELP: &str = "\
Commands:
  start           start the interview
  end             end the interview
  restart         end and start over with a clean slate
  answer <text>   replace your answer (use \\n for new lines)
  submit          submit your answer
  status          show the current session
  help            show this list
  quit            leave";

/// Parses a console line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (line, ""),
    };

    let command = match word.to_lowercase().as_str() {
        "start" => Command::Session(Input::Start),
        "end" => Command::Session(Input::End),
        "restart" => Command::Session(Input::Restart),
        "answer" => Command::Session(Input::EditAnswer(rest.replace("\\n", "\n"))),
        "submit" => Command::Session(Input::Submit),
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_session_commands() {
        assert_eq!(parse("start"), Ok(Some(Command::Session(Input::Start))));
        assert_eq!(parse("  END "), Ok(Some(Command::Session(Input::End))));
        assert_eq!(parse("restart"), Ok(Some(Command::Session(Input::Restart))));
        assert_eq!(parse("submit"), Ok(Some(Command::Session(Input::Submit))));
        assert_eq!(parse("status"), Ok(Some(Command::Status)));
        assert_eq!(parse("quit"), Ok(Some(Command::Quit)));
    }

    #[test]
    fn answer_keeps_text_and_expands_newlines() {
        assert_eq!(
            parse("answer def f(x):\\n    return x"),
            Ok(Some(Command::Session(Input::EditAnswer(
                "def f(x):\n    return x".to_string()
            ))))
        );
        // An empty answer clears the buffer.
        assert_eq!(
            parse("answer"),
            Ok(Some(Command::Session(Input::EditAnswer(String::new()))))
        );
    }

    #[test]
    fn blank_and_unknown_lines() {
        assert_eq!(parse("   "), Ok(None));
        assert_eq!(parse("dance now"), Err(CommandError::Unknown("dance".to_string())));
    }
}
