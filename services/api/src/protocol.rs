use interview_core::Input;
use serde::{Deserialize, Serialize};

/// Frames a browser view sends over `/ws`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ViewCommand {
    Start,
    End,
    Restart,
    Submit,
    EditAnswer { text: String },
}

impl From<ViewCommand> for Input {
    fn from(command: ViewCommand) -> Self {
        match command {
            ViewCommand::Start => Input::Start,
            ViewCommand::End => Input::End,
            ViewCommand::Restart => Input::Restart,
            ViewCommand::Submit => Input::Submit,
            ViewCommand::EditAnswer { text } => Input::EditAnswer(text),
        }
    }
}

/// Sent back when a frame cannot be understood.
#[derive(Debug, Serialize)]
pub struct ErrorFrame {
    pub error: String,
}

pub fn parse(text: &str) -> Result<ViewCommand, serde_json::Error> {
    serde_json::from_str(text)
}
