/// Events any voice-agent adapter can emit back to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    CallStart,
    CallEnd,
    Message(AgentMessage),
    Error(String),
}

/// A conversation message as delivered by the adapter.
///
/// Only `kind == "transcript"` carries utterances; everything else is ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentMessage {
    pub kind: String,
    pub role: String,
    pub transcript: String,
}

impl AgentMessage {
    pub const TRANSCRIPT: &'static str = "transcript";

    pub fn transcript(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: Self::TRANSCRIPT.to_string(),
            role: role.into(),
            transcript: text.into(),
        }
    }

    pub fn is_transcript(&self) -> bool {
        self.kind == Self::TRANSCRIPT
    }
}

/// Identifies what the adapter should connect to, e.g. an assistant id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTarget(String);

impl SessionTarget {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
