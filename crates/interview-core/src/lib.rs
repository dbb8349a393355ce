pub mod answer;
pub mod call_state;
pub mod controller;
pub mod events;
pub mod question;
pub mod session_client;
pub mod submission;
pub mod transcript;

pub use call_state::CallState;
pub use controller::{
    ControllerConfig, InterviewController, SessionHandle, SessionSnapshot, SettleStrategy,
};
pub use events::{AgentMessage, SessionEvent, SessionTarget};
pub use session_client::SessionClient;
pub use submission::{AcknowledgingSubmitter, SubmissionReceipt, Submitter};

/// Everything a view can ask of the interview controller.
///
/// User actions and adapter events funnel through one queue, together with
/// the controller's own restart timer, so a handler never runs concurrently
/// with another.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Start,
    End,
    Restart,
    EditAnswer(String),
    Submit,
    Session(SessionEvent),
    Dispose,
}
