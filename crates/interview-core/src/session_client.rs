use crate::events::{SessionEvent, SessionTarget};
use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::sync::mpsc;

/// A real-time voice-agent connection the controller can drive.
///
/// `start` and `stop` only request a transition: completion is reported later
/// through the event stream as `CallStart` / `CallEnd`. Starting twice without
/// an intervening stop is undefined on most providers, which is why the
/// controller guards every call with its state machine.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionClient: Send {
    /// Begins a voice session against `target`.
    async fn start(&mut self, target: &SessionTarget) -> Result<()>;

    /// Ends the current session. Does not wait for the call-end acknowledgment.
    async fn stop(&mut self) -> Result<()>;

    /// Takes the event stream. May only be called once per client.
    fn subscribe(&mut self) -> Result<mpsc::Receiver<SessionEvent>>;
}
