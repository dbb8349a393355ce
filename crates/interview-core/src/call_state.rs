use serde::Serialize;

/// Lifecycle of one conversation attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallState {
    #[default]
    Idle,
    Starting,
    Active,
    Ending,
    /// Old session stopped, waiting out the settle delay before starting again.
    Restarting,
}

/// Everything that can move the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallTrigger {
    StartRequested,
    EndRequested,
    RestartRequested,
    CallStarted,
    CallEnded,
    SettleElapsed,
    /// The adapter rejected a start or stop, or reported a fatal error.
    Failed,
}

impl CallState {
    /// Returns the next state, or `None` when the trigger is not accepted here.
    pub fn on(self, trigger: CallTrigger) -> Option<CallState> {
        use CallState::*;
        use CallTrigger::*;

        match (self, trigger) {
            (Idle, StartRequested) => Some(Starting),
            (Starting, CallStarted) => Some(Active),
            (Starting, CallEnded) => Some(Idle),
            (Active, EndRequested) => Some(Ending),
            (Active, RestartRequested) => Some(Restarting),
            (Active, CallEnded) => Some(Idle),
            (Ending, CallEnded) => Some(Idle),
            (Restarting, SettleElapsed) => Some(Starting),
            (Idle, Failed) => None,
            (_, Failed) => Some(Idle),
            _ => None,
        }
    }

    /// True while a session exists on the adapter side or is being set up.
    pub fn is_live(self) -> bool {
        !matches!(self, CallState::Idle)
    }
}
