use crate::config::Config;
use crate::vapi_adapter::VapiAdapter;
use anyhow::Result;
use interview_core::events::SessionTarget;
use interview_core::{AcknowledgingSubmitter, ControllerConfig, InterviewController, SessionHandle};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Opens one interview session backed by a fresh Vapi client.
///
/// Each view gets its own session; dropping every handle (or sending
/// `Input::Dispose`) tears it down and hangs up any call in progress.
pub fn open_session(config: &Config, target: SessionTarget) -> Result<(SessionHandle, JoinHandle<()>)> {
    let controller_config = ControllerConfig::new(target)
        .with_settle(config.settle)
        .with_classifier(Arc::new(config.classifier()));
    InterviewController::spawn(
        VapiAdapter::new(config.vapi_config()),
        AcknowledgingSubmitter,
        controller_config,
    )
}
