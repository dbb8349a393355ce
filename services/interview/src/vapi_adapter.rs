use anyhow::{Context, Result};
use async_trait::async_trait;
use interview_core::events::{AgentMessage, SessionEvent, SessionTarget};
use interview_core::session_client::SessionClient;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use vapi_realtime::{CallEvent, CallRx, ServerMessage};

const EVENT_CAPACITY: usize = 128;

/// The subset of `vapi_realtime::Client` the adapter drives, so tests can
/// substitute a mock.
#[async_trait]
pub trait VapiCalls: Send {
    async fn start(&mut self, assistant_id: &str) -> Result<()>;
    async fn stop(&mut self) -> Result<()>;
    fn events(&self) -> CallRx;
}

#[async_trait]
impl VapiCalls for vapi_realtime::Client {
    async fn start(&mut self, assistant_id: &str) -> Result<()> {
        vapi_realtime::Client::start(self, assistant_id).await
    }

    async fn stop(&mut self) -> Result<()> {
        vapi_realtime::Client::stop(self).await
    }

    fn events(&self) -> CallRx {
        vapi_realtime::Client::events(self)
    }
}

/// An adapter that implements the generic `SessionClient` trait for a Vapi call.
pub struct VapiAdapter<C: VapiCalls> {
    client: C,
    subscribed: bool,
}

impl VapiAdapter<vapi_realtime::Client> {
    pub fn new(config: vapi_realtime::Config) -> Self {
        Self::with_client(vapi_realtime::Client::new(EVENT_CAPACITY, config))
    }
}

impl<C: VapiCalls> VapiAdapter<C> {
    pub fn with_client(client: C) -> Self {
        Self {
            client,
            subscribed: false,
        }
    }
}

#[async_trait]
impl<C: VapiCalls> SessionClient for VapiAdapter<C> {
    async fn start(&mut self, target: &SessionTarget) -> Result<()> {
        self.client
            .start(target.as_str())
            .await
            .context("Adapter failed to start Vapi call")
    }

    async fn stop(&mut self) -> Result<()> {
        self.client
            .stop()
            .await
            .context("Adapter failed to stop Vapi call")
    }

    fn subscribe(&mut self) -> Result<mpsc::Receiver<SessionEvent>> {
        if self.subscribed {
            return Err(anyhow::anyhow!("session events have already been taken"));
        }
        self.subscribed = true;

        let (tx, rx) = mpsc::channel(EVENT_CAPACITY);
        let mut call_rx = self.client.events();
        tokio::spawn(async move {
            loop {
                let event = match call_rx.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "session event consumer lagged behind");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                let Some(event) = map_call_event(event) else {
                    continue;
                };
                if tx.send(event).await.is_err() {
                    tracing::debug!("session event receiver dropped, stopping adapter task");
                    break;
                }
            }
        });
        Ok(rx)
    }
}

/// Translates a Vapi call event into a session event. Speech and status
/// updates have no session counterpart and map to `None`.
pub fn map_call_event(event: CallEvent) -> Option<SessionEvent> {
    match event {
        CallEvent::CallStart => Some(SessionEvent::CallStart),
        CallEvent::CallEnd { reason } => {
            tracing::debug!(reason = reason.as_deref().unwrap_or("unknown"), "call ended");
            Some(SessionEvent::CallEnd)
        }
        CallEvent::Error(message) => Some(SessionEvent::Error(message)),
        CallEvent::Message(ServerMessage::Transcript {
            role, transcript, ..
        }) => Some(SessionEvent::Message(AgentMessage::transcript(role, transcript))),
        CallEvent::Message(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use tokio::sync::broadcast;

    mock! {
        pub VapiCalls {}
        #[async_trait]
        impl VapiCalls for VapiCalls {
            async fn start(&mut self, assistant_id: &str) -> Result<()>;
            async fn stop(&mut self) -> Result<()>;
            fn events(&self) -> CallRx;
        }
    }

    #[test]
    fn maps_lifecycle_and_transcripts() {
        assert_eq!(map_call_event(CallEvent::CallStart), Some(SessionEvent::CallStart));
        assert_eq!(
            map_call_event(CallEvent::CallEnd {
                reason: Some("customer-ended-call".to_string())
            }),
            Some(SessionEvent::CallEnd)
        );
        assert_eq!(
            map_call_event(CallEvent::Error("boom".to_string())),
            Some(SessionEvent::Error("boom".to_string()))
        );

        let transcript = CallEvent::Message(ServerMessage::Transcript {
            role: "assistant".to_string(),
            transcript_type: Some("final".to_string()),
            transcript: "Implement a heap".to_string(),
        });
        assert_eq!(
            map_call_event(transcript),
            Some(SessionEvent::Message(AgentMessage::transcript(
                "assistant",
                "Implement a heap"
            )))
        );
    }

    #[test]
    fn speech_updates_are_dropped() {
        let event = CallEvent::Message(ServerMessage::SpeechUpdate {
            status: "started".to_string(),
            role: "assistant".to_string(),
        });
        assert_eq!(map_call_event(event), None);
    }

    #[tokio::test]
    async fn start_passes_the_assistant_id() {
        let mut client = MockVapiCalls::new();
        client
            .expect_start()
            .withf(|assistant_id| assistant_id.starts_with("asst_42"))
            .times(1)
            .returning(|_| Ok(()));
        let mut adapter = VapiAdapter::with_client(client);

        adapter.start(&SessionTarget::new("asst_42")).await.unwrap();
    }

    #[tokio::test]
    async fn stop_errors_carry_context() {
        let mut client = MockVapiCalls::new();
        client
            .expect_stop()
            .times(1)
            .returning(|| Err(anyhow::anyhow!("no call in progress")));
        let mut adapter = VapiAdapter::with_client(client);

        let err = adapter.stop().await.unwrap_err();
        assert_eq!(
            format!("{err:#}"),
            "Adapter failed to stop Vapi call: no call in progress"
        );
    }

    #[tokio::test]
    async fn subscribe_forwards_mapped_events_once() {
        let (call_tx, _) = broadcast::channel(8);
        let events_tx = call_tx.clone();
        let mut client = MockVapiCalls::new();
        client
            .expect_events()
            .times(1)
            .returning(move || events_tx.subscribe());
        let mut adapter = VapiAdapter::with_client(client);

        let mut rx = adapter.subscribe().unwrap();
        assert!(adapter.subscribe().is_err());

        call_tx.send(CallEvent::CallStart).unwrap();
        call_tx
            .send(CallEvent::Message(ServerMessage::Hang))
            .unwrap();
        call_tx
            .send(CallEvent::CallEnd { reason: None })
            .unwrap();

        assert_eq!(rx.recv().await, Some(SessionEvent::CallStart));
        assert_eq!(rx.recv().await, Some(SessionEvent::CallEnd));
    }
}
