use crate::types::{CallEvent, ControlMessage, CreateCallRequest, ServerMessage};
use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

pub(crate) mod config;
mod consts;
mod utils;

type CallTx = broadcast::Sender<CallEvent>;
pub type CallRx = broadcast::Receiver<CallEvent>;
type ControlTx = mpsc::Sender<ControlMessage>;
type ControlRx = mpsc::Receiver<ControlMessage>;

/// One voice-agent connection at a time. Each `start` creates a call and runs
/// it on its own task; lifecycle and messages are broadcast to subscribers.
pub struct Client {
    config: Arc<config::Config>,
    http: reqwest::Client,
    events: CallTx,
    control: Option<ControlTx>,
    call: Option<JoinHandle<()>>,
}

impl Client {
    pub fn new(capacity: usize, config: config::Config) -> Self {
        let (events, _) = broadcast::channel(capacity);
        Self {
            config: Arc::new(config),
            http: reqwest::Client::new(),
            events,
            control: None,
            call: None,
        }
    }

    pub fn events(&self) -> CallRx {
        self.events.subscribe()
    }

    /// Starts a call with the given assistant. Returns once the call task is
    /// running; `CallEvent::CallStart` follows when the websocket is up.
    pub async fn start(&mut self, assistant_id: &str) -> Result<()> {
        if let Some(previous) = self.call.take() {
            if !previous.is_finished() {
                tracing::warn!("aborting previous call that was still tearing down");
                previous.abort();
            }
        }

        let (c_tx, c_rx) = mpsc::channel(consts::CONTROL_CAPACITY);
        self.control = Some(c_tx);

        let request = CreateCallRequest::websocket(assistant_id, self.config.sample_rate());
        tracing::info!(assistant_id, "starting call");
        self.call = Some(tokio::spawn(run_call(
            self.http.clone(),
            Arc::clone(&self.config),
            request,
            c_rx,
            self.events.clone(),
        )));
        Ok(())
    }

    /// Asks the agent to end the call. `CallEvent::CallEnd` follows.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(control) = self.control.take() else {
            return Err(anyhow::anyhow!("no call in progress"));
        };
        if control.send(ControlMessage::EndCall).await.is_err() {
            // The call task already finished and reported its end.
            tracing::debug!("call already closed");
        }
        Ok(())
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if let Some(call) = self.call.take() {
            call.abort();
        }
    }
}

async fn run_call(
    http: reqwest::Client,
    config: Arc<config::Config>,
    request: CreateCallRequest,
    mut control: ControlRx,
    events: CallTx,
) {
    let reason = match call(&http, &config, &request, &mut control, &events).await {
        Ok(reason) => reason,
        Err(e) => {
            tracing::error!("call failed: {:?}", e);
            let _ = events.send(CallEvent::Error(format!("{e:#}")));
            Some("error".to_string())
        }
    };
    tracing::info!(reason = reason.as_deref().unwrap_or("unknown"), "call ended");
    let _ = events.send(CallEvent::CallEnd { reason });
}

async fn call(
    http: &reqwest::Client,
    config: &config::Config,
    request: &CreateCallRequest,
    control: &mut ControlRx,
    events: &CallTx,
) -> Result<Option<String>> {
    let created = utils::create_call(http, config, request).await?;
    tracing::info!(call_id = %created.id, "call created");

    let (ws_stream, _) = tokio_tungstenite::connect_async(created.transport.websocket_call_url.as_str())
        .await
        .context("Failed to connect to call websocket")?;
    let (mut write, mut read) = ws_stream.split();
    let _ = events.send(CallEvent::CallStart);

    let mut ended_reason = None;
    let mut hanging_up = false;
    loop {
        tokio::select! {
            command = control.recv(), if !hanging_up => {
                // A closed control channel means the client went away.
                let command = command.unwrap_or(ControlMessage::EndCall);
                let text = serde_json::to_string(&command)?;
                write.send(Message::Text(text)).await.context("Failed to send end-call")?;
                write.send(Message::Close(None)).await.context("Failed to close call websocket")?;
                hanging_up = true;
            }
            message = read.next() => {
                let message = match message {
                    None => break,
                    Some(Err(e)) if hanging_up => {
                        tracing::debug!("websocket error while hanging up: {}", e);
                        break;
                    }
                    Some(Err(e)) => return Err(e).context("Failed to read from call websocket"),
                    Some(Ok(message)) => message,
                };
                match message {
                    Message::Text(text) => {
                        if let Some(reason) = handle_text(&text, events) {
                            ended_reason = Some(reason);
                        }
                    }
                    // Agent audio. Playback is not handled here.
                    Message::Binary(_) => {}
                    Message::Close(frame) => {
                        tracing::info!("connection closed: {:?}", frame);
                        if ended_reason.is_none() {
                            ended_reason = frame
                                .map(|frame| frame.reason.to_string())
                                .filter(|reason| !reason.is_empty());
                        }
                        break;
                    }
                    _ => {}
                }
            }
        }
    }
    Ok(ended_reason)
}

/// Broadcasts a server text frame. Returns the ended reason if the frame
/// reports one.
fn handle_text(text: &str, events: &CallTx) -> Option<String> {
    let message = match serde_json::from_str::<ServerMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("failed to deserialize server message: {}, text=> {:?}", e, text);
            return None;
        }
    };
    tracing::debug!("received message: {}", message.kind());

    let ended_reason = match &message {
        ServerMessage::StatusUpdate {
            status,
            ended_reason,
        } if status == "ended" => ended_reason.clone(),
        ServerMessage::Hang => {
            tracing::warn!("agent reported a hang");
            None
        }
        _ => None,
    };
    if !matches!(message, ServerMessage::Other) {
        let _ = events.send(CallEvent::Message(message));
    }
    ended_reason
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_frames_are_broadcast() {
        let (events, mut rx) = broadcast::channel(8);

        let reason = handle_text(
            r#"{"type":"transcript","role":"user","transcriptType":"final","transcript":"ok"}"#,
            &events,
        );

        assert_eq!(reason, None);
        let CallEvent::Message(ServerMessage::Transcript { role, transcript, .. }) =
            rx.try_recv().unwrap()
        else {
            panic!("expected transcript message");
        };
        assert_eq!(role, "user");
        assert_eq!(transcript, "ok");
    }

    #[test]
    fn ended_status_carries_reason() {
        let (events, mut rx) = broadcast::channel(8);

        let reason = handle_text(
            r#"{"type":"status-update","status":"ended","endedReason":"customer-ended-call"}"#,
            &events,
        );

        assert_eq!(reason.as_deref(), Some("customer-ended-call"));
        assert!(matches!(
            rx.try_recv().unwrap(),
            CallEvent::Message(ServerMessage::StatusUpdate { .. })
        ));
    }

    #[test]
    fn malformed_and_unknown_frames_are_dropped() {
        let (events, mut rx) = broadcast::channel(8);

        assert_eq!(handle_text("not json", &events), None);
        assert_eq!(handle_text(r#"{"type":"model-output"}"#, &events), None);

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn stop_without_call_is_an_error() {
        let mut client = Client::new(8, config::Config::builder().with_api_key("key").build());
        assert!(client.stop().await.is_err());
    }

    #[tokio::test]
    async fn unreachable_api_reports_error_then_call_end() {
        // Nothing listens on port 9 locally.
        let config = config::Config::builder()
            .with_base_url("http://127.0.0.1:9")
            .with_api_key("key")
            .build();
        let mut client = Client::new(8, config);
        let mut events = client.events();

        client.start("asst_1").await.unwrap();

        assert!(matches!(events.recv().await.unwrap(), CallEvent::Error(_)));
        assert!(matches!(
            events.recv().await.unwrap(),
            CallEvent::CallEnd { .. }
        ));
    }
}
