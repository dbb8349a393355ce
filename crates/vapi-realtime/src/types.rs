use serde::{Deserialize, Serialize};

const WEBSOCKET_PROVIDER: &str = "vapi.websocket";
const AUDIO_FORMAT: &str = "pcm_s16le";
const AUDIO_CONTAINER: &str = "raw";

/// Body of `POST /call` for a websocket-transport call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCallRequest {
    assistant_id: String,
    transport: TransportRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransportRequest {
    provider: String,
    audio_format: AudioFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioFormat {
    format: String,
    container: String,
    sample_rate: u32,
}

impl CreateCallRequest {
    pub fn websocket(assistant_id: &str, sample_rate: u32) -> Self {
        Self {
            assistant_id: assistant_id.to_string(),
            transport: TransportRequest {
                provider: WEBSOCKET_PROVIDER.to_string(),
                audio_format: AudioFormat {
                    format: AUDIO_FORMAT.to_string(),
                    container: AUDIO_CONTAINER.to_string(),
                    sample_rate,
                },
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCallResponse {
    pub id: String,
    pub transport: TransportResponse,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportResponse {
    pub websocket_call_url: String,
}

/// JSON text frames the call websocket delivers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    Transcript {
        role: String,
        #[serde(rename = "transcriptType", default)]
        transcript_type: Option<String>,
        transcript: String,
    },
    StatusUpdate {
        status: String,
        #[serde(rename = "endedReason", default)]
        ended_reason: Option<String>,
    },
    SpeechUpdate {
        status: String,
        role: String,
    },
    Hang,
    #[serde(other)]
    Other,
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Transcript { .. } => "transcript",
            ServerMessage::StatusUpdate { .. } => "status-update",
            ServerMessage::SpeechUpdate { .. } => "speech-update",
            ServerMessage::Hang => "hang",
            ServerMessage::Other => "other",
        }
    }
}

/// Control frames sent to the call websocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ControlMessage {
    EndCall,
}

/// Lifecycle of a call as seen by subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum CallEvent {
    /// The call websocket is connected.
    CallStart,
    /// The call is over, for whatever reason. Always the last event of a call.
    CallEnd { reason: Option<String> },
    Message(ServerMessage),
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_call_request_body() {
        let body = serde_json::to_value(CreateCallRequest::websocket("asst_123", 16000)).unwrap();
        assert_eq!(
            body,
            json!({
                "assistantId": "asst_123",
                "transport": {
                    "provider": "vapi.websocket",
                    "audioFormat": {
                        "format": "pcm_s16le",
                        "container": "raw",
                        "sampleRate": 16000
                    }
                }
            })
        );
    }

    #[test]
    fn create_call_response_exposes_websocket_url() {
        let response: CreateCallResponse = serde_json::from_value(json!({
            "id": "call_1",
            "status": "queued",
            "transport": {
                "provider": "vapi.websocket",
                "websocketCallUrl": "wss://phone.vapi.ai/call_1/transport"
            }
        }))
        .unwrap();
        assert_eq!(response.id, "call_1");
        assert_eq!(
            response.transport.websocket_call_url,
            "wss://phone.vapi.ai/call_1/transport"
        );
    }

    #[test]
    fn parses_transcript_frames() {
        let message: ServerMessage = serde_json::from_str(
            r#"{"type":"transcript","role":"assistant","transcriptType":"final","transcript":"Please implement a stack"}"#,
        )
        .unwrap();
        assert_eq!(
            message,
            ServerMessage::Transcript {
                role: "assistant".to_string(),
                transcript_type: Some("final".to_string()),
                transcript: "Please implement a stack".to_string(),
            }
        );
    }

    #[test]
    fn parses_status_update_with_reason() {
        let message: ServerMessage = serde_json::from_str(
            r#"{"type":"status-update","status":"ended","endedReason":"assistant-ended-call"}"#,
        )
        .unwrap();
        assert_eq!(
            message,
            ServerMessage::StatusUpdate {
                status: "ended".to_string(),
                ended_reason: Some("assistant-ended-call".to_string()),
            }
        );
    }

    #[test]
    fn unknown_frames_are_other() {
        let message: ServerMessage =
            serde_json::from_str(r#"{"type":"model-output","output":"..."}"#).unwrap();
        assert_eq!(message, ServerMessage::Other);
        assert_eq!(message.kind(), "other");
    }

    #[test]
    fn end_call_control_message() {
        let text = serde_json::to_string(&ControlMessage::EndCall).unwrap();
        assert_eq!(text, r#"{"type":"end-call"}"#);
    }
}
