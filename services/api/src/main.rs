mod config;
mod protocol;

use crate::config::Config;
use crate::protocol::ErrorFrame;
use anyhow::Context;
use axum::{
    Router,
    extract::State,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::Response,
    routing::get,
};
use interview_core::{Input, SessionSnapshot};
use interview_service::session::open_session;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

/// Handles WebSocket upgrade requests.
async fn ws_handler(ws: WebSocketUpgrade, State(config): State<Arc<Config>>) -> Response {
    info!("WebSocket upgrade request received");
    ws.on_upgrade(move |socket| handle_socket(socket, config))
}

/// Hosts one interview session for the lifetime of the connection.
///
/// Every published snapshot is pushed to the client as JSON. Closing the
/// socket disposes the session, which hangs up any call in progress.
async fn handle_socket(mut socket: WebSocket, config: Arc<Config>) {
    info!("WebSocket connection established");

    let session = config
        .session
        .session_target(None)
        .map_err(anyhow::Error::from)
        .and_then(|target| open_session(&config.session, target));
    let (session, task) = match session {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Failed to open interview session: {:?}", e);
            let _ = send_json(&mut socket, &ErrorFrame { error: format!("{e:#}") }).await;
            return;
        }
    };

    let mut snapshots = session.snapshots();
    let initial = snapshots.borrow_and_update().clone();
    if send_snapshot(&mut socket, &initial).await.is_ok() {
        loop {
            tokio::select! {
                message = socket.recv() => {
                    let text = match message {
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            info!("WebSocket error: {}", e);
                            break;
                        }
                    };
                    match protocol::parse(text.as_str()) {
                        Ok(command) => {
                            if session.send(Input::from(command)).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!("Unreadable client frame: {}", e);
                            let frame = ErrorFrame { error: format!("invalid command: {e}") };
                            if send_json(&mut socket, &frame).await.is_err() {
                                break;
                            }
                        }
                    }
                }
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = snapshots.borrow_and_update().clone();
                    if send_snapshot(&mut socket, &snapshot).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    if let Err(e) = session.send(Input::Dispose).await {
        tracing::debug!("session already closed: {:?}", e);
    }
    drop(session);
    if let Err(e) = task.await {
        tracing::error!("Interview session task failed: {:?}", e);
    }
    info!("WebSocket connection closed");
}

async fn send_snapshot(socket: &mut WebSocket, snapshot: &SessionSnapshot) -> anyhow::Result<()> {
    send_json(socket, snapshot).await
}

async fn send_json<T: serde::Serialize>(socket: &mut WebSocket, value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string(value).context("Failed to serialize frame")?;
    socket
        .send(Message::Text(text.into()))
        .await
        .context("Client disconnected")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load application configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.session.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    // Allow a separately served frontend to connect from any origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let bind_address = config.bind_address;
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(Arc::new(config));

    info!("Starting WebSocket server, listening on {}", bind_address);
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
