//! WebSocket stream of import notifications.
//!
//! A client first receives a `snapshot` frame with the whole session, then
//! one frame per session transition. A client that falls behind the
//! broadcast channel gets a fresh snapshot instead of the events it missed.
//! Sending the text `snapshot` asks for one at any time.

use std::time::{Duration, Instant};

use actix_web::{HttpRequest, HttpResponse, web};
use actix_ws::{Message, MessageStream, Session};
use futures_util::StreamExt;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::models::{ImportEvent, ImportEventMessage};
use crate::services::UploadSession;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

/// Text frame a client sends to request the current session state.
const SNAPSHOT_REQUEST: &str = "snapshot";

/// Upgrade the HTTP connection and start streaming events.
pub async fn websocket_handler(
    req: HttpRequest,
    stream: web::Payload,
    session: web::Data<UploadSession>,
) -> Result<HttpResponse, actix_web::Error> {
    let client = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string();

    let (response, ws, messages) = actix_ws::handle(&req, stream)?;
    info!(client = %client, "Dashboard subscribed to import events");

    actix_web::rt::spawn(stream_events(session, ws, messages, client));

    Ok(response)
}

/// Snapshot of `session` wrapped as an event frame.
fn snapshot_frame(session: &UploadSession) -> ImportEventMessage {
    ImportEventMessage::new(ImportEvent::Snapshot(session.snapshot()))
}

/// Send one event as a JSON text frame. `false` once the client is gone.
async fn send_frame(ws: &mut Session, frame: &ImportEventMessage) -> bool {
    match serde_json::to_string(frame) {
        Ok(json) => ws.text(json).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Could not encode import event");
            true
        }
    }
}

async fn stream_events(
    session: web::Data<UploadSession>,
    mut ws: Session,
    mut messages: MessageStream,
    client: String,
) {
    // Subscribe before the first snapshot so no transition falls in between.
    let mut events = session.events().subscribe();
    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    let mut last_seen = Instant::now();

    let mut open = send_frame(&mut ws, &snapshot_frame(&session)).await;

    while open {
        tokio::select! {
            Some(message) = messages.next() => {
                last_seen = Instant::now();
                open = match message {
                    Ok(Message::Ping(bytes)) => ws.pong(&bytes).await.is_ok(),
                    Ok(Message::Text(text)) if text.trim() == SNAPSHOT_REQUEST => {
                        send_frame(&mut ws, &snapshot_frame(&session)).await
                    }
                    Ok(Message::Text(text)) => {
                        debug!(client = %client, message = %text, "Ignoring client message");
                        true
                    }
                    Ok(Message::Close(reason)) => {
                        debug!(client = %client, reason = ?reason, "Client closed the stream");
                        false
                    }
                    Ok(_) => true,
                    Err(e) => {
                        warn!(client = %client, error = %e, "WebSocket protocol error");
                        false
                    }
                };
            }

            received = events.recv() => {
                open = match received {
                    Ok(frame) => send_frame(&mut ws, &frame).await,
                    Err(RecvError::Lagged(missed)) => {
                        warn!(client = %client, missed, "Client fell behind, resending snapshot");
                        send_frame(&mut ws, &snapshot_frame(&session)).await
                    }
                    Err(RecvError::Closed) => false,
                };
            }

            _ = heartbeat.tick() => {
                open = if last_seen.elapsed() > CLIENT_TIMEOUT + HEARTBEAT_INTERVAL {
                    warn!(client = %client, "No traffic from client, dropping stream");
                    false
                } else {
                    ws.ping(b"").await.is_ok()
                };
            }
        }
    }

    let _ = ws.close(None).await;
    info!(client = %client, "Dashboard unsubscribed from import events");
}

/// Configure WebSocket routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws").route(web::get().to(websocket_handler)));
}
