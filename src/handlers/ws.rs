//! `WS /ws/driver/{driver_id}` — one session per connected driver:
//! a reader loop that enqueues GPS worker tasks, and a subscriber task
//! that forwards `reroute:{driver_id}` events back to the client.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::AppState;
use crate::services::pubsub;
use crate::services::worker::GpsUpdate;
use crate::types::ClientFrame;

/// In-process `driver_id -> session` map. A `send` observing a present
/// handle can safely use it: handles are only removed after the
/// session's own reader loop exits.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, mpsc::Sender<Message>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, driver_id: &str, sender: mpsc::Sender<Message>) {
        self.sessions.lock().insert(driver_id.to_string(), sender);
    }

    fn remove(&self, driver_id: &str) {
        self.sessions.lock().remove(driver_id);
    }
}

pub async fn handle_upgrade(
    Path(driver_id): Path<String>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, driver_id, state))
}

async fn handle_socket(socket: WebSocket, driver_id: String, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (push_tx, mut push_rx) = mpsc::channel::<Message>(32);
    state.sessions.insert(&driver_id, push_tx.clone());

    let subscriber_handle = spawn_subscriber(state.redis_client.clone(), driver_id.clone(), push_tx);

    let forward_driver_id = driver_id.clone();
    let forward_task = tokio::spawn(async move {
        while let Some(message) = push_rx.recv().await {
            if sink.send(message).await.is_err() {
                debug!(driver_id = %forward_driver_id, "session send failed, closing");
                break;
            }
        }
    });

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => handle_client_frame(&state, &driver_id, &text),
            Ok(Message::Close(_)) => break,
            Err(e) => {
                warn!(%driver_id, error = %e, "websocket read error, closing session");
                break;
            }
            _ => {}
        }
    }

    if let Some(handle) = subscriber_handle {
        handle.abort();
        let _ = handle.await;
    }
    forward_task.abort();
    state.sessions.remove(&driver_id);
    state.state_store.clear(&driver_id).await;
    info!(%driver_id, "driver session closed");
}

fn handle_client_frame(state: &AppState, driver_id: &str, text: &str) {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(%driver_id, error = %e, "failed to parse client frame, ignoring");
            return;
        }
    };

    match frame {
        ClientFrame::GpsUpdate { lat: Some(lat), lng: Some(lng), timestamp, completed_stop_id } => {
            let update = GpsUpdate {
                driver_id: driver_id.to_string(),
                lat,
                lng,
                timestamp: timestamp.unwrap_or_else(Utc::now),
                completed_stop_id,
            };
            state.dispatcher.enqueue(update);
        }
        ClientFrame::GpsUpdate { .. } => {
            warn!(%driver_id, "gps_update missing lat/lng, ignoring");
        }
        ClientFrame::Unknown => {
            warn!(%driver_id, "unrecognized frame type, ignoring");
        }
    }
}

/// Subscribe to `reroute:{driver_id}` and forward each payload into
/// the session's push channel as a text frame. Returns `None` (no
/// subscriber) when Redis isn't configured — the session still works
/// for GPS ingestion, it just never receives re-route pushes.
fn spawn_subscriber(
    client: Option<redis::Client>,
    driver_id: String,
    push_tx: mpsc::Sender<Message>,
) -> Option<tokio::task::JoinHandle<()>> {
    let client = client?;
    Some(tokio::spawn(async move {
        let mut pubsub = match pubsub::subscribe(&client, &driver_id).await {
            Ok(pubsub) => pubsub,
            Err(e) => {
                warn!(%driver_id, error = %e, "failed to open reroute subscription");
                return;
            }
        };
        let mut stream = pubsub.on_message();
        while let Some(msg) = stream.next().await {
            let payload: String = match msg.get_payload() {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(%driver_id, error = %e, "failed to decode reroute payload");
                    continue;
                }
            };
            debug!(%driver_id, "forwarding reroute event");
            if push_tx.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    }))
}
