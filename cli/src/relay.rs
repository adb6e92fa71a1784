//! Local relay: STOMP over WebSocket, backed by the in-process broker.
//!
//! DESIGN
//! ======
//! Each upgraded socket opens one broker link and enters a `select!` loop:
//! - text messages from the client -> broker link
//! - frames from the broker -> client socket
//!
//! The relay never parses frames; the broker owns the protocol.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade on `/ws` or `/whiteboard` -> open a broker link
//! 2. Pump until either side closes
//! 3. Drop the link -> the broker forgets the connection's subscriptions

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use roomsync::broker::MemoryBroker;
use roomsync::transport::Transport;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Relay routes sharing one broker.
pub fn router(broker: MemoryBroker) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    Router::new()
        .route("/ws", get(handle_ws))
        .route("/whiteboard", get(handle_ws))
        .route("/healthz", get(healthz))
        .layer(cors)
        .with_state(broker)
}

async fn handle_ws(State(broker): State<MemoryBroker>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, broker))
}

async fn run_ws(mut socket: WebSocket, broker: MemoryBroker) {
    let client_id = Uuid::new_v4();
    let mut link = match broker.open("relay").await {
        Ok(link) => link,
        Err(e) => {
            warn!(%client_id, error = %e, "relay: broker refused connection");
            return;
        }
    };
    info!(%client_id, "relay: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        if link.outbound.send(text.as_str().to_owned()).is_err() {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            frame = link.inbound.recv() => {
                let Some(frame) = frame else {
                    debug!(%client_id, "relay: broker closed link");
                    break;
                };
                if socket.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    info!(%client_id, "relay: client disconnected");
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "relay_test.rs"]
mod tests;
