//! Transport seam between the channel manager and the wire.
//!
//! A [`Transport`] opens a [`Link`]: a pair of unbounded FIFO channels
//! carrying whole STOMP frames as text. The WebSocket transport bridges them
//! to a socket on a pump task; tests and the demo use the in-process broker.
//!
//! LIFECYCLE
//! =========
//! Dropping `Link::outbound` asks the far side to close. The far side closing,
//! for any reason, ends `Link::inbound` (`recv` yields `None`).

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The WebSocket handshake failed.
    #[error("websocket connect to {endpoint} failed: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: Box<tokio_tungstenite::tungstenite::Error>,
    },
    /// The endpoint refused the connection.
    #[error("endpoint {0} is unavailable")]
    Unavailable(String),
}

/// One open connection as a pair of text frame channels.
#[derive(Debug)]
pub struct Link {
    pub outbound: mpsc::UnboundedSender<String>,
    pub inbound: mpsc::UnboundedReceiver<String>,
}

impl Link {
    /// Build both ends of an in-memory link: `(client side, far side)`.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let (client_tx, far_rx) = mpsc::unbounded_channel();
        let (far_tx, client_rx) = mpsc::unbounded_channel();
        (Self { outbound: client_tx, inbound: client_rx }, Self { outbound: far_tx, inbound: far_rx })
    }
}

/// Opens links to an endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    /// # Errors
    ///
    /// Returns [`TransportError`] when the endpoint cannot be reached.
    async fn open(&self, endpoint: &str) -> Result<Link, TransportError>;
}

/// STOMP over a raw WebSocket, one text message per frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

#[async_trait]
impl Transport for WsTransport {
    async fn open(&self, endpoint: &str) -> Result<Link, TransportError> {
        let (mut socket, _) = connect_async(endpoint)
            .await
            .map_err(|e| TransportError::Connect { endpoint: endpoint.to_owned(), source: Box::new(e) })?;
        let (client, mut far) = Link::pair();
        let endpoint = endpoint.to_owned();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    incoming = socket.next() => match incoming {
                        Some(Ok(Message::Text(text))) => {
                            if far.outbound.send(text.as_str().to_owned()).is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!(%endpoint, error = %e, "websocket read failed");
                            break;
                        }
                    },
                    outgoing = far.inbound.recv() => {
                        let Some(text) = outgoing else {
                            if let Err(e) = socket.close(None).await {
                                debug!(%endpoint, error = %e, "websocket close failed");
                            }
                            break;
                        };
                        if let Err(e) = socket.send(Message::Text(text.into())).await {
                            warn!(%endpoint, error = %e, "websocket send failed");
                            break;
                        }
                    }
                }
            }
            debug!(%endpoint, "websocket pump exited");
        });

        Ok(client)
    }
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
