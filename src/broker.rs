//! In-process STOMP broker.
//!
//! DESIGN
//! ======
//! `MemoryBroker` is a [`Transport`]: every `open` starts a connection task
//! that speaks the broker side of STOMP 1.2 over the link. `SEND` frames to an
//! application destination (`/app/...`) are relayed to the matching topic
//! (see [`relay_topic`]) and delivered to every subscriber, the sender
//! included, in the order the broker received them.
//!
//! The broker backs the local relay server, the demo, and the tests, which use
//! [`MemoryBroker::drop_connections`] and [`MemoryBroker::set_available`] to
//! simulate network failure.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use frames::{Command, StompFrame, decode_frame, encode_frame};
use tokio::sync::{RwLock, mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::topic::relay_topic;
use crate::transport::{Link, Transport, TransportError};

struct Subscriber {
    conn: Uuid,
    id: String,
    tx: mpsc::UnboundedSender<String>,
}

#[derive(Default)]
struct BrokerState {
    unavailable: bool,
    /// Topic -> subscribers in subscription order.
    topics: HashMap<String, Vec<Subscriber>>,
    /// Live connections; dropping the sender ends the connection task.
    connections: HashMap<Uuid, oneshot::Sender<()>>,
    next_message_id: u64,
}

/// Shared, cloneable handle to one in-process broker.
#[derive(Clone, Default)]
pub struct MemoryBroker {
    state: Arc<RwLock<BrokerState>>,
}

impl MemoryBroker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions on `topic`.
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.state.read().await.topics.get(topic).map_or(0, Vec::len)
    }

    /// Number of live connections.
    pub async fn connection_count(&self) -> usize {
        self.state.read().await.connections.len()
    }

    /// Close every live connection as if the network dropped.
    pub async fn drop_connections(&self) {
        let mut state = self.state.write().await;
        let count = state.connections.len();
        state.connections.clear();
        state.topics.clear();
        info!(count, "broker dropped all connections");
    }

    /// While unavailable, `open` is refused.
    pub async fn set_available(&self, available: bool) {
        self.state.write().await.unavailable = !available;
    }

    /// Serve the broker side of STOMP over an already-open link.
    ///
    /// Returns when the client disconnects, the link closes, or the broker
    /// drops the connection.
    pub async fn serve(&self, link: Link) {
        let conn = Uuid::new_v4();
        let (kill_tx, mut kill_rx) = oneshot::channel();
        self.state.write().await.connections.insert(conn, kill_tx);
        debug!(%conn, "broker connection opened");

        let Link { outbound, mut inbound } = link;
        loop {
            tokio::select! {
                _ = &mut kill_rx => break,
                raw = inbound.recv() => {
                    let Some(raw) = raw else { break };
                    match decode_frame(&raw) {
                        Ok(Some(frame)) => {
                            if !self.handle(conn, frame, &outbound).await {
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            warn!(%conn, error = %e, "broker received malformed frame");
                            reply(&outbound, &StompFrame::error(&e.to_string()));
                            break;
                        }
                    }
                }
            }
        }

        self.forget(conn).await;
        debug!(%conn, "broker connection closed");
    }

    /// Handle one client frame. Returns `false` when the connection should close.
    async fn handle(&self, conn: Uuid, frame: StompFrame, out: &mpsc::UnboundedSender<String>) -> bool {
        match frame.command {
            Command::Connect | Command::Stomp => {
                reply(out, &StompFrame::connected());
                true
            }
            Command::Subscribe => {
                let (Some(topic), Some(id)) = (frame.destination(), frame.header("id")) else {
                    reply(out, &StompFrame::error("SUBSCRIBE requires destination and id"));
                    return false;
                };
                let mut state = self.state.write().await;
                state
                    .topics
                    .entry(topic.to_owned())
                    .or_default()
                    .push(Subscriber { conn, id: id.to_owned(), tx: out.clone() });
                debug!(%conn, topic, id, "broker subscribe");
                true
            }
            Command::Unsubscribe => {
                let Some(id) = frame.header("id") else {
                    reply(out, &StompFrame::error("UNSUBSCRIBE requires id"));
                    return false;
                };
                let mut state = self.state.write().await;
                for subs in state.topics.values_mut() {
                    subs.retain(|s| !(s.conn == conn && s.id == id));
                }
                true
            }
            Command::Send => {
                let Some(destination) = frame.destination() else {
                    reply(out, &StompFrame::error("SEND requires destination"));
                    return false;
                };
                self.publish(&relay_topic(destination), &frame.body).await;
                acknowledge(out, &frame);
                true
            }
            Command::Disconnect => {
                acknowledge(out, &frame);
                false
            }
            Command::Connected | Command::Message | Command::Receipt | Command::Error => {
                reply(out, &StompFrame::error(&format!("{} is a server frame", frame.command)));
                false
            }
        }
    }

    async fn publish(&self, topic: &str, body: &str) {
        let mut state = self.state.write().await;
        state.next_message_id += 1;
        let message_id = state.next_message_id.to_string();
        let Some(subs) = state.topics.get(topic) else {
            debug!(topic, "broker publish with no subscribers");
            return;
        };
        for sub in subs {
            let frame = StompFrame::message(topic, &sub.id, &message_id, body);
            if sub.tx.send(encode_frame(&frame)).is_err() {
                debug!(conn = %sub.conn, topic, "broker subscriber gone");
            }
        }
    }

    async fn forget(&self, conn: Uuid) {
        let mut state = self.state.write().await;
        state.connections.remove(&conn);
        for subs in state.topics.values_mut() {
            subs.retain(|s| s.conn != conn);
        }
        state.topics.retain(|_, subs| !subs.is_empty());
    }
}

#[async_trait]
impl Transport for MemoryBroker {
    async fn open(&self, endpoint: &str) -> Result<Link, TransportError> {
        if self.state.read().await.unavailable {
            return Err(TransportError::Unavailable(endpoint.to_owned()));
        }
        let (client, far) = Link::pair();
        let broker = self.clone();
        tokio::spawn(async move { broker.serve(far).await });
        Ok(client)
    }
}

fn reply(out: &mpsc::UnboundedSender<String>, frame: &StompFrame) {
    if out.send(encode_frame(frame)).is_err() {
        debug!(command = %frame.command, "broker reply dropped, client gone");
    }
}

/// Send a `RECEIPT` when the client asked for one.
fn acknowledge(out: &mpsc::UnboundedSender<String>, frame: &StompFrame) {
    if let Some(receipt) = frame.header("receipt") {
        reply(out, &StompFrame::new(Command::Receipt).with_header("receipt-id", receipt));
    }
}

#[cfg(test)]
#[path = "broker_test.rs"]
mod tests;
