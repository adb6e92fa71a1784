//! Channel manager: one real-time connection per collaboration context.
//!
//! DESIGN
//! ======
//! A `ChannelManager` is owned by exactly one session and talks to the broker
//! through an injected [`Transport`]. Callers pull typed [`ChannelEvent`]s
//! from [`ChannelManager::next_event`] instead of registering callbacks.
//!
//! LIFECYCLE
//! =========
//! `connect` opens a link, performs the STOMP handshake, subscribes the
//! context's canonical topic and announces the participant with `join`.
//! `disconnect` announces `leave` and closes the link; calling it again is a
//! no-op. When the link drops unexpectedly the manager reports
//! `Disconnected`, waits the reconnect delay, and makes one attempt to
//! re-establish the link with every topic resubscribed. A failed attempt
//! leaves the manager `Failed` and reports `Error`.
//!
//! Delivery is at-most-once: nothing is queued while disconnected.

use std::collections::VecDeque;
use std::time::Duration;

use frames::{
    Command, Envelope, HEADER_MESSAGE, StompFrame, decode_envelope, decode_frame, encode_envelope, encode_frame,
};
use tokio::time::{Instant, sleep_until, timeout};
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::topic::ChannelContext;
use crate::transport::{Link, Transport, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// No `CONNECTED` frame arrived within the connect timeout.
    #[error("no CONNECTED from {endpoint} within {timeout:?}")]
    Timeout { endpoint: String, timeout: Duration },
    /// The broker answered the handshake with an `ERROR` frame.
    #[error("broker rejected connection: {0}")]
    Rejected(String),
    /// The link closed before the handshake finished.
    #[error("connection closed during handshake")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// Result of a successful [`ChannelManager::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// A new connection was opened.
    Established,
    /// The manager was already connected; nothing changed.
    AlreadyConnected,
}

/// Events produced by a channel manager.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// The connection is up, subscribed, and `join` has been sent.
    Connected,
    /// An envelope arrived on a subscribed topic.
    Message { topic: String, envelope: Envelope },
    /// The connection went down.
    Disconnected,
    /// A connection-level failure.
    Error(String),
}

pub struct ChannelManager {
    transport: Box<dyn Transport>,
    endpoint: String,
    participant: String,
    reconnect_delay: Duration,
    connect_timeout: Duration,
    state: ConnectionState,
    context: Option<ChannelContext>,
    link: Option<Link>,
    /// Subscribed topics in subscription order; index `i` has id `sub-{i}`.
    topics: Vec<String>,
    pending: VecDeque<ChannelEvent>,
    /// When the single reconnect attempt may start; set on link loss.
    reconnect_at: Option<Instant>,
}

impl ChannelManager {
    #[must_use]
    pub fn new(transport: impl Transport + 'static, endpoint: &str, participant: &str) -> Self {
        Self {
            transport: Box::new(transport),
            endpoint: endpoint.to_owned(),
            participant: participant.to_owned(),
            reconnect_delay: Duration::from_millis(crate::config::DEFAULT_RECONNECT_DELAY_MS),
            connect_timeout: Duration::from_millis(crate::config::DEFAULT_CONNECT_TIMEOUT_MS),
            state: ConnectionState::Disconnected,
            context: None,
            link: None,
            topics: Vec::new(),
            pending: VecDeque::new(),
            reconnect_at: None,
        }
    }

    /// Manager with timing taken from `config`.
    #[must_use]
    pub fn with_config(transport: impl Transport + 'static, endpoint: &str, participant: &str, config: &SyncConfig) -> Self {
        Self::new(transport, endpoint, participant)
            .with_reconnect_delay(config.reconnect_delay)
            .with_connect_timeout(config.connect_timeout)
    }

    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, limit: Duration) -> Self {
        self.connect_timeout = limit;
        self
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    #[must_use]
    pub fn participant(&self) -> &str {
        &self.participant
    }

    #[must_use]
    pub fn context(&self) -> Option<&ChannelContext> {
        self.context.as_ref()
    }

    /// Topics subscribed on the current (or last) connection.
    #[must_use]
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Connect for `context`. Idempotent while connected.
    ///
    /// On success the context's topic is subscribed, `join` has been sent,
    /// and a [`ChannelEvent::Connected`] is queued.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] if the link cannot be opened or the handshake
    /// fails. The failure is also queued as a [`ChannelEvent::Error`].
    pub async fn connect(&mut self, context: &ChannelContext) -> Result<ConnectOutcome, ChannelError> {
        if self.state == ConnectionState::Connected {
            warn!(endpoint = %self.endpoint, topic = %context.topic, "already connected");
            return Ok(ConnectOutcome::AlreadyConnected);
        }

        self.state = ConnectionState::Connecting;
        self.context = Some(context.clone());
        self.topics = vec![context.topic.clone()];
        self.reconnect_at = None;

        match self.establish().await {
            Ok(()) => {
                info!(endpoint = %self.endpoint, topic = %context.topic, participant = %self.participant, "channel connected");
                self.pending.push_back(ChannelEvent::Connected);
                Ok(ConnectOutcome::Established)
            }
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "channel connect failed");
                self.state = ConnectionState::Failed;
                self.pending.push_back(ChannelEvent::Error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Subscribe an extra topic on the live connection.
    ///
    /// Returns `true` when a new subscription was made; duplicates and calls
    /// while disconnected return `false`.
    pub fn subscribe(&mut self, topic: &str) -> bool {
        if self.topics.iter().any(|t| t == topic) {
            debug!(topic, "already subscribed");
            return false;
        }
        if !self.is_connected() {
            warn!(topic, "subscribe while disconnected");
            return false;
        }
        let id = subscription_id(self.topics.len());
        self.topics.push(topic.to_owned());
        self.write(&StompFrame::subscribe(&id, topic))
    }

    /// Publish `envelope` to `destination`, or to the context's publish
    /// destination when `None`.
    ///
    /// Never errors: returns `false` and logs a warning when disconnected.
    pub fn send(&mut self, envelope: &Envelope, destination: Option<&str>) -> bool {
        if !self.is_connected() {
            warn!(kind = %envelope.kind(), "send while disconnected, dropping message");
            return false;
        }
        let Some(destination) = destination.map(str::to_owned).or_else(|| self.context.as_ref().map(|c| c.publish.clone()))
        else {
            warn!(kind = %envelope.kind(), "send with no destination");
            return false;
        };
        self.write(&StompFrame::send(&destination, encode_envelope(envelope)))
    }

    /// Announce `leave` and close the connection. Safe to call at any time.
    pub fn disconnect(&mut self) {
        self.reconnect_at = None;
        if !self.is_connected() {
            debug!(state = ?self.state, "disconnect while not connected");
            self.link = None;
            self.state = ConnectionState::Disconnected;
            return;
        }

        if let Some(leave) = self.context.as_ref().and_then(|c| c.leave.clone()) {
            self.write(&StompFrame::send(&leave, encode_envelope(&Envelope::leave(&self.participant))));
        }
        self.write(&StompFrame::disconnect());
        self.link = None;
        self.state = ConnectionState::Disconnected;
        self.pending.push_back(ChannelEvent::Disconnected);
        info!(endpoint = %self.endpoint, participant = %self.participant, "channel disconnected");
    }

    /// Next event, or `None` once the manager is idle with nothing queued.
    ///
    /// Cancel safe: a dropped call loses no inbound frame, and a pending
    /// reconnect keeps the deadline set when the link was lost, so the next
    /// call resumes the wait instead of starting it over.
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if let Some(deadline) = self.reconnect_at {
                sleep_until(deadline).await;
                self.reconnect().await;
                self.reconnect_at = None;
                continue;
            }
            let link = self.link.as_mut()?;
            let received = link.inbound.recv().await;
            match received {
                Some(raw) => {
                    if let Some(event) = self.on_frame(&raw) {
                        return Some(event);
                    }
                }
                None => self.on_link_lost(),
            }
        }
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    async fn establish(&mut self) -> Result<(), ChannelError> {
        let mut link = self.transport.open(&self.endpoint).await?;
        let connect = StompFrame::connect(host_of(&self.endpoint));
        if link.outbound.send(encode_frame(&connect)).is_err() {
            return Err(ChannelError::Closed);
        }

        let endpoint = self.endpoint.clone();
        let limit = self.connect_timeout;
        timeout(limit, await_connected(&mut link))
            .await
            .map_err(|_| ChannelError::Timeout { endpoint, timeout: limit })??;

        self.link = Some(link);
        self.state = ConnectionState::Connected;

        for (i, topic) in self.topics.iter().enumerate() {
            self.write(&StompFrame::subscribe(&subscription_id(i), topic));
        }
        if let Some(join) = self.context.as_ref().and_then(|c| c.join.clone()) {
            self.write(&StompFrame::send(&join, encode_envelope(&Envelope::join(&self.participant))));
        }
        Ok(())
    }

    async fn reconnect(&mut self) {
        info!(endpoint = %self.endpoint, "attempting reconnect");
        match self.establish().await {
            Ok(()) => {
                info!(endpoint = %self.endpoint, topics = self.topics.len(), "channel reconnected");
                self.pending.push_back(ChannelEvent::Connected);
            }
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "reconnect failed");
                self.state = ConnectionState::Failed;
                self.pending.push_back(ChannelEvent::Error(e.to_string()));
            }
        }
    }

    fn on_link_lost(&mut self) {
        warn!(endpoint = %self.endpoint, "connection lost");
        self.link = None;
        self.state = ConnectionState::Connecting;
        self.reconnect_at = Some(Instant::now() + self.reconnect_delay);
        self.pending.push_back(ChannelEvent::Disconnected);
    }

    fn on_frame(&mut self, raw: &str) -> Option<ChannelEvent> {
        let frame = match decode_frame(raw) {
            Ok(Some(frame)) => frame,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "skipping malformed frame");
                return None;
            }
        };

        match frame.command {
            Command::Message => {
                let topic = frame.destination().unwrap_or_default().to_owned();
                match decode_envelope(&frame.body) {
                    Ok(envelope) => Some(ChannelEvent::Message { topic, envelope }),
                    Err(e) => {
                        warn!(%topic, error = %e, "skipping malformed message body");
                        None
                    }
                }
            }
            Command::Error => {
                let reason = frame.header(HEADER_MESSAGE).unwrap_or(&frame.body).to_owned();
                warn!(endpoint = %self.endpoint, %reason, "broker error, closing connection");
                self.link = None;
                self.state = ConnectionState::Failed;
                self.pending.push_back(ChannelEvent::Disconnected);
                Some(ChannelEvent::Error(reason))
            }
            other => {
                debug!(command = %other, "ignoring frame");
                None
            }
        }
    }

    fn write(&self, frame: &StompFrame) -> bool {
        let Some(link) = &self.link else {
            return false;
        };
        if link.outbound.send(encode_frame(frame)).is_err() {
            warn!(command = %frame.command, "link closed, frame dropped");
            return false;
        }
        true
    }
}

async fn await_connected(link: &mut Link) -> Result<(), ChannelError> {
    while let Some(raw) = link.inbound.recv().await {
        match decode_frame(&raw) {
            Ok(Some(frame)) if frame.command == Command::Connected => return Ok(()),
            Ok(Some(frame)) if frame.command == Command::Error => {
                let reason = frame.header(HEADER_MESSAGE).unwrap_or(&frame.body).to_owned();
                return Err(ChannelError::Rejected(reason));
            }
            Ok(Some(frame)) => debug!(command = %frame.command, "ignoring frame before CONNECTED"),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "malformed frame during handshake"),
        }
    }
    Err(ChannelError::Closed)
}

fn subscription_id(index: usize) -> String {
    format!("sub-{index}")
}

/// Host (and port) part of an endpoint URL, sent in the `CONNECT` frame.
fn host_of(endpoint: &str) -> &str {
    let rest = endpoint.split_once("://").map_or(endpoint, |(_, rest)| rest);
    rest.split('/').next().unwrap_or(rest)
}

#[cfg(test)]
#[path = "channel_test.rs"]
mod tests;
