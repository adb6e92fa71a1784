//! Client configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_WS_URL: &str = "ws://localhost:8080/ws";
pub const DEFAULT_WHITEBOARD_URL: &str = "ws://localhost:8080/whiteboard";
pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_STORE_PATH: &str = ".roomsync.json";

/// Error returned by [`SyncConfig::from_env`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but its value cannot be used.
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Endpoints and timing for the real-time and REST clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// WebSocket endpoint carrying room (code, chat, presence) traffic.
    pub ws_url: String,
    /// WebSocket endpoint carrying whiteboard traffic.
    pub whiteboard_url: String,
    /// Base URL of the REST backend, without a trailing slash.
    pub api_url: String,
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
    /// Location of the persisted client store.
    pub store_path: PathBuf,
    /// Participant list refresh period; `None` disables periodic refresh.
    pub refresh_interval: Option<Duration>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_owned(),
            whiteboard_url: DEFAULT_WHITEBOARD_URL.to_owned(),
            api_url: DEFAULT_API_URL.to_owned(),
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            refresh_interval: None,
        }
    }
}

impl SyncConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `ROOMSYNC_WS_URL`: room endpoint (default `ws://localhost:8080/ws`)
    /// - `ROOMSYNC_WHITEBOARD_URL`: whiteboard endpoint
    /// - `ROOMSYNC_API_URL`: REST base URL
    /// - `ROOMSYNC_RECONNECT_DELAY_MS`: default 5000
    /// - `ROOMSYNC_CONNECT_TIMEOUT_MS`: default 10000
    /// - `ROOMSYNC_STORE`: client store path
    /// - `ROOMSYNC_REFRESH_SECS`: participant refresh period, 0 or unset disables
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a numeric variable does not parse
    /// or a URL variable has the wrong scheme.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`SyncConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let ws_url = url_var("ROOMSYNC_WS_URL", get("ROOMSYNC_WS_URL"), &["ws://", "wss://"])?
            .unwrap_or(defaults.ws_url);
        let whiteboard_url = url_var("ROOMSYNC_WHITEBOARD_URL", get("ROOMSYNC_WHITEBOARD_URL"), &["ws://", "wss://"])?
            .unwrap_or(defaults.whiteboard_url);
        let api_url = url_var("ROOMSYNC_API_URL", get("ROOMSYNC_API_URL"), &["http://", "https://"])?
            .unwrap_or(defaults.api_url)
            .trim_end_matches('/')
            .to_owned();

        let reconnect_delay = millis_var("ROOMSYNC_RECONNECT_DELAY_MS", get("ROOMSYNC_RECONNECT_DELAY_MS"))?
            .unwrap_or(defaults.reconnect_delay);
        let connect_timeout = millis_var("ROOMSYNC_CONNECT_TIMEOUT_MS", get("ROOMSYNC_CONNECT_TIMEOUT_MS"))?
            .unwrap_or(defaults.connect_timeout);
        let store_path = get("ROOMSYNC_STORE").map_or(defaults.store_path, PathBuf::from);
        let refresh_interval = parse_u64("ROOMSYNC_REFRESH_SECS", get("ROOMSYNC_REFRESH_SECS"))?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Ok(Self { ws_url, whiteboard_url, api_url, reconnect_delay, connect_timeout, store_path, refresh_interval })
    }
}

fn url_var(var: &'static str, raw: Option<String>, schemes: &[&str]) -> Result<Option<String>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    if schemes.iter().any(|scheme| raw.starts_with(scheme)) {
        Ok(Some(raw))
    } else {
        Err(ConfigError::Invalid { var, reason: format!("expected one of {} but got {raw}", schemes.join(", ")) })
    }
}

fn parse_u64(var: &'static str, raw: Option<String>) -> Result<Option<u64>, ConfigError> {
    raw.map(|v| v.parse::<u64>().map_err(|e| ConfigError::Invalid { var, reason: format!("{v}: {e}") }))
        .transpose()
}

fn millis_var(var: &'static str, raw: Option<String>) -> Result<Option<Duration>, ConfigError> {
    Ok(parse_u64(var, raw)?.map(Duration::from_millis))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
