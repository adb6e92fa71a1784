//! REST client for the collaboration backend and the execution service.

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::code::Language;
use crate::ids::{IdError, RoomId, SessionCode};
use crate::presence::ParticipantSource;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-2xx response; `body` is the response text as sent.
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("missing expected field `{0}`")]
    MissingField(&'static str),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("server returned an invalid id: {0}")]
    InvalidId(#[from] IdError),
}

/// Result of `POST /api/code/run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Output(String),
    /// The program failed to compile or run.
    Error(String),
}

/// One entry of a user's room history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub room_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// HTTP client bound to one backend base URL.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.trim_end_matches('/').to_owned() }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create an interview room: `POST /api/interview-rooms/create`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, non-2xx status, or a reply
    /// without `roomCode`/`accessCode`.
    pub async fn create_room(&self) -> Result<SessionCode, ApiError> {
        let value = self.request(Method::POST, "/api/interview-rooms/create", &[], None).await?;
        let room_code = str_field(&value, "roomCode")?;
        let access_code = str_field(&value, "accessCode")?;
        Ok(SessionCode::new(room_code, access_code)?)
    }

    /// Join an interview room with its access code.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] when the backend refuses the code.
    pub async fn join_room(&self, code: &SessionCode, username: &str) -> Result<(), ApiError> {
        let query = [
            ("roomCode", code.room_code.as_str()),
            ("accessCode", code.access_code.as_str()),
            ("username", username),
        ];
        self.request(Method::POST, "/api/interview-rooms/join", &query, None).await?;
        Ok(())
    }

    /// Current participants of a room.
    ///
    /// Accepts a list of names or of `{name}` / `{username}` records.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on failure or when the reply is not a list.
    pub async fn participants(&self, room: &RoomId) -> Result<Vec<String>, ApiError> {
        let path = format!("/api/interview-rooms/{room}/participants");
        let value = self.request(Method::GET, &path, &[], None).await?;
        let Value::Array(items) = value else {
            return Err(ApiError::MissingField("participants"));
        };
        Ok(items.iter().filter_map(participant_name).collect())
    }

    /// Run code on the quick execution endpoint: `POST /execute`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on failure or a reply without `output`.
    pub async fn execute(&self, code: &str, language: Language) -> Result<String, ApiError> {
        let body = json!({ "code": code, "language": language.name() });
        let value = self.request(Method::POST, "/execute", &[], Some(body)).await?;
        Ok(str_field(&value, "output")?.to_owned())
    }

    /// Run code with stdin through the judge: `POST /api/code/run`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-2xx status.
    pub async fn run(&self, code: &str, language: Language, input: &str) -> Result<RunOutcome, ApiError> {
        let body = json!({ "code": code, "languageId": language.judge0_id().to_string(), "input": input });
        let value = self.request(Method::POST, "/api/code/run", &[], Some(body)).await?;
        if let Some(output) = value.get("output").and_then(Value::as_str).filter(|s| !s.is_empty()) {
            return Ok(RunOutcome::Output(output.to_owned()));
        }
        if let Some(error) = value.get("error").and_then(Value::as_str) {
            return Ok(RunOutcome::Error(error.to_owned()));
        }
        Ok(RunOutcome::Output("No output.".to_owned()))
    }

    /// Room history of `username`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on failure or an unexpected reply shape.
    pub async fn sessions(&self, username: &str) -> Result<Vec<SessionRecord>, ApiError> {
        let path = format!("/api/sessions/{username}");
        let value = self.request(Method::GET, &path, &[], None).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Record that `username` entered `room`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on failure.
    pub async fn save_session(&self, room: &RoomId, username: &str) -> Result<(), ApiError> {
        let body = json!({ "roomId": room.as_str(), "username": username });
        self.request(Method::POST, "/api/sessions", &[], Some(body)).await?;
        Ok(())
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "api request");

        let request = self.http.request(method, &url).query(query);
        let request = if let Some(json) = body { request.json(&json) } else { request };

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status { status: status.as_u16(), body: text });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl ParticipantSource for BackendClient {
    async fn fetch_participants(&self, room: &RoomId) -> Result<Vec<String>, ApiError> {
        self.participants(room).await
    }
}

fn str_field<'a>(value: &'a Value, field: &'static str) -> Result<&'a str, ApiError> {
    value.get(field).and_then(Value::as_str).ok_or(ApiError::MissingField(field))
}

fn participant_name(item: &Value) -> Option<String> {
    match item {
        Value::String(name) => Some(name.clone()),
        Value::Object(map) => map
            .get("name")
            .or_else(|| map.get("username"))
            .and_then(Value::as_str)
            .map(ToOwned::to_owned),
        _ => None,
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
