//! Persisted client state.
//!
//! A flat key/value map written as pretty JSON. Missing files load as an
//! empty store; every mutation is explicit and `save` writes the whole map.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file exists but is not a JSON object of strings.
    #[error("store file {path} is corrupt: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Keys the client persists between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredKey {
    Token,
    Name,
    Profile,
    Email,
}

impl StoredKey {
    pub const ALL: [Self; 4] = [Self::Token, Self::Name, Self::Profile, Self::Email];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Name => "name",
            Self::Profile => "profile",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for StoredKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl ClientStore {
    /// Read the store at `path`, or start empty if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be read or is not valid JSON.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|source| StoreError::Json { path: path.clone(), source })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        debug!(path = %path.display(), entries = values.len(), "client store loaded");
        Ok(Self { path, values })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn get(&self, key: StoredKey) -> Option<&str> {
        self.values.get(key.as_str()).map(String::as_str)
    }

    pub fn set(&mut self, key: StoredKey, value: &str) {
        self.values.insert(key.as_str().to_owned(), value.to_owned());
    }

    /// Remove `key`, returning its previous value.
    pub fn remove(&mut self, key: StoredKey) -> Option<String> {
        self.values.remove(key.as_str())
    }

    /// Forget the session credentials. The display name is kept.
    pub fn logout(&mut self) {
        for key in [StoredKey::Token, StoredKey::Email, StoredKey::Profile] {
            self.remove(key);
        }
    }

    /// Write the store to disk, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be written.
    pub fn save(&self) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io { path: self.path.clone(), source };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let text = serde_json::to_string_pretty(&self.values)
            .map_err(|source| StoreError::Json { path: self.path.clone(), source })?;
        std::fs::write(&self.path, text).map_err(io_err)?;
        debug!(path = %self.path.display(), "client store saved");
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
