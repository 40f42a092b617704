/// Persisted local state
///
/// A single JSON object on disk, keyed like browser local storage. Several
/// stores (one per open window) may share one `LocalStorage`; every
/// read-modify-write runs under one lock so the welcome marker is claimed
/// exactly once.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Signed-in user and flag
pub const USER_STATE: &str = "user-state";
/// Access and refresh tokens
pub const AUTH_SESSION: &str = "auth-session";
/// Remembered sign-in email
pub const SAVED_EMAIL: &str = "saved-email";
/// User id the welcome notice was last shown for
pub const WELCOME_SHOWN: &str = "welcome-shown";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt entry {key}: {source}")]
    Serde {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug)]
pub struct LocalStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let _guard = self.lock.lock().await;
        let entries = self.read_all().await?;

        match entries.get(key) {
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|source| StorageError::Serde {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let value = serde_json::to_value(value).map_err(|source| StorageError::Serde {
            key: key.to_string(),
            source,
        })?;

        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value);
        self.write_all(&entries).await
    }

    pub async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        if entries.remove(key).is_some() {
            self.write_all(&entries).await?;
        }
        Ok(())
    }

    /// Marks the welcome notice as shown for `user_id`
    ///
    /// Returns `true` only for the first caller per user; later callers
    /// (other windows, a reload) see the marker and stay quiet.
    pub async fn claim_welcome(&self, user_id: Uuid) -> Result<bool, StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        let marker = Value::String(user_id.to_string());

        if entries.get(WELCOME_SHOWN) == Some(&marker) {
            return Ok(false);
        }

        entries.insert(WELCOME_SHOWN.to_string(), marker);
        self.write_all(&entries).await?;
        Ok(true)
    }

    async fn read_all(&self) -> Result<Map<String, Value>, StorageError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        serde_json::from_str(&contents).map_err(|source| StorageError::Serde {
            key: self.path.display().to_string(),
            source,
        })
    }

    async fn write_all(&self, entries: &Map<String, Value>) -> Result<(), StorageError> {
        let io_error = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        let contents = serde_json::to_string_pretty(entries).map_err(|source| StorageError::Serde {
            key: self.path.display().to_string(),
            source,
        })?;
        tokio::fs::write(&self.path, contents).await.map_err(io_error)
    }
}
