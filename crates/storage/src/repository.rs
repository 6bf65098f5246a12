use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// How long a flag survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagScope {
    /// Lives for the current process only.
    Session,
    /// Survives restarts.
    Local,
}

/// Well-known flags used by the app shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKey {
    /// The student chose "Later" on the update dialog.
    UpdateDismissed,
    /// The student closed the install banner; value is a unix-millis timestamp.
    InstallDismissed,
}

impl FlagKey {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FlagKey::UpdateDismissed => "pwa-update-dismissed",
            FlagKey::InstallDismissed => "pwa-install-dismissed",
        }
    }

    #[must_use]
    pub fn scope(self) -> FlagScope {
        match self {
            FlagKey::UpdateDismissed => FlagScope::Session,
            FlagKey::InstallDismissed => FlagScope::Local,
        }
    }
}

impl fmt::Display for FlagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored flag value and when it was last written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagRecord {
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

impl FlagRecord {
    /// Interpret the value as a unix-millis timestamp marker.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        self.value
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
    }
}

/// Simple key/value markers with no schema.
#[async_trait]
pub trait FlagRepository: Send + Sync {
    /// Fetch a flag, `None` when it was never set or has been cleared.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_flag(&self, key: FlagKey) -> Result<Option<FlagRecord>, StorageError>;

    /// Set or overwrite a flag.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the flag cannot be stored.
    async fn set_flag(
        &self,
        key: FlagKey,
        value: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Remove a flag. Clearing a missing flag is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn clear_flag(&self, key: FlagKey) -> Result<(), StorageError>;
}

/// In-memory flags, used for session scope and in tests.
#[derive(Clone, Default)]
pub struct InMemoryFlags {
    flags: Arc<Mutex<HashMap<FlagKey, FlagRecord>>>,
}

impl InMemoryFlags {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlagRepository for InMemoryFlags {
    async fn get_flag(&self, key: FlagKey) -> Result<Option<FlagRecord>, StorageError> {
        let guard = self
            .flags
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&key).cloned())
    }

    async fn set_flag(
        &self,
        key: FlagKey,
        value: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .flags
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(
            key,
            FlagRecord {
                value: value.to_string(),
                updated_at: at,
            },
        );
        Ok(())
    }

    async fn clear_flag(&self, key: FlagKey) -> Result<(), StorageError> {
        let mut guard = self
            .flags
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(&key);
        Ok(())
    }
}

/// Session and local flag stores behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub session_flags: Arc<dyn FlagRepository>,
    pub local_flags: Arc<dyn FlagRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            session_flags: Arc::new(InMemoryFlags::new()),
            local_flags: Arc::new(InMemoryFlags::new()),
        }
    }

    /// The store responsible for `key`'s scope.
    #[must_use]
    pub fn flags_for(&self, key: FlagKey) -> Arc<dyn FlagRepository> {
        match key.scope() {
            FlagScope::Session => Arc::clone(&self.session_flags),
            FlagScope::Local => Arc::clone(&self.local_flags),
        }
    }
}
