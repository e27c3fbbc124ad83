//! Durable client-side key-value storage.
//!
//! Two scopes exist, mirroring a browser's session and local storage:
//!
//! - [`StorageScope::Session`] lives as long as the running client.
//! - [`StorageScope::Persistent`] survives restarts ("remember me").
//!
//! There is no atomicity across scopes.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when reading or writing storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File that was being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Value could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Key contains characters that cannot be stored.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// A key-value store holding string values.
pub trait Storage: Send {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Which storage location a value lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageScope {
    /// Cleared when the client exits.
    Session,
    /// Survives restarts.
    Persistent,
}

impl StorageScope {
    /// Read order used when rehydrating: persistent first, then session.
    pub const READ_ORDER: [Self; 2] = [Self::Persistent, Self::Session];

    /// The opposite scope.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Session => Self::Persistent,
            Self::Persistent => Self::Session,
        }
    }
}

impl std::fmt::Display for StorageScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session => f.write_str("session"),
            Self::Persistent => f.write_str("persistent"),
        }
    }
}

/// The pair of storage scopes available to the client.
pub struct DurableStorage {
    session: Box<dyn Storage>,
    persistent: Box<dyn Storage>,
}

impl DurableStorage {
    /// Combine a session-scoped and a persistent-scoped store.
    #[must_use]
    pub fn new(session: Box<dyn Storage>, persistent: Box<dyn Storage>) -> Self {
        Self {
            session,
            persistent,
        }
    }

    /// Both scopes in memory. Nothing survives the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            Box::new(MemoryStorage::new()),
            Box::new(MemoryStorage::new()),
        )
    }

    /// Session scope in memory, persistent scope in `dir` on disk.
    #[must_use]
    pub fn on_disk(dir: impl Into<PathBuf>) -> Self {
        Self::new(
            Box::new(MemoryStorage::new()),
            Box::new(FileStorage::new(dir)),
        )
    }

    /// Borrow the store for `scope`.
    #[must_use]
    pub fn scope(&self, scope: StorageScope) -> &dyn Storage {
        match scope {
            StorageScope::Session => self.session.as_ref(),
            StorageScope::Persistent => self.persistent.as_ref(),
        }
    }

    /// Mutably borrow the store for `scope`.
    pub fn scope_mut(&mut self, scope: StorageScope) -> &mut dyn Storage {
        match scope {
            StorageScope::Session => self.session.as_mut(),
            StorageScope::Persistent => self.persistent.as_mut(),
        }
    }
}

impl std::fmt::Debug for DurableStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableStorage").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_scopes_are_independent() {
        let mut storage = DurableStorage::in_memory();
        storage
            .scope_mut(StorageScope::Session)
            .set("k", "session")
            .unwrap();

        assert_eq!(
            storage.scope(StorageScope::Session).get("k").unwrap().as_deref(),
            Some("session")
        );
        assert!(storage.scope(StorageScope::Persistent).get("k").unwrap().is_none());
    }

    #[test]
    fn test_read_order_prefers_persistent() {
        assert_eq!(StorageScope::READ_ORDER[0], StorageScope::Persistent);
        assert_eq!(StorageScope::Persistent.to_string(), "persistent");
    }
}
