//! The persisted snapshot of client state.
//!
//! One JSON document under one storage key holds the auth, cart, POS and
//! catalog slices. It is rewritten after every persisted mutation and read
//! at startup. Documents carry a schema version; a document with another
//! version (or one that does not parse) is discarded and erased rather than
//! migrated.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::AuthState;
use crate::cart::Cart;
use crate::catalog::Catalog;
use crate::pos::PosState;
use crate::storage::{DurableStorage, StorageError, StorageScope};
use crate::store::ClientState;

/// Current snapshot schema version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized projection of the client state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    #[serde(default)]
    pub auth: AuthState,
    #[serde(default)]
    pub cart: Cart,
    #[serde(default)]
    pub pos: PosState,
    #[serde(default)]
    pub catalog: Catalog,
}

impl Snapshot {
    /// Capture the persisted slices of `state`.
    #[must_use]
    pub fn capture(state: &ClientState) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            auth: state.auth.clone(),
            cart: state.cart.clone(),
            pos: state.pos.clone(),
            catalog: state.catalog.clone(),
        }
    }

    /// Restore the slices into `state`.
    ///
    /// Auth is not restored here beyond the device token: the session token
    /// is re-decoded by `Store::initialize`, which is the only path that may
    /// set role and user id.
    pub fn restore_into(self, state: &mut ClientState) {
        state.auth.fcm_token = self.auth.fcm_token;

        state.cart = self.cart;
        state.cart.normalize();

        state.pos = self.pos;
        state.pos.settle_after_restore();

        state.catalog = self.catalog;
    }
}

/// Why a stored snapshot was discarded.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The document is not valid JSON or does not match the schema.
    #[error("snapshot is unreadable: {0}")]
    Unreadable(#[from] serde_json::Error),

    /// The document was written by another schema version.
    #[error("snapshot version {found:?} does not match {SNAPSHOT_VERSION}")]
    VersionMismatch { found: Option<u64> },
}

/// Parse a stored snapshot, enforcing the schema version.
///
/// # Errors
///
/// Returns `SnapshotError` if the document should be discarded.
pub fn decode(raw: &str) -> Result<Snapshot, SnapshotError> {
    let value: Value = serde_json::from_str(raw)?;
    let found = value.get("version").and_then(Value::as_u64);
    if found != Some(u64::from(SNAPSHOT_VERSION)) {
        return Err(SnapshotError::VersionMismatch { found });
    }
    Ok(serde_json::from_value(value)?)
}

/// Reads and writes the snapshot in durable storage.
#[derive(Debug)]
pub struct SnapshotStore {
    storage: DurableStorage,
    key: String,
    remember_me: bool,
    /// Whether the copy outside the target scope has been removed since the
    /// store was opened or "remember me" last changed.
    other_scope_clean: bool,
}

impl SnapshotStore {
    #[must_use]
    pub fn new(storage: DurableStorage, key: impl Into<String>, remember_me: bool) -> Self {
        Self {
            storage,
            key: key.into(),
            remember_me,
            other_scope_clean: false,
        }
    }

    /// Storage key of the snapshot.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Scope that writes go to: persistent with "remember me", else session.
    #[must_use]
    pub const fn target_scope(&self) -> StorageScope {
        if self.remember_me {
            StorageScope::Persistent
        } else {
            StorageScope::Session
        }
    }

    /// Switch "remember me". The copy in the previous scope is removed so
    /// that reads cannot pick up a stale document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the old copy cannot be removed.
    pub fn set_remember_me(&mut self, remember_me: bool) -> Result<(), StorageError> {
        if self.remember_me == remember_me {
            return Ok(());
        }
        let previous = self.target_scope();
        self.remember_me = remember_me;
        self.storage.scope_mut(previous).remove(&self.key)?;
        self.other_scope_clean = true;
        Ok(())
    }

    /// Load the snapshot, persistent scope first. After the first
    /// [`save`](Self::save) only the target scope holds a copy.
    ///
    /// Unreadable and version-mismatched documents are logged, erased from
    /// their scope, and skipped.
    pub fn load(&mut self) -> Option<Snapshot> {
        for scope in StorageScope::READ_ORDER {
            let raw = match self.storage.scope(scope).get(&self.key) {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) => {
                    warn!(scope = %scope, error = %e, "Failed to read snapshot");
                    continue;
                }
            };

            match decode(&raw) {
                Ok(snapshot) => {
                    debug!(scope = %scope, "Loaded snapshot");
                    return Some(snapshot);
                }
                Err(reason) => {
                    warn!(scope = %scope, reason = %reason, "Discarding stored snapshot");
                    if let Err(e) = self.storage.scope_mut(scope).remove(&self.key) {
                        warn!(scope = %scope, error = %e, "Failed to erase discarded snapshot");
                    }
                }
            }
        }
        None
    }

    /// Write the snapshot to the target scope.
    ///
    /// The first write also removes any copy left in the other scope by an
    /// earlier run with a different "remember me" setting, so a later
    /// [`load`](Self::load) cannot prefer it over the document just written.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if serialization, the write or the removal fails.
    pub fn save(&mut self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let raw = serde_json::to_string(snapshot)?;
        let scope = self.target_scope();
        self.storage.scope_mut(scope).set(&self.key, &raw)?;
        if !self.other_scope_clean {
            self.storage.scope_mut(scope.other()).remove(&self.key)?;
            self.other_scope_clean = true;
        }
        Ok(())
    }

    /// Remove the snapshot from both scopes.
    ///
    /// Both removals are attempted; the first failure is returned.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if either removal fails.
    pub fn erase(&mut self) -> Result<(), StorageError> {
        let session = self.storage.scope_mut(StorageScope::Session).remove(&self.key);
        let persistent = self
            .storage
            .scope_mut(StorageScope::Persistent)
            .remove(&self.key);
        session.and(persistent)
    }

    #[must_use]
    pub const fn storage(&self) -> &DurableStorage {
        &self.storage
    }

    #[must_use]
    pub fn into_storage(self) -> DurableStorage {
        self.storage
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mindoro_core::{Price, ProductId, RequestStatus};
    use serde_json::json;

    use super::*;
    use crate::cart::ProductQuantity;

    const KEY: &str = "my-app-store";

    fn raw(store: &SnapshotStore, scope: StorageScope) -> Option<String> {
        store.storage().scope(scope).get(KEY).unwrap()
    }

    #[test]
    fn test_save_targets_remember_me_scope() {
        let mut store = SnapshotStore::new(DurableStorage::in_memory(), KEY, true);
        store.save(&Snapshot::capture(&ClientState::default())).unwrap();
        assert!(raw(&store, StorageScope::Persistent).is_some());
        assert!(raw(&store, StorageScope::Session).is_none());

        let mut store = SnapshotStore::new(DurableStorage::in_memory(), KEY, false);
        store.save(&Snapshot::capture(&ClientState::default())).unwrap();
        assert!(raw(&store, StorageScope::Persistent).is_none());
        assert!(raw(&store, StorageScope::Session).is_some());
    }

    #[test]
    fn test_session_save_removes_stale_persistent_copy() {
        let mut storage = DurableStorage::in_memory();
        let mut remembered = ClientState::default();
        remembered.catalog.stock_warning = "from last week".to_string();
        storage
            .scope_mut(StorageScope::Persistent)
            .set(KEY, &serde_json::to_string(&Snapshot::capture(&remembered)).unwrap())
            .unwrap();
        let mut store = SnapshotStore::new(storage, KEY, false);

        let mut current = ClientState::default();
        current.catalog.stock_warning = "today".to_string();
        store.save(&Snapshot::capture(&current)).unwrap();

        assert!(raw(&store, StorageScope::Persistent).is_none());
        assert_eq!(store.load().unwrap().catalog.stock_warning, "today");
    }

    #[test]
    fn test_load_roundtrip() {
        let mut state = ClientState::default();
        state.cart.add_or_merge([ProductQuantity::new(
            ProductId::new(1),
            "Horn",
            Price::from_centavos(45_000),
            1,
        )]);
        state.catalog.stock_warning = "Low on horns".to_string();

        let mut store = SnapshotStore::new(DurableStorage::in_memory(), KEY, true);
        store.save(&Snapshot::capture(&state)).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.version, SNAPSHOT_VERSION);
        assert_eq!(loaded.cart, state.cart);
        assert_eq!(loaded.catalog.stock_warning, "Low on horns");
    }

    #[test]
    fn test_version_mismatch_is_discarded() {
        let mut storage = DurableStorage::in_memory();
        storage
            .scope_mut(StorageScope::Persistent)
            .set(KEY, &json!({"version": 99, "cart": []}).to_string())
            .unwrap();
        let mut store = SnapshotStore::new(storage, KEY, true);

        assert!(store.load().is_none());
        assert!(raw(&store, StorageScope::Persistent).is_none());
    }

    #[test]
    fn test_unversioned_and_garbage_are_discarded() {
        assert!(matches!(
            decode(r#"{"auth": {}}"#),
            Err(SnapshotError::VersionMismatch { found: None })
        ));
        assert!(matches!(decode("not json"), Err(SnapshotError::Unreadable(_))));
        assert!(matches!(
            decode(r#"{"version": 1, "cart": "nope"}"#),
            Err(SnapshotError::Unreadable(_))
        ));
    }

    #[test]
    fn test_load_falls_back_to_session_scope() {
        let mut storage = DurableStorage::in_memory();
        storage
            .scope_mut(StorageScope::Persistent)
            .set(KEY, "garbage")
            .unwrap();
        storage
            .scope_mut(StorageScope::Session)
            .set(KEY, &json!({"version": 1}).to_string())
            .unwrap();
        let mut store = SnapshotStore::new(storage, KEY, true);

        assert!(store.load().is_some());
        assert!(raw(&store, StorageScope::Persistent).is_none());
    }

    #[test]
    fn test_erase_clears_both_scopes() {
        let mut storage = DurableStorage::in_memory();
        for scope in StorageScope::READ_ORDER {
            storage.scope_mut(scope).set(KEY, "{}").unwrap();
        }
        let mut store = SnapshotStore::new(storage, KEY, true);
        store.erase().unwrap();
        assert!(raw(&store, StorageScope::Persistent).is_none());
        assert!(raw(&store, StorageScope::Session).is_none());

        // Erasing again is fine
        store.erase().unwrap();
    }

    #[test]
    fn test_switching_remember_me_removes_old_copy() {
        let mut store = SnapshotStore::new(DurableStorage::in_memory(), KEY, true);
        store.save(&Snapshot::capture(&ClientState::default())).unwrap();

        store.set_remember_me(false).unwrap();
        assert_eq!(store.target_scope(), StorageScope::Session);
        assert!(raw(&store, StorageScope::Persistent).is_none());
    }

    #[test]
    fn test_restore_settles_loading_and_skips_identity() {
        let snapshot: Snapshot = serde_json::from_value(json!({
            "version": 1,
            "auth": {"account_type": "Owner", "token": "t", "user_id": "u", "fcm_token": "dev"},
            "pos": {"status": "loading", "current_session_id": "S9"}
        }))
        .unwrap();

        let mut state = ClientState::default();
        snapshot.restore_into(&mut state);

        assert_eq!(state.pos.status, RequestStatus::Idle);
        assert_eq!(state.pos.current_session_id.as_ref().map(|s| s.as_str()), Some("S9"));
        assert_eq!(state.auth.fcm_token.as_deref(), Some("dev"));
        assert!(state.auth.account_type().is_none());
        assert!(!state.auth.is_authenticated());
    }
}
