//! Command implementations.
//!
//! Every command opens the store from the data directory, hydrates it, acts,
//! and writes a final snapshot on close.

pub mod auth;
pub mod cart;
pub mod navigate;
pub mod pos;
pub mod products;

use mindoro_client::api::ApiClient;
use mindoro_client::storage::DurableStorage;
use mindoro_client::{ClientConfig, ClientError, Store, StoreOptions};

/// Store and API client shared by the commands.
pub struct Context {
    pub store: Store,
    pub api: ApiClient,
}

impl Context {
    /// Open the store under the configured data directory.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` if the HTTP client cannot be built.
    pub fn open(config: ClientConfig) -> Result<Self, ClientError> {
        let api = ApiClient::new(&config)?;
        let storage = DurableStorage::on_disk(config.data_dir.clone());
        let mut store = Store::new(storage, StoreOptions::from(&config));
        store.hydrate();
        tracing::debug!(data_dir = %config.data_dir.display(), "Store hydrated");
        Ok(Self { store, api })
    }

    /// Write the final snapshot.
    pub fn close(self) {
        let _storage = self.store.teardown();
    }
}
