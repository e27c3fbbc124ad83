//! Mindoro Auto Parts client library.
//!
//! The browser-side core of the storefront, point-of-sale and inventory
//! application: an explicitly constructed state container persisted to
//! durable client storage, the auth session manager, the role-based route
//! guard, and thin wrappers over the backend REST API.
//!
//! # Lifecycle
//!
//! ```rust,ignore
//! use mindoro_client::{Store, StoreOptions, storage::DurableStorage};
//!
//! let mut store = Store::new(DurableStorage::in_memory(), StoreOptions::default());
//! store.hydrate();
//! store.add_to_cart(item);
//! let storage = store.teardown();
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod pos;
pub mod router;
pub mod snapshot;
pub mod storage;
pub mod store;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use store::{ClientState, Mutation, Store, StoreOptions};
