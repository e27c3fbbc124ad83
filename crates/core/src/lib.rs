//! Mindoro Auto Parts Core - Shared types library.
//!
//! This crate provides common types used across all client components:
//! - `client` - State container, route guard and REST collaborators
//! - `cli` - Terminal harness driving the client core
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no storage,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, roles and request statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
