//! Core types for the Mindoro Auto Parts client.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod lenient;
pub mod price;
pub mod status;

pub use id::*;
pub use price::Price;
pub use status::*;
