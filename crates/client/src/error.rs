//! Unified error handling with Sentry integration.
//!
//! Each concern has its own error enum; `ClientError` aggregates them for
//! callers that drive several concerns at once (the CLI, integration tests).

use thiserror::Error;

use crate::api::ApiError;
use crate::auth::DecodeError;
use crate::config::ConfigError;
use crate::pos::PosError;
use crate::storage::StorageError;

/// Application-level error type for the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Durable storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// REST API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Session token could not be decoded.
    #[error("Token error: {0}")]
    Decode(#[from] DecodeError),

    /// POS session action failed.
    #[error("POS error: {0}")]
    Pos(#[from] PosError),

    /// The backend answered with a failure payload.
    #[error("Rejected: {0}")]
    Rejected(String),
}

impl ClientError {
    /// Human-readable message suitable for showing to the user.
    ///
    /// Internal details (transport errors, parse errors) are not exposed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(_) => "The application is not configured correctly.".to_string(),
            Self::Storage(_) => "Could not save your session on this device.".to_string(),
            Self::Api(err) => err
                .server_message()
                .map_or_else(|| "Network or server issue, please try again.".to_string(), str::to_string),
            Self::Decode(_) => "Your session is invalid, please log in again.".to_string(),
            Self::Pos(err) => err.user_message(),
            Self::Rejected(message) => message.clone(),
        }
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, role: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
        if let Some(role) = role {
            scope.set_tag("role", role);
        }
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
        scope.remove_tag("role");
    });
}

/// Record a breadcrumb on the current Sentry scope.
///
/// Each `(key, value)` pair becomes a string field of the breadcrumb.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(category.to_owned()),
        message: Some(message.to_owned()),
        data: data
            .iter()
            .map(|(key, value)| ((*key).to_owned(), serde_json::Value::from(*value)))
            .collect(),
        ..Default::default()
    });
}
