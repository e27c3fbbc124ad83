//! REST API collaborators.
//!
//! # Architecture
//!
//! - [`ApiClient`] wraps `reqwest` with the backend base URL, bearer auth and
//!   response diagnostics
//! - Each backend area is a trait (`AuthApi`, `SessionApi`, ...) implemented
//!   by `ApiClient`; store actions take the trait so tests can substitute
//!   in-process fakes
//! - Product lists are cached in memory via `moka` (5 minute TTL)
//!
//! Every endpoint answers with the same JSON envelope:
//!
//! ```json
//! { "status": "success", "message": "...", "data": { ... } }
//! ```

mod auth;
mod client;
mod orders;
mod pos;
mod products;
mod session;

pub use auth::{AuthApi, DEFAULT_PROVINCE, LoginData, LoginRequest, RegistrationForm};
pub use client::ApiClient;
pub use orders::{CheckoutApi, CheckoutLine, CheckoutRequest};
pub use pos::{CreatedOrder, PosOrderApi};
pub use products::ProductApi;
pub use session::{SessionApi, StartedSession};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status code.
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("(no message)"))]
    Status {
        /// Response status code.
        status: StatusCode,
        /// `message` field of the error body, if the body had one.
        message: Option<String>,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The envelope reported failure or carried no data.
    #[error("Request failed: {0}")]
    Failure(String),
}

impl ApiError {
    /// The message the backend supplied, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status {
                message: Some(message),
                ..
            }
            | Self::Failure(message) => Some(message.as_str()),
            _ => None,
        }
    }

    /// Whether the backend produced a response at all (as opposed to a
    /// transport failure). A body that does not parse still counts.
    #[must_use]
    pub const fn has_response(&self) -> bool {
        matches!(self, Self::Status { .. } | Self::Failure(_) | Self::Parse(_))
    }
}

/// The backend's response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// `"success"` on success; anything else is a failure.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// A successful envelope carrying `data`.
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: None,
            data: Some(data),
        }
    }

    /// A failure envelope carrying `message`.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
            data: None,
        }
    }

    /// Whether the backend reported success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }

    /// The non-empty server message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.trim().is_empty())
    }

    /// Unwrap the data of a successful envelope.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Failure` if the envelope reports failure or has no data.
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.is_success() {
            let message = self
                .message()
                .unwrap_or("request was not successful")
                .to_string();
            return Err(ApiError::Failure(message));
        }
        self.data
            .ok_or_else(|| ApiError::Failure("response carried no data".to_string()))
    }
}

impl ApiResponse<Value> {
    /// Decode `data` into `T`, but only for a successful envelope.
    ///
    /// Failure envelopes often carry placeholder data (`{}`, `[]`) that does
    /// not match the success shape; their data is dropped so the status and
    /// message still reach the caller.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Parse` if a successful envelope's data does not
    /// match `T`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<ApiResponse<T>, ApiError> {
        let data = match self.data {
            Some(data) if self.status.eq_ignore_ascii_case("success") && !data.is_null() => {
                Some(serde_json::from_value(data)?)
            }
            _ => None,
        };
        Ok(ApiResponse {
            status: self.status,
            message: self.message,
            data,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    #[test]
    fn test_envelope_success() {
        let response: ApiResponse<Value> =
            serde_json::from_value(json!({"status": "success", "data": {"x": 1}})).unwrap();
        assert!(response.is_success());
        assert_eq!(response.into_data().unwrap(), json!({"x": 1}));
    }

    #[test]
    fn test_envelope_failure_keeps_message() {
        let response: ApiResponse<Value> =
            serde_json::from_value(json!({"status": "error", "message": "Drawer already open"}))
                .unwrap();
        assert!(!response.is_success());
        let err = response.into_data().unwrap_err();
        assert_eq!(err.server_message(), Some("Drawer already open"));
    }

    #[test]
    fn test_envelope_success_without_data() {
        let response: ApiResponse<Value> =
            serde_json::from_value(json!({"status": "success", "message": ""})).unwrap();
        assert!(response.message().is_none());
        assert!(matches!(response.into_data(), Err(ApiError::Failure(_))));
    }

    #[test]
    fn test_decode_drops_data_of_failure_envelope() {
        let raw: ApiResponse<Value> = serde_json::from_value(
            json!({"status": "error", "message": "Drawer locked", "data": {}}),
        )
        .unwrap();

        let response: ApiResponse<Vec<String>> = raw.decode().unwrap();

        assert!(!response.is_success());
        assert_eq!(response.message(), Some("Drawer locked"));
        assert!(response.data.is_none());
    }

    #[test]
    fn test_decode_success_data() {
        let raw: ApiResponse<Value> =
            serde_json::from_value(json!({"status": "success", "data": ["a", "b"]})).unwrap();
        let response: ApiResponse<Vec<String>> = raw.decode().unwrap();
        assert_eq!(response.data, Some(vec!["a".to_string(), "b".to_string()]));

        let raw: ApiResponse<Value> =
            serde_json::from_value(json!({"status": "success", "data": {"x": 1}})).unwrap();
        let err = raw.decode::<Vec<String>>().unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
        assert!(err.has_response());
    }

    #[test]
    fn test_status_error_display() {
        let err = ApiError::Status {
            status: StatusCode::CONFLICT,
            message: Some("Session already started".to_string()),
        };
        assert_eq!(err.to_string(), "HTTP 409 Conflict: Session already started");
        assert!(err.has_response());

        let err = ApiError::Status {
            status: StatusCode::BAD_GATEWAY,
            message: None,
        };
        assert_eq!(err.to_string(), "HTTP 502 Bad Gateway: (no message)");
        assert!(err.server_message().is_none());
    }
}
