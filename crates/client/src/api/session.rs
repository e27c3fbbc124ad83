//! Cash-register session endpoints.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use mindoro_core::lenient::deserialize_string;
use mindoro_core::{OrderId, SessionId};

use super::{ApiClient, ApiError, ApiResponse};
use crate::auth::SessionToken;
use crate::pos::StartSessionForm;

/// Identifiers returned when a register session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartedSession {
    #[serde(deserialize_with = "deserialize_session_id")]
    pub session_id: SessionId,
    /// The order opened together with the session.
    #[serde(deserialize_with = "deserialize_order_id")]
    pub order_id: OrderId,
}

fn deserialize_session_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SessionId, D::Error> {
    deserialize_string(deserializer).map(SessionId::new)
}

fn deserialize_order_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OrderId, D::Error> {
    deserialize_string(deserializer).map(OrderId::new)
}

/// Cash-register sessions.
#[allow(async_fn_in_trait)]
pub trait SessionApi {
    /// Open a register session with the given opening data.
    async fn start_session(
        &self,
        form: &StartSessionForm,
        token: Option<&SessionToken>,
    ) -> Result<ApiResponse<StartedSession>, ApiError>;

    /// List register sessions.
    async fn fetch_sessions(
        &self,
        token: Option<&SessionToken>,
    ) -> Result<ApiResponse<Vec<Value>>, ApiError>;

    /// Details (orders, totals) of one register session.
    async fn session_details(
        &self,
        session_id: &SessionId,
        token: Option<&SessionToken>,
    ) -> Result<ApiResponse<Value>, ApiError>;
}

impl SessionApi for ApiClient {
    async fn start_session(
        &self,
        form: &StartSessionForm,
        token: Option<&SessionToken>,
    ) -> Result<ApiResponse<StartedSession>, ApiError> {
        self.post::<_, ApiResponse<Value>>("/session/startSession", form, token)
            .await?
            .decode()
    }

    async fn fetch_sessions(
        &self,
        token: Option<&SessionToken>,
    ) -> Result<ApiResponse<Vec<Value>>, ApiError> {
        self.get::<ApiResponse<Value>>("/session/fetchSessions", token)
            .await?
            .decode()
    }

    async fn session_details(
        &self,
        session_id: &SessionId,
        token: Option<&SessionToken>,
    ) -> Result<ApiResponse<Value>, ApiError> {
        let url = self.url_with_id("/session/getSessionDetails", session_id.as_str())?;
        self.get_at(url, token).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_failure_envelope_with_placeholder_data_keeps_message() {
        let raw: ApiResponse<Value> = serde_json::from_value(
            json!({"status": "error", "message": "Drawer locked", "data": {}}),
        )
        .unwrap();

        let response: ApiResponse<StartedSession> = raw.decode().unwrap();

        assert!(!response.is_success());
        assert_eq!(response.message(), Some("Drawer locked"));
    }

    #[test]
    fn test_started_session_accepts_numeric_ids() {
        let started: StartedSession =
            serde_json::from_value(json!({"session_id": 12, "order_id": "ORD-7"})).unwrap();
        assert_eq!(started.session_id.as_str(), "12");
        assert_eq!(started.order_id.as_str(), "ORD-7");
    }
}
