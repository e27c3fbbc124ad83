//! Point-of-sale register session state.
//!
//! A cashier fills in the opening form (initial cash, notes) and starts a
//! session; the backend answers with a session id and the id of the first
//! order. Only one start request may be in flight at a time.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use mindoro_core::{OrderId, RequestStatus, SessionId};

use crate::api::{ApiError, ApiResponse, PosOrderApi, SessionApi, StartedSession};
use crate::store::{Mutation, Store};

/// Shown when the backend does not supply its own success message.
pub const SESSION_STARTED: &str = "Session started successfully.";
/// Shown when the backend answers with a failure payload and no message.
pub const SESSION_START_UNKNOWN_FAILURE: &str = "Failed to start session due to an unknown error.";
/// Shown when the backend answers with an error status and no message.
pub const SESSION_START_REJECTED: &str = "Failed to start session.";
/// Shown when no response arrived.
pub const SESSION_START_NETWORK_FAILURE: &str =
    "Failed to start session due to a network or server issue.";

/// Errors from register session actions.
#[derive(Debug, Error)]
pub enum PosError {
    /// A start request is already outstanding.
    #[error("a session start request is already in flight")]
    AlreadyInFlight,

    /// The backend answered with a failure payload.
    #[error("session request rejected: {0}")]
    Rejected(String),

    /// The request failed in transport or with an error status.
    #[error("{message}")]
    Api {
        /// User-facing message recorded in the POS state.
        message: String,
        #[source]
        source: ApiError,
    },
}

impl PosError {
    fn api(source: ApiError, fallback: &str) -> Self {
        let message = source.server_message().unwrap_or(fallback).to_string();
        Self::Api { message, source }
    }

    /// Human-readable message suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::AlreadyInFlight => "A session is already being started, please wait.".to_string(),
            Self::Rejected(message) | Self::Api { message, .. } => message.clone(),
        }
    }
}

/// Editable fields of the opening form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartSessionField {
    InitialCash,
    Notes,
}

impl FromStr for StartSessionField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial_cash" => Ok(Self::InitialCash),
            "notes" => Ok(Self::Notes),
            other => Err(UnknownField(other.to_string())),
        }
    }
}

/// Error returned when parsing an unknown form field name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown start-session field: {0}")]
pub struct UnknownField(pub String);

/// The register opening form, sent as-is to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartSessionForm {
    /// Cash in the drawer at opening, as typed.
    #[serde(default)]
    pub initial_cash: String,
    #[serde(default)]
    pub notes: String,
}

impl StartSessionForm {
    pub fn set(&mut self, field: StartSessionField, value: String) {
        match field {
            StartSessionField::InitialCash => self.initial_cash = value,
            StartSessionField::Notes => self.notes = value,
        }
    }
}

/// Register session slice of the client state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PosState {
    pub start_form: StartSessionForm,
    pub status: RequestStatus,
    pub success_message: String,
    pub error_message: String,
    pub current_session_id: Option<SessionId>,
    pub current_order_id: Option<OrderId>,
    /// Session summaries as listed by the backend.
    pub sessions: Vec<Value>,
    pub session_details: Option<Value>,
}

impl PosState {
    pub(crate) fn begin_start(&mut self) {
        self.status = RequestStatus::Loading;
        self.success_message.clear();
        self.error_message.clear();
    }

    pub(crate) fn finish_started(&mut self, started: StartedSession, message: String) {
        self.status = RequestStatus::Success;
        self.success_message = message;
        self.current_session_id = Some(started.session_id);
        self.current_order_id = Some(started.order_id);
        self.start_form = StartSessionForm::default();
    }

    pub(crate) fn finish_failed(&mut self, message: String) {
        self.status = RequestStatus::Error;
        self.error_message = message;
    }

    /// A request cannot survive a restart; a restored `Loading` becomes `Idle`.
    pub(crate) fn settle_after_restore(&mut self) {
        if self.status.is_loading() {
            self.status = RequestStatus::Idle;
        }
    }
}

/// Settles a start request that is dropped before the backend answers, so
/// the status never stays `Loading`.
struct PendingStart<'a> {
    store: &'a mut Store,
    settled: bool,
}

impl Drop for PendingStart<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Session start was cancelled before a response arrived");
            self.store.commit(Mutation::SessionStartFailed {
                message: SESSION_START_NETWORK_FAILURE.to_string(),
            });
        }
    }
}

// =============================================================================
// Store actions
// =============================================================================

impl Store {
    /// Set one field of the opening form.
    pub fn set_start_field(&mut self, field: StartSessionField, value: impl Into<String>) {
        self.commit(Mutation::SetStartSessionField {
            field,
            value: value.into(),
        });
    }

    /// Start a register session with the current opening form.
    ///
    /// The outcome is recorded in the POS state (`Success` or `Error` with a
    /// message) and also returned. Dropping the future before the backend
    /// answers records the network failure message.
    ///
    /// # Errors
    ///
    /// Returns `PosError::AlreadyInFlight` without touching state if a start
    /// is outstanding; otherwise the failure that was recorded.
    #[instrument(skip_all)]
    pub async fn start_session<A: SessionApi>(&mut self, api: &A) -> Result<StartedSession, PosError> {
        if self.state().pos.status.is_loading() {
            warn!("Refusing to start a session while another start is in flight");
            return Err(PosError::AlreadyInFlight);
        }

        self.commit(Mutation::StartSessionRequested);
        let form = self.state().pos.start_form.clone();
        let token = self.state().auth.token().cloned();

        let mut pending = PendingStart {
            store: self,
            settled: false,
        };
        let result = api.start_session(&form, token.as_ref()).await;
        pending.settled = true;
        pending.store.finish_start(result)
    }

    fn finish_start(
        &mut self,
        result: Result<ApiResponse<StartedSession>, ApiError>,
    ) -> Result<StartedSession, PosError> {
        let error = match result {
            Ok(response) if response.is_success() => {
                let message = response.message().unwrap_or(SESSION_STARTED).to_string();
                if let Some(started) = response.data {
                    info!(session_id = %started.session_id, order_id = %started.order_id, "POS session started");
                    self.commit(Mutation::SessionStarted {
                        started: started.clone(),
                        message,
                    });
                    return Ok(started);
                }
                PosError::Rejected(SESSION_START_UNKNOWN_FAILURE.to_string())
            }
            Ok(response) => PosError::Rejected(
                response
                    .message()
                    .unwrap_or(SESSION_START_UNKNOWN_FAILURE)
                    .to_string(),
            ),
            Err(source) => {
                let fallback = if source.has_response() {
                    SESSION_START_REJECTED
                } else {
                    SESSION_START_NETWORK_FAILURE
                };
                PosError::api(source, fallback)
            }
        };

        error!(error = %error, "Failed to start POS session");
        self.commit(Mutation::SessionStartFailed {
            message: error.user_message(),
        });
        Err(error)
    }

    /// Return the register state to its defaults.
    pub fn reset_pos(&mut self) {
        self.commit(Mutation::ResetPos);
    }

    /// Load the list of register sessions.
    ///
    /// # Errors
    ///
    /// Returns `PosError::Api` if the request fails.
    #[instrument(skip_all)]
    pub async fn fetch_sessions<A: SessionApi>(&mut self, api: &A) -> Result<usize, PosError> {
        let token = self.state().auth.token().cloned();
        let sessions = api
            .fetch_sessions(token.as_ref())
            .await
            .and_then(ApiResponse::into_data)
            .map_err(|e| {
                error!(error = %e, "Error fetching sessions");
                PosError::api(e, "Failed to load sessions.")
            })?;
        let count = sessions.len();
        self.commit(Mutation::SetSessions(sessions));
        Ok(count)
    }

    /// Load the details of one register session.
    ///
    /// # Errors
    ///
    /// Returns `PosError::Api` if the request fails.
    #[instrument(skip_all, fields(session_id = %session_id))]
    pub async fn load_session_details<A: SessionApi>(
        &mut self,
        api: &A,
        session_id: &SessionId,
    ) -> Result<(), PosError> {
        let token = self.state().auth.token().cloned();
        let details = api
            .session_details(session_id, token.as_ref())
            .await
            .and_then(ApiResponse::into_data)
            .map_err(|e| {
                error!(error = %e, "Error fetching session details");
                PosError::api(e, "Failed to load session details.")
            })?;
        self.commit(Mutation::SetSessionDetails(details));
        Ok(())
    }

    /// Open a new order in `session_id` and make it the current order.
    ///
    /// # Errors
    ///
    /// Returns `PosError::Api` if the request fails.
    #[instrument(skip_all, fields(session_id = %session_id))]
    pub async fn add_order<A: PosOrderApi>(
        &mut self,
        api: &A,
        session_id: &SessionId,
    ) -> Result<OrderId, PosError> {
        let token = self.state().auth.token().cloned();
        let order = api
            .create_order(session_id, token.as_ref())
            .await
            .and_then(ApiResponse::into_data)
            .map_err(|e| {
                error!(error = %e, "Error adding order");
                PosError::api(e, "Failed to add order.")
            })?;
        info!(order_id = %order.id, "POS order created");
        self.commit(Mutation::SetCurrentOrder(order.id.clone()));
        Ok(order.id)
    }

    /// Send updated line items or payment details for an order.
    ///
    /// # Errors
    ///
    /// Returns `PosError::Api` if the request fails.
    #[instrument(skip_all, fields(order_id = %order_id))]
    pub async fn update_order<A: PosOrderApi>(
        &self,
        api: &A,
        order_id: &OrderId,
        details: &Value,
    ) -> Result<Value, PosError> {
        api.update_order(order_id, details, self.state().auth.token())
            .await
            .and_then(ApiResponse::into_data)
            .map_err(|e| {
                error!(error = %e, "Error updating order");
                PosError::api(e, "Failed to update order.")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> StartedSession {
        StartedSession {
            session_id: SessionId::new("S1"),
            order_id: OrderId::new("O1"),
        }
    }

    #[test]
    fn test_field_names() {
        assert_eq!("initial_cash".parse(), Ok(StartSessionField::InitialCash));
        assert_eq!("notes".parse(), Ok(StartSessionField::Notes));
        assert!("cash".parse::<StartSessionField>().is_err());
    }

    #[test]
    fn test_form_set() {
        let mut form = StartSessionForm::default();
        form.set(StartSessionField::InitialCash, "1500".to_string());
        form.set(StartSessionField::Notes, "Morning shift".to_string());
        assert_eq!(form.initial_cash, "1500");
        assert_eq!(form.notes, "Morning shift");
    }

    #[test]
    fn test_start_lifecycle() {
        let mut state = PosState {
            error_message: "old".to_string(),
            ..PosState::default()
        };
        state.start_form.initial_cash = "1000".to_string();

        state.begin_start();
        assert!(state.status.is_loading());
        assert!(state.error_message.is_empty());

        state.finish_started(started(), SESSION_STARTED.to_string());
        assert_eq!(state.status, RequestStatus::Success);
        assert_eq!(state.current_session_id, Some(SessionId::new("S1")));
        assert_eq!(state.current_order_id, Some(OrderId::new("O1")));
        assert_eq!(state.start_form, StartSessionForm::default());
    }

    #[test]
    fn test_failure_keeps_form() {
        let mut state = PosState::default();
        state.start_form.notes = "keep me".to_string();
        state.begin_start();
        state.finish_failed("Drawer already open".to_string());
        assert_eq!(state.status, RequestStatus::Error);
        assert_eq!(state.error_message, "Drawer already open");
        assert_eq!(state.start_form.notes, "keep me");
    }

    #[test]
    fn test_restored_loading_settles_to_idle() {
        let mut state = PosState {
            status: RequestStatus::Loading,
            ..PosState::default()
        };
        state.settle_after_restore();
        assert_eq!(state.status, RequestStatus::Idle);

        let mut state = PosState {
            status: RequestStatus::Error,
            ..PosState::default()
        };
        state.settle_after_restore();
        assert_eq!(state.status, RequestStatus::Error);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            PosError::AlreadyInFlight.to_string(),
            "a session start request is already in flight"
        );
        let err = PosError::api(
            ApiError::Failure("Cash drawer locked".to_string()),
            SESSION_START_REJECTED,
        );
        assert_eq!(err.user_message(), "Cash drawer locked");
    }
}
