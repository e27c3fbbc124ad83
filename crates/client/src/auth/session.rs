//! Session manager operations on the store.

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use mindoro_core::{Role, UserId};

use super::{DecodeError, SessionToken, TokenClaims};
use crate::api::{ApiError, AuthApi, LoginRequest, RegistrationForm};
use crate::error::{ClientError, clear_sentry_user, set_sentry_user};
use crate::store::{Mutation, Store};

impl Store {
    /// Re-derive the auth state from the token in the stored snapshot.
    ///
    /// A token that fails to decode leaves the auth state empty. This never
    /// fails: a broken session means "not logged in".
    #[instrument(skip_all)]
    pub fn initialize(&mut self) {
        let token = self
            .snapshots_mut()
            .load()
            .and_then(|snapshot| snapshot.auth.persisted_token());

        let Some(token) = token else {
            debug!("No stored session token");
            return;
        };

        match self.codec().decode(token.expose()) {
            Ok(claims) => {
                if claims.is_expired_at(Utc::now()) {
                    debug!(expires_at = ?claims.expires_at(), "Stored session token has expired");
                }
                self.commit(Mutation::SetAuth {
                    token,
                    user_id: claims.user_id,
                    role: claims.role,
                });
            }
            Err(e) => {
                warn!(error = %e, "Error decoding the stored session token");
                self.commit(Mutation::ResetAuth);
            }
        }
    }

    /// Record a logged-in session.
    pub fn login(&mut self, token: SessionToken, user_id: UserId, role: Role) {
        set_sentry_user(&user_id, Some(role.as_str()));
        info!(user_id = %user_id, role = %role, "Logged in");
        self.commit(Mutation::SetAuth {
            token,
            user_id,
            role,
        });
    }

    /// Decode `token` and record the session it describes.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` if the token cannot be decoded; state is unchanged.
    pub fn login_with_token(&mut self, token: SessionToken) -> Result<TokenClaims, DecodeError> {
        let claims = self.codec().decode(token.expose())?;
        self.login(token, claims.user_id.clone(), claims.role);
        Ok(claims)
    }

    /// Log in against the backend with an identity-provider token.
    ///
    /// `fcm_token`, when given, is recorded first and sent along.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` on transport or HTTP failure,
    /// `ClientError::Rejected` if the backend refuses the login, and
    /// `ClientError::Decode` if the returned token cannot be decoded.
    #[instrument(skip_all)]
    pub async fn login_remote<A: AuthApi>(
        &mut self,
        api: &A,
        id_token: &str,
        fcm_token: Option<&str>,
    ) -> Result<TokenClaims, ClientError> {
        if let Some(fcm_token) = fcm_token {
            self.set_fcm_token(Some(fcm_token.to_string()));
        }
        let fcm_token = self.state().auth.fcm_token.clone().unwrap_or_default();

        let response = api
            .login(&LoginRequest {
                id_token,
                fcm_token: &fcm_token,
            })
            .await?;

        if !response.is_success() {
            let message = response
                .message()
                .unwrap_or("Login was not successful.")
                .to_string();
            warn!(message = %message, "Login rejected");
            return Err(ClientError::Rejected(message));
        }

        let data = response.data.ok_or_else(|| {
            ApiError::Failure("login response carried no token".to_string())
        })?;
        Ok(self.login_with_token(SessionToken::new(data.token))?)
    }

    /// Register a new customer account.
    ///
    /// The recorded device token is sent along when the form has none. The
    /// account is not logged in; that takes a separate login.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` on transport or HTTP failure and
    /// `ClientError::Rejected` if the backend refuses the registration.
    #[instrument(skip_all)]
    pub async fn register_customer<A: AuthApi>(
        &self,
        api: &A,
        form: &RegistrationForm,
    ) -> Result<Value, ClientError> {
        let mut form = form.clone();
        if form.fcm_token.is_empty() {
            form.fcm_token = self.state().auth.fcm_token.clone().unwrap_or_default();
        }

        let response = api.register_customer(&form).await.map_err(|e| {
            error!(error = %e, "Registration failed");
            e
        })?;

        if !response.is_success() {
            let message = response
                .message()
                .unwrap_or("Registration was not successful.")
                .to_string();
            warn!(message = %message, "Registration rejected");
            return Err(ClientError::Rejected(message));
        }

        info!("Customer registered");
        Ok(response.data.unwrap_or(Value::Null))
    }

    /// Clear the session and erase the stored snapshot from both scopes.
    #[instrument(skip_all)]
    pub fn logout(&mut self) {
        self.commit(Mutation::ResetAuth);
        if let Err(e) = self.snapshots_mut().erase() {
            warn!(error = %e, "Failed to erase stored snapshot on logout");
        }
        clear_sentry_user();
        info!("Logged out");
    }

    /// Whether a session token is present. Expiry is not checked.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state().auth.is_authenticated()
    }

    /// Record the push-notification device token.
    pub fn set_fcm_token(&mut self, token: Option<String>) {
        self.commit(Mutation::SetFcmToken(token));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::auth::unsigned_token;
    use crate::storage::{DurableStorage, StorageScope};
    use crate::store::StoreOptions;

    fn store() -> Store {
        Store::new(DurableStorage::in_memory(), StoreOptions::default())
    }

    fn token(role: &str, user_id: &str) -> SessionToken {
        SessionToken::new(unsigned_token(&json!({"role": role, "user_id": user_id})))
    }

    #[test]
    fn test_login_with_token_sets_all_fields() {
        let mut store = store();
        let claims = store.login_with_token(token("Employee", "e-7")).unwrap();
        assert_eq!(claims.role, Role::Employee);

        let auth = &store.state().auth;
        assert!(auth.is_authenticated());
        assert_eq!(auth.account_type(), Some(Role::Employee));
        assert_eq!(auth.user_id().map(UserId::as_str), Some("e-7"));
    }

    #[test]
    fn test_login_with_bad_token_leaves_state() {
        let mut store = store();
        assert!(store.login_with_token(SessionToken::new("garbage")).is_err());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_initialize_rehydrates_from_snapshot() {
        let mut store = store();
        store.login_with_token(token("Owner", "o-1")).unwrap();
        let storage = store.teardown();

        let mut store = Store::new(storage, StoreOptions::default());
        store.initialize();
        assert_eq!(store.state().auth.account_type(), Some(Role::Owner));
        assert_eq!(store.state().auth.user_id().map(UserId::as_str), Some("o-1"));
    }

    #[test]
    fn test_initialize_with_undecodable_token_is_unauthenticated() {
        let mut storage = DurableStorage::in_memory();
        storage
            .scope_mut(StorageScope::Persistent)
            .set(
                "my-app-store",
                &json!({"version": 1, "auth": {"token": "not.a-jwt"}}).to_string(),
            )
            .unwrap();

        let mut store = Store::new(storage, StoreOptions::default());
        store.initialize();
        assert!(!store.is_authenticated());
        assert!(store.state().auth.account_type().is_none());
        assert!(store.state().auth.user_id().is_none());
    }

    #[test]
    fn test_initialize_keeps_expired_session() {
        let mut store = store();
        let expired = unsigned_token(&json!({"role": "Customer", "user_id": "c", "exp": 1}));
        store.login_with_token(SessionToken::new(expired)).unwrap();
        let storage = store.teardown();

        let mut store = Store::new(storage, StoreOptions::default());
        store.initialize();
        assert!(store.is_authenticated());
    }

    #[test]
    fn test_logout_erases_both_scopes() {
        let mut storage = DurableStorage::in_memory();
        storage
            .scope_mut(StorageScope::Session)
            .set("my-app-store", "{}")
            .unwrap();
        let mut store = Store::new(storage, StoreOptions::default());
        store.login_with_token(token("Customer", "c-1")).unwrap();

        store.logout();
        assert!(!store.is_authenticated());
        for scope in StorageScope::READ_ORDER {
            assert!(store.storage().scope(scope).get("my-app-store").unwrap().is_none());
        }

        store.initialize();
        assert!(!store.is_authenticated());
        assert!(store.state().auth.account_type().is_none());
    }

    #[test]
    fn test_fcm_token_survives_logout() {
        let mut store = store();
        store.set_fcm_token(Some("device-abc".to_string()));
        store.login_with_token(token("Customer", "c-1")).unwrap();
        store.logout();
        assert_eq!(store.state().auth.fcm_token.as_deref(), Some("device-abc"));
    }
}
