//! Authentication state and the session manager.
//!
//! `AuthState` is the slice of client state describing who is logged in. The
//! session manager operations (`initialize`, `login`, `logout`, ...) live on
//! [`crate::Store`] in the `session` submodule because they need the
//! persisted snapshot and the token codec.
//!
//! # Invariant
//!
//! `account_type` and `user_id` are present if and only if `token` is present
//! and decoded. The only way to set them is [`AuthState::establish`], which
//! takes all three together.

mod session;
mod token;

pub use token::{DecodeError, JwtPayloadCodec, SessionToken, TokenClaims, TokenCodec};

#[cfg(test)]
pub(crate) use token::unsigned_token;

use serde::{Deserialize, Serialize};

use mindoro_core::{Role, UserId};

/// Who is logged in on this client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthState {
    account_type: Option<Role>,
    token: Option<SessionToken>,
    user_id: Option<UserId>,
    /// Push-notification device token, sent along at login.
    #[serde(default)]
    pub fcm_token: Option<String>,
}

impl AuthState {
    /// Set token, user id and role together.
    pub fn establish(&mut self, token: SessionToken, user_id: UserId, role: Role) {
        self.token = Some(token);
        self.user_id = Some(user_id);
        self.account_type = Some(role);
    }

    /// Clear token, user id and role. The device token is kept.
    pub fn reset(&mut self) {
        self.token = None;
        self.user_id = None;
        self.account_type = None;
    }

    /// True iff a non-empty token is present.
    ///
    /// This is a presence check only: expiry and signature are not
    /// re-validated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.as_ref().is_some_and(|token| !token.is_empty())
    }

    /// Role of the logged-in account.
    #[must_use]
    pub const fn account_type(&self) -> Option<Role> {
        self.account_type
    }

    /// Session token of the logged-in account.
    #[must_use]
    pub const fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    /// Backend id of the logged-in account.
    #[must_use]
    pub const fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// The stored token, unless empty. Role and user id are re-derived from
    /// it on rehydration rather than trusted from a snapshot.
    #[must_use]
    pub(crate) fn persisted_token(&self) -> Option<SessionToken> {
        self.token.clone().filter(|token| !token.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unauthenticated() {
        let state = AuthState::default();
        assert!(!state.is_authenticated());
        assert!(state.account_type().is_none());
        assert!(state.user_id().is_none());
        assert!(state.token().is_none());
    }

    #[test]
    fn test_establish_and_reset_move_together() {
        let mut state = AuthState {
            fcm_token: Some("device-1".to_string()),
            ..AuthState::default()
        };
        state.establish(SessionToken::new("t"), UserId::new("u-1"), Role::Employee);
        assert!(state.is_authenticated());
        assert_eq!(state.account_type(), Some(Role::Employee));
        assert_eq!(state.user_id().map(UserId::as_str), Some("u-1"));

        state.reset();
        assert_eq!(
            state,
            AuthState {
                fcm_token: Some("device-1".to_string()),
                ..AuthState::default()
            }
        );
    }

    #[test]
    fn test_empty_token_is_not_authenticated() {
        let mut state = AuthState::default();
        state.establish(SessionToken::new(""), UserId::new("u"), Role::Customer);
        assert!(!state.is_authenticated());
        assert!(state.persisted_token().is_none());
    }

    #[test]
    fn test_is_authenticated_ignores_expiry() {
        // A token that decodes to long-expired claims is still "present".
        let mut state = AuthState::default();
        state.establish(
            SessionToken::new("header.payload.sig"),
            UserId::new("u"),
            Role::Owner,
        );
        assert!(state.is_authenticated());
    }
}
