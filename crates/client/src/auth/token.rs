//! Session tokens and claim decoding.
//!
//! The backend issues JWTs. The client only reads the payload segment to
//! learn the role and user id; the signature is the backend's business and
//! is not verified here.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeZone, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use mindoro_core::lenient::deserialize_string;
use mindoro_core::{Role, UserId};

/// Errors that can occur when decoding a session token.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The token is not three dot-separated segments.
    #[error("token is not a well-formed JWT")]
    Malformed,

    /// The payload segment is not valid base64url.
    #[error("token payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The payload is not the expected JSON claims object.
    #[error("token claims are invalid: {0}")]
    Claims(#[from] serde_json::Error),

    /// A required claim is empty.
    #[error("token claim '{0}' is empty")]
    EmptyClaim(&'static str),
}

/// An opaque session token.
///
/// Wraps the raw string in a `SecretString` so it never shows up in `Debug`
/// output or tracing fields.
#[derive(Clone)]
pub struct SessionToken(SecretString);

impl SessionToken {
    /// Wrap a raw token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// The raw token, for sending in an `Authorization` header or decoding.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Whether the token is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

impl PartialEq for SessionToken {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for SessionToken {}

impl From<&str> for SessionToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for SessionToken {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}

impl Serialize for SessionToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}

impl<'de> Deserialize<'de> for SessionToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// Claims carried in the token payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    /// Account role.
    pub role: Role,
    /// Backend user id. Numeric ids are accepted and kept as text.
    #[serde(deserialize_with = "deserialize_user_id")]
    pub user_id: UserId,
    /// Expiry as seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Expiry as a timestamp, if the token carries one.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single())
    }

    /// Whether the token has expired at `now`. Tokens without `exp` never expire.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|at| at <= now)
    }
}

fn deserialize_user_id<'de, D>(deserializer: D) -> Result<UserId, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_string(deserializer).map(UserId::new)
}

/// Decodes session tokens into claims.
pub trait TokenCodec: Send + Sync {
    /// Decode `token` into its claims.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` if the token cannot be decoded.
    fn decode(&self, token: &str) -> Result<TokenClaims, DecodeError>;
}

/// Reads the claims from a JWT payload without checking the signature.
#[derive(Debug, Clone, Copy, Default)]
pub struct JwtPayloadCodec;

impl TokenCodec for JwtPayloadCodec {
    fn decode(&self, token: &str) -> Result<TokenClaims, DecodeError> {
        let mut segments = token.trim().split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(DecodeError::Malformed);
        };
        if payload.is_empty() {
            return Err(DecodeError::Malformed);
        }

        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        let claims: TokenClaims = serde_json::from_slice(&bytes)?;

        if claims.user_id.as_str().is_empty() {
            return Err(DecodeError::EmptyClaim("user_id"));
        }
        Ok(claims)
    }
}

/// Build an unsigned token carrying `claims`. Test helper.
#[cfg(test)]
pub(crate) fn unsigned_token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decode_valid_token() {
        let token = unsigned_token(&json!({"role": "Owner", "user_id": "u-1", "exp": 1_900_000_000}));
        let claims = JwtPayloadCodec.decode(&token).unwrap();
        assert_eq!(claims.role, Role::Owner);
        assert_eq!(claims.user_id.as_str(), "u-1");
        assert_eq!(claims.exp, Some(1_900_000_000));
    }

    #[test]
    fn test_decode_numeric_user_id() {
        let token = unsigned_token(&json!({"role": "Customer", "user_id": 17}));
        let claims = JwtPayloadCodec.decode(&token).unwrap();
        assert_eq!(claims.user_id.as_str(), "17");
        assert!(claims.exp.is_none());
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(
            JwtPayloadCodec.decode("not-a-jwt"),
            Err(DecodeError::Malformed)
        ));
        assert!(matches!(
            JwtPayloadCodec.decode("a..c"),
            Err(DecodeError::Malformed)
        ));
        assert!(matches!(
            JwtPayloadCodec.decode("a.b.c.d"),
            Err(DecodeError::Malformed)
        ));
    }

    #[test]
    fn test_decode_bad_base64_and_json() {
        assert!(matches!(
            JwtPayloadCodec.decode("h.!!!.s"),
            Err(DecodeError::Base64(_))
        ));
        let not_json = format!("h.{}.s", URL_SAFE_NO_PAD.encode("hello"));
        assert!(matches!(
            JwtPayloadCodec.decode(&not_json),
            Err(DecodeError::Claims(_))
        ));
    }

    #[test]
    fn test_decode_unknown_role_fails() {
        let token = unsigned_token(&json!({"role": "Admin", "user_id": "u-1"}));
        assert!(matches!(
            JwtPayloadCodec.decode(&token),
            Err(DecodeError::Claims(_))
        ));
    }

    #[test]
    fn test_decode_empty_user_id_fails() {
        let token = unsigned_token(&json!({"role": "Owner", "user_id": ""}));
        assert!(matches!(
            JwtPayloadCodec.decode(&token),
            Err(DecodeError::EmptyClaim("user_id"))
        ));
    }

    #[test]
    fn test_expiry() {
        let claims = TokenClaims {
            role: Role::Employee,
            user_id: UserId::new("u"),
            exp: Some(1_000),
        };
        let before = Utc.timestamp_opt(999, 0).single().unwrap();
        let after = Utc.timestamp_opt(1_000, 0).single().unwrap();
        assert!(!claims.is_expired_at(before));
        assert!(claims.is_expired_at(after));

        let forever = TokenClaims { exp: None, ..claims };
        assert!(!forever.is_expired_at(after));
    }

    #[test]
    fn test_session_token_debug_is_redacted() {
        let token = SessionToken::new("eyJhbGciOi.secret.sig");
        let debug = format!("{token:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret"));
        assert_eq!(serde_json::to_string(&token).unwrap(), "\"eyJhbGciOi.secret.sig\"");
    }
}
