use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claim key holding the authenticated user's identifier.
pub const USER_ID_CLAIM: &str = "x-user-id";

/// JWT claims issued by the API server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Identifier of the authenticated user (`user-xxxxxx`).
    #[serde(rename = "x-user-id")]
    pub user_id: String,

    /// Issued-at (unix seconds).
    pub iat: i64,

    /// Not-before (unix seconds).
    pub nbf: i64,

    /// Expiration (unix seconds).
    pub exp: i64,
}

impl TokenClaims {
    pub fn new(user_id: impl Into<String>, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            iat: issued_at.timestamp(),
            nbf: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("token carries no user identity")]
    MissingIdentity,
}

/// Deterministically validate decoded claims against `now`.
///
/// Signature verification happens before this, in [`crate::TokenManager`].
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.user_id.trim().is_empty() {
        return Err(TokenValidationError::MissingIdentity);
    }
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    let now = now.timestamp();
    if now < claims.nbf {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
