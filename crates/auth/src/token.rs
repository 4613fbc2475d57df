//! HS256 token signing and verification.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::claims::{TokenClaims, TokenValidationError, validate_claims};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),

    #[error("failed to decode token: {0}")]
    Decode(#[source] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),

    #[error("expiration out of range")]
    Expiration,
}

/// Issues and verifies bearer tokens with a shared secret.
///
/// Built once at startup and shared by reference; there is no global key.
#[derive(Clone)]
pub struct TokenManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiration: Duration,
}

impl TokenManager {
    pub fn new(secret: &str, expiration: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiration,
        }
    }

    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    /// Sign a token for `user_id`, returning it with its expiry instant.
    pub fn sign(&self, user_id: &str) -> Result<(String, DateTime<Utc>), TokenError> {
        self.sign_at(user_id, Utc::now())
    }

    pub fn sign_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<(String, DateTime<Utc>), TokenError> {
        let ttl = chrono::Duration::from_std(self.expiration).map_err(|_| TokenError::Expiration)?;
        let expires_at = now + ttl;
        let claims = TokenClaims::new(user_id, now, expires_at);

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Sign)?;
        Ok((token, expires_at))
    }

    /// Verify signature and time window; return the user identifier.
    pub fn parse(&self, token: &str) -> Result<String, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;

        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &validation)
            .map_err(TokenError::Decode)?;
        validate_claims(&data.claims, Utc::now())?;
        Ok(data.claims.user_id)
    }
}
