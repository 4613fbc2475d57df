//! One-way password hashing (bcrypt).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("password does not match")]
    Mismatch,
}

/// Bcrypt hasher with a fixed work factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: bcrypt::DEFAULT_COST }
    }
}

impl PasswordHasher {
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }

    pub fn encrypt(&self, password: &str) -> Result<String, PasswordError> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    /// Compare `password` against a stored `hash`.
    pub fn compare(&self, hash: &str, password: &str) -> Result<(), PasswordError> {
        if bcrypt::verify(password, hash)? {
            Ok(())
        } else {
            Err(PasswordError::Mismatch)
        }
    }
}
