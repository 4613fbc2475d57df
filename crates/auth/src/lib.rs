//! `fastblog-auth`: signed tokens and password hashes.
//!
//! Decoupled from HTTP and storage; callers pass the verified identity on.

pub mod claims;
pub mod password;
pub mod token;

pub use claims::{TokenClaims, TokenValidationError, validate_claims};
pub use password::{PasswordError, PasswordHasher};
pub use token::{TokenError, TokenManager};
