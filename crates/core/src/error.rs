//! Error catalog shared by every layer.
//!
//! An [`Errorx`] carries the HTTP status code, a stable machine-readable
//! `reason` and a human-readable `message`. Clients only ever see the
//! `{reason, message}` envelope built from it.

use std::borrow::Cow;

use serde::Serialize;
use thiserror::Error;

/// Result type used across the service layers.
pub type Result<T, E = Errorx> = core::result::Result<T, E>;

/// Domain error with a stable `reason` taxonomy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("error: code: {code}, reason: {reason}, message: {message}")]
pub struct Errorx {
    code: u16,
    reason: Cow<'static, str>,
    message: Cow<'static, str>,
}

impl Errorx {
    pub const OK: Errorx = Errorx::new(200, "", "Success");
    pub const INTERNAL: Errorx = Errorx::new(500, "InternalError", "Internal server error");
    pub const NOT_FOUND: Errorx = Errorx::new(404, "NotFound", "Resource not found");
    pub const DB_WRITE: Errorx = Errorx::new(500, "InternalError.DBWrite", "Database write error");
    pub const DB_READ: Errorx = Errorx::new(500, "InternalError.DBRead", "Database read error");
    pub const BIND: Errorx = Errorx::new(400, "BindError", "Request parameter binding error");
    pub const INVALID_ARGUMENT: Errorx =
        Errorx::new(400, "InvalidArgument", "Argument verification failed");
    pub const SIGN_TOKEN: Errorx =
        Errorx::new(401, "Unauthenticated.SignToken", "Failed to sign token");
    pub const TOKEN_INVALID: Errorx =
        Errorx::new(401, "Unauthenticated.TokenInvalid", "Invalid token");
    pub const REQUEST_TIMEOUT: Errorx = Errorx::new(408, "RequestTimeout", "Request timed out");

    pub const USERNAME_INVALID: Errorx = Errorx::new(
        400,
        "InvalidArgument.InvalidUsername",
        "Invalid username: Username must consist of letters, digits, and underscores only, and its length must be between 4 and 32 characters.",
    );
    pub const PASSWORD_INVALID: Errorx =
        Errorx::new(400, "InvalidArgument.InvalidPassword", "Password is incorrect");
    pub const USER_ALREADY_EXISTS: Errorx =
        Errorx::new(400, "AlreadyExists.UserAlreadyExists", "User already exists");
    pub const USER_NOT_FOUND: Errorx = Errorx::new(404, "NotFound.UserNotFound", "User not found");

    pub const POST_NOT_FOUND: Errorx = Errorx::new(404, "NotFound.PostNotFound", "Post not found");

    pub const fn new(code: u16, reason: &'static str, message: &'static str) -> Self {
        Self {
            code,
            reason: Cow::Borrowed(reason),
            message: Cow::Borrowed(message),
        }
    }

    /// Rebuild an error from its wire parts (used when a reason arrives over gRPC).
    pub fn from_parts(code: u16, reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            reason: Cow::Owned(reason.into()),
            message: Cow::Owned(message.into()),
        }
    }

    /// Replace the message, keeping code and reason.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Cow::Owned(message.into());
        self
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Classify an arbitrary error.
    ///
    /// Walks the source chain looking for an `Errorx`; anything else becomes
    /// the generic internal error so no foreign text reaches the client.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut current = Some(err);
        while let Some(e) = current {
            if let Some(errx) = e.downcast_ref::<Errorx>() {
                return errx.clone();
            }
            current = e.source();
        }
        Self::INTERNAL
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            reason: self.reason.to_string(),
            message: self.message.to_string(),
        }
    }
}

/// JSON error envelope returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}
