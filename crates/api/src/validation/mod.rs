//! Request validators.
//!
//! Each function has the [`crate::pipeline::Validator`] shape and returns an
//! `InvalidArgument` error describing the first problem it finds.

use fastblog_core::{Errorx, RequestContext};

pub mod post;
pub mod user;

pub use post::*;
pub use user::*;

fn invalid(message: &str) -> Errorx {
    Errorx::INVALID_ARGUMENT.with_message(message.to_string())
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// The caller must be authenticated.
pub(crate) fn require_user(ctx: &RequestContext) -> Result<(), Errorx> {
    match ctx.user_id() {
        Some(id) if !id.is_empty() => Ok(()),
        _ => Err(invalid("user ID cannot be empty")),
    }
}

pub(crate) fn validate_page(offset: i64, limit: i64) -> Result<(), Errorx> {
    if offset < 0 {
        return Err(invalid("offset cannot be negative"));
    }
    if limit <= 0 {
        return Err(invalid("limit must be greater than 0"));
    }
    Ok(())
}
