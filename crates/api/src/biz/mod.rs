//! Business services: orchestration on top of the store façade.

use std::sync::Arc;

use fastblog_auth::{PasswordHasher, TokenManager};
use fastblog_core::{Errorx, RequestContext};
use fastblog_store::Store;

pub mod conversion;
pub mod post;
pub mod user;

pub use post::PostBiz;
pub use user::UserBiz;

/// Upper bound on concurrent per-user lookups while listing users.
pub const MAX_FAN_OUT_CONCURRENCY: usize = 1000;

/// Entry point for every service; cheap to clone.
#[derive(Clone)]
pub struct Biz {
    store: Store,
    tokens: Arc<TokenManager>,
    hasher: PasswordHasher,
}

impl Biz {
    pub fn new(store: Store, tokens: Arc<TokenManager>) -> Self {
        Self {
            store,
            tokens,
            hasher: PasswordHasher::default(),
        }
    }

    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn user(&self) -> UserBiz<'_> {
        UserBiz::new(&self.store, &self.tokens, self.hasher)
    }

    pub fn post(&self) -> PostBiz<'_> {
        PostBiz::new(&self.store)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}

/// The caller's own user ID.
///
/// Self-service operations accept an explicit ID from the path or body; one
/// that names somebody else is reported as not found.
pub(crate) fn caller_id(ctx: &RequestContext, requested: &str) -> Result<String, Errorx> {
    let caller = ctx.user_id().ok_or(Errorx::TOKEN_INVALID)?;
    if !requested.is_empty() && requested != caller {
        return Err(Errorx::USER_NOT_FOUND);
    }
    Ok(caller.to_string())
}
