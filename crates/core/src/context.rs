//! Request-scoped context threaded through the pipeline, services and store.

use std::sync::Arc;

use sqlx::{Any, Transaction};
use tokio::sync::Mutex;

/// Shared handle to the transaction owned by the current request.
pub type TxHandle = Arc<Mutex<Transaction<'static, Any>>>;

/// Per-request values: correlation ID, authenticated identity, and the
/// active transaction scope if one is open.
///
/// An absent identity means the request is unauthenticated; an absent
/// transaction means store calls run directly against the pool.
#[derive(Clone, Default)]
pub struct RequestContext {
    request_id: String,
    user_id: Option<String>,
    tx: Option<TxHandle>,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Self::default()
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Derive a context bound to `tx`.
    pub fn with_tx(&self, tx: TxHandle) -> Self {
        Self {
            tx: Some(tx),
            ..self.clone()
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn tx(&self) -> Option<&TxHandle> {
        self.tx.as_ref()
    }
}

impl core::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("user_id", &self.user_id)
            .field("in_tx", &self.tx.is_some())
            .finish()
    }
}
