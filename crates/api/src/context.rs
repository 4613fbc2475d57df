use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

pub use fastblog_core::RequestContext;

/// Header carrying the request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Correlation ID for a request, assigned by the request-id middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Use `value` when it is a usable header value, otherwise generate one.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Self(v.to_string()),
            _ => Self::generate(),
        }
    }
}

/// Authenticated identity for a request (set by the auth middleware).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user_id: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into() }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

/// Extractor wrapper; handlers destructure it as `ContextExtractor(ctx)`.
#[derive(Debug, Clone)]
pub struct ContextExtractor(pub RequestContext);

/// Build the request context from what the middlewares left in the
/// request extensions. Never rejects: a missing request ID is generated and
/// a missing identity leaves the context unauthenticated.
#[async_trait]
impl<S> FromRequestParts<S> for ContextExtractor
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .extensions
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(RequestId::generate);

        let mut ctx = RequestContext::new(request_id.0);
        if let Some(identity) = parts.extensions.get::<Identity>() {
            ctx = ctx.with_user_id(identity.user_id());
        }
        Ok(ContextExtractor(ctx))
    }
}
