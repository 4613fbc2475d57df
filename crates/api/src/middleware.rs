//! HTTP middlewares shared by the REST and gateway routers.

use std::any::Any;
use std::sync::Arc;

use axum::{
    BoxError,
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::Instrument;

use fastblog_auth::TokenManager;
use fastblog_core::Errorx;

use crate::app::errors::error_response;
use crate::context::{Identity, RequestId, X_REQUEST_ID};

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenManager>,
}

/// Verify the bearer token and attach the caller's identity to the request.
pub async fn auth_middleware(State(state): State<AuthState>, mut req: Request<Body>, next: Next) -> Response {
    let user_id = match extract_bearer(req.headers()).and_then(|token| {
        state.tokens.parse(token).map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            Errorx::TOKEN_INVALID
        })
    }) {
        Ok(user_id) => user_id,
        Err(err) => return error_response(&err),
    };

    req.extensions_mut().insert(Identity::new(user_id));
    next.run(req).await
}

pub(crate) fn extract_bearer(headers: &HeaderMap) -> Result<&str, Errorx> {
    let header = headers
        .get(header::AUTHORIZATION)
        .ok_or(Errorx::TOKEN_INVALID)?
        .to_str()
        .map_err(|_| Errorx::TOKEN_INVALID)?;

    bearer_token(header).ok_or(Errorx::TOKEN_INVALID)
}

/// The token part of an `Authorization: Bearer <token>` value.
pub(crate) fn bearer_token(value: &str) -> Option<&str> {
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Propagate or assign `X-Request-ID` and run the request inside a span
/// carrying it.
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let id = RequestId::from_header(req.headers().get(X_REQUEST_ID).and_then(|v| v.to_str().ok()));
    let span = tracing::info_span!(
        "request",
        request_id = %id.0,
        method = %req.method(),
        path = %req.uri().path(),
    );

    req.extensions_mut().insert(id.clone());
    let mut resp = next.run(req).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&id.0) {
        resp.headers_mut().insert(X_REQUEST_ID, value);
    }
    resp
}

pub async fn no_cache(req: Request<Body>, next: Next) -> Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, max-age=0, must-revalidate"),
    );
    headers.insert(header::EXPIRES, HeaderValue::from_static("Thu, 01 Jan 1970 00:00:00 GMT"));
    if let Ok(value) = HeaderValue::from_str(&Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()) {
        headers.insert(header::LAST_MODIFIED, value);
    }
    resp
}

/// Answer preflight requests directly; decorate everything else.
pub async fn cors(req: Request<Body>, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        let mut resp = StatusCode::OK.into_response();
        let headers = resp.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, PUT, PATCH, DELETE, OPTIONS"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("authorization, origin, content-type, accept, x-request-id"),
        );
        headers.insert(header::ALLOW, HeaderValue::from_static("HEAD, GET, POST, PUT, PATCH, DELETE, OPTIONS"));
        return resp;
    }

    let mut resp = next.run(req).await;
    resp.headers_mut()
        .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    resp
}

/// Error handler for the timeout layer.
pub async fn handle_timeout(err: BoxError) -> Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!("request timed out");
        return error_response(&Errorx::REQUEST_TIMEOUT);
    }
    tracing::error!(error = %err, "unhandled middleware error");
    error_response(&Errorx::INTERNAL)
}

/// Turn a handler panic into the generic internal-error envelope.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "handler panicked");

    error_response(&Errorx::INTERNAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_requires_scheme_and_value() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("Bearer   abc "), Some("abc"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[test]
    fn missing_header_is_token_invalid() {
        assert_eq!(extract_bearer(&HeaderMap::new()).unwrap_err(), Errorx::TOKEN_INVALID);
    }
}
