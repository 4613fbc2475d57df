//! Generic bind → validate → invoke → respond sequence.
//!
//! Every HTTP handler funnels through [`handle_request`], which writes
//! exactly one response: the bind error, the first validation error, the
//! handler's error, or the handler's value as JSON.

use std::future::Future;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Json, Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use fastblog_core::{Errorx, RequestContext};

use crate::app::errors::error_response;

/// Check over a bound request; the first failure wins.
pub type Validator<T> = fn(&RequestContext, &T) -> Result<(), Errorx>;

pub fn bind_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Errorx> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| Errorx::BIND.with_message(rejection.body_text()))
}

pub fn bind_query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, Errorx> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| Errorx::BIND.with_message(rejection.body_text()))
}

pub fn bind_path<T>(path: Result<Path<T>, PathRejection>) -> Result<T, Errorx> {
    path.map(|Path(value)| value)
        .map_err(|rejection| Errorx::BIND.with_message(rejection.body_text()))
}

/// Run `validators` in order, stopping at the first failure.
pub fn validate<T>(ctx: &RequestContext, request: &T, validators: &[Validator<T>]) -> Result<(), Errorx> {
    validators.iter().try_for_each(|validate| validate(ctx, request))
}

pub fn read_request<T>(
    ctx: &RequestContext,
    bound: Result<T, Errorx>,
    validators: &[Validator<T>],
) -> Result<T, Errorx> {
    let request = bound?;
    validate(ctx, &request, validators)?;
    Ok(request)
}

pub async fn handle_request<T, R, H, Fut>(
    ctx: RequestContext,
    bound: Result<T, Errorx>,
    validators: &[Validator<T>],
    handler: H,
) -> Response
where
    R: Serialize,
    H: FnOnce(RequestContext, T) -> Fut,
    Fut: Future<Output = Result<R, Errorx>>,
{
    let request = match read_request(&ctx, bound, validators) {
        Ok(request) => request,
        Err(err) => return write_response::<R>(&ctx, Err(err)),
    };

    let result = handler(ctx.clone(), request).await;
    write_response(&ctx, result)
}

pub fn write_response<R: Serialize>(ctx: &RequestContext, result: Result<R, Errorx>) -> Response {
    match result {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(err) => {
            if err.code() >= 500 {
                tracing::error!(request_id = ctx.request_id(), reason = err.reason(), "request failed");
            } else {
                tracing::debug!(request_id = ctx.request_id(), reason = err.reason(), "request rejected");
            }
            error_response(&err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::body::to_bytes;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Echo {
        name: String,
    }

    #[derive(Debug, Serialize)]
    struct Reply {
        greeting: String,
    }

    fn name_not_empty(_: &RequestContext, rq: &Echo) -> Result<(), Errorx> {
        if rq.name.is_empty() {
            return Err(Errorx::INVALID_ARGUMENT.with_message("name cannot be empty"));
        }
        Ok(())
    }

    fn name_short(_: &RequestContext, rq: &Echo) -> Result<(), Errorx> {
        if rq.name.len() > 8 {
            return Err(Errorx::INVALID_ARGUMENT.with_message("name too long"));
        }
        Ok(())
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn run(bound: Result<Echo, Errorx>, calls: Arc<AtomicUsize>, fail: Option<Errorx>) -> Response {
        let ctx = RequestContext::new("test");
        handle_request(ctx, bound, &[name_not_empty, name_short], move |_ctx, rq: Echo| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            match fail {
                Some(err) => Err(err),
                None => Ok(Reply { greeting: format!("hi {}", rq.name) }),
            }
        })
        .await
    }

    #[tokio::test]
    async fn success_writes_value_as_json() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resp = run(Ok(Echo { name: "ann".into() }), calls.clone(), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["greeting"], "hi ann");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bind_failure_skips_validation_and_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resp = run(Err(Errorx::BIND.with_message("bad json")), calls.clone(), None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["reason"], "BindError");
        assert_eq!(body["message"], "bad json");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn first_failing_validator_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resp = run(Ok(Echo { name: String::new() }), calls.clone(), None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["reason"], "InvalidArgument");
        assert_eq!(body["message"], "name cannot be empty");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn handler_error_keeps_its_domain_code() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resp = run(Ok(Echo { name: "ann".into() }), calls.clone(), Some(Errorx::USER_NOT_FOUND)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["reason"], "NotFound.UserNotFound");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn internal_errors_map_to_500() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resp = run(Ok(Echo { name: "ann".into() }), calls, Some(Errorx::DB_READ)).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await["reason"], "InternalError.DBRead");
    }
}
