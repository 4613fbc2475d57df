use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use fastblog_core::Errorx;

/// Render an [`Errorx`] as the `{reason, message}` envelope with its status.
pub fn error_response(err: &Errorx) -> axum::response::Response {
    let status = StatusCode::from_u16(err.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    json_error(status, err.reason(), err.message())
}

pub fn json_error(
    status: StatusCode,
    reason: &str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "reason": reason,
            "message": message.into(),
        })),
    )
        .into_response()
}
