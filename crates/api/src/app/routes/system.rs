use axum::{Json, http::StatusCode, response::Response};
use serde_json::{Value, json};

use crate::app::errors::json_error;

pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, "NotFound", "Page not found")
}
