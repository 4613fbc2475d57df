//! [`Errorx`] ↔ [`tonic::Status`] mapping.
//!
//! The status code carries the error class; the exact reason travels in the
//! `x-error-reason` metadata entry so a gateway can rebuild the envelope.

use tonic::metadata::MetadataValue;
use tonic::{Code, Status};

use fastblog_core::Errorx;

pub const X_ERROR_REASON: &str = "x-error-reason";

pub fn to_status(err: &Errorx) -> Status {
    let code = match err.code() {
        400 if err.reason().starts_with("AlreadyExists") => Code::AlreadyExists,
        400 => Code::InvalidArgument,
        401 => Code::Unauthenticated,
        404 => Code::NotFound,
        _ => Code::Internal,
    };

    let mut status = Status::new(code, err.message());
    if let Ok(reason) = MetadataValue::try_from(err.reason()) {
        status.metadata_mut().insert(X_ERROR_REASON, reason);
    }
    status
}

pub fn from_status(status: &Status) -> Errorx {
    let reason = status
        .metadata()
        .get(X_ERROR_REASON)
        .and_then(|v| v.to_str().ok())
        .filter(|r| !r.is_empty());

    let class = match status.code() {
        Code::InvalidArgument | Code::AlreadyExists | Code::OutOfRange => Errorx::INVALID_ARGUMENT,
        Code::Unauthenticated => Errorx::TOKEN_INVALID,
        Code::NotFound => Errorx::NOT_FOUND,
        Code::Internal => Errorx::INTERNAL,
        _ => return Errorx::INTERNAL,
    };

    match reason {
        Some(reason) => Errorx::from_parts(class.code(), reason, status.message()),
        // Without a reason the status did not come from this service.
        None if class.code() >= 500 => Errorx::INTERNAL,
        None => class.with_message(status.message()),
    }
}
