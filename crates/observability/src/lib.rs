//! Tracing and logging setup shared by the API server binaries.

pub use self::tracing::{LogFormat, LogOptions};

/// Initialize process-wide tracing with `opts`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(opts: &LogOptions) {
    tracing::init(opts);
}

/// Tracing configuration (filters, layers).
pub mod tracing;
