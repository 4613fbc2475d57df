//! Tracing/logging initialization.
//!
//! `RUST_LOG` wins over the configured level when it is set.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Output encoding for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Console,
}

/// `log` section of the server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LogOptions {
    /// Default filter directive, e.g. `info` or `fastblog=debug,info`.
    pub level: String,
    pub format: LogFormat,
    /// Drop file/line information from log lines.
    pub disable_caller: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
            disable_caller: false,
        }
    }
}

impl LogOptions {
    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(opts: &LogOptions) {
    let with_caller = !opts.disable_caller;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(opts.filter())
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_file(with_caller)
        .with_line_number(with_caller)
        .with_target(false);

    let _ = match opts.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Console => builder.try_init(),
    };
}
