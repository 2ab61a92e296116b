//! Tracing subscriber setup.
//!
//! Call [`init`] once from the embedding application. Filtering follows the
//! `DEVTRACE_LOG` environment variable (standard `EnvFilter` directives),
//! with an explicit directive string taking precedence.

use tracing_subscriber::EnvFilter;

/// Environment variable consulted for filter directives.
pub const LOG_ENV_VAR: &str = "DEVTRACE_LOG";

/// Initialize the global tracing subscriber.
///
/// `directives` overrides `DEVTRACE_LOG`; when both are absent the filter
/// defaults to `info`. `json` switches to newline-delimited JSON output for
/// log aggregation. Safe to call more than once — subsequent calls are
/// no-ops.
pub fn init(directives: Option<&str>, json: bool) {
    let filter = match directives {
        Some(d) => EnvFilter::new(d),
        None => EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    // Already-initialized is fine; embedders may install their own.
    drop(result);
}
