//! Backend connection settings.

use std::time::Duration;

/// Default base URL of the DevTrace runtime backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Default bound on request-style calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`HttpBackend`](crate::HttpBackend).
#[derive(Clone, Debug)]
pub struct BackendConfig {
    /// Base URL of the runtime backend, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout for request-style calls. The trace long-poll
    /// and the live event stream are exempt.
    pub request_timeout: Duration,
}

impl BackendConfig {
    /// Settings pointing at `base_url` with the default timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
