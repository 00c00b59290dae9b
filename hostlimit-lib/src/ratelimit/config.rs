use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::builder::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};

/// Default interval between requests to the same host.
/// Keeps a single host below 5000 requests per hour.
pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_millis(720);

/// Pause between two attempts when a server answers with a status of 500 or above
pub const DEFAULT_RETRY_PAUSE: Duration = Duration::from_secs(5);

/// Rate limiting configuration, as read from a config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Minimum interval between two requests to the same host
    #[serde(default = "default_request_interval", with = "humantime_serde")]
    pub request_interval: Duration,

    /// Transport-level timeout of a single request
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Pause before retrying a request that failed with a server error
    #[serde(default = "default_retry_pause", with = "humantime_serde")]
    pub retry_pause: Duration,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            request_interval: default_request_interval(),
            timeout: default_timeout(),
            retry_pause: default_retry_pause(),
            user_agent: default_user_agent(),
        }
    }
}

const fn default_request_interval() -> Duration {
    DEFAULT_REQUEST_INTERVAL
}

const fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

const fn default_retry_pause() -> Duration {
    DEFAULT_RETRY_PAUSE
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl RateLimitConfig {
    /// Create a `RateLimitConfig` from CLI options, using defaults for missing values
    #[must_use]
    pub fn from_options(
        request_interval: Option<Duration>,
        timeout: Option<Duration>,
        retry_pause: Option<Duration>,
    ) -> Self {
        Self {
            request_interval: request_interval.unwrap_or(DEFAULT_REQUEST_INTERVAL),
            timeout: timeout.unwrap_or(DEFAULT_TIMEOUT),
            retry_pause: retry_pause.unwrap_or(DEFAULT_RETRY_PAUSE),
            user_agent: default_user_agent(),
        }
    }
}
