use thiserror::Error;
use url::Url;

use crate::ratelimit::HostKey;

/// Errors that can occur while dispatching a rate limited request
#[derive(Error, Debug)]
pub enum RateLimitError {
    /// The request URL does not name a host, so there is nothing to
    /// rate limit against. No network call was attempted.
    #[error("Invalid request: URL {url} has no host")]
    InvalidRequest {
        /// The offending request URL
        url: Url,
    },

    /// The underlying transport failed (DNS, connection, timeout, TLS, ...).
    /// The transport error is passed through untouched as the source.
    #[error("Network error for host {host}: {source}")]
    NetworkError {
        /// The host the request was sent to
        host: HostKey,
        /// The underlying network error
        #[source]
        source: reqwest::Error,
    },

    /// Error creating or configuring the default HTTP transport
    #[error("Failed to configure HTTP transport: {source}")]
    ClientConfigError {
        /// Underlying error
        #[source]
        source: reqwest::Error,
    },
}

impl RateLimitError {
    /// The transport error behind this failure, if any
    #[must_use]
    pub const fn transport_error(&self) -> Option<&reqwest::Error> {
        match self {
            Self::NetworkError { source, .. } => Some(source),
            Self::InvalidRequest { .. } | Self::ClientConfigError { .. } => None,
        }
    }
}
