use reqwest::blocking::{Client, Request, Response};
use std::sync::Arc;
use std::time::Duration;

use crate::{RateLimitError, Result};

/// Sends a single request over the network and waits for the response.
///
/// This is the seam below [`RateLimitedClient`](crate::RateLimitedClient):
/// the client decides *when* a request may go out, the transport decides
/// *how*. Timeouts are the transport's business.
pub trait Transport: Send + Sync {
    /// Execute one request, blocking until a response or an error arrives
    ///
    /// # Errors
    ///
    /// Returns the transport's own error on connection, DNS, TLS or timeout
    /// failures.
    fn execute(&self, request: Request) -> reqwest::Result<Response>;
}

impl Transport for Client {
    fn execute(&self, request: Request) -> reqwest::Result<Response> {
        Client::execute(self, request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: Request) -> reqwest::Result<Response> {
        (**self).execute(request)
    }
}

/// Build a blocking `reqwest` client with a request timeout and user agent.
///
/// # Errors
///
/// Returns [`RateLimitError::ClientConfigError`] if the TLS backend cannot
/// be initialized.
pub fn default_transport(timeout: Duration, user_agent: &str) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|source| RateLimitError::ClientConfigError { source })
}
