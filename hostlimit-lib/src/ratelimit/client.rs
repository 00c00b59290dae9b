use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::{debug, trace, warn};
use reqwest::blocking::{Client, Request, Response};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;
use std::time::Duration;

use crate::Result;
use crate::ratelimit::{DEFAULT_RETRY_PAUSE, HostKey, HostLimiter, RateLimitError};
use crate::retry::RetryExt;
use crate::transport::Transport;

/// Upper bound of attempts for one request when the server keeps answering
/// with a status of 500 or above.
pub const MAX_ATTEMPTS: usize = 3;

/// A blocking HTTP client that spaces out requests per destination host.
///
/// Every host gets its own [`HostLimiter`], created lazily on the first
/// request to that host. Requests to the same host are serialized and at
/// least [`min_interval`](Self::min_interval) apart; requests to different
/// hosts don't wait for each other.
///
/// Responses with a server error status are retried up to
/// [`MAX_ATTEMPTS`] times in total, pausing in between. The last response
/// is returned as-is, even if it is still a server error.
///
/// The client is cheap to clone; clones share their hosts and settings.
///
/// # Examples
///
/// ```no_run
/// use hostlimit_lib::{RateLimitedClient, default_transport};
/// use reqwest::{Method, blocking::Request};
/// use std::time::Duration;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = default_transport(Duration::from_secs(30), "hostlimit")?;
/// let client = RateLimitedClient::new(transport, Duration::from_millis(200));
///
/// let request = Request::new(Method::GET, "https://example.com".parse()?);
/// let response = client.send(request)?;
/// assert!(response.status().is_success());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RateLimitedClient<T = Client> {
    /// Sends requests once a host's turn has come
    transport: Arc<T>,

    /// Map of hostname to limiter, created on-demand
    hosts: Arc<DashMap<HostKey, Arc<HostLimiter>>>,

    /// Minimum interval between two dispatches to the same host
    min_interval: Arc<RwLock<Duration>>,

    /// Pause between attempts after a server error
    retry_pause: Duration,
}

impl<T> Clone for RateLimitedClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            hosts: Arc::clone(&self.hosts),
            min_interval: Arc::clone(&self.min_interval),
            retry_pause: self.retry_pause,
        }
    }
}

impl<T: Transport> RateLimitedClient<T> {
    /// Create a client without any host history.
    ///
    /// The transport is expected to carry its own request timeout;
    /// the client never puts a deadline on the network call itself.
    #[must_use]
    pub fn new(transport: T, min_interval: Duration) -> Self {
        Self {
            transport: Arc::new(transport),
            hosts: Arc::new(DashMap::new()),
            min_interval: Arc::new(RwLock::new(min_interval)),
            retry_pause: DEFAULT_RETRY_PAUSE,
        }
    }

    /// Replace the pause between attempts after a server error
    #[must_use]
    pub fn with_retry_pause(mut self, retry_pause: Duration) -> Self {
        self.retry_pause = retry_pause;
        self
    }

    /// Send a request once its host's turn has come.
    ///
    /// This method:
    /// 1. Extracts the host from the request URL
    /// 2. Gets or creates the limiter for that host
    /// 3. Waits for exclusive access to the host
    /// 4. Sleeps until the minimum interval since the last dispatch has passed
    /// 5. Executes the request, retrying on server errors
    /// 6. Records the completion time, so the next caller's interval is
    ///    measured from here
    ///
    /// A response with an error status is not an error: inspect
    /// [`Response::status`] yourself.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError::InvalidRequest`] without touching the
    /// network if the URL has no host. Returns
    /// [`RateLimitError::NetworkError`] carrying the transport's error if
    /// any attempt fails below HTTP.
    pub fn send(&self, request: Request) -> Result<Response> {
        let key = HostKey::try_from(request.url())?;
        let limiter = self.limiter(&key);

        let mut turn = limiter.acquire();
        let waited = turn.wait(self.min_interval());
        if !waited.is_zero() {
            debug!("Waited {}ms for host {key}", waited.as_millis());
        }

        turn.stamp();
        let result = self.dispatch(&key, request);
        turn.stamp();

        result
    }

    /// Execute a request, retrying server errors up to [`MAX_ATTEMPTS`] times
    fn dispatch(&self, key: &HostKey, mut request: Request) -> Result<Response> {
        let mut attempt = 1;
        loop {
            let retry = if attempt < MAX_ATTEMPTS {
                request.try_clone()
            } else {
                None
            };

            let response =
                self.transport
                    .execute(request)
                    .map_err(|source| RateLimitError::NetworkError {
                        host: key.clone(),
                        source,
                    })?;

            let status = response.status();
            if !status.should_retry() || attempt == MAX_ATTEMPTS {
                return Ok(response);
            }

            let Some(next) = retry else {
                debug!("Request to {key} has a streaming body and cannot be retried");
                return Ok(response);
            };

            warn!(
                "Host {key} answered {status} (attempt {attempt}/{MAX_ATTEMPTS}), retrying in {}ms",
                self.retry_pause.as_millis()
            );
            drop(response);
            thread::sleep(self.retry_pause);

            request = next;
            attempt += 1;
        }
    }

    /// Get an existing limiter or create a new one for the given host
    fn limiter(&self, key: &HostKey) -> Arc<HostLimiter> {
        if let Some(limiter) = self.hosts.get(key) {
            return Arc::clone(limiter.value());
        }

        // Another thread may have created it since our lookup
        match self.hosts.entry(key.clone()) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                trace!("Tracking new host {key}");
                Arc::clone(entry.insert(Arc::new(HostLimiter::new())).value())
            }
        }
    }
}

impl<T> RateLimitedClient<T> {
    /// The minimum interval between two dispatches to the same host
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        *self
            .min_interval
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Change the minimum interval for all future dispatches.
    ///
    /// Callers already sleeping keep the wait they computed.
    pub fn set_min_interval(&self, min_interval: Duration) {
        *self
            .min_interval
            .write()
            .unwrap_or_else(PoisonError::into_inner) = min_interval;
    }

    /// The pause between attempts after a server error
    #[must_use]
    pub const fn retry_pause(&self) -> Duration {
        self.retry_pause
    }

    /// Forget everything about a host.
    ///
    /// The next request to that host goes out immediately. A request
    /// currently in flight to that host finishes normally with the old
    /// limiter.
    ///
    /// `hostname` must be spelled like a [`HostKey`]: lowercase is not
    /// required, but a port belongs in it only when the URLs used a
    /// non-default one. Since a bare name carries no scheme, a default port
    /// such as `example.com:443` is not stripped and won't match the key
    /// `example.com`.
    ///
    /// Returns true if a host was removed, false if it was never seen.
    pub fn clear_host(&self, hostname: &str) -> bool {
        let key = HostKey::from(hostname);
        let removed = self.hosts.remove(&key).is_some();
        if removed {
            trace!("Cleared history of host {key}");
        }
        removed
    }

    /// Forget all hosts
    pub fn clear_all(&self) {
        self.hosts.clear();
    }

    /// Number of hosts with a live limiter
    #[must_use]
    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }
}
