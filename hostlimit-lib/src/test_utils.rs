use reqwest::Method;
use reqwest::blocking::{Client, Request, Response};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use url::Url;

use crate::Transport;

/// Creates a mock web server, which responds with a predefined status when
/// handling a matching request
macro_rules! mock_server {
    ($status:expr $(, $func:tt ($($arg:expr),*))*) => {{
        let mock_server = wiremock::MockServer::start().await;
        let response_template = wiremock::ResponseTemplate::new($status);
        let template = response_template$(.$func($($arg),*))*;
        wiremock::Mock::given(wiremock::matchers::method("GET")).respond_with(template).mount(&mock_server).await;
        mock_server
    }};
}

/// A transport that remembers when each request went out
#[derive(Debug)]
pub(crate) struct RecordingTransport {
    inner: Client,
    dispatches: Mutex<Vec<Instant>>,
}

impl RecordingTransport {
    pub(crate) fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub(crate) fn with_timeout(timeout: Duration) -> Self {
        Self {
            inner: Client::builder().timeout(timeout).build().unwrap(),
            dispatches: Mutex::new(Vec::new()),
        }
    }

    /// Number of requests handed to the network, including failed ones
    pub(crate) fn calls(&self) -> usize {
        self.dispatches.lock().unwrap().len()
    }

    /// Dispatch instants in the order requests went out
    pub(crate) fn dispatches(&self) -> Vec<Instant> {
        self.dispatches.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    fn execute(&self, request: Request) -> reqwest::Result<Response> {
        self.dispatches.lock().unwrap().push(Instant::now());
        self.inner.execute(request)
    }
}

/// Build a GET request
///
/// # Panic
///
/// This panics on an unparsable URL, so it should only be used for testing
pub(crate) fn get(url: &str) -> Request {
    Request::new(Method::GET, Url::parse(url).expect("Expected valid URL"))
}

/// Run blocking client code off the async test runtime.
///
/// The blocking `reqwest` client refuses to be used (or dropped) from within
/// an async context, so everything touching it lives inside `f`.
pub(crate) async fn run_blocking<F, R>(f: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .expect("Blocking test task panicked")
}
