use reqwest::blocking::Client;
use std::time::Duration;
use typed_builder::TypedBuilder;

use crate::{
    Result,
    ratelimit::{DEFAULT_REQUEST_INTERVAL, DEFAULT_RETRY_PAUSE, RateLimitConfig, RateLimitedClient},
    transport::default_transport,
};

/// Default timeout of a single request, 30 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default user agent, `hostlimit/<PKG_VERSION>`.
pub const DEFAULT_USER_AGENT: &str = concat!("hostlimit/", env!("CARGO_PKG_VERSION"));

/// Builder for a [`RateLimitedClient`] backed by a blocking `reqwest` client.
///
/// See crate-level documentation for usage example.
#[derive(TypedBuilder, Debug, Clone)]
#[builder(field_defaults(default, setter(into)))]
#[builder(builder_method(doc = "
Create a builder for building `ClientBuilder`.

On the builder call, call methods with same name as its fields to set their values.

Finally, call `.build()` to create the instance of `ClientBuilder`.
"))]
pub struct ClientBuilder {
    /// Minimum interval between two requests to the same host.
    #[builder(default = DEFAULT_REQUEST_INTERVAL)]
    min_interval: Duration,

    /// Response timeout per request, enforced by the transport.
    #[builder(default = DEFAULT_TIMEOUT)]
    timeout: Duration,

    /// Pause between two attempts after a server error.
    #[builder(default = DEFAULT_RETRY_PAUSE)]
    retry_pause: Duration,

    /// User agent used for all requests.
    #[builder(default_code = "String::from(DEFAULT_USER_AGENT)")]
    user_agent: String,
}

impl Default for ClientBuilder {
    #[inline]
    fn default() -> Self {
        Self::builder().build()
    }
}

impl From<&RateLimitConfig> for ClientBuilder {
    fn from(config: &RateLimitConfig) -> Self {
        Self::builder()
            .min_interval(config.request_interval)
            .timeout(config.timeout)
            .retry_pause(config.retry_pause)
            .user_agent(config.user_agent.clone())
            .build()
    }
}

impl ClientBuilder {
    /// Instantiates a [`RateLimitedClient`].
    ///
    /// # Errors
    ///
    /// Returns an `Err` if the underlying `reqwest` client cannot be built,
    /// usually because the TLS backend failed to initialize.
    pub fn client(self) -> Result<RateLimitedClient<Client>> {
        let transport = default_transport(self.timeout, &self.user_agent)?;
        Ok(RateLimitedClient::new(transport, self.min_interval).with_retry_pause(self.retry_pause))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let client = ClientBuilder::default().client().unwrap();

        assert_eq!(client.min_interval(), DEFAULT_REQUEST_INTERVAL);
        assert_eq!(client.retry_pause(), DEFAULT_RETRY_PAUSE);
        assert_eq!(client.host_count(), 0);
    }

    #[test]
    fn test_builder_overrides() {
        let client = ClientBuilder::builder()
            .min_interval(Duration::from_millis(200))
            .retry_pause(Duration::from_millis(10))
            .build()
            .client()
            .unwrap();

        assert_eq!(client.min_interval(), Duration::from_millis(200));
        assert_eq!(client.retry_pause(), Duration::from_millis(10));
    }

    #[test]
    fn test_from_config() {
        let config = RateLimitConfig {
            request_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(5),
            retry_pause: Duration::from_secs(2),
            user_agent: "test-agent".to_string(),
        };

        let builder = ClientBuilder::from(&config);
        assert_eq!(builder.min_interval, Duration::from_secs(1));
        assert_eq!(builder.timeout, Duration::from_secs(5));
        assert_eq!(builder.user_agent, "test-agent");

        let client = builder.client().unwrap();
        assert_eq!(client.retry_pause(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_user_agent_is_sent() {
        use wiremock::matchers::header;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let mock_server = MockServer::start().await;
        Mock::given(header("user-agent", "test-agent"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;
        let url = mock_server.uri();

        let status = crate::test_utils::run_blocking(move || {
            let client = ClientBuilder::builder()
                .user_agent("test-agent")
                .build()
                .client()
                .unwrap();
            client.send(crate::test_utils::get(&url)).unwrap().status()
        })
        .await;

        assert_eq!(status, reqwest::StatusCode::OK);
    }
}
