use anyhow::{Context, Error, Result, anyhow};
use clap::Parser;
use hostlimit_lib::RateLimitConfig;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use std::{
    collections::HashMap, fs, num::NonZeroUsize, path::Path, path::PathBuf, time::Duration,
};
use url::Url;

use crate::verbosity::Verbosity;

pub(crate) const HOSTLIMIT_CONFIG_FILE: &str = "hostlimit.toml";

const DEFAULT_MAX_CONCURRENCY: NonZeroUsize = NonZeroUsize::new(128).unwrap();

const HELP_MSG_CONFIG_FILE: &str = "Configuration file to use

If not given, `hostlimit.toml` in the current directory is used when it exists.";

/// Fetch URLs without hammering their hosts.
///
/// Every URL is requested concurrently, but two requests to the same host
/// are always at least `--interval` apart. Server errors are retried.
#[derive(Parser, Debug)]
#[command(version, about)]
pub(crate) struct HostlimitOptions {
    /// The URLs to fetch
    #[arg(name = "urls", required = true)]
    pub(crate) urls: Vec<Url>,

    #[arg(short, long = "config", help = HELP_MSG_CONFIG_FILE)]
    pub(crate) config_file: Option<PathBuf>,

    /// Minimum interval between two requests to the same host, e.g. `500ms`
    #[arg(short, long, value_parser = humantime::parse_duration)]
    pub(crate) interval: Option<Duration>,

    /// Website timeout per request, e.g. `30s`
    #[arg(short, long, value_parser = humantime::parse_duration)]
    pub(crate) timeout: Option<Duration>,

    /// Pause before retrying a request that failed with a server error, e.g. `5s`
    #[arg(long, value_parser = humantime::parse_duration)]
    pub(crate) retry_pause: Option<Duration>,

    /// User agent
    #[arg(short, long)]
    pub(crate) user_agent: Option<String>,

    /// Custom request header, e.g. `--header "Accept: application/json"`.
    /// Can be given multiple times.
    #[arg(short = 'H', long = "header", value_parser = parse_single_header)]
    pub(crate) header: Vec<(String, String)>,

    /// Maximum number of URLs fetched at the same time
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENCY)]
    pub(crate) max_concurrency: NonZeroUsize,

    /// Bearer token sent in the `Authorization` header
    #[arg(long, env = "HOSTLIMIT_TOKEN", hide_env_values = true)]
    pub(crate) token: Option<String>,

    #[command(flatten)]
    pub(crate) verbose: Verbosity,
}

/// Settings that can live in the config file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    /// Rate limiting settings, under `[ratelimit]`
    #[serde(default)]
    pub(crate) ratelimit: RateLimitConfig,

    /// Headers sent with every request, under `[header]`
    #[serde(default)]
    pub(crate) header: HashMap<String, String>,
}

impl Config {
    /// Load configuration from a file
    pub(crate) fn load_from_file(path: &Path) -> Result<Config> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents).with_context(|| "Failed to parse configuration file")
    }
}

impl HostlimitOptions {
    /// Combine the config file with the command line, which takes precedence
    pub(crate) fn rate_limit_config(&self, file: &Config) -> RateLimitConfig {
        let defaults = &file.ratelimit;
        RateLimitConfig {
            request_interval: self.interval.unwrap_or(defaults.request_interval),
            timeout: self.timeout.unwrap_or(defaults.timeout),
            retry_pause: self.retry_pause.unwrap_or(defaults.retry_pause),
            user_agent: self
                .user_agent
                .clone()
                .unwrap_or_else(|| defaults.user_agent.clone()),
        }
    }

    /// Headers for every request: config file first, then `--header`,
    /// then `--token`
    pub(crate) fn headers(&self, file: &Config) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        for (name, value) in file.header.iter().chain(
            self.header
                .iter()
                .map(|(name, value)| (name, value)),
        ) {
            let name = HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("Invalid header name '{name}'"))?;
            let value = HeaderValue::from_str(value)
                .with_context(|| format!("Invalid value for header '{name}'"))?;
            headers.insert(name, value);
        }

        if let Some(token) = &self.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| anyhow!("Token contains invalid characters"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }
}

/// Parse a single header of the form `Name: value`
fn parse_single_header(header: &str) -> Result<(String, String), Error> {
    let (name, value) = header
        .split_once(':')
        .ok_or_else(|| anyhow!("Header '{header}' must be of the form 'Name: value'"))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("Header '{header}' has an empty name"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
