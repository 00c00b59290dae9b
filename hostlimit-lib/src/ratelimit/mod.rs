//! Per-host request spacing.
//!
//! Requests to the same host are serialized and spaced apart by a minimum
//! interval, while requests to different hosts proceed independently.
//!
//! # Architecture
//!
//! - [`HostKey`]: Represents a hostname (plus explicit port) for rate limiting
//! - [`HostLimiter`]: Holds the last dispatch time of one host behind its own lock
//! - [`RateLimitedClient`]: Routes requests to the limiter of their host and
//!   dispatches them over a [`Transport`](crate::Transport)
//! - [`RateLimitConfig`]: Serializable configuration for the client

mod client;
mod config;
mod error;
mod key;
mod limiter;

pub use client::{MAX_ATTEMPTS, RateLimitedClient};
pub use config::{DEFAULT_REQUEST_INTERVAL, DEFAULT_RETRY_PAUSE, RateLimitConfig};
pub use error::RateLimitError;
pub use key::HostKey;
pub use limiter::{HostLimiter, Turn};
