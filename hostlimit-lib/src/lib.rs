//! `hostlimit` is a library for talking to remote hosts politely.
//!
//! It wraps a blocking HTTP transport and makes sure that two requests to
//! the same host are always spaced apart by a minimum interval, while
//! requests to different hosts run independently. Server errors (any status
//! of 500 and up) are retried a bounded number of times.
//!
//! "Hello world" example:
//! ```no_run
//! use hostlimit_lib::{ClientBuilder, Result};
//! use reqwest::blocking::Request;
//! use reqwest::Method;
//! use std::time::Duration;
//!
//! fn main() -> Result<()> {
//!     let client = ClientBuilder::builder()
//!         .min_interval(Duration::from_millis(200))
//!         .build()
//!         .client()?;
//!
//!     let url = "https://api.github.com/zen".parse().unwrap();
//!     let response = client.send(Request::new(Method::GET, url))?;
//!     println!("{}", response.status());
//!     Ok(())
//! }
//! ```
#![warn(clippy::all, clippy::pedantic)]
#![warn(
    absolute_paths_not_starting_with_crate,
    rustdoc::invalid_html_tags,
    missing_copy_implementations,
    missing_debug_implementations,
    semicolon_in_expressions_from_macros,
    unreachable_pub,
    unused_extern_crates,
    variant_size_differences,
    clippy::missing_const_for_fn
)]
#![deny(anonymous_parameters, macro_use_extern_crate)]
#![warn(missing_docs)]

#[cfg(test)]
#[macro_use]
mod test_utils;

mod builder;
mod retry;
mod transport;

pub mod ratelimit;

#[cfg(feature = "native-tls")]
use openssl_sys as _; // required for vendored-openssl feature

pub use crate::{
    builder::{ClientBuilder, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT},
    ratelimit::{HostKey, RateLimitConfig, RateLimitError, RateLimitedClient},
    transport::{Transport, default_transport},
};

/// Result type used throughout the crate, with [`RateLimitError`] as the error.
pub type Result<T> = std::result::Result<T, RateLimitError>;
