//! `hostlimit` fetches URLs without hammering their hosts.
//!
//! All URLs are requested concurrently, yet two requests to the same host
//! are always spaced apart by a minimum interval:
//!
//! ```sh
//! hostlimit --interval 500ms https://api.github.com/rate_limit https://api.github.com/zen
//! ```
//!
//! Server errors (status 500 and up) are retried twice, pausing in between:
//!
//! ```sh
//! hostlimit --retry-pause 2s https://example.com/flaky
//! ```
//!
//! Authenticate with a bearer token:
//! ```sh
//! HOSTLIMIT_TOKEN=... hostlimit https://api.github.com/user
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
#![deny(missing_docs)]

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use hostlimit_lib::ClientBuilder;
use log::{error, info};

#[cfg(feature = "native-tls")]
use openssl_sys as _; // required for vendored-openssl feature

mod dispatch;
mod logging;
mod options;
mod verbosity;

use crate::{
    dispatch::fetch_all,
    logging::init_logging,
    options::{Config, HOSTLIMIT_CONFIG_FILE, HostlimitOptions},
};

/// A C-like enum that can be cast to `i32` and used as process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitCode {
    Success = 0,
    // NOTE: exit code 1 is used for any `Result::Err` bubbled up to `main()`
    // using the `?` operator.
    #[allow(unused)]
    UnexpectedFailure = 1,
    RequestFailure = 2,
    ConfigFile = 3,
}

fn main() -> Result<()> {
    // std::process::exit doesn't guarantee that all destructors will be run,
    // therefore we wrap the main code in another function to ensure that.
    let exit_code = run_main()?;
    std::process::exit(exit_code);
}

/// Load the config file, if there is one.
///
/// An explicitly given file must exist. The default file is only read when
/// present, but must be valid then.
fn load_config(opts: &HostlimitOptions) -> Result<Config> {
    let (path, explicit) = match &opts.config_file {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(HOSTLIMIT_CONFIG_FILE), false),
    };

    if !explicit && !path.is_file() {
        return Ok(Config::default());
    }

    match Config::load_from_file(&path) {
        Ok(config) => Ok(config),
        Err(e) => bail!("Cannot load configuration file `{}`: {e:?}", path.display()),
    }
}

fn run_main() -> Result<i32> {
    let opts = HostlimitOptions::parse();
    init_logging(&opts.verbose);

    let config = match load_config(&opts) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return Ok(ExitCode::ConfigFile as i32);
        }
    };

    let rate_limit_config = opts.rate_limit_config(&config);
    let headers = opts.headers(&config)?;
    info!(
        "Spacing requests per host by {}ms",
        rate_limit_config.request_interval.as_millis()
    );

    let client = ClientBuilder::from(&rate_limit_config).client()?;
    let outcomes = fetch_all(&client, &opts.urls, &headers, opts.max_concurrency);

    let mut failed = false;
    for outcome in &outcomes {
        println!("{outcome}");
        failed |= !outcome.is_success();
    }

    if failed {
        Ok(ExitCode::RequestFailure as i32)
    } else {
        Ok(ExitCode::Success as i32)
    }
}
