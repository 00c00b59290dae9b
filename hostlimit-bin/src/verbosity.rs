//! `-v`/`-q` flags for the command line.
//!
//! By default only warnings are reported.
//! - `-q` reports errors only
//! - `-v` shows info
//! - `-vv` shows debug, including the wait before each dispatch
//! - `-vvv` shows trace

use log::LevelFilter;

#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Verbosity {
    /// Pass many times for more log output
    #[arg(
        long,
        short = 'v',
        action = clap::ArgAction::Count,
        global = true,
        conflicts_with = "quiet"
    )]
    verbose: u8,

    /// Only report errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,
}

impl Verbosity {
    /// Get the log level filter.
    pub(crate) const fn log_level_filter(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
