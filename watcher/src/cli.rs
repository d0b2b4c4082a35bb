// Command-line interface

use clap::Parser;
use common::models::DEFAULT_SELECTOR;
use common::validation::WatchArgs;
use std::path::PathBuf;

/// Watch web pages for content changes and send rate-limited notifications.
///
/// Required values are optional at the parser level so that missing or
/// malformed ones are reported through the watcher's own exit codes.
#[derive(Debug, Parser)]
#[command(name = "watcher", version, about)]
pub struct Cli {
    /// File with one URL per line, or a JSON object of URL → selector
    #[arg(long, value_name = "PATH")]
    pub endpoints: Option<PathBuf>,

    /// Base seconds between cycles
    #[arg(long, value_name = "SECONDS", allow_hyphen_values = true)]
    pub interval: Option<String>,

    /// JSON file with key, eventName, bodyKey and optional timeout
    #[arg(long, value_name = "PATH")]
    pub notification: Option<PathBuf>,

    /// Randomize each interval; bare flag or `true` means 20%, or give 0-99
    #[arg(
        long,
        value_name = "BOOL|PERCENT",
        num_args = 0..=1,
        default_missing_value = "true",
        allow_hyphen_values = true
    )]
    pub jitter: Option<String>,

    /// CSS selector used when endpoints are a plain URL list
    #[arg(long, value_name = "SELECTOR", default_value = DEFAULT_SELECTOR)]
    pub selector: String,

    /// Directory holding default.toml / local.toml
    #[arg(long, value_name = "DIR", default_value = "config")]
    pub config_dir: PathBuf,
}

impl Cli {
    pub fn watch_args(&self) -> WatchArgs {
        WatchArgs {
            endpoints: self.endpoints.clone(),
            interval: self.interval.clone(),
            notification: self.notification.clone(),
            jitter: self.jitter.clone(),
            selector: self.selector.clone(),
        }
    }
}
