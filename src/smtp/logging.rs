//! Logging setup and the server's log facade

use std::str::FromStr;

use tracing::metadata::LevelFilter;
use tracing_subscriber::{
    Layer, filter::FilterFn, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

/// Install a compact stdout subscriber for this crate's events.
///
/// The level comes from the `LOG_LEVEL` environment variable (default
/// `info`). Calling it again, or after another subscriber was installed,
/// does nothing.
pub fn init() {
    let default = LevelFilter::INFO;

    let level = std::env::var("LOG_LEVEL").map_or(default, |level| {
        LevelFilter::from_str(level.as_str()).unwrap_or_else(|_| {
            eprintln!("Invalid log level specified {level}, defaulting to {default}");
            default
        })
    });

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_filter(level)
                .with_filter(FilterFn::new(|metadata| {
                    metadata.target().starts_with("smtp_mock")
                })),
        )
        .try_init();
}

/// Log facade handed to the server, its sessions and the accept loop.
///
/// Warnings and errors are always emitted; activity (requests, responses,
/// session boundaries) only when enabled in the configuration.
#[derive(Debug, Clone, Copy)]
pub struct Logger {
    activity: bool,
}

impl Logger {
    pub fn new(activity: bool) -> Self {
        Self { activity }
    }

    pub fn info_activity(&self, message: &str) {
        if self.activity {
            tracing::info!("{message}");
        }
    }

    pub fn warning(&self, message: &str) {
        tracing::warn!("{message}");
    }

    pub fn error(&self, message: &str) {
        tracing::error!("{message}");
    }
}
