//! Structured logging setup.
//!
//! - Console output on stderr (stdout carries IPC events).
//! - Daily rolling log files in `{data_dir}/logs/cabin.log`, latest 5 kept.
//! - `RUST_LOG` filter, defaulting to info with HTTP internals quieted.

use std::fs;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::paths;

const DEFAULT_FILTER: &str = "info,reqwest=warn,hyper=warn,hyper_util=warn,mio=warn";

/// Install the global subscriber. Call once, first thing in `main`.
pub fn init() {
    let log_dir = paths::get_log_dir();
    let _ = fs::create_dir_all(&log_dir);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact();

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("cabin")
        .filename_suffix("log")
        .max_log_files(5)
        .build(&log_dir);

    let (file_layer, file_error) = match appender {
        Ok(appender) => (
            Some(
                fmt::layer()
                    .with_writer(appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            ),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    match file_error {
        None => tracing::info!(log_dir = %log_dir.display(), "Logger initialized"),
        Some(e) => tracing::warn!("File logging disabled: {}", e),
    }
}
