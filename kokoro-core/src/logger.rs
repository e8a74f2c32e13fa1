//! Tracing initialization: console and optional log file share one fmt layer.

use std::fs::OpenOptions;
use std::io;
use std::sync::Arc;

use crate::error::{KokoroError, Result};
use tracing_subscriber::{
    fmt::format::FmtSpan,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

/// Installs the global tracing subscriber.
///
/// Output goes to stdout, and additionally to `log_file` when one is given
/// (same full fmt format: level, target, span close events, all fields).
/// The level filter comes from `RUST_LOG`; unset defaults to `info`.
/// Load `.env` (e.g. `dotenvy::dotenv()`) before calling this, otherwise a
/// `RUST_LOG` set there is not picked up.
pub fn init_tracing(log_file: Option<&str>) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let file = Arc::new(file);

            use tracing_subscriber::fmt::writer::MakeWriterExt;
            let writer = io::stdout.and(file);

            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_file(false)
                .with_line_number(false)
                .boxed()
        }
        None => tracing_subscriber::fmt::layer()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
    };

    Registry::default()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| KokoroError::Unknown(format!("Failed to set global subscriber: {}", e)))?;

    Ok(())
}
