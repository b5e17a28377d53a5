//! Tracing helpers
// (c) 2024 Ross Younger

use std::{fs::File, sync::Arc};

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

const STANDARD_ENV_VAR: &str = "RUST_LOG";
const LOG_FILE_DETAIL_ENV_VAR: &str = "RUST_LOG_FILE_DETAIL";

struct FilterResult {
    filter: EnvFilter,
    /// Did the filter come from the environment?
    used_env: bool,
}

/// Uses the given environment variable if set; otherwise logs only our own events at `trace_level`.
fn filter_for(trace_level: &str, key: &str) -> anyhow::Result<FilterResult> {
    match EnvFilter::try_from_env(key) {
        Ok(filter) => Ok(FilterResult {
            filter,
            used_env: true,
        }),
        Err(e) if std::env::var(key).is_ok() => {
            anyhow::bail!("{key} (set in environment) was invalid: {e}")
        }
        Err(_) => Ok(FilterResult {
            filter: EnvFilter::new(format!("sshconf={trace_level}")),
            used_env: false,
        }),
    }
}

/// Set up rust tracing, to stderr and optionally to file.
///
/// By default we log only our own events, at a given trace level.
/// This can be overridden by setting `RUST_LOG`; the file output can be
/// tuned separately with `RUST_LOG_FILE_DETAIL`.
///
/// **CAUTION:** If this function fails, tracing won't be set up; callers must take extra care to report the error.
pub fn setup(trace_level: &str, filename: Option<&str>) -> anyhow::Result<()> {
    let mut layers = Vec::new();

    let filter = filter_for(trace_level, STANDARD_ENV_VAR)?;
    // Only show targets when logging more than just ourselves
    layers.push(
        fmt::layer()
            .compact()
            .with_target(filter.used_env)
            .with_writer(std::io::stderr)
            .with_filter(filter.filter)
            .boxed(),
    );

    if let Some(filename) = filename {
        let out_file = Arc::new(File::create(filename).context("Failed to open log file")?);
        let filter = if std::env::var(LOG_FILE_DETAIL_ENV_VAR).is_ok() {
            FilterResult {
                filter: EnvFilter::try_from_env(LOG_FILE_DETAIL_ENV_VAR)?,
                used_env: true,
            }
        } else {
            filter_for(trace_level, STANDARD_ENV_VAR)?
        };
        layers.push(
            fmt::layer()
                .with_writer(out_file)
                .with_target(filter.used_env)
                .compact()
                .with_ansi(false)
                .with_filter(filter.filter)
                .boxed(),
        );
    }

    tracing_subscriber::registry().with(layers).init();
    Ok(())
}
