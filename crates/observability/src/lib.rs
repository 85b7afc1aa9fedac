//! # Observability
//!
//! Tracing setup and metric helpers for the converter.
//!
//! ## Features
//!
//! - Tracing initialization (JSON / Pretty / Compact)
//! - `metrics` counters and histograms behind small helper functions
//! - In-memory merge statistics with a printable summary
//!
//! No metrics exporter is installed: the converter is a one-shot batch tool, so
//! counters only matter to an embedding application that installs its own recorder.
//!
//! ## Example
//!
//! ```no_run
//! use observability::{init_with_config, LogFormat, ObservabilityConfig};
//!
//! init_with_config(ObservabilityConfig {
//!     log_format: LogFormat::Compact,
//!     ..Default::default()
//! })?;
//! observability::record_records_loaded("xsens_imu", 1024);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use crate::metrics::{
    record_export_failure, record_merge_cache, record_merge_pair, record_record_exported,
    record_records_loaded, record_scan_materialized, record_sync_violation, MergeStatsAggregator,
    MergeSummary, RigSummary, RunningStats, StatsSummary,
};

/// Initialize tracing with default settings (JSON, `info`)
pub fn init() -> Result<()> {
    init_with_config(ObservabilityConfig::default())
}

/// Observability configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
    /// Filter used when `RUST_LOG` is not set
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            default_log_level: "info".to_string(),
        }
    }
}

/// Log format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON lines
    #[default]
    Json,
    /// Human readable, multi-line
    Pretty,
    /// Single line
    Compact,
}

/// Initialize tracing with a custom configuration
///
/// `RUST_LOG` takes precedence over `default_log_level`.
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    match config.log_format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer().pretty().with_writer(std::io::stderr);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
        LogFormat::Compact => {
            let fmt_layer = fmt::layer().compact().with_writer(std::io::stderr);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
    }

    tracing::debug!(log_format = ?config.log_format, "Observability initialized");

    Ok(())
}
