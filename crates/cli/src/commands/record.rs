//! `record` command implementation.

use std::time::Instant;

use anyhow::{Context, Result};
use dispatcher::{create_dispatcher, SinkSpec};
use ingestion::{fuse_dataset, DatasetSchema};
use tracing::info;

use super::{ensure_dataset, load_config};
use crate::cli::RecordArgs;
use crate::pipeline::ConversionStats;

/// Execute the `record` command
pub fn run_record(args: &RecordArgs) -> Result<()> {
    let root = args.datasets_root.join(&args.dataset_name);
    ensure_dataset(&root)?;

    let config = load_config(&args.config)?;
    let versions = config.versions.for_dataset(&args.dataset_name);
    let compression = args
        .compression
        .map(Into::into)
        .unwrap_or(config.export.record_compression);

    info!(
        dataset = %args.dataset_name,
        root = %root.display(),
        output = %args.output.display(),
        sensors = ?config.dataset.sensors,
        lidar_mode = %config.dataset.lidar_mode,
        imu_version = versions.imu,
        vrs_gps_version = versions.vrs_gps,
        ?compression,
        "Converting dataset to record"
    );

    let started = Instant::now();
    let schema = DatasetSchema::new(&root).with_bounds(config.sync);
    let stream = fuse_dataset(
        &schema,
        &config.dataset.sensors,
        config.dataset.lidar_mode,
        versions,
    )
    .with_context(|| format!("Failed to load dataset {}", root.display()))?;

    let dispatcher = create_dispatcher(vec![
        SinkSpec::Log {
            name: "log".to_string(),
        },
        SinkSpec::Record {
            name: "record".to_string(),
            path: args.output.clone(),
            compression,
        },
    ])
    .context("Failed to create sinks")?;

    let summary = dispatcher
        .run(stream)
        .context("Record conversion failed")?;

    let stats = ConversionStats::from_dispatch(
        "record",
        args.output.display().to_string(),
        &summary,
        started.elapsed(),
    );
    info!(
        records = stats.records,
        duration_secs = stats.duration.as_secs_f64(),
        "Record written"
    );

    if args.json {
        let json =
            serde_json::to_string_pretty(&stats).context("Failed to serialize record summary")?;
        println!("{}", json);
    } else {
        stats.print_summary();
    }
    Ok(())
}
