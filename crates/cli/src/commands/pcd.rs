//! `pcd` command implementation.

use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{DataSink, PcdEncoding};
use dispatcher::{dispatch, write_aligned_poses, LogSink, PcdSink};
use ingestion::{read_global_coords, DatasetSchema, DualHeadRig};
use sync_engine::align_poses;
use tracing::info;

use super::{ensure_dataset, load_config};
use crate::cli::PcdArgs;
use crate::error::CliError;
use crate::pipeline::ConversionStats;

/// Execute the `pcd` command
pub fn run_pcd(args: &PcdArgs) -> Result<()> {
    ensure_dataset(&args.dataroot)?;
    let config = load_config(&args.config)?;
    let encoding: PcdEncoding = args
        .encoding
        .map(Into::into)
        .unwrap_or(config.export.pcd_encoding);

    let schema = DatasetSchema::new(&args.dataroot).with_bounds(config.sync);
    let layout = schema.layout();
    let out_dir = args.out_dir.clone().unwrap_or_else(|| layout.pcd_dir());
    let poses_out = args
        .poses_out
        .clone()
        .unwrap_or_else(|| layout.aligned_poses());

    // Poses are required up front so a missing trajectory fails before any export
    let coords_path = layout.global_coords();
    if !coords_path.is_file() {
        return Err(CliError::missing_input(
            "global_coors.csv",
            &coords_path,
            "run `kuc-convert ground-truth` first",
        )
        .into());
    }
    let trajectory = read_global_coords(&coords_path)
        .with_context(|| format!("Failed to read {}", coords_path.display()))?;

    info!(
        dataroot = %args.dataroot.display(),
        out_dir = %out_dir.display(),
        ?encoding,
        poses = trajectory.len(),
        "Exporting merged VLP scans"
    );

    let started = Instant::now();
    let merged = schema
        .merged_records(DualHeadRig::Vlp)
        .context("Failed to materialize merged VLP scans")?;

    let mut pcd = PcdSink::new("pcd", &out_dir, encoding).context("Failed to create PCD sink")?;
    let mut log = LogSink::new("log");
    let summary = dispatch(
        merged,
        &mut [&mut pcd as &mut dyn DataSink, &mut log as &mut dyn DataSink],
    )
    .context("PCD export failed")?;

    let aligned = align_poses(pcd.frame_stamps(), &trajectory)
        .context("Failed to align poses to exported frames")?;
    write_aligned_poses(&poses_out, &aligned)
        .with_context(|| format!("Failed to write {}", poses_out.display()))?;
    info!(
        frames = aligned.len(),
        path = %poses_out.display(),
        "Aligned poses written"
    );

    ConversionStats::from_dispatch(
        "pcd",
        out_dir.display().to_string(),
        &summary,
        started.elapsed(),
    )
    .print_summary();
    Ok(())
}
