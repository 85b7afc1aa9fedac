//! `ground-truth` command implementation.

use anyhow::{Context, Result};
use ingestion::{build_global_coords, DatasetSchema};
use tracing::info;

use super::ensure_dataset;
use crate::cli::GroundTruthArgs;
use crate::error::CliError;

/// Execute the `ground-truth` command
pub fn run_ground_truth(args: &GroundTruthArgs) -> Result<()> {
    ensure_dataset(&args.dataroot)?;
    let schema = DatasetSchema::new(&args.dataroot);
    let pose_path = schema.layout().global_pose();
    if !pose_path.is_file() {
        return Err(CliError::missing_input(
            "global_pose.csv",
            &pose_path,
            "it ships with the dataset",
        )
        .into());
    }

    info!(
        dataroot = %args.dataroot.display(),
        imu_version = args.imu_version,
        "Building ground truth coordinates"
    );
    let records = build_global_coords(&schema, args.imu_version)
        .context("Failed to build global coordinates")?;

    println!(
        "✓ {} poses written to {}",
        records.len(),
        schema.layout().global_coords().display()
    );
    Ok(())
}
