//! `info` command implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ingestion::{DatasetLayout, DualHeadRig};
use serde::Serialize;
use tracing::info;

use super::ensure_dataset;
use crate::cli::InfoArgs;

/// Single-file sensors below `sensor_data/`
const SENSOR_FILES: [&str; 6] = ["xsens_imu", "vrs_gps", "gps", "encoder", "fog", "altimeter"];

/// Dataset info for JSON output
#[derive(Serialize)]
struct DatasetInfo {
    root: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    stamps: Vec<FileInfo>,
    sensors: Vec<FileInfo>,
    merged: Vec<FileInfo>,
    ground_truth: Vec<FileInfo>,
}

#[derive(Serialize)]
struct FileInfo {
    label: String,
    path: String,
    /// Non-empty rows, `None` when the file is absent
    rows: Option<usize>,
}

impl FileInfo {
    fn inspect(label: impl Into<String>, path: PathBuf) -> Result<Self> {
        let rows = count_rows(&path)?;
        Ok(Self {
            label: label.into(),
            path: path.display().to_string(),
            rows,
        })
    }
}

fn count_rows(path: &Path) -> Result<Option<usize>> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Some(
        content.lines().filter(|l| !l.trim().is_empty()).count(),
    ))
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    ensure_dataset(&args.dataroot)?;
    info!(dataroot = %args.dataroot.display(), "Inspecting dataset");

    let dataset = build_dataset_info(&DatasetLayout::new(&args.dataroot))?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&dataset).context("Failed to serialize dataset info")?;
        println!("{}", json);
    } else {
        print_dataset_info(&dataset);
    }
    Ok(())
}

fn build_dataset_info(layout: &DatasetLayout) -> Result<DatasetInfo> {
    let mut stamps = Vec::new();
    for rig in DualHeadRig::ALL {
        for head in rig.heads() {
            stamps.push(FileInfo::inspect(head, layout.stamp_file(head))?);
        }
    }
    stamps.push(FileInfo::inspect("stereo", layout.stamp_file("stereo"))?);

    let sensors = SENSOR_FILES
        .iter()
        .map(|file| FileInfo::inspect(*file, layout.sensor_csv(file)))
        .collect::<Result<Vec<_>>>()?;

    let merged = DualHeadRig::ALL
        .iter()
        .map(|rig| FileInfo::inspect(rig.merged_name(), layout.merged_index(*rig)))
        .collect::<Result<Vec<_>>>()?;

    let ground_truth = vec![
        FileInfo::inspect("global_pose", layout.global_pose())?,
        FileInfo::inspect("global_coors", layout.global_coords())?,
    ];

    Ok(DatasetInfo {
        root: layout.root().display().to_string(),
        name: layout.name().map(str::to_string),
        stamps,
        sensors,
        merged,
        ground_truth,
    })
}

fn print_section(title: &str, files: &[FileInfo]) {
    println!("\n{title}");
    for (i, file) in files.iter().enumerate() {
        let prefix = if i == files.len() - 1 { "└─" } else { "├─" };
        match file.rows {
            Some(rows) => println!("   {} {:<14} {:>8} rows", prefix, file.label, rows),
            None => println!("   {} {:<14} {:>8}", prefix, file.label, "missing"),
        }
    }
}

fn print_dataset_info(dataset: &DatasetInfo) {
    println!(
        "Dataset {} ({})",
        dataset.name.as_deref().unwrap_or("?"),
        dataset.root
    );
    print_section("Stamp series", &dataset.stamps);
    print_section("Sensor files", &dataset.sensors);
    print_section("Merged scans", &dataset.merged);
    print_section("Ground truth", &dataset.ground_truth);
    println!();
}
