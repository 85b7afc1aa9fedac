//! `merge` command implementation.

use anyhow::{Context, Result};
use ingestion::{DatasetSchema, DualHeadRig, MaterializeReport};
use observability::{MergeStatsAggregator, MergeSummary};
use serde::Serialize;
use tracing::info;

use super::{ensure_dataset, load_config};
use crate::cli::MergeArgs;

/// Per-rig result for JSON output
#[derive(Serialize)]
struct RigResult {
    rig: &'static str,
    cached: bool,
    scans: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    skew_ms: Option<SkewStats>,
}

#[derive(Serialize)]
struct SkewStats {
    min: f64,
    max: f64,
    mean: f64,
    std_dev: f64,
}

/// Execute the `merge` command
pub fn run_merge(args: &MergeArgs) -> Result<()> {
    ensure_dataset(&args.dataroot)?;
    let config = load_config(&args.config)?;
    let schema = DatasetSchema::new(&args.dataroot).with_bounds(config.sync);

    let rigs: Vec<DualHeadRig> = match args.rig {
        Some(rig) => vec![rig],
        None => DualHeadRig::ALL.to_vec(),
    };

    let mut stats = MergeStatsAggregator::new();
    let mut reports = Vec::with_capacity(rigs.len());
    for rig in rigs {
        info!(rig = rig.name(), "Merging dual-head scans");
        let report = schema
            .materialize(rig)
            .with_context(|| format!("Failed to merge {} scans", rig.name()))?;
        accumulate(&mut stats, &report);
        reports.push(report);
    }
    let summary = stats.summary();

    if args.json {
        let results = build_results(&reports, &summary);
        let json =
            serde_json::to_string_pretty(&results).context("Failed to serialize merge summary")?;
        println!("{}", json);
    } else {
        print!("{}", summary);
    }
    Ok(())
}

fn accumulate(stats: &mut MergeStatsAggregator, report: &MaterializeReport) {
    let rig = report.rig.name();
    if report.cached {
        stats.record_cached(rig);
        return;
    }
    for pair in &report.pairs {
        stats.record_pair(rig, pair);
    }
    for &points in &report.point_counts {
        stats.record_scan(rig, points);
    }
}

fn build_results(reports: &[MaterializeReport], summary: &MergeSummary) -> Vec<RigResult> {
    reports
        .iter()
        .map(|report| {
            let skew_ms = summary
                .rigs
                .iter()
                .find(|r| r.rig == report.rig.name() && r.skew_ms.count > 0)
                .map(|r| SkewStats {
                    min: r.skew_ms.min,
                    max: r.skew_ms.max,
                    mean: r.skew_ms.mean,
                    std_dev: r.skew_ms.std_dev,
                });
            RigResult {
                rig: report.rig.name(),
                cached: report.cached,
                scans: report.index.len(),
                skew_ms,
            }
        })
        .collect()
}
