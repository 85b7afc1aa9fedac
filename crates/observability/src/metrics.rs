//! Conversion metrics
//!
//! Helper functions over the `metrics` facade plus an in-memory aggregator for
//! dual-head merge statistics.

use std::collections::BTreeMap;
use std::fmt;

use contracts::StampPair;
use metrics::{counter, gauge, histogram};

const NS_PER_MS: f64 = 1_000_000.0;

/// Records parsed from one sensor file
pub fn record_records_loaded(sensor: &str, count: usize) {
    counter!("kuc_records_loaded_total", "sensor" => sensor.to_string()).increment(count as u64);
}

/// One dual-head stamp pair accepted
pub fn record_merge_pair(rig: &str, skew_ns: u64) {
    counter!("kuc_merge_pairs_total", "rig" => rig.to_string()).increment(1);
    histogram!("kuc_merge_skew_ms", "rig" => rig.to_string()).record(skew_ns as f64 / NS_PER_MS);
}

/// Skew bound exceeded (the run aborts right after)
pub fn record_sync_violation(skew_ns: u64, limit_ns: u64) {
    counter!("kuc_sync_violations_total").increment(1);
    gauge!("kuc_sync_violation_skew_ms").set(skew_ns as f64 / NS_PER_MS);
    gauge!("kuc_sync_violation_limit_ms").set(limit_ns as f64 / NS_PER_MS);
}

/// Merged scan written to disk
pub fn record_scan_materialized(rig: &str, points: usize) {
    counter!("kuc_merged_scans_total", "rig" => rig.to_string()).increment(1);
    histogram!("kuc_merged_scan_points", "rig" => rig.to_string()).record(points as f64);
}

/// Merged index lookup: `hit` when the cached index was reused
pub fn record_merge_cache(rig: &str, hit: bool) {
    let status = if hit { "hit" } else { "miss" };
    counter!(
        "kuc_merge_cache_total",
        "rig" => rig.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record written by a sink
pub fn record_record_exported(sink_name: &str, kind: &str) {
    counter!(
        "kuc_records_exported_total",
        "sink" => sink_name.to_string(),
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Sink write failure
pub fn record_export_failure(sink_name: &str) {
    counter!("kuc_export_failures_total", "sink" => sink_name.to_string()).increment(1);
}

/// Per-rig merge statistics
///
/// Aggregated in memory so a `merge` run can print a summary without a recorder.
#[derive(Debug, Clone, Default)]
pub struct MergeStatsAggregator {
    rigs: BTreeMap<String, RigStats>,
}

#[derive(Debug, Clone, Default)]
struct RigStats {
    cached: bool,
    skew_ms: RunningStats,
    points: RunningStats,
}

impl MergeStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account one accepted pair
    pub fn record_pair(&mut self, rig: &str, pair: &StampPair) {
        self.rig_mut(rig)
            .skew_ms
            .push(pair.skew() as f64 / NS_PER_MS);
    }

    /// Account one merged scan and its point count
    pub fn record_scan(&mut self, rig: &str, points: usize) {
        self.rig_mut(rig).points.push(points as f64);
    }

    /// Mark a rig whose merged index was already on disk
    pub fn record_cached(&mut self, rig: &str) {
        self.rig_mut(rig).cached = true;
    }

    pub fn summary(&self) -> MergeSummary {
        MergeSummary {
            rigs: self
                .rigs
                .iter()
                .map(|(name, stats)| RigSummary {
                    rig: name.clone(),
                    cached: stats.cached,
                    pairs: stats.skew_ms.count(),
                    skew_ms: StatsSummary::from(&stats.skew_ms),
                    points: StatsSummary::from(&stats.points),
                })
                .collect(),
        }
    }

    fn rig_mut(&mut self, rig: &str) -> &mut RigStats {
        self.rigs.entry(rig.to_string()).or_default()
    }
}

/// Merge summary
#[derive(Debug, Clone, Default)]
pub struct MergeSummary {
    pub rigs: Vec<RigSummary>,
}

#[derive(Debug, Clone, Default)]
pub struct RigSummary {
    pub rig: String,
    pub cached: bool,
    pub pairs: u64,
    pub skew_ms: StatsSummary,
    pub points: StatsSummary,
}

impl fmt::Display for MergeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Merge Summary ===")?;
        if self.rigs.is_empty() {
            writeln!(f, "No rigs merged")?;
        }
        for rig in &self.rigs {
            if rig.cached {
                writeln!(f, "{}: cached index reused", rig.rig)?;
                continue;
            }
            writeln!(f, "{}: {} pairs", rig.rig, rig.pairs)?;
            writeln!(f, "  Skew (ms): {}", rig.skew_ms)?;
            writeln!(f, "  Points per scan: {}", rig.points)?;
        }
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
