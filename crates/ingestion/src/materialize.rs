//! Merged-scan cache of a dual-head rig.
//!
//! The first run pairs the two heads' stamps, moves both scans into the vehicle
//! frame and writes `<SENSOR>_merged/<avg>.bin` plus the `<SENSOR>_merged_stamp.csv`
//! index. Later runs find the index and reuse it without looking at the scans.

use std::fs;

use contracts::{LidarModel, SkewBounds, StampPair, Timestamp};
use observability::{record_merge_cache, record_merge_pair, record_scan_materialized};
use sync_engine::{merge_scans, merge_stamps, sick_to_cartesian, PointScan};
use tracing::{debug, info, instrument};

use crate::error::{IngestionError, Result};
use crate::layout::{DatasetLayout, DualHeadRig};
use crate::reader::{read_calibration, read_scan, read_stamps, write_scan, write_stamps};

/// Result of [`materialize`]
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializeReport {
    pub rig: DualHeadRig,

    /// Merged stamps, one per merged scan
    pub index: Vec<Timestamp>,

    /// `true` when an existing index was reused
    pub cached: bool,

    /// Accepted stamp pairs (empty when cached)
    pub pairs: Vec<StampPair>,

    /// Points per written scan, in `pairs` order
    pub point_counts: Vec<usize>,
}

/// Ensures the merged cache of `rig` exists and returns its index.
///
/// Only the existence of the index file is checked; a stale cache is not detected.
/// The index is written last, so an interrupted run leaves no index behind and the
/// next run merges again.
#[instrument(name = "materialize", skip_all, fields(rig = rig.name()))]
pub fn materialize(
    layout: &DatasetLayout,
    rig: DualHeadRig,
    bounds: &SkewBounds,
) -> Result<MaterializeReport> {
    let index_path = layout.merged_index(rig);
    if index_path.is_file() {
        let index = read_stamps(&index_path)?;
        record_merge_cache(rig.name(), true);
        debug!(path = %index_path.display(), scans = index.len(), "merged index reused");
        return Ok(MaterializeReport {
            rig,
            index,
            cached: true,
            pairs: Vec::new(),
            point_counts: Vec::new(),
        });
    }
    record_merge_cache(rig.name(), false);

    let [head_a, head_b] = rig.heads();
    let stamps_a = read_stamps(&layout.stamp_file(head_a))?;
    let stamps_b = read_stamps(&layout.stamp_file(head_b))?;
    let pairs = merge_stamps(&stamps_a, &stamps_b, bounds)?;

    let [calib_a, calib_b] = rig.calibration_files();
    let calib_a = read_calibration(&layout.calibration(calib_a))?;
    let calib_b = read_calibration(&layout.calibration(calib_b))?;

    let folder = layout.merged_folder(rig);
    fs::create_dir_all(&folder).map_err(|e| IngestionError::io(&folder, e))?;

    let folder_a = layout.scan_folder(head_a);
    let folder_b = layout.scan_folder(head_b);
    let mut index = Vec::with_capacity(pairs.len());
    let mut point_counts = Vec::with_capacity(pairs.len());

    for pair in &pairs {
        let scan_a = load_head(rig, &folder_a.join(format!("{}.bin", pair.left)))?;
        let scan_b = load_head(rig, &folder_b.join(format!("{}.bin", pair.right)))?;
        let merged = merge_scans(&scan_a, &scan_b, &calib_a, &calib_b)?;

        let stamp = pair.average();
        write_scan(&folder.join(format!("{stamp}.bin")), &merged)?;

        record_merge_pair(rig.name(), pair.skew());
        record_scan_materialized(rig.name(), merged.rows());
        index.push(stamp);
        point_counts.push(merged.rows());
    }

    let tmp = index_path.with_extension("csv.tmp");
    write_stamps(&tmp, &index)?;
    fs::rename(&tmp, &index_path).map_err(|e| IngestionError::io(&index_path, e))?;

    info!(
        heads_a = stamps_a.len(),
        heads_b = stamps_b.len(),
        pairs = pairs.len(),
        folder = %folder.display(),
        "merged scans written"
    );

    Ok(MaterializeReport {
        rig,
        index,
        cached: false,
        pairs,
        point_counts,
    })
}

/// Reads one head scan as 4-column points in the sensor frame
fn load_head(rig: DualHeadRig, path: &std::path::Path) -> Result<PointScan> {
    let model = rig.model();
    let scan = read_scan(path, model.raw_columns())?;
    match model {
        LidarModel::Vlp => Ok(scan),
        LidarModel::Sick => sick_to_cartesian(&scan)
            .map_err(|e| IngestionError::malformed_scan(path, e.to_string())),
    }
}
