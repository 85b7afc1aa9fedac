//! Dataset-level stream fusion.

use contracts::{LidarMode, SchemaVersions, SensorKind, SensorRecord};
use sync_engine::{fuse, TimeOrderedMerge};
use tracing::{info, instrument};

use crate::error::Result;
use crate::schema::DatasetSchema;

/// Fused record stream of one dataset
pub type RecordStream = TimeOrderedMerge<std::vec::IntoIter<SensorRecord>>;

/// Loads every selected sensor and merges the collections into one time-ordered stream.
///
/// Streams are numbered in selection order (heads before merged scans for dual-head
/// kinds), which decides the order of records sharing a timestamp.
#[instrument(name = "fuse_dataset", skip_all, fields(sensors = selection.len(), mode = %mode))]
pub fn fuse_dataset(
    schema: &DatasetSchema,
    selection: &[SensorKind],
    mode: LidarMode,
    versions: SchemaVersions,
) -> Result<RecordStream> {
    let mut streams = Vec::new();
    for &kind in selection {
        streams.extend(schema.records_for(kind, versions, mode)?);
    }

    let total: usize = streams.iter().map(Vec::len).sum();
    info!(streams = streams.len(), records = total, "dataset streams loaded");
    Ok(fuse(streams))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::DatasetLayout;
    use crate::reader::write_stamps;
    use contracts::{SensorPayload, Timestamp};
    use std::fs;

    #[test]
    fn test_fuse_orders_across_sensors() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DatasetLayout::new(dir.path());
        fs::create_dir_all(layout.sensor_data()).unwrap();
        fs::write(layout.sensor_csv("altimeter"), "10,1.0\n30,1.1\n50,1.2\n").unwrap();
        fs::write(layout.sensor_csv("fog"), "20,0,0,0\n30,0,0,0\n").unwrap();
        write_stamps(&layout.stamp_file("stereo"), &[5, 45]).unwrap();

        let schema = DatasetSchema::new(dir.path());
        let fused: Vec<SensorRecord> = fuse_dataset(
            &schema,
            &[SensorKind::Altimeter, SensorKind::Fog, SensorKind::Stereo],
            LidarMode::Merged,
            SchemaVersions::default(),
        )
        .unwrap()
        .collect();

        let stamps: Vec<Timestamp> = fused.iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![5, 10, 20, 30, 30, 45, 50]);
        // Equal stamps keep selection order
        assert!(matches!(fused[3].payload, SensorPayload::Altimeter(_)));
        assert!(matches!(fused[4].payload, SensorPayload::Fog(_)));
    }

    #[test]
    fn test_missing_sensor_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let schema = DatasetSchema::new(dir.path());
        assert!(fuse_dataset(
            &schema,
            &[SensorKind::Gps],
            LidarMode::Merged,
            SchemaVersions::default()
        )
        .is_err());
    }
}
