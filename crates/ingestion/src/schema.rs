//! Per-sensor record catalog of one dataset.

use contracts::{
    AltimeterData, EncoderData, FogData, GpsData, ImuData, LidarFrame, LidarMode, SchemaVersion,
    SchemaVersions, SensorId, SensorKind, SensorPayload, SensorRecord, SkewBounds, StereoFrame,
    Timestamp, VrsGpsData,
};
use observability::record_records_loaded;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::layout::{DatasetLayout, DualHeadRig};
use crate::materialize::{materialize, MaterializeReport};
use crate::reader::read_stamps;
use crate::rows::{read_rows, SensorRow};

/// Records of a dual-head rig
#[derive(Debug, Clone)]
pub struct DualHeadRecords {
    /// First head (`VLP_left` / `SICK_back`)
    pub head_a: Vec<SensorRecord>,
    /// Second head (`VLP_right` / `SICK_middle`)
    pub head_b: Vec<SensorRecord>,
    /// Merged scans in the vehicle frame
    pub merged: Vec<SensorRecord>,
}

/// Sensor catalog over a [`DatasetLayout`]
///
/// Every accessor reads its files on call; nothing is held between calls except the
/// merged-scan cache on disk.
#[derive(Debug, Clone)]
pub struct DatasetSchema {
    layout: DatasetLayout,
    bounds: SkewBounds,
}

impl DatasetSchema {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self {
            layout: DatasetLayout::new(root),
            bounds: SkewBounds::default(),
        }
    }

    /// Skew bounds used when the merged cache has to be built
    pub fn with_bounds(mut self, bounds: SkewBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    pub fn bounds(&self) -> &SkewBounds {
        &self.bounds
    }

    /// Velodyne heads plus merged scans
    pub fn vlp(&self) -> Result<DualHeadRecords> {
        self.dual_head(DualHeadRig::Vlp)
    }

    /// SICK heads plus merged scans
    pub fn sick(&self) -> Result<DualHeadRecords> {
        self.dual_head(DualHeadRig::Sick)
    }

    /// Both heads and the merged scans of `rig`, building the merged cache if absent.
    pub fn dual_head(&self, rig: DualHeadRig) -> Result<DualHeadRecords> {
        let [head_a, head_b] = self.head_records(rig)?;
        let merged = self.merged_records(rig)?;
        Ok(DualHeadRecords {
            head_a,
            head_b,
            merged,
        })
    }

    /// Raw records of both heads; never touches the merged cache
    pub fn head_records(&self, rig: DualHeadRig) -> Result<[Vec<SensorRecord>; 2]> {
        let [a, b] = rig.heads();
        Ok([self.head(rig, a)?, self.head(rig, b)?])
    }

    /// Merged records of `rig`, building the merged cache if absent
    pub fn merged_records(&self, rig: DualHeadRig) -> Result<Vec<SensorRecord>> {
        let report = self.materialize(rig)?;
        let frame = LidarFrame {
            model: rig.model(),
            data_folder: self.layout.merged_folder(rig),
            merged: true,
        };
        Ok(lidar_records(rig.merged_name(), &report.index, &frame))
    }

    /// Builds (or reuses) the merged cache of `rig`
    pub fn materialize(&self, rig: DualHeadRig) -> Result<MaterializeReport> {
        materialize(&self.layout, rig, &self.bounds)
    }

    /// Stereo pairs listed in `stereo_stamp.csv`
    pub fn stereo(&self) -> Result<Vec<SensorRecord>> {
        let stamps = self.stamps("stereo")?;
        let image_root = self.layout.image_root();
        let id = SensorId::from("stereo");
        Ok(stamps
            .into_iter()
            .map(|t| {
                SensorRecord::new(
                    id.clone(),
                    t,
                    SensorPayload::Stereo(StereoFrame::new(&image_root, t)),
                )
            })
            .collect())
    }

    pub fn altimeter(&self) -> Result<Vec<SensorRecord>> {
        self.rows::<AltimeterData>(SchemaVersion::V1)
    }

    pub fn encoder(&self) -> Result<Vec<SensorRecord>> {
        self.rows::<EncoderData>(SchemaVersion::V1)
    }

    pub fn fog(&self) -> Result<Vec<SensorRecord>> {
        self.rows::<FogData>(SchemaVersion::V1)
    }

    pub fn gps(&self) -> Result<Vec<SensorRecord>> {
        self.rows::<GpsData>(SchemaVersion::V1)
    }

    /// `xsens_imu.csv` under schema `version` (1 or 2)
    pub fn imu(&self, version: u8) -> Result<Vec<SensorRecord>> {
        self.rows::<ImuData>(SchemaVersion::parse("imu", version)?)
    }

    /// `vrs_gps.csv` under schema `version` (1 or 2)
    pub fn vrs_gps(&self, version: u8) -> Result<Vec<SensorRecord>> {
        self.rows::<VrsGpsData>(SchemaVersion::parse("vrs_gps", version)?)
    }

    /// Typed IMU rows, for consumers that need the samples rather than records
    pub fn imu_samples(&self, version: u8) -> Result<Vec<(Timestamp, ImuData)>> {
        let version = SchemaVersion::parse("imu", version)?;
        read_rows::<ImuData>(&self.layout.sensor_csv("xsens_imu"), version)
    }

    /// Record collections for one sensor kind, one sorted collection per stream.
    ///
    /// Dual-head kinds yield the two heads, the merged scans, or all three depending
    /// on `mode`; the merged cache is built only when merged scans are requested.
    #[instrument(name = "records_for", skip_all, fields(kind = kind.as_str(), mode = %mode))]
    pub fn records_for(
        &self,
        kind: SensorKind,
        versions: SchemaVersions,
        mode: LidarMode,
    ) -> Result<Vec<Vec<SensorRecord>>> {
        if let Some(rig) = DualHeadRig::from_kind(kind) {
            let mut streams = Vec::with_capacity(3);
            if mode.includes_raw() {
                streams.extend(self.head_records(rig)?);
            }
            if mode.includes_merged() {
                streams.push(self.merged_records(rig)?);
            }
            return Ok(streams);
        }

        let records = match kind {
            SensorKind::Stereo => self.stereo()?,
            SensorKind::Altimeter => self.altimeter()?,
            SensorKind::Encoder => self.encoder()?,
            SensorKind::Fog => self.fog()?,
            SensorKind::Gps => self.gps()?,
            SensorKind::Imu => self.imu(versions.imu)?,
            SensorKind::VrsGps => self.vrs_gps(versions.vrs_gps)?,
            SensorKind::Vlp | SensorKind::Sick => Vec::new(),
        };
        Ok(vec![records])
    }

    fn head(&self, rig: DualHeadRig, head: &str) -> Result<Vec<SensorRecord>> {
        let stamps = self.stamps(head)?;
        let frame = LidarFrame {
            model: rig.model(),
            data_folder: self.layout.scan_folder(head),
            merged: false,
        };
        Ok(lidar_records(head, &stamps, &frame))
    }

    fn stamps(&self, sensor: &str) -> Result<Vec<Timestamp>> {
        let stamps = read_stamps(&self.layout.stamp_file(sensor))?;
        record_records_loaded(sensor, stamps.len());
        debug!(sensor, count = stamps.len(), "stamps loaded");
        Ok(stamps)
    }

    fn rows<S: SensorRow>(&self, version: SchemaVersion) -> Result<Vec<SensorRecord>> {
        let rows = read_rows::<S>(&self.layout.sensor_csv(S::FILE), version)?;
        record_records_loaded(S::FILE, rows.len());
        debug!(sensor = S::FILE, count = rows.len(), ?version, "rows loaded");

        let id = SensorId::from(S::FILE);
        Ok(rows
            .into_iter()
            .map(|(t, row)| SensorRecord::new(id.clone(), t, row.into_payload()))
            .collect())
    }
}

fn lidar_records(sensor: &str, stamps: &[Timestamp], frame: &LidarFrame) -> Vec<SensorRecord> {
    let id = SensorId::from(sensor);
    stamps
        .iter()
        .map(|&t| SensorRecord::new(id.clone(), t, SensorPayload::Lidar(frame.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IngestionError;
    use crate::reader::{write_scan, write_stamps};
    use contracts::ContractError;
    use std::fs;
    use std::path::Path;
    use sync_engine::PointScan;

    fn vlp_fixture(root: &Path) {
        let layout = DatasetLayout::new(root);
        for (head, stamps) in [("VLP_left", [100, 200]), ("VLP_right", [110, 190])] {
            let folder = layout.scan_folder(head);
            fs::create_dir_all(&folder).unwrap();
            write_stamps(&layout.stamp_file(head), &stamps).unwrap();
            for t in stamps {
                let scan = PointScan::new(4, vec![1.0, 0.0, 0.0, 0.5]).unwrap();
                write_scan(&folder.join(format!("{t}.bin")), &scan).unwrap();
            }
        }
        fs::create_dir_all(root.join("calibration")).unwrap();
        for file in DualHeadRig::Vlp.calibration_files() {
            fs::write(layout.calibration(file), "R: 1 0 0 0 1 0 0 0 1\nT: 0 0 0\n").unwrap();
        }
    }

    #[test]
    fn test_vlp_materializes_on_first_access() {
        let dir = tempfile::tempdir().unwrap();
        vlp_fixture(dir.path());
        let schema = DatasetSchema::new(dir.path());
        assert!(!schema.layout().merged_index(DualHeadRig::Vlp).exists());

        let records = schema.vlp().unwrap();
        assert_eq!(records.head_a.len(), 2);
        assert_eq!(records.head_b[0].sensor_id, "VLP_right");
        let stamps: Vec<Timestamp> = records.merged.iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![105, 195]);
        assert!(schema.layout().merged_index(DualHeadRig::Vlp).exists());

        let SensorPayload::Lidar(frame) = &records.merged[0].payload else {
            panic!("expected lidar payload");
        };
        assert!(frame.merged);
        assert!(frame.scan_path(105).is_file());
    }

    #[test]
    fn test_raw_mode_skips_materialization() {
        let dir = tempfile::tempdir().unwrap();
        vlp_fixture(dir.path());
        let schema = DatasetSchema::new(dir.path());

        let streams = schema
            .records_for(SensorKind::Vlp, SchemaVersions::default(), LidarMode::Raw)
            .unwrap();
        assert_eq!(streams.len(), 2);
        assert!(!schema.layout().merged_index(DualHeadRig::Vlp).exists());

        let streams = schema
            .records_for(SensorKind::Vlp, SchemaVersions::default(), LidarMode::Both)
            .unwrap();
        assert_eq!(streams.len(), 3);
    }

    #[test]
    fn test_stereo_paths() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DatasetLayout::new(dir.path());
        fs::create_dir_all(layout.sensor_data()).unwrap();
        write_stamps(&layout.stamp_file("stereo"), &[42]).unwrap();

        let records = DatasetSchema::new(dir.path()).stereo().unwrap();
        let SensorPayload::Stereo(pair) = &records[0].payload else {
            panic!("expected stereo payload");
        };
        assert_eq!(
            pair.left.image_path,
            dir.path().join("image/stereo_left/42.png")
        );
        assert_eq!(
            pair.right.image_path,
            dir.path().join("image/stereo_right/42.png")
        );
    }

    #[test]
    fn test_unknown_version_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let err = DatasetSchema::new(dir.path()).imu(3).unwrap_err();
        assert!(matches!(
            err,
            IngestionError::Contract(ContractError::UnknownSchemaVersion { version: 3, .. })
        ));
    }

    #[test]
    fn test_imu_records() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DatasetLayout::new(dir.path());
        fs::create_dir_all(layout.sensor_data()).unwrap();
        fs::write(
            layout.sensor_csv("xsens_imu"),
            "10,0,0,0,1,0,0,0\n20,0,0,1,0,0,0,3.14\n",
        )
        .unwrap();

        let records = DatasetSchema::new(dir.path()).imu(1).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].sensor_id, "xsens_imu");
        assert_eq!(records[1].payload.kind_name(), "imu");
    }
}
