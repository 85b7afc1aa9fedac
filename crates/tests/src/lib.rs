//! # Integration Tests
//!
//! End-to-end tests over a small synthetic dataset written to a temp directory.
//!
//! Covers:
//! - Contract snapshot checks
//! - Dual-head merge and cache reuse
//! - Fusion into the MCAP recording
//! - Ground truth, PCD export and pose alignment

#[cfg(test)]
mod fixture {
    use std::fs;
    use std::path::{Path, PathBuf};

    use contracts::Timestamp;
    use ingestion::{write_scan, write_stamps, DatasetLayout, DualHeadRig};
    use sync_engine::PointScan;
    use tempfile::TempDir;

    pub const SEC: Timestamp = 1_000_000_000;
    pub const MS: Timestamp = 1_000_000;

    pub const LEFT: [Timestamp; 3] = [SEC, SEC + 100 * MS, SEC + 200 * MS];
    pub const RIGHT: [Timestamp; 3] = [SEC + 10 * MS, SEC + 110 * MS, SEC + 190 * MS];
    pub const MERGED: [Timestamp; 3] = [SEC + 5 * MS, SEC + 105 * MS, SEC + 195 * MS];

    /// IMU every 50 ms from 1.00 s to 1.30 s, qz = 0.1 * sample index
    pub const IMU_COUNT: usize = 7;
    pub const VRS: [Timestamp; 2] = [SEC + 20 * MS, SEC + 150 * MS];

    /// Dataset `urban_test` below a temp datasets root
    pub struct SyntheticDataset {
        _dir: TempDir,
        pub datasets_root: PathBuf,
        pub root: PathBuf,
    }

    impl SyntheticDataset {
        pub const NAME: &'static str = "urban_test";

        pub fn build() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let datasets_root = dir.path().to_path_buf();
            let root = datasets_root.join(Self::NAME);
            let layout = DatasetLayout::new(&root);
            fs::create_dir_all(layout.sensor_data()).unwrap();

            write_head(&layout, "VLP_left", &LEFT, 2);
            write_head(&layout, "VLP_right", &RIGHT, 3);
            write_calibration(&layout, DualHeadRig::Vlp);
            write_imu(&layout);
            write_vrs_gps(&layout);
            write_global_pose(&root);

            Self {
                _dir: dir,
                datasets_root,
                root,
            }
        }

        pub fn layout(&self) -> DatasetLayout {
            DatasetLayout::new(&self.root)
        }

        /// Replaces the right head's stamps
        pub fn shift_right_head(&self, stamps: &[Timestamp]) {
            let layout = self.layout();
            write_head(&layout, "VLP_right", stamps, 3);
        }
    }

    fn write_head(layout: &DatasetLayout, head: &str, stamps: &[Timestamp], rows: usize) {
        let folder = layout.scan_folder(head);
        fs::create_dir_all(&folder).unwrap();
        write_stamps(&layout.stamp_file(head), stamps).unwrap();
        let scan = PointScan::new(4, [1.0f32, 2.0, 3.0, 0.5].repeat(rows)).unwrap();
        for t in stamps {
            write_scan(&folder.join(format!("{t}.bin")), &scan).unwrap();
        }
    }

    fn write_calibration(layout: &DatasetLayout, rig: DualHeadRig) {
        fs::create_dir_all(layout.root().join("calibration")).unwrap();
        let [a, b] = rig.calibration_files();
        fs::write(layout.calibration(a), "R: 1 0 0 0 1 0 0 0 1\nT: 0 0 0\n").unwrap();
        fs::write(layout.calibration(b), "R: 1 0 0 0 1 0 0 0 1\nT: 0 0 10\n").unwrap();
    }

    fn write_imu(layout: &DatasetLayout) {
        let qz = ["0", "0.1", "0.2", "0.3", "0.4", "0.5", "0.6"];
        let content: String = qz
            .iter()
            .enumerate()
            .map(|(k, qz)| {
                let t = SEC + 50 * MS * k as Timestamp;
                format!("{t},0,0,{qz},1,0,0,0,0,0,0.1,0,0,9.8,0,0,0\n")
            })
            .collect();
        fs::write(layout.sensor_csv("xsens_imu"), content).unwrap();
    }

    fn write_vrs_gps(layout: &DatasetLayout) {
        let content: String = VRS
            .iter()
            .map(|t| {
                format!("{t},37.5,127.0,332000.1,4150000.2,20.5,4,12,0.8,0.01,0.02,0.03,1,0,10.5,19.4,A\n")
            })
            .collect();
        fs::write(layout.sensor_csv("vrs_gps"), content).unwrap();
    }

    fn write_global_pose(root: &Path) {
        let content: String = [(SEC, 10), (SEC + 100 * MS, 20), (SEC + 200 * MS, 30)]
            .iter()
            .map(|(t, x)| format!("{t},1,0,0,{x},0,1,0,0,0,0,1,0\n"))
            .collect();
        fs::write(root.join("global_pose.csv"), content).unwrap();
    }
}

#[cfg(test)]
mod contract_tests {
    use contracts::{ConverterConfig, SkewBounds, StampPair};

    #[test]
    fn test_default_bounds_snapshot() {
        let bounds = SkewBounds::default();
        assert_eq!(bounds.nearest_ns, 500_000_000);
        assert_eq!(bounds.hard_ns, 1_000_000_000);
        assert_eq!(ConverterConfig::default().sync, bounds);
    }

    #[test]
    fn test_merged_stamp_is_floor_average() {
        assert_eq!(StampPair::new(100, 111).average(), 105);
        assert_eq!(StampPair::new(-3, 0).average(), -2);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::fs;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        ContractError, DataSink, LidarMode, PcdEncoding, RecordCompression, SchemaVersions,
        SensorKind, SensorRecord, Timestamp,
    };
    use dispatcher::messages::{BEST_POSE_TOPIC, IMU_TOPIC, POINT_CLOUD_TOPIC};
    use dispatcher::{
        create_dispatcher, dispatch, write_aligned_poses, DispatcherError, PcdSink, SinkSpec,
    };
    use ingestion::{
        build_global_coords, fuse_dataset, read_global_coords, read_scan, read_stamps,
        DatasetSchema, DualHeadRig, IngestionError,
    };
    use sync_engine::align_poses;

    use crate::fixture::{SyntheticDataset, IMU_COUNT, LEFT, MERGED, MS, SEC, VRS};

    const CONFIG: &str = r#"
[dataset]
lidar_mode = "merged"
sensors = ["vlp", "imu", "vrs_gps"]

[versions.default]
imu = 1
vrs_gps = 1

[versions.datasets.urban_test]
imu = 2
vrs_gps = 1
"#;

    fn versions() -> SchemaVersions {
        ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml)
            .unwrap()
            .versions
            .for_dataset(SyntheticDataset::NAME)
    }

    /// Merge -> cache reuse
    #[test]
    fn test_merge_then_reuse_cache() {
        let dataset = SyntheticDataset::build();
        let schema = DatasetSchema::new(&dataset.root);

        let first = schema.materialize(DualHeadRig::Vlp).unwrap();
        assert!(!first.cached);
        assert_eq!(first.index, MERGED.to_vec());
        assert_eq!(first.point_counts, vec![5, 5, 5]);

        let layout = dataset.layout();
        let index_path = layout.merged_index(DualHeadRig::Vlp);
        assert_eq!(read_stamps(&index_path).unwrap(), MERGED.to_vec());

        // Left head points first, right head shifted by its calibration
        let first_scan = layout
            .merged_folder(DualHeadRig::Vlp)
            .join(format!("{}.bin", MERGED[0]));
        let scan = read_scan(&first_scan, 4).unwrap();
        assert_eq!(scan.rows(), 5);
        assert_eq!(scan.row(0), &[1.0, 2.0, 3.0, 0.5]);
        assert_eq!(scan.row(4), &[1.0, 2.0, 13.0, 0.5]);

        let modified = fs::metadata(&index_path).unwrap().modified().unwrap();
        let second = schema.materialize(DualHeadRig::Vlp).unwrap();
        assert!(second.cached);
        assert_eq!(second.index, first.index);
        assert!(second.pairs.is_empty());
        assert_eq!(fs::metadata(&index_path).unwrap().modified().unwrap(), modified);
    }

    #[test]
    fn test_sync_violation_aborts_merge() {
        let dataset = SyntheticDataset::build();
        dataset.shift_right_head(&[2 * SEC, 2 * SEC + 100 * MS, 2 * SEC + 200 * MS]);
        let schema = DatasetSchema::new(&dataset.root);

        let err = schema.materialize(DualHeadRig::Vlp).unwrap_err();
        assert!(
            matches!(
                err,
                IngestionError::Contract(ContractError::SyncViolation { .. })
            ),
            "{err}"
        );
        assert!(!dataset.layout().merged_index(DualHeadRig::Vlp).exists());
    }

    /// Fuse -> globally ordered stream, ties in selection order
    #[test]
    fn test_fused_stream_order() {
        let dataset = SyntheticDataset::build();
        let schema = DatasetSchema::new(&dataset.root);
        let records: Vec<SensorRecord> = fuse_dataset(
            &schema,
            &[SensorKind::Vlp, SensorKind::Imu, SensorKind::VrsGps],
            LidarMode::Merged,
            versions(),
        )
        .unwrap()
        .collect();

        assert_eq!(records.len(), MERGED.len() + IMU_COUNT + VRS.len());
        assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

        let at_tie: Vec<&str> = records
            .iter()
            .filter(|r| r.timestamp == SEC + 150 * MS)
            .map(|r| r.sensor_id.as_str())
            .collect();
        assert_eq!(at_tie, vec!["xsens_imu", "vrs_gps"]);
        assert_eq!(records[1].sensor_id.as_str(), "VLP_merged");
    }

    #[test]
    fn test_raw_mode_leaves_cache_untouched() {
        let dataset = SyntheticDataset::build();
        let schema = DatasetSchema::new(&dataset.root);
        let records: Vec<SensorRecord> = fuse_dataset(
            &schema,
            &[SensorKind::Vlp],
            LidarMode::Raw,
            SchemaVersions::default(),
        )
        .unwrap()
        .collect();

        assert_eq!(records.len(), 6);
        assert_eq!(records[0].sensor_id.as_str(), "VLP_left");
        assert!(!dataset.layout().merged_index(DualHeadRig::Vlp).exists());
    }

    /// Fuse -> RecordSink -> read back
    #[test]
    fn test_record_export_read_back() {
        let dataset = SyntheticDataset::build();
        let schema = DatasetSchema::new(&dataset.root);
        let stream = fuse_dataset(
            &schema,
            &[SensorKind::Vlp, SensorKind::Imu, SensorKind::VrsGps],
            LidarMode::Merged,
            versions(),
        )
        .unwrap();

        let output = dataset.datasets_root.join("urban_test.mcap");
        let dispatcher = create_dispatcher(vec![
            SinkSpec::Log {
                name: "log".to_string(),
            },
            SinkSpec::Record {
                name: "record".to_string(),
                path: output.clone(),
                compression: RecordCompression::Zstd,
            },
        ])
        .unwrap();
        let summary = dispatcher.run(stream).unwrap();
        assert_eq!(summary.records, 12);
        assert_eq!(summary.sinks[1].1.write_count, 12);

        let bytes = fs::read(&output).unwrap();
        let messages: Vec<_> = mcap::MessageStream::new(&bytes)
            .unwrap()
            .map(|m| m.unwrap())
            .collect();
        assert_eq!(messages.len(), 12);

        let count = |topic: &str| {
            messages
                .iter()
                .filter(|m| m.channel.topic == topic)
                .count()
        };
        assert_eq!(count(POINT_CLOUD_TOPIC), 3);
        assert_eq!(count(IMU_TOPIC), IMU_COUNT);
        assert_eq!(count(BEST_POSE_TOPIC), 2);

        let times: Vec<u64> = messages.iter().map(|m| m.log_time).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(times[0], SEC as u64);

        let cloud = messages
            .iter()
            .find(|m| m.channel.topic == POINT_CLOUD_TOPIC)
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&cloud.data).unwrap();
        assert_eq!(body["width"], 5);
        assert_eq!(cloud.publish_time, MERGED[0] as u64);
    }

    #[test]
    fn test_record_export_needs_imu_v2() {
        let dataset = SyntheticDataset::build();
        // Orientation and euler angles only
        let v1_rows = format!("{},0,0,0,1,0,0,0\n{},0,0,0.1,1,0,0,0\n", SEC, SEC + 50 * MS);
        fs::write(dataset.layout().sensor_csv("xsens_imu"), v1_rows).unwrap();

        let schema = DatasetSchema::new(&dataset.root);
        let v1 = SchemaVersions {
            imu: 1,
            vrs_gps: 1,
        };
        let stream = fuse_dataset(&schema, &[SensorKind::Imu], LidarMode::Merged, v1).unwrap();

        let dispatcher = create_dispatcher(vec![SinkSpec::Record {
            name: "record".to_string(),
            path: dataset.datasets_root.join("v1.mcap"),
            compression: RecordCompression::None,
        }])
        .unwrap();
        let err = dispatcher.run(stream).unwrap_err();
        assert!(matches!(
            err,
            DispatcherError::Sink {
                timestamp,
                source: ContractError::SinkWrite { .. },
                ..
            } if timestamp == SEC
        ));
    }

    /// Ground truth -> PCD export -> aligned poses
    #[test]
    fn test_ground_truth_pcd_and_poses() {
        let dataset = SyntheticDataset::build();
        let schema = DatasetSchema::new(&dataset.root);
        let layout = dataset.layout();

        let coords = build_global_coords(&schema, 2).unwrap();
        assert_eq!(coords.len(), 3);
        let trajectory = read_global_coords(&layout.global_coords()).unwrap();
        assert_eq!(trajectory[1].position, [20.0, 0.0, 0.0]);
        // pose at 1.1 s takes the IMU sample at 1.1 s
        assert_eq!(trajectory[1].orientation.z, 0.2);

        let merged = schema.merged_records(DualHeadRig::Vlp).unwrap();
        let mut pcd = PcdSink::new("pcd", layout.pcd_dir(), PcdEncoding::BinaryCompressed).unwrap();
        let summary = dispatch(merged, &mut [&mut pcd as &mut dyn DataSink]).unwrap();
        assert_eq!(summary.records, 3);
        assert_eq!(pcd.frame_stamps(), &MERGED);

        for frame in 0..3 {
            let bytes = fs::read(layout.pcd_dir().join(format!("{frame}.pcd"))).unwrap();
            let text = String::from_utf8_lossy(&bytes);
            assert!(text.contains("POINTS 5\n"), "frame {frame}");
            assert!(text.contains("FIELDS x y z intensity timestamp\n"));
        }

        let aligned = align_poses(pcd.frame_stamps(), &trajectory).unwrap();
        write_aligned_poses(&layout.aligned_poses(), &aligned).unwrap();
        let content = fs::read_to_string(layout.aligned_poses()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], format!("0 {} 10.0 0.0 0.0 0.0 0.0 0.0 1.0", LEFT[0]));
        assert_eq!(lines[2], format!("2 {} 30.0 0.0 0.0 0.0 0.0 0.4 1.0", LEFT[2]));
    }

    #[test]
    fn test_ground_truth_without_imu_samples() {
        let dataset = SyntheticDataset::build();
        fs::write(dataset.layout().sensor_csv("xsens_imu"), "").unwrap();
        let schema = DatasetSchema::new(&dataset.root);

        let err = build_global_coords(&schema, 2).unwrap_err();
        assert!(
            matches!(
                err,
                IngestionError::Contract(ContractError::CountMismatch { .. })
            ),
            "{err}"
        );
    }

    #[test]
    fn test_poses_follow_merged_stamps() {
        let trajectory_stamps: Vec<Timestamp> = vec![SEC, SEC + 100 * MS, SEC + 200 * MS];
        assert_eq!(
            sync_engine::match_nearest(&MERGED, &trajectory_stamps).unwrap(),
            vec![0, 1, 2]
        );
    }
}
