//! RecordSink - writes the fused stream into an MCAP recording
//!
//! VLP scans, IMU samples and VRS GPS fixes map to the Apollo point cloud, IMU and
//! best pose channels. Log and publish time of every message is the record's own
//! nanosecond stamp.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use contracts::{
    ContractError, DataSink, LidarModel, RecordCompression, SensorPayload, SensorRecord, Timestamp,
};
use mcap::records::MessageHeader;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::messages::{
    json_schema, GnssBestPoseMessage, ImuMessage, PointCloudMessage, BEST_POSE_TOPIC, IMU_TOPIC,
    POINT_CLOUD_TOPIC,
};

const PROFILE: &str = "apollo";

struct ChannelState {
    id: u16,
    sequence: u32,
}

/// Sink producing one `.mcap` file
pub struct RecordSink {
    name: String,
    path: PathBuf,
    writer: Option<mcap::Writer<BufWriter<File>>>,
    channels: HashMap<&'static str, ChannelState>,
    written: u64,
}

impl RecordSink {
    pub fn create(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        compression: RecordCompression,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let compression = match compression {
            RecordCompression::None => None,
            RecordCompression::Zstd => Some(mcap::Compression::Zstd),
        };
        let file = File::create(&path)?;
        let writer = mcap::WriteOptions::new()
            .compression(compression)
            .profile(PROFILE)
            .library(&format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")))
            .create(BufWriter::new(file))
            .map_err(|e| ContractError::sink_write(&name, e.to_string()))?;

        Ok(Self {
            name,
            path,
            writer: Some(writer),
            channels: HashMap::new(),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Messages written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    fn publish<M: Serialize>(
        &mut self,
        topic: &'static str,
        timestamp: Timestamp,
        build: impl FnOnce(u32) -> M,
    ) -> Result<(), ContractError> {
        let name = self.name.clone();
        let fail = |message: String| ContractError::sink_write(&name, message);
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| fail("sink already closed".to_string()))?;

        let channel = match self.channels.entry(topic) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                let (schema_name, schema) = json_schema(topic)
                    .ok_or_else(|| fail(format!("no schema for topic {topic}")))?;
                let schema_id = writer
                    .add_schema(schema_name, "jsonschema", schema.as_bytes())
                    .map_err(|e| fail(e.to_string()))?;
                let id = writer
                    .add_channel(schema_id, topic, "json", &BTreeMap::new())
                    .map_err(|e| fail(e.to_string()))?;
                debug!(topic, channel = id, "channel registered");
                entry.insert(ChannelState { id, sequence: 0 })
            }
        };

        let message = build(channel.sequence);
        let data = serde_json::to_vec(&message).map_err(|e| fail(e.to_string()))?;
        let time = u64::try_from(timestamp)
            .map_err(|_| fail(format!("negative timestamp {timestamp}")))?;

        writer
            .write_to_known_channel(
                &MessageHeader {
                    channel_id: channel.id,
                    sequence: channel.sequence,
                    log_time: time,
                    publish_time: time,
                },
                &data,
            )
            .map_err(|e| fail(e.to_string()))?;

        channel.sequence += 1;
        self.written += 1;
        Ok(())
    }
}

impl DataSink for RecordSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "record_sink_write",
        skip(self, record),
        fields(sink = %self.name, sensor = %record.sensor_id, timestamp = record.timestamp)
    )]
    fn write(&mut self, record: &SensorRecord) -> Result<(), ContractError> {
        let t = record.timestamp;
        match &record.payload {
            SensorPayload::Lidar(frame) if frame.model == LidarModel::Vlp => {
                let scan = ingestion::load_scan(&frame.scan_path(t), frame.columns())
                    .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
                if scan.columns() != 4 {
                    return Err(ContractError::invalid_scan(format!(
                        "point cloud export needs 4 columns, got {}",
                        scan.columns()
                    )));
                }
                self.publish(POINT_CLOUD_TOPIC, t, |seq| {
                    PointCloudMessage::from_scan(&scan, t, seq)
                })
            }
            SensorPayload::Imu(imu) => {
                let Some(inertial) = &imu.inertial else {
                    return Err(ContractError::sink_write(
                        &self.name,
                        "IMU export needs schema version 2 (acceleration and gyroscope)",
                    ));
                };
                self.publish(IMU_TOPIC, t, |seq| ImuMessage::new(inertial, t, seq))
            }
            SensorPayload::VrsGps(gps) => self.publish(BEST_POSE_TOPIC, t, |seq| {
                GnssBestPoseMessage::from_vrs_gps(gps, t, seq)
            }),
            other => Err(ContractError::unsupported_record(
                &self.name,
                other.kind_name(),
            )),
        }
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "record_sink_close", skip(self))]
    fn close(&mut self) -> Result<(), ContractError> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        writer
            .finish()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        info!(
            sink = %self.name,
            messages = self.written,
            channels = self.channels.len(),
            path = %self.path.display(),
            "RecordSink closed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        AltimeterData, ImuData, ImuInertial, LidarFrame, Quaternion, Vector3, VrsGpsData,
    };
    use metrics::{
        Counter, CounterFn, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
    };
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use sync_engine::PointScan;

    fn imu_record(t: Timestamp, inertial: bool) -> SensorRecord {
        let imu = ImuData {
            orientation: Quaternion::identity(),
            euler: Vector3::default(),
            inertial: inertial.then(|| ImuInertial {
                gyroscope: Vector3::new(0.0, 0.0, 0.1),
                acceleration: Vector3::new(0.0, 0.0, 9.8),
                magnetic_field: Vector3::default(),
            }),
        };
        SensorRecord::new("xsens_imu".into(), t, SensorPayload::Imu(imu))
    }

    fn gps_record(t: Timestamp) -> SensorRecord {
        let gps = VrsGpsData {
            latitude: 37.5,
            longitude: 127.0,
            utm_x: 0.0,
            utm_y: 0.0,
            altitude: 20.0,
            fix_state: 4,
            num_satellites: 10,
            horizontal_precision: 0.7,
            latitude_std: 0.01,
            longitude_std: 0.02,
            altitude_std: 0.03,
            heading_validate_flag: 0,
            magnetic_global_heading: 0.0,
            speed_in_knot: 0.0,
            speed_in_km: 0.0,
            gnvtg_mode: "A".to_string(),
            orthometric_altitude: None,
        };
        SensorRecord::new("vrs_gps".into(), t, SensorPayload::VrsGps(gps))
    }

    #[test]
    fn test_messages_read_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let scans = dir.path().join("VLP_merged");
        std::fs::create_dir_all(&scans).unwrap();
        let scan = PointScan::new(4, vec![1.0, 2.0, 3.0, 0.5]).unwrap();
        ingestion::write_scan(&scans.join("150.bin"), &scan).unwrap();
        let lidar = SensorRecord::new(
            "VLP_merged".into(),
            150,
            SensorPayload::Lidar(LidarFrame {
                model: LidarModel::Vlp,
                data_folder: scans,
                merged: true,
            }),
        );

        let path = dir.path().join("out.mcap");
        let mut sink = RecordSink::create("record", &path, RecordCompression::None).unwrap();
        for record in [imu_record(100, true), lidar, gps_record(200), imu_record(300, true)] {
            sink.write(&record).unwrap();
        }
        sink.close().unwrap();
        assert_eq!(sink.written(), 4);

        let bytes = std::fs::read(&path).unwrap();
        let messages: Vec<_> = mcap::MessageStream::new(&bytes)
            .unwrap()
            .map(|m| m.unwrap())
            .collect();
        let topics: Vec<&str> = messages.iter().map(|m| m.channel.topic.as_str()).collect();
        assert_eq!(
            topics,
            vec![IMU_TOPIC, POINT_CLOUD_TOPIC, BEST_POSE_TOPIC, IMU_TOPIC]
        );
        let times: Vec<u64> = messages.iter().map(|m| m.log_time).collect();
        assert_eq!(times, vec![100, 150, 200, 300]);
        assert_eq!(messages[3].sequence, 1);

        let cloud: serde_json::Value = serde_json::from_slice(&messages[1].data).unwrap();
        assert_eq!(cloud["frame_id"], "velodyne");
        assert_eq!(cloud["width"], 1);
        let pose: serde_json::Value = serde_json::from_slice(&messages[2].data).unwrap();
        assert_eq!(pose["latitude_std_dev"], 0.01);
    }

    #[test]
    fn test_unsupported_kinds_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink =
            RecordSink::create("record", dir.path().join("x.mcap"), RecordCompression::None)
                .unwrap();
        let record = SensorRecord::new(
            "altimeter".into(),
            1,
            SensorPayload::Altimeter(AltimeterData { altitude: 3.0 }),
        );
        assert!(matches!(
            sink.write(&record),
            Err(ContractError::UnsupportedRecord { .. })
        ));
        assert!(matches!(
            sink.write(&imu_record(1, false)),
            Err(ContractError::SinkWrite { .. })
        ));
    }

    /// Counts increments of `kuc_records_exported_total`
    struct ExportCounter(Arc<AtomicU64>);

    impl CounterFn for ExportCounter {
        fn increment(&self, value: u64) {
            self.0.fetch_add(value, Ordering::Relaxed);
        }

        fn absolute(&self, value: u64) {
            self.0.store(value, Ordering::Relaxed);
        }
    }

    struct ExportRecorder(Arc<AtomicU64>);

    impl Recorder for ExportRecorder {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
            if key.name() == "kuc_records_exported_total" {
                Counter::from_arc(Arc::new(ExportCounter(Arc::clone(&self.0))))
            } else {
                Counter::noop()
            }
        }

        fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
            Gauge::noop()
        }

        fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
            Histogram::noop()
        }
    }

    #[test]
    fn test_export_counted_once_per_message() {
        let dir = tempfile::tempdir().unwrap();
        let exported = Arc::new(AtomicU64::new(0));
        let recorder = ExportRecorder(Arc::clone(&exported));

        let summary = metrics::with_local_recorder(&recorder, || {
            let mut sink =
                RecordSink::create("record", dir.path().join("m.mcap"), RecordCompression::None)
                    .unwrap();
            let records = vec![gps_record(1), imu_record(2, true), gps_record(3)];
            crate::dispatch(records, &mut [&mut sink as &mut dyn DataSink]).unwrap()
        });

        assert_eq!(summary.records, 3);
        assert_eq!(exported.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_zstd_compression() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("z.mcap");
        let mut sink = RecordSink::create("record", &path, RecordCompression::Zstd).unwrap();
        sink.write(&gps_record(5)).unwrap();
        sink.close().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let count = mcap::MessageStream::new(&bytes).unwrap().count();
        assert_eq!(count, 1);
    }
}
