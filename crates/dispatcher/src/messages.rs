//! Apollo-style message bodies written to the record container.
//!
//! Messages are JSON encoded; each channel carries a JSON schema so generic
//! viewers can decode them.

use contracts::{ImuData, ImuInertial, Timestamp, VrsGpsData};
use serde::Serialize;
use sync_engine::PointScan;

pub const POINT_CLOUD_TOPIC: &str = "/apollo/sensor/velodyne/compensator/PointCloud2";
pub const IMU_TOPIC: &str = "/apollo/sensor/gnss/imu";
pub const BEST_POSE_TOPIC: &str = "/apollo/sensor/gnss/best_pose";

/// Frame id of exported lidar clouds
pub const LIDAR_FRAME_ID: &str = "velodyne";

const NS_PER_SEC: f64 = 1e9;

/// Nanosecond stamp to floating seconds
pub fn to_seconds(timestamp: Timestamp) -> f64 {
    timestamp as f64 / NS_PER_SEC
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Header {
    pub timestamp_sec: f64,
    pub module_name: String,
    pub sequence_num: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<String>,
}

impl Header {
    pub fn new(timestamp: Timestamp, sequence_num: u32, frame_id: Option<&str>) -> Self {
        Self {
            timestamp_sec: to_seconds(timestamp),
            module_name: env!("CARGO_PKG_NAME").to_string(),
            sequence_num,
            frame_id: frame_id.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<contracts::Vector3> for Point3D {
    fn from(v: contracts::Vector3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointXyzit {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub intensity: f32,
    pub timestamp: u64,
}

/// `/apollo/sensor/velodyne/compensator/PointCloud2`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointCloudMessage {
    pub header: Header,
    pub frame_id: String,
    pub is_dense: bool,
    pub measurement_time: f64,
    pub width: u32,
    pub height: u32,
    pub point: Vec<PointXyzit>,
}

impl PointCloudMessage {
    /// Builds a cloud from a 4-column `(x, y, z, intensity)` scan
    pub fn from_scan(scan: &PointScan, timestamp: Timestamp, sequence: u32) -> Self {
        let stamp = u64::try_from(timestamp).unwrap_or_default();
        let point: Vec<PointXyzit> = scan
            .iter_rows()
            .map(|row| PointXyzit {
                x: row[0],
                y: row[1],
                z: row[2],
                intensity: row[3],
                timestamp: stamp,
            })
            .collect();

        Self {
            header: Header::new(timestamp, sequence, Some(LIDAR_FRAME_ID)),
            frame_id: LIDAR_FRAME_ID.to_string(),
            is_dense: false,
            measurement_time: to_seconds(timestamp),
            width: point.len() as u32,
            height: 1,
            point,
        }
    }
}

/// `/apollo/sensor/gnss/imu`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImuMessage {
    pub header: Header,
    pub measurement_time: f64,
    pub linear_acceleration: Point3D,
    pub angular_velocity: Point3D,
}

impl ImuMessage {
    pub fn new(inertial: &ImuInertial, timestamp: Timestamp, sequence: u32) -> Self {
        Self {
            header: Header::new(timestamp, sequence, None),
            measurement_time: to_seconds(timestamp),
            linear_acceleration: inertial.acceleration.into(),
            angular_velocity: inertial.gyroscope.into(),
        }
    }

    /// `None` for IMU rows without inertial fields (schema v1)
    pub fn from_imu(imu: &ImuData, timestamp: Timestamp, sequence: u32) -> Option<Self> {
        imu.inertial
            .as_ref()
            .map(|inertial| Self::new(inertial, timestamp, sequence))
    }
}

/// `/apollo/sensor/gnss/best_pose`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GnssBestPoseMessage {
    pub header: Header,
    pub measurement_time: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub height_msl: f64,
    pub undulation: f64,
    pub datum_id: String,
    pub latitude_std_dev: f64,
    pub longitude_std_dev: f64,
    pub height_std_dev: f64,
    pub num_sats_tracked: i8,
}

impl GnssBestPoseMessage {
    pub fn from_vrs_gps(gps: &VrsGpsData, timestamp: Timestamp, sequence: u32) -> Self {
        Self {
            header: Header::new(timestamp, sequence, None),
            measurement_time: to_seconds(timestamp),
            latitude: gps.latitude,
            longitude: gps.longitude,
            height_msl: gps.altitude,
            undulation: 0.0,
            datum_id: "WGS84".to_string(),
            latitude_std_dev: gps.latitude_std,
            longitude_std_dev: gps.longitude_std,
            height_std_dev: gps.altitude_std,
            num_sats_tracked: gps.num_satellites,
        }
    }
}

const HEADER_SCHEMA: &str = r#"{"type":"object","properties":{"timestamp_sec":{"type":"number"},"module_name":{"type":"string"},"sequence_num":{"type":"integer"},"frame_id":{"type":"string"}}}"#;
const POINT3D_SCHEMA: &str = r#"{"type":"object","properties":{"x":{"type":"number"},"y":{"type":"number"},"z":{"type":"number"}}}"#;

/// JSON schema of a channel's message body: `(schema name, schema text)`
pub fn json_schema(topic: &str) -> Option<(&'static str, String)> {
    let schema = match topic {
        POINT_CLOUD_TOPIC => (
            "apollo.drivers.PointCloud",
            format!(
                r#"{{"type":"object","properties":{{"header":{HEADER_SCHEMA},"frame_id":{{"type":"string"}},"is_dense":{{"type":"boolean"}},"measurement_time":{{"type":"number"}},"width":{{"type":"integer"}},"height":{{"type":"integer"}},"point":{{"type":"array","items":{{"type":"object","properties":{{"x":{{"type":"number"}},"y":{{"type":"number"}},"z":{{"type":"number"}},"intensity":{{"type":"number"}},"timestamp":{{"type":"integer"}}}}}}}}}}}}"#
            ),
        ),
        IMU_TOPIC => (
            "apollo.drivers.gnss.Imu",
            format!(
                r#"{{"type":"object","properties":{{"header":{HEADER_SCHEMA},"measurement_time":{{"type":"number"}},"linear_acceleration":{POINT3D_SCHEMA},"angular_velocity":{POINT3D_SCHEMA}}}}}"#
            ),
        ),
        BEST_POSE_TOPIC => (
            "apollo.drivers.gnss.GnssBestPose",
            format!(
                r#"{{"type":"object","properties":{{"header":{HEADER_SCHEMA},"measurement_time":{{"type":"number"}},"latitude":{{"type":"number"}},"longitude":{{"type":"number"}},"height_msl":{{"type":"number"}},"undulation":{{"type":"number"}},"datum_id":{{"type":"string"}},"latitude_std_dev":{{"type":"number"}},"longitude_std_dev":{{"type":"number"}},"height_std_dev":{{"type":"number"}},"num_sats_tracked":{{"type":"integer"}}}}}}"#
            ),
        ),
        _ => return None,
    };
    Some(schema)
}
