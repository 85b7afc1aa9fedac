//! SensorRecord - Ingestion output
//!
//! One timestamped measurement from the dataset. File-backed sensors (lidar, cameras)
//! carry only the location of their payload; everything else carries decoded values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::{SensorId, Timestamp, Timestamped};

/// Sensor families that can be selected for fusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// 3D lidar pair (left / right Velodyne)
    Vlp,
    /// 2D lidar pair (back / middle SICK)
    Sick,
    Stereo,
    Altimeter,
    Encoder,
    Fog,
    Gps,
    VrsGps,
    Imu,
}

impl SensorKind {
    pub const ALL: [SensorKind; 9] = [
        Self::Vlp,
        Self::Sick,
        Self::Stereo,
        Self::Altimeter,
        Self::Encoder,
        Self::Fog,
        Self::Gps,
        Self::VrsGps,
        Self::Imu,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vlp => "vlp",
            Self::Sick => "sick",
            Self::Stereo => "stereo",
            Self::Altimeter => "altimeter",
            Self::Encoder => "encoder",
            Self::Fog => "fog",
            Self::Gps => "gps",
            Self::VrsGps => "vrs_gps",
            Self::Imu => "imu",
        }
    }

    /// Whether the sensor is a two-head lidar rig with a merged product
    pub fn is_dual_head(self) -> bool {
        matches!(self, Self::Vlp | Self::Sick)
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered)
            .ok_or_else(|| format!("unknown sensor kind '{s}'"))
    }
}

/// A single dataset measurement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorRecord {
    /// Source identifier, e.g. `VLP_left` or `xsens_imu`
    pub sensor_id: SensorId,

    /// Nanosecond timestamp
    pub timestamp: Timestamp,

    /// Decoded data or payload location
    pub payload: SensorPayload,
}

impl SensorRecord {
    pub fn new(sensor_id: SensorId, timestamp: Timestamp, payload: SensorPayload) -> Self {
        Self {
            sensor_id,
            timestamp,
            payload,
        }
    }
}

impl Timestamped for SensorRecord {
    #[inline]
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// Sensor payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SensorPayload {
    /// Lidar scan stored as `<folder>/<timestamp>.bin`
    Lidar(LidarFrame),

    /// Single camera image
    Camera(CameraFrame),

    /// Stereo image pair
    Stereo(StereoFrame),

    Altimeter(AltimeterData),

    Encoder(EncoderData),

    /// Fiber optic gyro increments
    Fog(FogData),

    Gps(GpsData),

    VrsGps(VrsGpsData),

    Imu(ImuData),
}

impl SensorPayload {
    /// Short kind name used in logs and error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Lidar(frame) => match frame.model {
                LidarModel::Vlp => "vlp",
                LidarModel::Sick => "sick",
            },
            Self::Camera(_) => "camera",
            Self::Stereo(_) => "stereo",
            Self::Altimeter(_) => "altimeter",
            Self::Encoder(_) => "encoder",
            Self::Fog(_) => "fog",
            Self::Gps(_) => "gps",
            Self::VrsGps(_) => "vrs_gps",
            Self::Imu(_) => "imu",
        }
    }
}

/// Lidar hardware family, which fixes the on-disk column layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LidarModel {
    /// Velodyne VLP-16: x, y, z, intensity
    Vlp,
    /// SICK LMS: range, intensity on a fixed angular grid
    Sick,
}

impl LidarModel {
    /// Number of f32 columns per raw row on disk
    pub fn raw_columns(self) -> usize {
        match self {
            Self::Vlp => 4,
            Self::Sick => 2,
        }
    }
}

/// Reference to a lidar scan on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LidarFrame {
    pub model: LidarModel,

    /// Folder holding `<timestamp>.bin` files
    pub data_folder: PathBuf,

    /// Merged scans are already in the vehicle frame with 4 columns
    #[serde(default)]
    pub merged: bool,
}

impl LidarFrame {
    /// Path of the scan recorded at `timestamp`
    pub fn scan_path(&self, timestamp: Timestamp) -> PathBuf {
        self.data_folder.join(format!("{timestamp}.bin"))
    }

    /// Columns per row of the stored scan
    pub fn columns(&self) -> usize {
        if self.merged {
            4
        } else {
            self.model.raw_columns()
        }
    }
}

/// Reference to one image on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraFrame {
    pub image_path: PathBuf,
}

/// Reference to a stereo image pair on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StereoFrame {
    pub left: CameraFrame,
    pub right: CameraFrame,
}

impl StereoFrame {
    /// Builds the `stereo_left/<t>.png` and `stereo_right/<t>.png` pair under `image_root`
    pub fn new(image_root: &Path, timestamp: Timestamp) -> Self {
        Self {
            left: CameraFrame {
                image_path: image_root
                    .join("stereo_left")
                    .join(format!("{timestamp}.png")),
            },
            right: CameraFrame {
                image_path: image_root
                    .join("stereo_right")
                    .join(format!("{timestamp}.png")),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AltimeterData {
    /// Altitude (m)
    pub altitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderData {
    pub left_count: i64,
    pub right_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FogData {
    pub delta_roll: f64,
    pub delta_pitch: f64,
    pub delta_yaw: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsData {
    /// Latitude (deg)
    pub latitude: f64,
    /// Longitude (deg)
    pub longitude: f64,
    /// Altitude (m)
    pub altitude: f64,
    /// Row-major 3x3 position covariance
    pub position_covariance: [f64; 9],
}

/// RTK (VRS) GPS fix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VrsGpsData {
    pub latitude: f64,
    pub longitude: f64,
    pub utm_x: f64,
    pub utm_y: f64,
    pub altitude: f64,
    pub fix_state: i8,
    pub num_satellites: i8,
    pub horizontal_precision: f64,
    pub latitude_std: f64,
    pub longitude_std: f64,
    pub altitude_std: f64,
    pub heading_validate_flag: i8,
    pub magnetic_global_heading: f64,
    pub speed_in_knot: f64,
    pub speed_in_km: f64,
    /// NMEA GNVTG mode indicator
    pub gnvtg_mode: String,
    /// Present from schema version 2 on
    pub orthometric_altitude: Option<f64>,
}

/// Xsens IMU sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImuData {
    pub orientation: Quaternion,
    /// Euler angles (rad)
    pub euler: Vector3,
    /// Present from schema version 2 on
    pub inertial: Option<ImuInertial>,
}

/// Raw inertial channels of a version 2 IMU row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImuInertial {
    /// Angular velocity (rad/s)
    pub gyroscope: Vector3,
    /// Linear acceleration (m/s²)
    pub acceleration: Vector3,
    pub magnetic_field: Vector3,
}

/// 3D vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Orientation quaternion in (x, y, z, w) order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}
