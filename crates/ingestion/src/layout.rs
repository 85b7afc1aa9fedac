//! Fixed on-disk layout of one dataset directory.

use std::path::{Path, PathBuf};

use contracts::{LidarModel, SensorKind};

/// Paths below a dataset root
///
/// ```text
/// <root>/sensor_data/<SENSOR>_stamp.csv
/// <root>/sensor_data/<SENSOR>/<timestamp>.bin
/// <root>/sensor_data/{xsens_imu,gps,vrs_gps,encoder,fog,altimeter}.csv
/// <root>/calibration/Vehicle2<Head>.txt
/// <root>/image/stereo_{left,right}/<timestamp>.png
/// <root>/global_pose.csv, <root>/global_coors.csv
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    root: PathBuf,
}

impl DatasetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory name of the dataset, used for per-dataset version lookup
    pub fn name(&self) -> Option<&str> {
        self.root.file_name().and_then(|n| n.to_str())
    }

    pub fn sensor_data(&self) -> PathBuf {
        self.root.join("sensor_data")
    }

    /// `sensor_data/<sensor>_stamp.csv`
    pub fn stamp_file(&self, sensor: &str) -> PathBuf {
        self.sensor_data().join(format!("{sensor}_stamp.csv"))
    }

    /// `sensor_data/<sensor>/` holding one `<timestamp>.bin` per record
    pub fn scan_folder(&self, sensor: &str) -> PathBuf {
        self.sensor_data().join(sensor)
    }

    /// `sensor_data/<file>.csv` for single-file sensors
    pub fn sensor_csv(&self, file: &str) -> PathBuf {
        self.sensor_data().join(format!("{file}.csv"))
    }

    pub fn calibration(&self, file: &str) -> PathBuf {
        self.root.join("calibration").join(file)
    }

    pub fn image_root(&self) -> PathBuf {
        self.root.join("image")
    }

    pub fn global_pose(&self) -> PathBuf {
        self.root.join("global_pose.csv")
    }

    pub fn global_coords(&self) -> PathBuf {
        self.root.join("global_coors.csv")
    }

    pub fn pcd_dir(&self) -> PathBuf {
        self.root.join("pcds")
    }

    pub fn aligned_poses(&self) -> PathBuf {
        self.root.join("aligned_poses.txt")
    }

    /// Index of materialized merged scans for `rig`
    pub fn merged_index(&self, rig: DualHeadRig) -> PathBuf {
        self.stamp_file(rig.merged_name())
    }

    pub fn merged_folder(&self, rig: DualHeadRig) -> PathBuf {
        self.scan_folder(rig.merged_name())
    }
}

/// Lidar rig made of two heads whose scans can be merged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DualHeadRig {
    /// Left / right Velodyne
    Vlp,
    /// Back / middle SICK
    Sick,
}

impl DualHeadRig {
    pub const ALL: [DualHeadRig; 2] = [Self::Vlp, Self::Sick];

    pub fn from_kind(kind: SensorKind) -> Option<Self> {
        match kind {
            SensorKind::Vlp => Some(Self::Vlp),
            SensorKind::Sick => Some(Self::Sick),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Vlp => "vlp",
            Self::Sick => "sick",
        }
    }

    pub fn model(self) -> LidarModel {
        match self {
            Self::Vlp => LidarModel::Vlp,
            Self::Sick => LidarModel::Sick,
        }
    }

    /// Sensor names of the two heads, first head first
    pub fn heads(self) -> [&'static str; 2] {
        match self {
            Self::Vlp => ["VLP_left", "VLP_right"],
            Self::Sick => ["SICK_back", "SICK_middle"],
        }
    }

    /// Calibration file of each head, in [`Self::heads`] order
    pub fn calibration_files(self) -> [&'static str; 2] {
        match self {
            Self::Vlp => ["Vehicle2LeftVLP.txt", "Vehicle2RightVLP.txt"],
            Self::Sick => ["Vehicle2BackSick.txt", "Vehicle2MiddleSick.txt"],
        }
    }

    pub fn merged_name(self) -> &'static str {
        match self {
            Self::Vlp => "VLP_merged",
            Self::Sick => "SICK_merged",
        }
    }
}

impl std::str::FromStr for DualHeadRig {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vlp" => Ok(Self::Vlp),
            "sick" => Ok(Self::Sick),
            other => Err(format!("unknown rig '{other}' (expected vlp or sick)")),
        }
    }
}
