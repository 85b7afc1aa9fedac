//! ConverterConfig - Config Loader output
//!
//! Describes which sensors to fuse, which column schema versions the dataset uses,
//! the dual-head skew bounds and the export encodings. Every field has a default so
//! an empty file (or no file at all) is a valid configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::{ContractError, LidarMode, SensorKind, SkewBounds};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete converter configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ConverterConfig {
    #[serde(default)]
    pub version: ConfigVersion,

    /// Sensor selection and lidar mode
    #[serde(default)]
    #[validate(nested)]
    pub dataset: DatasetConfig,

    /// Column schema versions
    #[serde(default)]
    #[validate(nested)]
    pub versions: VersionTable,

    /// Dual-head pairing bounds
    #[serde(default)]
    pub sync: SkewBounds,

    /// Output encodings
    #[serde(default)]
    pub export: ExportConfig,
}

/// Sensor selection for the fused stream
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatasetConfig {
    #[serde(default)]
    pub lidar_mode: LidarMode,

    #[serde(default = "default_sensors")]
    #[validate(length(min = 1, message = "at least one sensor must be selected"))]
    pub sensors: Vec<SensorKind>,
}

fn default_sensors() -> Vec<SensorKind> {
    vec![SensorKind::Vlp, SensorKind::Imu, SensorKind::VrsGps]
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            lidar_mode: LidarMode::default(),
            sensors: default_sensors(),
        }
    }
}

/// Column schema versions for the versioned CSV files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SchemaVersions {
    #[serde(default = "default_imu_version")]
    #[validate(range(min = 1, max = 2))]
    pub imu: u8,

    #[serde(default = "default_vrs_gps_version")]
    #[validate(range(min = 1, max = 2))]
    pub vrs_gps: u8,
}

/// v2 carries the inertial columns the record export needs
fn default_imu_version() -> u8 {
    2
}

fn default_vrs_gps_version() -> u8 {
    1
}

impl Default for SchemaVersions {
    fn default() -> Self {
        Self {
            imu: default_imu_version(),
            vrs_gps: default_vrs_gps_version(),
        }
    }
}

/// Default versions plus per-dataset overrides keyed by dataset name
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct VersionTable {
    #[serde(default)]
    #[validate(nested)]
    pub default: SchemaVersions,

    #[serde(default)]
    pub datasets: HashMap<String, SchemaVersions>,
}

impl VersionTable {
    /// Versions for `dataset`, falling back to the defaults
    pub fn for_dataset(&self, dataset: &str) -> SchemaVersions {
        self.datasets.get(dataset).copied().unwrap_or(self.default)
    }
}

/// Parsed column schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SchemaVersion {
    V1,
    /// Adds trailing columns to IMU and VRS GPS rows
    V2,
}

impl SchemaVersion {
    /// Accepts 1 or 2; anything else is [`ContractError::UnknownSchemaVersion`]
    pub fn parse(schema: &str, version: u8) -> Result<Self, ContractError> {
        match version {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            other => Err(ContractError::UnknownSchemaVersion {
                schema: schema.to_string(),
                version: other,
            }),
        }
    }
}

/// Export encodings
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub pcd_encoding: PcdEncoding,

    #[serde(default)]
    pub record_compression: RecordCompression,
}

/// PCD `DATA` section encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PcdEncoding {
    Binary,
    #[default]
    BinaryCompressed,
}

/// Chunk compression of the record container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordCompression {
    #[default]
    None,
    Zstd,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConverterConfig::default();
        assert_eq!(config.dataset.lidar_mode, LidarMode::Merged);
        assert_eq!(
            config.dataset.sensors,
            vec![SensorKind::Vlp, SensorKind::Imu, SensorKind::VrsGps]
        );
        assert_eq!(config.versions.default.imu, 2);
        assert_eq!(config.versions.default.vrs_gps, 1);
        assert_eq!(config.export.pcd_encoding, PcdEncoding::BinaryCompressed);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_version_override_lookup() {
        let mut table = VersionTable::default();
        table.datasets.insert(
            "urban39".into(),
            SchemaVersions {
                imu: 1,
                vrs_gps: 2,
            },
        );
        assert_eq!(table.for_dataset("urban39").imu, 1);
        assert_eq!(table.for_dataset("urban39").vrs_gps, 2);
        assert_eq!(table.for_dataset("urban28"), SchemaVersions::default());
    }

    #[test]
    fn test_schema_version_parse() {
        assert_eq!(SchemaVersion::parse("imu", 2).unwrap(), SchemaVersion::V2);
        let err = SchemaVersion::parse("vrs_gps", 7).unwrap_err();
        assert!(matches!(
            err,
            ContractError::UnknownSchemaVersion { version: 7, .. }
        ));
    }

    #[test]
    fn test_derive_rejects_out_of_range_version() {
        let mut config = ConverterConfig::default();
        config.versions.default.vrs_gps = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_derive_rejects_empty_selection() {
        let mut config = ConverterConfig::default();
        config.dataset.sensors.clear();
        assert!(config.validate().is_err());
    }
}
