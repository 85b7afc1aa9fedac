//! Configuration validation
//!
//! Rules:
//! - field ranges declared with `#[validate]` on the config types
//! - schema versions in every per-dataset override are 1 or 2
//! - nearest_skew_ns > 0 and nearest_skew_ns <= hard_skew_ns
//! - no sensor kind selected twice

use std::collections::HashSet;

use contracts::{ContractError, ConverterConfig, SchemaVersion, SchemaVersions};
use ::validator::Validate;

/// Validate a ConverterConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &ConverterConfig) -> Result<(), ContractError> {
    validate_fields(config)?;
    validate_sensor_selection(config)?;
    validate_dataset_versions(config)?;
    validate_skew_bounds(config)?;
    Ok(())
}

/// Run the derived field-level rules
fn validate_fields(config: &ConverterConfig) -> Result<(), ContractError> {
    config.validate().map_err(|errors| {
        let field = errors
            .errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "config".to_string());
        ContractError::config_validation(field, errors.to_string())
    })
}

fn validate_sensor_selection(config: &ConverterConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for kind in &config.dataset.sensors {
        if !seen.insert(kind) {
            return Err(ContractError::config_validation(
                format!("dataset.sensors[{kind}]"),
                "duplicate sensor kind",
            ));
        }
    }
    Ok(())
}

fn validate_dataset_versions(config: &ConverterConfig) -> Result<(), ContractError> {
    let mut names: Vec<_> = config.versions.datasets.keys().collect();
    names.sort();
    for name in names {
        let SchemaVersions { imu, vrs_gps } = config.versions.datasets[name];
        for (schema, version) in [("imu", imu), ("vrs_gps", vrs_gps)] {
            SchemaVersion::parse(schema, version).map_err(|e| {
                ContractError::config_validation(
                    format!("versions.datasets.{name}.{schema}"),
                    e.to_string(),
                )
            })?;
        }
    }
    Ok(())
}

fn validate_skew_bounds(config: &ConverterConfig) -> Result<(), ContractError> {
    let sync = &config.sync;

    if sync.nearest_ns == 0 {
        return Err(ContractError::config_validation(
            "sync.nearest_skew_ns",
            "nearest_skew_ns must be > 0",
        ));
    }

    if sync.nearest_ns > sync.hard_ns {
        return Err(ContractError::config_validation(
            "sync.nearest_skew_ns / sync.hard_skew_ns",
            format!(
                "nearest_skew_ns ({}) must be <= hard_skew_ns ({})",
                sync.nearest_ns, sync.hard_ns
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SensorKind;

    #[test]
    fn test_valid_config() {
        assert!(validate(&ConverterConfig::default()).is_ok());
    }

    #[test]
    fn test_duplicate_sensor_kind() {
        let mut config = ConverterConfig::default();
        config.dataset.sensors.push(SensorKind::Vlp);
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate sensor kind"));
    }

    #[test]
    fn test_default_version_out_of_range() {
        let mut config = ConverterConfig::default();
        config.versions.default.imu = 0;
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { .. }));
    }

    #[test]
    fn test_dataset_version_out_of_range() {
        let mut config = ConverterConfig::default();
        config
            .versions
            .datasets
            .insert("urban26".into(), SchemaVersions { imu: 2, vrs_gps: 5 });
        let err = validate(&config).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("versions.datasets.urban26.vrs_gps"), "{msg}");
        assert!(msg.contains("unknown vrs_gps schema version 5"), "{msg}");
    }

    #[test]
    fn test_nearest_above_hard() {
        let mut config = ConverterConfig::default();
        config.sync.nearest_ns = 2_000_000_000;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("must be <="));
    }

    #[test]
    fn test_zero_nearest_bound() {
        let mut config = ConverterConfig::default();
        config.sync.nearest_ns = 0;
        assert!(validate(&config).is_err());
    }
}
