//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{ConverterConfig, LidarMode, SensorKind};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::error::CliError;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    lidar_mode: String,
    sensors: Vec<String>,
    default_imu_version: u8,
    default_vrs_gps_version: u8,
    dataset_overrides: usize,
    nearest_skew_ns: u64,
    hard_skew_ns: u64,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    match result.error {
        None => Ok(()),
        Some(error) => Err(CliError::config_validation(error).into()),
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(CliError::config_not_found(&args.config).to_string()),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    lidar_mode: config.dataset.lidar_mode.to_string(),
                    sensors: config
                        .dataset
                        .sensors
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                    default_imu_version: config.versions.default.imu,
                    default_vrs_gps_version: config.versions.default.vrs_gps,
                    dataset_overrides: config.versions.datasets.len(),
                    nearest_skew_ns: config.sync.nearest_ns,
                    hard_skew_ns: config.sync.hard_ns,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &ConverterConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let sensors = &config.dataset.sensors;

    // The record exporter maps only these kinds
    for kind in sensors {
        if !matches!(kind, SensorKind::Vlp | SensorKind::Imu | SensorKind::VrsGps) {
            warnings.push(format!(
                "sensor '{kind}' has no record channel - `record` will reject it"
            ));
        }
    }

    if sensors.contains(&SensorKind::Imu) && config.versions.default.imu < 2 {
        warnings.push(
            "versions.default.imu = 1 has no inertial columns - IMU records cannot be exported"
                .to_string(),
        );
    }

    if config.dataset.lidar_mode == LidarMode::Both && sensors.iter().any(|s| s.is_dual_head()) {
        warnings.push(
            "lidar_mode = both emits raw heads and merged scans for the same instants".to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Lidar mode: {}", summary.lidar_mode);
            println!("  Sensors: {}", summary.sensors.join(", "));
            println!(
                "  Versions: imu={} vrs_gps={} ({} dataset overrides)",
                summary.default_imu_version,
                summary.default_vrs_gps_version,
                summary.dataset_overrides
            );
            println!(
                "  Skew bounds: nearest={}ns hard={}ns",
                summary.nearest_skew_ns, summary.hard_skew_ns
            );
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
