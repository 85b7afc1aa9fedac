//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use contracts::{PcdEncoding, RecordCompression};
use ingestion::DualHeadRig;

/// KUC Convert - KAIST Urban Complex dataset converter
#[derive(Parser, Debug)]
#[command(
    name = "kuc-convert",
    author,
    version,
    about = "KAIST Urban Complex dataset converter",
    long_about = "Converts a KAIST Urban Complex driving log into a time-ordered sensor stream.\n\n\
                  Merges the dual-head lidar scans, fuses the per-sensor files by timestamp \n\
                  and exports MCAP recordings, PCD point clouds and aligned poses."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "KUC_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "KUC_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fuse VLP, IMU and VRS GPS into an MCAP recording
    Record(RecordArgs),

    /// Export merged VLP scans as PCD files with aligned poses
    Pcd(PcdArgs),

    /// Build global_coors.csv from global_pose.csv and IMU orientation
    GroundTruth(GroundTruthArgs),

    /// Materialize merged dual-head scans and print skew statistics
    Merge(MergeArgs),

    /// Validate configuration file without converting
    Validate(ValidateArgs),

    /// Summarize the sensor files of a dataset
    Info(InfoArgs),
}

/// Optional configuration file shared by the converting commands
#[derive(clap::Args, Debug, Clone)]
pub struct ConfigArg {
    /// Path to configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "KUC_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Arguments for the `record` command
#[derive(Parser, Debug, Clone)]
pub struct RecordArgs {
    /// Directory holding the datasets
    pub datasets_root: PathBuf,

    /// Dataset directory name below DATASETS_ROOT, also the version table key
    pub dataset_name: String,

    /// Output `.mcap` file
    pub output: PathBuf,

    #[command(flatten)]
    pub config: ConfigArg,

    /// Override the configured chunk compression
    #[arg(long, value_enum)]
    pub compression: Option<CompressionArg>,

    /// Output summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `pcd` command
#[derive(Parser, Debug, Clone)]
pub struct PcdArgs {
    /// Dataset directory
    pub dataroot: PathBuf,

    #[command(flatten)]
    pub config: ConfigArg,

    /// Override the configured PCD encoding
    #[arg(long, value_enum)]
    pub encoding: Option<EncodingArg>,

    /// Output directory for `<i>.pcd` (default: DATAROOT/pcds)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Aligned pose file (default: DATAROOT/aligned_poses.txt)
    #[arg(long)]
    pub poses_out: Option<PathBuf>,
}

/// Arguments for the `ground-truth` command
#[derive(Parser, Debug, Clone)]
pub struct GroundTruthArgs {
    /// Dataset directory
    pub dataroot: PathBuf,

    /// Column schema version of xsens_imu.csv
    #[arg(long, default_value = "2")]
    pub imu_version: u8,
}

/// Arguments for the `merge` command
#[derive(Parser, Debug, Clone)]
pub struct MergeArgs {
    /// Dataset directory
    pub dataroot: PathBuf,

    #[command(flatten)]
    pub config: ConfigArg,

    /// Rig to merge (both when omitted)
    #[arg(long)]
    pub rig: Option<DualHeadRig>,

    /// Output summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "kuc.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Dataset directory
    pub dataroot: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// PCD `DATA` encoding
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum EncodingArg {
    Binary,
    BinaryCompressed,
}

impl From<EncodingArg> for PcdEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Binary => Self::Binary,
            EncodingArg::BinaryCompressed => Self::BinaryCompressed,
        }
    }
}

/// MCAP chunk compression
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum CompressionArg {
    None,
    Zstd,
}

impl From<CompressionArg> for RecordCompression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => Self::None,
            CompressionArg::Zstd => Self::Zstd,
        }
    }
}
