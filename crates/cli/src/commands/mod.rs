//! Command implementations.

mod ground_truth;
mod info;
mod merge;
mod pcd;
mod record;
mod validate;

pub use ground_truth::run_ground_truth;
pub use info::run_info;
pub use merge::run_merge;
pub use pcd::run_pcd;
pub use record::run_record;
pub use validate::run_validate;

use std::path::Path;

use anyhow::{Context, Result};
use contracts::ConverterConfig;
use tracing::info;

use crate::cli::ConfigArg;
use crate::error::CliError;

/// Load the optional configuration file, falling back to validated defaults
pub(crate) fn load_config(arg: &ConfigArg) -> Result<ConverterConfig> {
    match &arg.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path).into());
            }
            info!(config = %path.display(), "Loading configuration");
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))
        }
        None => config_loader::ConfigLoader::load_or_default(None)
            .context("Failed to build default configuration"),
    }
}

/// Fail early when the dataset directory is missing
pub(crate) fn ensure_dataset(root: &Path) -> Result<()> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(CliError::dataset_not_found(root).into())
    }
}
