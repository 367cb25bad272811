//! CLI command implementations.

pub mod batch;
pub mod config;
pub mod process;

use std::path::{Path, PathBuf};

use meisai_core::MeisaiConfig;
use tracing::debug;

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("meisai")
        .join("config.json")
}

/// Load the `--config` file, else the default file if present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<MeisaiConfig> {
    if let Some(path) = config_path {
        debug!("Loading config from {}", path);
        return Ok(MeisaiConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Loading config from {}", default_path.display());
        return Ok(MeisaiConfig::from_file(&default_path)?);
    }

    Ok(MeisaiConfig::default())
}
