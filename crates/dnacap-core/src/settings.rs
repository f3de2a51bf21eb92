//! Settings file (YAML) and app directories.

use crate::{CoreError, CoreResult, TimingConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const APP_DIR_NAME: &str = "dnacap";
const SETTINGS_FILE_NAME: &str = "settings.yaml";

/// Persistent defaults. Calibration is intentionally not stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory the dataset folder is created in. Current directory when unset.
    pub workdir: Option<PathBuf>,
    /// Iteration count offered when `start` is given no count.
    pub default_count: u32,
    pub timing: TimingConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self { workdir: None, default_count: 1000, timing: TimingConfig::default() }
    }
}

/// Get the app data directory for dnacap.
pub fn get_app_data_dir() -> PathBuf {
    let base = dirs_next::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join(APP_DIR_NAME)
}

/// Directory for rolling log files.
pub fn get_log_dir() -> PathBuf {
    get_app_data_dir().join("logs")
}

/// `<config dir>/dnacap/settings.yaml`.
pub fn default_settings_path() -> PathBuf {
    let base = dirs_next::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join(APP_DIR_NAME).join(SETTINGS_FILE_NAME)
}

/// Load settings from `path`.
///
/// A missing file yields defaults. An unreadable or invalid file is logged
/// and also yields defaults.
pub fn load_settings(path: &Path) -> Settings {
    if !path.exists() {
        debug!(?path, "no settings file, using defaults");
        return Settings::default();
    }

    match read_settings(path) {
        Ok(settings) => {
            info!(?path, "loaded settings");
            settings
        }
        Err(e) => {
            warn!(?path, error = %e, "ignoring settings file, using defaults");
            Settings::default()
        }
    }
}

fn read_settings(path: &Path) -> CoreResult<Settings> {
    let content = fs::read_to_string(path)?;
    let settings: Settings =
        serde_yaml::from_str(&content).map_err(|e| CoreError::Settings(e.to_string()))?;
    settings.timing.validate()?;
    if settings.default_count == 0 {
        return Err(CoreError::Settings("default_count must be greater than 0".into()));
    }
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &Settings) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let yaml = serde_yaml::to_string(settings).map_err(|e| CoreError::Settings(e.to_string()))?;
    fs::write(path, yaml)?;
    info!(?path, "saved settings");
    Ok(())
}
