// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::{CameraBackendType, FacingMode};
use crate::constants::{self, timing};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Bumped when fields change meaning; older files are migrated by serde defaults
pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Layout version of the file this was read from
    pub version: u32,
    /// Facing mode used the first time the camera is opened
    pub default_facing: FacingMode,
    /// Camera backend to use (V4L2 or virtual)
    pub backend: CameraBackendType,
    /// Device path to use for the front camera (e.g. /dev/video0)
    pub user_device: Option<String>,
    /// Device path to use for the rear camera
    pub environment_device: Option<String>,
    /// Requested stream width
    pub ideal_width: u32,
    /// Requested stream height
    pub ideal_height: u32,
    /// Photo database location; defaults to the user data directory
    pub database_path: Option<PathBuf>,
    /// How long notifications stay visible
    pub notification_visible_ms: u64,
    /// Length of the notification fade-out
    pub notification_fade_ms: u64,
    /// Install the bundled asset cache at start-up
    pub install_assets: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            default_facing: FacingMode::Environment,
            backend: CameraBackendType::default(),
            user_device: None,
            environment_device: None,
            ideal_width: constants::IDEAL_WIDTH,
            ideal_height: constants::IDEAL_HEIGHT,
            database_path: None,
            notification_visible_ms: timing::NOTIFICATION_VISIBLE_MS,
            notification_fade_ms: timing::NOTIFICATION_FADE_MS,
            install_assets: true,
        }
    }
}

impl Config {
    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(constants::APP_ID).join("config.json"))
    }

    /// Load the configuration, falling back to defaults
    ///
    /// A missing file is normal on first start; a malformed one is reported
    /// and ignored so the app still starts.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            warn!("No config directory available, using defaults");
            return Self::default();
        };

        match Self::load_from(&path) {
            Ok(Some(config)) => config,
            Ok(None) => {
                debug!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable config");
                Self::default()
            }
        }
    }

    /// Read a configuration file; `Ok(None)` when it does not exist
    pub fn load_from(path: &Path) -> AppResult<Option<Self>> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::Config(format!("{}: {}", path.display(), e))),
        };

        let mut config: Config = serde_json::from_str(&text)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;

        if config.version != CONFIG_VERSION {
            info!(
                from = config.version,
                to = CONFIG_VERSION,
                "Upgrading config layout"
            );
            config.version = CONFIG_VERSION;
        }

        Ok(Some(config))
    }

    /// Write the configuration as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Config(format!("{}: {}", parent.display(), e)))?;
        }

        let text = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, text)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;

        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Resolved photo database file
    pub fn database_file(&self) -> PathBuf {
        if let Some(path) = &self.database_path {
            return path.clone();
        }

        dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(std::env::temp_dir)
            .join(constants::APP_ID)
            .join(format!("{}.sqlite3", constants::storage::DATABASE_NAME))
    }

    /// Per-user cache directory (asset cache, exported photos, logs)
    pub fn cache_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(constants::APP_ID)
    }
}
