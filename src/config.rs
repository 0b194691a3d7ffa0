// SPDX-License-Identifier: GPL-3.0-only

//! Scanner configuration
//!
//! Settings live in `<config_dir>/qr-scanner/config.json`. Every field is
//! optional in the file; missing fields take their defaults.

use crate::constants::{
    DEFAULT_DEVICE_INDEX, DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH, DEFAULT_SCANLINE_STEP,
    WINDOW_TITLE,
};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory name used under the platform config and picture directories
pub const APP_DIR_NAME: &str = "qr-scanner";

/// Config file name inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// V4L2 device index (`/dev/video{index}`)
    pub device_index: u32,
    /// Requested capture width
    pub frame_width: u32,
    /// Requested capture height
    pub frame_height: u32,
    /// Title shown above the live preview
    pub window_title: String,
    /// Hand http(s) payloads to the system browser
    pub open_urls: bool,
    /// Open each URL payload only once per run instead of every frame
    pub dedupe_urls: bool,
    /// Rows between linear-barcode scanlines
    pub scanline_step: u32,
    /// Where snapshots are written (defaults to the pictures directory)
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            device_index: DEFAULT_DEVICE_INDEX,
            frame_width: DEFAULT_FRAME_WIDTH,
            frame_height: DEFAULT_FRAME_HEIGHT,
            window_title: WINDOW_TITLE.to_string(),
            open_urls: true,
            dedupe_urls: false,
            scanline_step: DEFAULT_SCANLINE_STEP,
            snapshot_dir: None,
        }
    }
}

impl ScannerConfig {
    /// Default location of the config file, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location, falling back to defaults when absent
    pub fn load() -> AppResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from `path`. A missing file yields defaults; a malformed one is an error.
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(AppError::Config(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;

        info!(path = %path.display(), device_index = config.device_index, "Loaded configuration");
        Ok(config.normalized())
    }

    /// Write the configuration as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Directory snapshots are written to
    pub fn snapshot_directory(&self) -> PathBuf {
        self.snapshot_dir.clone().unwrap_or_else(|| {
            dirs::picture_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR_NAME)
        })
    }

    fn normalized(mut self) -> Self {
        self.scanline_step = self.scanline_step.max(1);
        self
    }
}
