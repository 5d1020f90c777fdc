//! Application configuration.
//!
//! Loaded from `skiff.toml`, either an explicit path or the platform
//! config directory. A missing file yields defaults; a malformed file is
//! an error the operator should see, not a silent fallback.

use crate::error::SkiffError;

use common::ErrorLocation;
use shell_core::window::WindowOptions;

use std::collections::BTreeMap;
use std::panic::Location;
use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

const CONFIG_DIR_NAME: &str = "skiff";
const CONFIG_FILE_NAME: &str = "skiff.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Title for the main window.
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Run without visible renderer chrome.
    pub headless: bool,
    /// Directory for `skiff.log`. Platform data dir when unset.
    pub log_dir: Option<PathBuf>,
    /// Free-form entries published to the renderer as
    /// `window.__args.config`.
    pub renderer: BTreeMap<String, String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            title: "Skiff".to_string(),
            width: 1024,
            height: 768,
            headless: false,
            log_dir: None,
            renderer: BTreeMap::new(),
        }
    }
}

impl ShellConfig {
    /// Load configuration from `path`, or from the platform config
    /// directory when `path` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`SkiffError::Config`] when the file exists but cannot be
    /// read or parsed. A missing file is not an error.
    #[track_caller]
    pub fn load(path: Option<&Path>) -> Result<Self, SkiffError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path).map_err(|e| SkiffError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let config: ShellConfig = toml::from_str(&raw).map_err(|e| SkiffError::Config {
            message: format!("Failed to parse {}: {e}", path.display()),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Window options for the window at `index`, carrying the renderer
    /// config entries into the preload.
    pub fn window_options(&self, index: i32) -> WindowOptions {
        WindowOptions {
            index,
            title: self.title.clone(),
            width: self.width,
            height: self.height,
            headless: self.headless,
            config: self.renderer.clone(),
        }
    }

    /// Directory the log file lands in.
    pub fn log_dir(&self) -> PathBuf {
        if let Some(dir) = &self.log_dir {
            return dir.clone();
        }

        dirs::data_local_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
