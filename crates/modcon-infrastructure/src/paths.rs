//! Path management for modcon configuration and logs.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/modcon/            # Config directory
//! ├── config.toml              # Console configuration
//! └── logs/                    # Application logs
//!     └── modcon.log.YYYY-MM-DD
//! ```

use std::path::PathBuf;

use modcon_core::error::{ModconError, Result};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "MODCON_CONFIG";

const APP_DIR: &str = "modcon";

/// Resolves modcon paths.
///
/// With an explicit base directory everything is placed under it; otherwise
/// the platform config directory is used (XDG on Linux).
#[derive(Debug, Clone, Default)]
pub struct ModconPaths {
    base: Option<PathBuf>,
}

impl ModconPaths {
    pub fn new(base: Option<PathBuf>) -> Self {
        Self { base }
    }

    /// Returns the modcon configuration directory.
    pub fn config_dir(&self) -> Result<PathBuf> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or_else(|| ModconError::config("Cannot find config directory")),
        }
    }

    /// Returns the default path of `config.toml`, ignoring overrides.
    pub fn config_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Returns the config file path, honouring `MODCON_CONFIG`.
    pub fn resolve_config_file(&self) -> Result<PathBuf> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => self.config_file(),
        }
    }

    pub fn logs_dir(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("logs"))
    }
}
