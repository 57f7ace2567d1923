//! Configuration service implementation.
//!
//! Loads [`ConsoleConfig`] from `config.toml` (by default
//! `~/.config/modcon/config.toml`), creating the file with defaults when it
//! does not exist.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use modcon_core::config::ConsoleConfig;
use modcon_core::error::{ModconError, Result};

use crate::paths::ModconPaths;

/// Configuration service that loads and caches the console configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration, filled on first access.
    config: Arc<RwLock<Option<ConsoleConfig>>>,
}

impl ConfigService {
    /// Creates a service for the default location (`MODCON_CONFIG` or the
    /// platform config directory).
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(ModconPaths::default().resolve_config_file()?))
    }

    /// Creates a service for an explicit config file.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    pub fn get_config(&self) -> Result<ConsoleConfig> {
        if let Some(cached) = self
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(cached.clone());
        }

        let loaded = self.load_or_create()?;
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Some(loaded.clone());
        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Writes `config` to the file and refreshes the cache.
    pub fn save(&self, config: &ConsoleConfig) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.path, content)?;
        tracing::info!("[Config] Saved {}", self.path.display());

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Some(config.clone());
        Ok(())
    }

    fn load_or_create(&self) -> Result<ConsoleConfig> {
        if !self.path.exists() {
            tracing::info!(
                "[Config] {} not found, writing defaults",
                self.path.display()
            );
            let config = ConsoleConfig::default();
            self.save(&config)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| ModconError::io(format!("{}: {e}", self.path.display())))?;
        let config: ConsoleConfig = toml::from_str(&content).map_err(|e| {
            ModconError::config(format!("Invalid config {}: {e}", self.path.display()))
        })?;
        tracing::debug!("[Config] Loaded {}", self.path.display());
        Ok(config)
    }
}
