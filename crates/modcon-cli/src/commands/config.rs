use std::path::Path;

use anyhow::{Context, Result, bail};
use modcon_core::config::ConsoleConfig;

use super::utils;

pub fn path(config_path: Option<&Path>) -> Result<()> {
    let service = utils::config_service(config_path)?;
    println!("{}", service.config_path().display());
    Ok(())
}

pub fn show(config_path: Option<&Path>) -> Result<()> {
    let config = utils::load_config(config_path)?;
    let content = toml::to_string_pretty(&config).context("Failed to serialize config")?;
    print!("{content}");
    Ok(())
}

pub fn init(config_path: Option<&Path>, force: bool) -> Result<()> {
    let service = utils::config_service(config_path)?;
    let path = service.config_path();
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    service
        .save(&ConsoleConfig::default())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("✅ Wrote default config to {}", path.display());
    Ok(())
}
