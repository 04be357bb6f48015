//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;
use tracing::info;

use crate::config::Config;

/// Write the default configuration to `config_path`
pub fn run(force: bool, config_path: &Path) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "Config file {} already exists, use --force to overwrite",
            config_path.display()
        );
    }

    info!("Writing default configuration...");
    let config = Config::default();
    config.save(config_path)?;

    println!("[OK] Configuration written to {}", config_path.display());
    println!();
    println!("Maintenance file: {}", config.storage.record_path().display());
    println!("Cache directory: {}", config.storage.cache_path.display());
    Ok(())
}
