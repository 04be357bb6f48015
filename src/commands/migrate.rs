//! Migrate command implementation.

use anyhow::{bail, Context, Result};
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::info;

use crate::config::StorageBackend;
use crate::store::MigrateOutcome;

/// Run the migrate command
pub fn run(force: bool, clear: bool, yes: bool, config_path: &Path) -> Result<()> {
    let (config, admin) = super::open(config_path)?;

    if clear {
        if !yes && !confirm("Clear maintenance data from all storage backends?")? {
            println!("Aborted");
            return Ok(());
        }
        if !admin.clear_all() {
            bail!("Failed to clear maintenance data");
        }
        println!("[OK] All maintenance data cleared");
        return Ok(());
    }

    if config.storage.backend != StorageBackend::Cache && !force {
        bail!(
            "Configured storage backend is not 'cache'. Set storage.backend: cache \
             or use --force to migrate anyway"
        );
    }

    info!(
        "Migrating maintenance data from {} to cache at {}...",
        config.storage.record_path().display(),
        config.storage.cache_path.display()
    );

    match admin.migrate() {
        MigrateOutcome::Migrated => println!("[OK] Maintenance data migrated to cache"),
        MigrateOutcome::NothingToMigrate => println!("[INFO] No file-based maintenance data to migrate"),
        MigrateOutcome::Failed(reason) => bail!("Migration failed, file left in place: {}", reason),
    }
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
