//! Up command implementation.

use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::admin::DeactivateOutcome;

/// Run the up command
pub fn run(config_path: &Path) -> Result<()> {
    let (_, admin) = super::open(config_path)?;

    info!("Disabling maintenance mode...");

    match admin.deactivate()? {
        DeactivateOutcome::Deactivated => println!("[OK] Application is now live"),
        DeactivateOutcome::AlreadyInactive => println!("[INFO] Application is already live"),
    }
    Ok(())
}
