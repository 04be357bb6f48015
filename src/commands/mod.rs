//! CLI command implementations.

pub mod check;
pub mod down;
pub mod init;
pub mod migrate;
pub mod status;
pub mod up;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use crate::admin::Maintenance;
use crate::config::Config;
use crate::config::StorageConfig;
use crate::fs_abstraction::RealFileSystem;
use crate::store::{create_store, FileCache};

/// Cache shared with every other process using the same `cache_path`
pub(crate) fn shared_cache(storage: &StorageConfig) -> Arc<FileCache> {
    Arc::new(FileCache::new(RealFileSystem, &storage.cache_path))
}

/// Load config (defaults if the file is missing) and build the admin service.
pub(crate) fn open(config_path: &Path) -> Result<(Config, Maintenance)> {
    let config = Config::load_or_default(config_path)?;
    let store = create_store(
        &config.storage,
        shared_cache(&config.storage),
        config.gate.logging_enabled,
    );
    Ok((config, Maintenance::new(store)))
}
