//! Maintenance record storage (file, cache).
//!
//! Every backend implements [`StateBackend`] with typed errors. The
//! [`StateStore`] facade in front of them swallows those errors into
//! `bool`/`Option` returns so storage failures never reach the request path.

mod cache;
mod file;

use std::sync::Arc;
use tracing::{error, info, warn};

pub use cache::{Cache, CacheStore, FileCache, MemoryCache};
pub use file::FileStore;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::GateError;
use crate::fs_abstraction::RealFileSystem;
use crate::record::MaintenanceRecord;

/// Trait for storage backends
pub trait StateBackend: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Existence check only, no deserialization
    fn is_active(&self) -> bool;

    /// Read and parse the stored record. `Ok(None)` when nothing is stored.
    fn load(&self) -> Result<Option<MaintenanceRecord>, GateError>;

    /// Persist a record, replacing any previous one
    fn store(&self, record: &MaintenanceRecord) -> Result<(), GateError>;

    /// Delete the record. Deleting an absent record succeeds.
    fn delete(&self) -> Result<(), GateError>;
}

/// Result of a file-to-cache migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrateOutcome {
    /// Record copied to the cache and the file removed
    Migrated,
    /// The file backend holds no record
    NothingToMigrate,
    /// Migration did not happen; the file is left intact
    Failed(String),
}

impl MigrateOutcome {
    pub fn succeeded(&self) -> bool {
        !matches!(self, MigrateOutcome::Failed(_))
    }
}

/// Storage facade: the configured backend plus access to both for
/// `clear_all` and `migrate_to_cache`.
#[derive(Clone)]
pub struct StateStore {
    active: Arc<dyn StateBackend>,
    file: Arc<dyn StateBackend>,
    cache: Arc<dyn StateBackend>,
    logging: bool,
}

impl StateStore {
    /// Build a store. `selected` picks which backend serves reads and writes.
    pub fn new(
        selected: StorageBackend,
        file: Arc<dyn StateBackend>,
        cache: Arc<dyn StateBackend>,
        logging: bool,
    ) -> Self {
        let active = match selected {
            StorageBackend::File => Arc::clone(&file),
            StorageBackend::Cache => Arc::clone(&cache),
        };
        Self {
            active,
            file,
            cache,
            logging,
        }
    }

    /// Name of the backend serving reads and writes
    pub fn backend_name(&self) -> &'static str {
        self.active.name()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_active()
    }

    /// Read the current record.
    ///
    /// Returns `None` when inactive, and also when the payload is corrupted
    /// or unreadable (logged as an error).
    pub fn read(&self) -> Option<MaintenanceRecord> {
        match self.active.load() {
            Ok(record) => record,
            Err(e) => {
                if self.logging {
                    error!("Failed to read maintenance record from {}: {}", self.active.name(), e);
                }
                None
            }
        }
    }

    /// Like [`read`](Self::read) but keeps the error, for status reporting.
    pub fn read_checked(&self) -> Result<Option<MaintenanceRecord>, GateError> {
        self.active.load()
    }

    pub fn write(&self, record: &MaintenanceRecord) -> bool {
        match self.active.store(record) {
            Ok(()) => {
                if self.logging {
                    info!("Maintenance record saved to {}", self.active.name());
                }
                true
            }
            Err(e) => {
                if self.logging {
                    error!("Failed to save maintenance record to {}: {}", self.active.name(), e);
                }
                false
            }
        }
    }

    /// Idempotent: removing an absent record returns true.
    pub fn remove(&self) -> bool {
        match self.active.delete() {
            Ok(()) => {
                if self.logging {
                    info!("Maintenance record removed from {}", self.active.name());
                }
                true
            }
            Err(e) => {
                if self.logging {
                    error!("Failed to remove maintenance record from {}: {}", self.active.name(), e);
                }
                false
            }
        }
    }

    /// Remove the record from both backends, whichever is configured.
    pub fn clear_all(&self) -> bool {
        let mut ok = true;
        for backend in [&self.cache, &self.file] {
            if let Err(e) = backend.delete() {
                if self.logging {
                    error!("Failed to clear {} storage: {}", backend.name(), e);
                }
                ok = false;
            }
        }
        if ok && self.logging {
            info!("All maintenance data cleared");
        }
        ok
    }

    /// Copy the file record into the cache, then delete the file.
    ///
    /// The file is only deleted after the cache write succeeded.
    pub fn migrate_to_cache(&self) -> MigrateOutcome {
        if !self.file.is_active() {
            return MigrateOutcome::NothingToMigrate;
        }

        let record = match self.file.load() {
            Ok(Some(record)) => record,
            Ok(None) => return MigrateOutcome::NothingToMigrate,
            Err(e) => {
                if self.logging {
                    error!("Cannot migrate maintenance record: {}", e);
                }
                return MigrateOutcome::Failed(e.to_string());
            }
        };

        if let Err(e) = self.cache.store(&record) {
            if self.logging {
                error!("Cache write failed during migration, file kept: {}", e);
            }
            return MigrateOutcome::Failed(e.to_string());
        }

        if let Err(e) = self.file.delete() {
            // Record now lives in both backends; the cache copy is authoritative.
            if self.logging {
                warn!("Maintenance record migrated but old file was not removed: {}", e);
            }
        }

        if self.logging {
            info!("Maintenance data migrated from file to cache");
        }
        MigrateOutcome::Migrated
    }
}

/// Create a storage facade from configuration.
///
/// The cache handle is passed in so that every store in a process shares it:
/// a [`MemoryCache`] inside one application, or a [`FileCache`] when several
/// processes (the CLI and the application) must see the same record.
pub fn create_store<C: Cache + 'static>(
    config: &StorageConfig,
    cache: Arc<C>,
    logging: bool,
) -> StateStore {
    let file = FileStore::new(RealFileSystem, &config.file_path, &config.file_name);
    let cache = CacheStore::new(cache, &config.cache_key, config.cache_ttl);
    StateStore::new(config.backend, Arc::new(file), Arc::new(cache), logging)
}
