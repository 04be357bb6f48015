//! Administrative operations: activate, deactivate, inspect and migrate
//! maintenance mode.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::GateError;
use crate::record::MaintenanceRecord;
use crate::store::{MigrateOutcome, StateStore};
use crate::utils::{random_alnum, COOKIE_NAME_LEN};

/// Parameters for [`Maintenance::activate`]
#[derive(Debug, Clone, Default)]
pub struct Activation {
    pub message: Option<String>,
    /// Already validated allow-list entries
    pub allowed_addresses: Vec<String>,
    pub duration_minutes: u64,
    /// Enables the record's own secret bypass when present and non-empty
    pub secret: Option<String>,
    /// Bypass cookie name; a random one is generated when absent
    pub cookie_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivateOutcome {
    Activated(MaintenanceRecord),
    AlreadyActive,
}

impl ActivateOutcome {
    /// Treat a refused activation as an error.
    pub fn into_record(self) -> Result<MaintenanceRecord, GateError> {
        match self {
            ActivateOutcome::Activated(record) => Ok(record),
            ActivateOutcome::AlreadyActive => Err(GateError::AlreadyActive),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeactivateOutcome {
    Deactivated,
    AlreadyInactive,
}

/// Snapshot for status reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Live,
    Maintenance(MaintenanceRecord),
    /// Active but the stored payload cannot be read
    Corrupted(String),
}

impl Status {
    pub fn is_active(&self) -> bool {
        !matches!(self, Status::Live)
    }

    /// The active record, or why there is none.
    pub fn into_record(self) -> Result<MaintenanceRecord, GateError> {
        match self {
            Status::Live => Err(GateError::NotActive),
            Status::Maintenance(record) => Ok(record),
            Status::Corrupted(detail) => Err(GateError::CorruptedRecord(detail)),
        }
    }
}

/// Whether the estimated end has passed
pub fn is_overdue(record: &MaintenanceRecord, now: DateTime<Utc>) -> bool {
    record.estimated_end_at.is_some_and(|end| end <= now)
}

/// Administrative operations over a [`StateStore`].
pub struct Maintenance {
    store: StateStore,
}

impl Maintenance {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Enter maintenance mode. Refuses when a record already exists.
    pub fn activate(&self, activation: Activation) -> Result<ActivateOutcome, GateError> {
        if self.store.is_active() {
            return Ok(ActivateOutcome::AlreadyActive);
        }

        let cookie_name = activation
            .cookie_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| random_alnum(COOKIE_NAME_LEN));

        let mut record = MaintenanceRecord::new(
            activation.message,
            activation.allowed_addresses,
            activation.duration_minutes,
        )
        .with_cookie_name(cookie_name);
        if let Some(secret) = activation.secret {
            record = record.with_secret(secret);
        }

        if !self.store.write(&record) {
            return Err(GateError::Storage(format!(
                "Failed to enable maintenance mode via {} storage",
                self.store.backend_name()
            )));
        }

        info!(
            "Maintenance mode enabled ({} allowed address(es), {} minutes)",
            record.allowed_addresses.len(),
            record.duration_minutes
        );
        Ok(ActivateOutcome::Activated(record))
    }

    /// Leave maintenance mode.
    pub fn deactivate(&self) -> Result<DeactivateOutcome, GateError> {
        if !self.store.is_active() {
            return Ok(DeactivateOutcome::AlreadyInactive);
        }

        if !self.store.remove() {
            return Err(GateError::Storage(format!(
                "Failed to disable maintenance mode via {} storage",
                self.store.backend_name()
            )));
        }

        info!("Maintenance mode disabled");
        Ok(DeactivateOutcome::Deactivated)
    }

    pub fn status(&self) -> Status {
        if !self.store.is_active() {
            return Status::Live;
        }
        match self.store.read_checked() {
            Ok(Some(record)) => Status::Maintenance(record),
            Ok(None) => Status::Live,
            Err(e) => Status::Corrupted(e.to_string()),
        }
    }

    pub fn migrate(&self) -> MigrateOutcome {
        self.store.migrate_to_cache()
    }

    /// Remove the record from every backend.
    pub fn clear_all(&self) -> bool {
        let cleared = self.store.clear_all();
        if !cleared {
            warn!("Some maintenance data could not be cleared");
        }
        cleared
    }
}
