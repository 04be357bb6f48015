//! The maintenance gate, called once per inbound request.
//!
//! Only a legitimate block leaves the gate as [`Verdict::Deny`]. Storage
//! errors, corrupted records and panics inside resolution all degrade to
//! [`AllowReason::FailOpen`] so a maintenance bug never locks out the site.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info};

use crate::config::{Config, Environment, GateConfig};
use crate::error::GateError;
use crate::resolver::{self, BypassReason, Evidence, Origin, Resolution};
use crate::store::{create_store, Cache, StateStore};

/// Why a request was let through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowReason {
    /// No maintenance record is active
    Live,
    /// Operator tooling outside of test runs
    OperatorContext,
    Bypass(BypassReason),
    /// Internal failure; access allowed to avoid a site-wide lockout
    FailOpen,
}

/// A blocked request: respond 503 with `Retry-After`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub message: String,
    pub retry_after_seconds: u64,
}

impl Denial {
    pub const STATUS_CODE: u16 = 503;

    /// `Retry-After` header for the rejected response
    pub fn retry_after_header(&self) -> (&'static str, String) {
        ("Retry-After", self.retry_after_seconds.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow(AllowReason),
    Deny(Denial),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allow(_))
    }
}

/// Events signaled by the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateEvent {
    Bypassed { reason: BypassReason, source: String },
    Blocked { source: String },
    CorruptedRecord { detail: String },
    InternalError { detail: String },
}

/// Receiver for gate events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &GateEvent);
}

/// Default sink: renders events as tracing logs
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &GateEvent) {
        match event {
            GateEvent::Bypassed { reason, source } => {
                info!("Maintenance mode bypassed via {} from IP: {}", reason, source)
            }
            GateEvent::Blocked { source } => {
                info!("Maintenance mode blocking access from IP: {}", source)
            }
            GateEvent::CorruptedRecord { detail } => {
                error!("Maintenance mode data is invalid or corrupted: {}", detail)
            }
            GateEvent::InternalError { detail } => {
                error!("Unexpected error in maintenance mode check: {}", detail)
            }
        }
    }
}

/// Maintenance gate holding its store and static config.
pub struct Gate {
    store: StateStore,
    config: GateConfig,
    environment: Environment,
    sink: Arc<dyn EventSink>,
}

impl Gate {
    pub fn new(store: StateStore, config: GateConfig, environment: Environment) -> Self {
        Self {
            store,
            config,
            environment,
            sink: Arc::new(TracingSink),
        }
    }

    /// Build a gate from loaded configuration.
    pub fn from_config<C: Cache + 'static>(config: &Config, cache: Arc<C>) -> Self {
        let store = create_store(&config.storage, cache, config.gate.logging_enabled);
        Self::new(store, config.gate.clone(), config.environment)
    }

    /// Replace the event sink
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Decide whether the request may proceed.
    pub fn check(&self, evidence: &Evidence) -> Verdict {
        if evidence.origin == Origin::Operator && self.environment != Environment::Testing {
            return Verdict::Allow(AllowReason::OperatorContext);
        }

        match panic::catch_unwind(AssertUnwindSafe(|| self.evaluate(evidence))) {
            Ok(verdict) => verdict,
            Err(payload) => {
                self.emit(GateEvent::InternalError {
                    detail: panic_message(payload.as_ref()),
                });
                Verdict::Allow(AllowReason::FailOpen)
            }
        }
    }

    fn evaluate(&self, evidence: &Evidence) -> Verdict {
        if !self.store.is_active() {
            return Verdict::Allow(AllowReason::Live);
        }

        let record = match self.store.read_checked() {
            Ok(Some(record)) => record,
            // Deactivated between the two calls
            Ok(None) => return Verdict::Allow(AllowReason::Live),
            Err(GateError::CorruptedRecord(detail)) => {
                self.emit(GateEvent::CorruptedRecord { detail });
                return Verdict::Allow(AllowReason::FailOpen);
            }
            Err(e) => {
                self.emit(GateEvent::InternalError {
                    detail: e.to_string(),
                });
                return Verdict::Allow(AllowReason::FailOpen);
            }
        };

        match resolver::resolve(&self.config, &record, evidence) {
            Resolution::Allow(reason) => {
                self.emit(GateEvent::Bypassed {
                    reason,
                    source: evidence.source_address.clone(),
                });
                Verdict::Allow(AllowReason::Bypass(reason))
            }
            Resolution::Deny(message) => {
                self.emit(GateEvent::Blocked {
                    source: evidence.source_address.clone(),
                });
                Verdict::Deny(Denial {
                    message,
                    retry_after_seconds: self.config.retry_after_seconds,
                })
            }
        }
    }

    fn emit(&self, event: GateEvent) {
        if self.config.logging_enabled {
            self.sink.emit(&event);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic during maintenance check".to_string()
    }
}
