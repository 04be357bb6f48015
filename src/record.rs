//! The persisted description of a maintenance episode.
//!
//! Serialized as JSON with the keys `time`, `message`, `allowed_ips`,
//! `secret_bypass`, `secret_key`, `cookie_name`, `duration_minutes` and
//! `estimated_end`. Timestamps are unix seconds.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SecureString;
use crate::error::GateError;

/// One maintenance episode. At most one exists per storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    /// When maintenance was activated
    #[serde(rename = "time", with = "chrono::serde::ts_seconds")]
    pub activated_at: DateTime<Utc>,

    /// Message for blocked clients. `None` means "use the configured default",
    /// while `Some("")` is an explicit empty message.
    #[serde(default)]
    pub message: Option<String>,

    /// Literal IPs or CIDR ranges allowed through
    #[serde(rename = "allowed_ips", default)]
    pub allowed_addresses: Vec<String>,

    #[serde(rename = "secret_bypass", default)]
    pub secret_bypass_enabled: bool,

    #[serde(rename = "secret_key", default)]
    pub secret_value: SecureString,

    /// Name of the bypass cookie; its expected value is the name itself
    #[serde(default)]
    pub cookie_name: Option<String>,

    #[serde(default)]
    pub duration_minutes: u64,

    /// Informational only, never used to expire maintenance
    #[serde(
        rename = "estimated_end",
        with = "chrono::serde::ts_seconds_option",
        default
    )]
    pub estimated_end_at: Option<DateTime<Utc>>,
}

impl MaintenanceRecord {
    /// Create a record activated now.
    ///
    /// Duplicate allow-list entries are dropped, keeping first occurrences.
    pub fn new(message: Option<String>, allowed_addresses: Vec<String>, duration_minutes: u64) -> Self {
        // Persisted with second precision; keep in-memory records identical.
        let now = Utc::now();
        let now = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);
        let mut unique: Vec<String> = Vec::with_capacity(allowed_addresses.len());
        for addr in allowed_addresses {
            if !unique.contains(&addr) {
                unique.push(addr);
            }
        }

        let minutes = i64::try_from(duration_minutes).unwrap_or(i64::MAX);
        let estimated_end_at = Duration::try_minutes(minutes).and_then(|d| now.checked_add_signed(d));

        Self {
            activated_at: now,
            message,
            allowed_addresses: unique,
            secret_bypass_enabled: false,
            secret_value: SecureString::default(),
            cookie_name: None,
            duration_minutes,
            estimated_end_at,
        }
    }

    /// Enable the record's own secret bypass. An empty key leaves it disabled.
    pub fn with_secret(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.secret_bypass_enabled = !key.is_empty();
        self.secret_value = SecureString::new(key);
        self
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = Some(name.into());
        self
    }

    /// Secret bypass is reachable only when enabled and non-empty.
    pub fn secret(&self) -> Option<&str> {
        (self.secret_bypass_enabled && !self.secret_value.is_empty())
            .then(|| self.secret_value.as_str())
    }

    /// Bypass cookie name, if one is usable.
    pub fn bypass_cookie(&self) -> Option<&str> {
        self.cookie_name.as_deref().filter(|name| !name.is_empty())
    }

    /// Message to show blocked clients.
    pub fn effective_message<'a>(&'a self, default: &'a str) -> &'a str {
        self.message.as_deref().unwrap_or(default)
    }

    /// Time left until the estimated end, `None` when unknown or overdue.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.estimated_end_at
            .map(|end| end.signed_duration_since(now))
            .filter(|d| *d > Duration::zero())
    }

    /// Parse a persisted payload.
    pub fn from_json(payload: &str) -> Result<Self, GateError> {
        serde_json::from_str(payload).map_err(|e| GateError::CorruptedRecord(e.to_string()))
    }

    /// Serialize for persistence.
    pub fn to_json(&self) -> Result<String, GateError> {
        serde_json::to_string_pretty(self).map_err(|e| GateError::Storage(e.to_string()))
    }
}
