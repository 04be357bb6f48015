//! Bypass resolution while maintenance is active.
//!
//! Channels are tried in a fixed order and the first match wins:
//!
//! 1. config secret (`?maintenance_secret=` equal to the configured key)
//! 2. record secret (same parameter, equal to the record's key)
//! 3. source address in the record's allow-list
//! 4. bypass cookie whose value equals its own name
//!
//! A miss on one channel falls through to the next; only after all four
//! miss is the request denied.

use std::collections::HashMap;
use std::fmt;

use crate::config::{GateConfig, SecureString};
use crate::ip_matcher;
use crate::record::MaintenanceRecord;

/// Query parameter carrying the bypass secret
pub const SECRET_QUERY_PARAM: &str = "maintenance_secret";

/// Where a request comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Origin {
    /// An inbound request from the transport layer
    #[default]
    Transport,
    /// Administrative tooling running inside the application
    Operator,
}

/// Per-request evidence collected by the transport adapter.
#[derive(Debug, Clone, Default)]
pub struct Evidence {
    pub origin: Origin,
    /// Value of the `maintenance_secret` query parameter
    pub secret: Option<SecureString>,
    /// Resolved client address
    pub source_address: String,
    pub cookies: HashMap<String, String>,
}

impl Evidence {
    pub fn new(source_address: impl Into<String>) -> Self {
        Self {
            source_address: source_address.into(),
            ..Self::default()
        }
    }

    /// Evidence for an operator context (CLI, scheduled jobs)
    pub fn operator() -> Self {
        Self {
            origin: Origin::Operator,
            ..Self::default()
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(SecureString::new(secret.into()));
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Take the secret from a raw query string (`a=1&maintenance_secret=...`).
    pub fn with_query(mut self, query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        if let Some((_, value)) = url::form_urlencoded::parse(query.as_bytes())
            .find(|(name, _)| name == SECRET_QUERY_PARAM)
        {
            self.secret = Some(SecureString::new(value.into_owned()));
        }
        self
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    fn secret_str(&self) -> Option<&str> {
        self.secret.as_ref().map(SecureString::as_str)
    }
}

/// Which channel let the request through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassReason {
    ConfigSecret,
    RecordSecret,
    AllowedAddress,
    Cookie,
}

impl fmt::Display for BypassReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BypassReason::ConfigSecret => "config secret",
            BypassReason::RecordSecret => "record secret",
            BypassReason::AllowedAddress => "allowed address",
            BypassReason::Cookie => "bypass cookie",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Allow(BypassReason),
    /// Carries the message shown to the blocked client
    Deny(String),
}

/// Decide whether a request may bypass active maintenance.
///
/// Secrets are compared byte for byte: case-sensitive, no trimming.
pub fn resolve(config: &GateConfig, record: &MaintenanceRecord, evidence: &Evidence) -> Resolution {
    let presented = evidence.secret_str();

    if let (Some(expected), Some(given)) = (config.secret(), presented) {
        if given == expected {
            return Resolution::Allow(BypassReason::ConfigSecret);
        }
    }

    if let (Some(expected), Some(given)) = (record.secret(), presented) {
        if given == expected {
            return Resolution::Allow(BypassReason::RecordSecret);
        }
    }

    if ip_matcher::matches(&evidence.source_address, &record.allowed_addresses) {
        return Resolution::Allow(BypassReason::AllowedAddress);
    }

    if let Some(name) = record.bypass_cookie() {
        if evidence.cookie(name) == Some(name) {
            return Resolution::Allow(BypassReason::Cookie);
        }
    }

    Resolution::Deny(record.effective_message(&config.default_message).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_secret(secret: &str) -> GateConfig {
        GateConfig {
            secret_bypass_enabled: true,
            secret_bypass_key: SecureString::from(secret),
            default_message: "default".to_string(),
            ..GateConfig::default()
        }
    }

    fn record() -> MaintenanceRecord {
        MaintenanceRecord::new(Some("down".into()), vec!["127.0.0.1".into()], 60)
    }

    #[test]
    fn test_allowed_address() {
        let config = GateConfig::default();
        let record = record();
        assert_eq!(
            resolve(&config, &record, &Evidence::new("127.0.0.1")),
            Resolution::Allow(BypassReason::AllowedAddress)
        );
        assert_eq!(
            resolve(&config, &record, &Evidence::new("10.0.0.1")),
            Resolution::Deny("down".into())
        );
    }

    #[test]
    fn test_record_secret_is_case_sensitive() {
        let config = GateConfig::default();
        let record = record().with_secret("abc");

        let ok = Evidence::new("10.0.0.1").with_secret("abc");
        assert_eq!(
            resolve(&config, &record, &ok),
            Resolution::Allow(BypassReason::RecordSecret)
        );

        let wrong_case = Evidence::new("10.0.0.1").with_secret("ABC");
        assert_eq!(resolve(&config, &record, &wrong_case), Resolution::Deny("down".into()));

        let padded = Evidence::new("10.0.0.1").with_secret(" abc");
        assert_eq!(resolve(&config, &record, &padded), Resolution::Deny("down".into()));
    }

    #[test]
    fn test_config_secret_has_priority() {
        let config = config_with_secret("config-key");
        let record = record().with_secret("record-key").with_cookie_name("c00kie");

        let evidence = Evidence::new("10.9.9.9").with_secret("config-key");
        assert_eq!(
            resolve(&config, &record, &evidence),
            Resolution::Allow(BypassReason::ConfigSecret)
        );
    }

    #[test]
    fn test_wrong_config_secret_falls_through() {
        let config = config_with_secret("config-key");
        let record = record().with_secret("record-key");

        let evidence = Evidence::new("10.9.9.9").with_secret("record-key");
        assert_eq!(
            resolve(&config, &record, &evidence),
            Resolution::Allow(BypassReason::RecordSecret)
        );

        let evidence = Evidence::new("127.0.0.1").with_secret("nope");
        assert_eq!(
            resolve(&config, &record, &evidence),
            Resolution::Allow(BypassReason::AllowedAddress)
        );
    }

    #[test]
    fn test_config_secret_disabled_is_ignored() {
        let mut config = config_with_secret("config-key");
        config.secret_bypass_enabled = false;
        let evidence = Evidence::new("10.0.0.1").with_secret("config-key");
        assert_eq!(
            resolve(&config, &record(), &evidence),
            Resolution::Deny("down".into())
        );
    }

    #[test]
    fn test_empty_secrets_never_match() {
        let config = config_with_secret("");
        let mut record = record();
        record.secret_bypass_enabled = true;

        let evidence = Evidence::new("10.0.0.1").with_secret("");
        assert_eq!(resolve(&config, &record, &evidence), Resolution::Deny("down".into()));
    }

    #[test]
    fn test_cookie_value_must_equal_name() {
        let config = GateConfig::default();
        let record = record().with_cookie_name("Ab12Cd34");

        let ok = Evidence::new("10.0.0.1").with_cookie("Ab12Cd34", "Ab12Cd34");
        assert_eq!(resolve(&config, &record, &ok), Resolution::Allow(BypassReason::Cookie));

        let wrong = Evidence::new("10.0.0.1").with_cookie("Ab12Cd34", "other");
        assert_eq!(resolve(&config, &record, &wrong), Resolution::Deny("down".into()));

        let missing = Evidence::new("10.0.0.1");
        assert_eq!(resolve(&config, &record, &missing), Resolution::Deny("down".into()));
    }

    #[test]
    fn test_empty_cookie_name_never_matches() {
        let config = GateConfig::default();
        let record = record().with_cookie_name("");
        let evidence = Evidence::new("10.0.0.1").with_cookie("", "");
        assert_eq!(resolve(&config, &record, &evidence), Resolution::Deny("down".into()));
    }

    #[test]
    fn test_deny_message_fallback() {
        let config = GateConfig {
            default_message: "default".to_string(),
            ..GateConfig::default()
        };
        let evidence = Evidence::new("10.0.0.1");

        let absent = MaintenanceRecord::new(None, vec![], 0);
        assert_eq!(resolve(&config, &absent, &evidence), Resolution::Deny("default".into()));

        let empty = MaintenanceRecord::new(Some(String::new()), vec![], 0);
        assert_eq!(resolve(&config, &empty, &evidence), Resolution::Deny(String::new()));
    }

    #[test]
    fn test_resolve_does_not_mutate_record() {
        let config = GateConfig::default();
        let record = record().with_secret("abc").with_cookie_name("c");
        let before = record.clone();
        let _ = resolve(&config, &record, &Evidence::new("1.2.3.4").with_secret("x"));
        assert_eq!(record, before);
    }

    #[test]
    fn test_evidence_from_query() {
        let evidence = Evidence::new("10.0.0.1").with_query("?page=2&maintenance_secret=a%20b%2Bc");
        assert_eq!(evidence.secret_str(), Some("a b+c"));

        let evidence = Evidence::new("10.0.0.1").with_query("page=2");
        assert!(evidence.secret.is_none());
    }

    #[test]
    fn test_evidence_debug_redacts_secret() {
        let evidence = Evidence::new("10.0.0.1").with_secret("hunter2");
        assert!(!format!("{:?}", evidence).contains("hunter2"));
    }
}
