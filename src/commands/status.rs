//! Status command implementation.

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use serde_json::{json, Value};
use std::path::Path;

use crate::admin::{is_overdue, Status};
use crate::utils::{format_remaining, mask_secret};

/// Run the status command
pub fn run(json: bool, show_secret: bool, config_path: &Path) -> Result<()> {
    let (config, admin) = super::open(config_path)?;
    let status = admin.status();

    if json {
        println!("{}", serde_json::to_string_pretty(&status_json(&status, show_secret))?);
    } else {
        println!();
        print_status(&status, &config.gate.default_message, show_secret);
        println!();
    }
    Ok(())
}

pub(crate) fn print_status(status: &Status, default_message: &str, show_secret: bool) {
    print!("{}", format_status(status, default_message, show_secret, Utc::now()));
}

/// Human-readable status report
pub fn format_status(
    status: &Status,
    default_message: &str,
    show_secret: bool,
    now: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    let record = match status {
        Status::Live => {
            out.push_str("Status: LIVE\n");
            return out;
        }
        Status::Corrupted(detail) => {
            out.push_str("Status: MAINTENANCE (record unreadable)\n");
            out.push_str(&format!("Error: {}\n", detail));
            out.push_str("Requests are allowed through until the record is fixed or removed.\n");
            return out;
        }
        Status::Maintenance(record) => record,
    };

    let started: DateTime<Local> = record.activated_at.into();
    out.push_str("Status: MAINTENANCE\n");
    out.push_str(&format!("Started: {}\n", started.format("%Y-%m-%d %H:%M:%S")));
    out.push_str(&format!("Duration: {} minutes\n", record.duration_minutes));

    if let Some(end) = record.estimated_end_at {
        let local: DateTime<Local> = end.into();
        let left = match record.remaining(now) {
            Some(d) if !is_overdue(record, now) => format!("{} remaining", format_remaining(d)),
            _ => "Overdue".to_string(),
        };
        out.push_str(&format!(
            "Estimated end: {} ({})\n",
            local.format("%Y-%m-%d %H:%M:%S"),
            left
        ));
    }

    match record.message.as_deref() {
        Some(message) => out.push_str(&format!("Message: {}\n", message)),
        None => out.push_str(&format!("Message: {} (default)\n", default_message)),
    }

    if record.allowed_addresses.is_empty() {
        out.push_str("Allowed IPs: none\n");
    } else {
        out.push_str(&format!("Allowed IPs: {}\n", record.allowed_addresses.join(", ")));
    }

    let secret = match record.secret() {
        Some(secret) if show_secret => format!("enabled ({})", secret),
        Some(secret) => format!("enabled ({})", mask_secret(secret)),
        None => "disabled".to_string(),
    };
    out.push_str(&format!("Secret bypass: {}\n", secret));

    if let Some(cookie) = record.bypass_cookie() {
        out.push_str(&format!("Bypass cookie: {}\n", cookie));
    }
    out
}

/// JSON snapshot of the status. The secret is masked unless `show_secret`.
pub fn status_json(status: &Status, show_secret: bool) -> Value {
    match status {
        Status::Live => json!({ "active": false }),
        Status::Corrupted(detail) => json!({
            "active": true,
            "corrupted": true,
            "error": detail,
        }),
        Status::Maintenance(record) => {
            let mut snapshot = serde_json::to_value(record).unwrap_or(Value::Null);
            if !show_secret {
                if let Some(key) = snapshot.get_mut("secret_key") {
                    let masked = key.as_str().map(mask_secret).unwrap_or_default();
                    *key = Value::String(masked);
                }
            }
            json!({ "active": true, "record": snapshot })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MaintenanceRecord;
    use chrono::Duration;

    fn record() -> MaintenanceRecord {
        MaintenanceRecord::new(Some("Upgrading".into()), vec!["10.0.0.1".into()], 30)
            .with_secret("abcdef123456")
            .with_cookie_name("Ab12Cd34")
    }

    #[test]
    fn test_format_live() {
        assert_eq!(format_status(&Status::Live, "d", false, Utc::now()), "Status: LIVE\n");
    }

    #[test]
    fn test_format_maintenance_masks_secret() {
        let record = record();
        let out = format_status(&Status::Maintenance(record.clone()), "d", false, record.activated_at);
        assert!(out.contains("Status: MAINTENANCE"));
        assert!(out.contains("Message: Upgrading"));
        assert!(out.contains("Allowed IPs: 10.0.0.1"));
        assert!(out.contains("30 minutes remaining"));
        assert!(out.contains("Bypass cookie: Ab12Cd34"));
        assert!(out.contains("ab********56"));
        assert!(!out.contains("abcdef123456"));

        let shown = format_status(&Status::Maintenance(record.clone()), "d", true, record.activated_at);
        assert!(shown.contains("abcdef123456"));
    }

    #[test]
    fn test_format_overdue_and_default_message() {
        let mut record = record();
        record.message = None;
        let later = record.activated_at + Duration::minutes(45);
        let out = format_status(&Status::Maintenance(record), "Back soon", false, later);
        assert!(out.contains("Overdue"));
        assert!(out.contains("Message: Back soon (default)"));
    }

    #[test]
    fn test_format_corrupted() {
        let out = format_status(&Status::Corrupted("bad json".into()), "d", false, Utc::now());
        assert!(out.contains("record unreadable"));
        assert!(out.contains("bad json"));
    }

    #[test]
    fn test_status_json() {
        assert_eq!(status_json(&Status::Live, false), json!({ "active": false }));

        let value = status_json(&Status::Maintenance(record()), false);
        assert_eq!(value["active"], true);
        assert_eq!(value["record"]["allowed_ips"][0], "10.0.0.1");
        assert_eq!(value["record"]["secret_key"], "ab********56");

        let value = status_json(&Status::Maintenance(record()), true);
        assert_eq!(value["record"]["secret_key"], "abcdef123456");
    }
}
