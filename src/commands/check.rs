//! Check command implementation.

use anyhow::{bail, Result};
use std::path::Path;

use crate::config::Config;
use crate::gate::{AllowReason, Gate, Verdict};
use crate::resolver::Evidence;
use crate::validation::validate_ip;

/// Run the check command
pub fn run(ip: &str, secret: Option<String>, cookies: &[String], config_path: &Path) -> Result<()> {
    validate_ip(ip)?;

    let config = Config::load_or_default(config_path)?;
    let gate = Gate::from_config(&config, super::shared_cache(&config.storage));

    let mut evidence = Evidence::new(ip);
    if let Some(secret) = secret {
        evidence = evidence.with_secret(secret);
    }
    for cookie in cookies {
        let (name, value) = parse_cookie(cookie)?;
        evidence = evidence.with_cookie(name, value);
    }

    println!();
    match gate.check(&evidence) {
        Verdict::Allow(reason) => println!("Request from {} is ALLOWED ({})", ip, describe(reason)),
        Verdict::Deny(denial) => {
            println!("Request from {} is BLOCKED", ip);
            println!("Message: {}", denial.message);
            println!("Retry-After: {}", denial.retry_after_seconds);
        }
    }
    println!();

    Ok(())
}

fn parse_cookie(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value)),
        _ => bail!("Invalid cookie '{}', expected NAME=VALUE", raw),
    }
}

fn describe(reason: AllowReason) -> String {
    match reason {
        AllowReason::Live => "application is live".to_string(),
        AllowReason::OperatorContext => "operator context".to_string(),
        AllowReason::Bypass(bypass) => format!("bypass via {}", bypass),
        AllowReason::FailOpen => "maintenance data unreadable, failing open".to_string(),
    }
}
