//! Down command implementation.

use anyhow::{bail, Result};
use std::path::Path;
use tracing::info;

use crate::admin::{ActivateOutcome, Activation};
use crate::utils::{random_alnum, SECRET_LEN};
use crate::validation::{sanitize_allow_list, validate_cookie_name};

/// Options collected from `maintgate down`
#[derive(Debug, Default)]
pub struct DownOptions {
    pub message: Option<String>,
    pub ips: Vec<String>,
    pub duration: Option<u64>,
    pub secret: Option<String>,
    pub generate_secret: bool,
    pub cookie: Option<String>,
}

/// Run the down command
pub fn run(options: DownOptions, config_path: &Path) -> Result<()> {
    let (config, admin) = super::open(config_path)?;

    if let Some(ref cookie) = options.cookie {
        validate_cookie_name(cookie)?;
    }

    let secret = if options.generate_secret {
        Some(random_alnum(SECRET_LEN))
    } else {
        options.secret.filter(|s| !s.is_empty())
    };

    let activation = Activation {
        message: options.message,
        allowed_addresses: sanitize_allow_list(&options.ips),
        duration_minutes: options.duration.unwrap_or(config.default_duration_minutes),
        secret,
        cookie_name: options.cookie,
    };

    info!("Enabling maintenance mode...");

    let record = match admin.activate(activation)? {
        ActivateOutcome::Activated(record) => record,
        ActivateOutcome::AlreadyActive => {
            eprintln!("[ERROR] Application is already in maintenance mode");
            println!();
            super::status::print_status(&admin.status(), &config.gate.default_message, false);
            bail!("Maintenance mode is already active, run 'maintgate up' first");
        }
    };

    println!("[OK] Application is now in maintenance mode");
    println!();
    println!("Allowed IPs: {}", record.allowed_addresses.join(", "));
    if let Some(cookie) = record.bypass_cookie() {
        println!("Bypass cookie: {}={}", cookie, cookie);
    }
    if let Some(secret) = record.secret() {
        println!("Secret bypass: ?maintenance_secret={}", secret);
    }
    if let Some(end) = record.estimated_end_at {
        let local: chrono::DateTime<chrono::Local> = end.into();
        println!(
            "Estimated end: {} ({} minutes)",
            local.format("%Y-%m-%d %H:%M:%S"),
            record.duration_minutes
        );
    }
    println!();

    Ok(())
}
