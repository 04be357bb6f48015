//! Validation of operator input for maintgate.
//!
//! This module provides unified validation for:
//! - IP addresses and CIDR ranges in allow-lists
//! - Bypass cookie names

use anyhow::{bail, Result};
use ipnet::IpNet;
use std::net::IpAddr;
use tracing::warn;

use crate::error::GateError;

/// Address used when an allow-list ends up empty
pub const FALLBACK_ALLOWED_ADDRESS: &str = "127.0.0.1";

/// Validate an IP address string and return the parsed IpAddr.
///
/// # Examples
/// ```
/// use maintgate::validation::validate_ip;
/// assert!(validate_ip("192.168.1.1").is_ok());
/// assert!(validate_ip("::1").is_ok());
/// assert!(validate_ip("invalid").is_err());
/// ```
pub fn validate_ip(ip_str: &str) -> Result<IpAddr> {
    let ip: IpAddr = ip_str
        .trim()
        .parse()
        .map_err(|_| GateError::InvalidIp(ip_str.to_string()))?;
    Ok(ip)
}

/// Validate an IP address or CIDR string and return the parsed IpNet.
///
/// If the input is a plain IP address (without /prefix), it will be converted
/// to a /32 (IPv4) or /128 (IPv6) network.
///
/// # Examples
/// ```
/// use maintgate::validation::validate_ip_or_cidr;
/// assert!(validate_ip_or_cidr("192.168.1.1").is_ok());
/// assert!(validate_ip_or_cidr("192.168.0.0/24").is_ok());
/// assert!(validate_ip_or_cidr("invalid").is_err());
/// ```
pub fn validate_ip_or_cidr(ip_str: &str) -> Result<IpNet> {
    let ip_str = ip_str.trim();
    if ip_str.contains('/') {
        ip_str
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid CIDR: {}", ip_str))
    } else {
        let ip = validate_ip(ip_str)?;
        Ok(IpNet::from(ip))
    }
}

/// Clean an allow-list given on the command line.
///
/// Invalid entries are dropped with a warning. Entries are kept in the form
/// the operator wrote them (trimmed), so `10.0.0.1` is not rewritten as
/// `10.0.0.1/32`. An empty result falls back to [`FALLBACK_ALLOWED_ADDRESS`].
///
/// # Examples
/// ```
/// use maintgate::validation::sanitize_allow_list;
/// let list = sanitize_allow_list(&["10.0.0.0/8".to_string(), "bogus".to_string()]);
/// assert_eq!(list, vec!["10.0.0.0/8"]);
/// assert_eq!(sanitize_allow_list(&[]), vec!["127.0.0.1"]);
/// ```
pub fn sanitize_allow_list(entries: &[String]) -> Vec<String> {
    let mut valid = Vec::with_capacity(entries.len());
    for entry in entries {
        let trimmed = entry.trim();
        match validate_ip_or_cidr(trimmed) {
            Ok(_) => valid.push(trimmed.to_string()),
            Err(e) => warn!("Ignoring allow-list entry: {}", e),
        }
    }

    if valid.is_empty() {
        valid.push(FALLBACK_ALLOWED_ADDRESS.to_string());
    }
    valid
}

/// Validate a bypass cookie name.
///
/// Cookie names must be non-empty RFC 6265 tokens: visible ASCII without
/// separators.
pub fn validate_cookie_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("Cookie name cannot be empty");
    }

    if !name.is_ascii() {
        bail!("Invalid cookie name '{}'. Only ASCII characters allowed", name);
    }

    const SEPARATORS: &[char] = &[
        '(', ')', '<', '>', '@', ',', ';', ':', '\\', '"', '/', '[', ']', '?', '=', '{', '}',
    ];
    if let Some(c) = name
        .chars()
        .find(|c| c.is_ascii_control() || c.is_ascii_whitespace() || SEPARATORS.contains(c))
    {
        bail!("Invalid cookie name '{}'. Character {:?} is not allowed", name, c);
    }

    Ok(())
}
