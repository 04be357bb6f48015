//! Allow-list matching for client addresses.
//!
//! Entries can be literal IPv4/IPv6 addresses or CIDR ranges, mixed freely.
//! Matching is done on parsed addresses with prefix masking, never on
//! string prefixes, so `10.0.0.0/8` matches `10.5.5.5` but not `100.0.0.1`.

use ipnet::IpNet;
use std::net::IpAddr;
use tracing::debug;

/// A parsed allow-list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowEntry {
    Addr(IpAddr),
    Net(IpNet),
}

impl AllowEntry {
    fn contains(&self, ip: &IpAddr) -> bool {
        match self {
            AllowEntry::Addr(addr) => addr == ip,
            AllowEntry::Net(net) => net.contains(ip),
        }
    }
}

/// Parse one allow-list entry. Returns `None` for malformed entries.
pub fn parse_entry(entry: &str) -> Option<AllowEntry> {
    let entry = entry.trim();
    if entry.contains('/') {
        entry.parse::<IpNet>().ok().map(AllowEntry::Net)
    } else {
        entry.parse::<IpAddr>().ok().map(AllowEntry::Addr)
    }
}

/// Check whether `candidate` matches any entry of `allowed`.
///
/// Malformed entries are skipped and a malformed candidate never matches.
/// IPv4-mapped IPv6 candidates (`::ffff:a.b.c.d`) are also tried as IPv4.
pub fn matches<S: AsRef<str>>(candidate: &str, allowed: &[S]) -> bool {
    let ip: IpAddr = match candidate.trim().parse() {
        Ok(ip) => ip,
        Err(_) => {
            debug!("Candidate address is not a valid IP: {:?}", candidate);
            return false;
        }
    };
    let mapped = match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4),
        IpAddr::V4(_) => None,
    };

    allowed.iter().any(|raw| match parse_entry(raw.as_ref()) {
        Some(entry) => entry.contains(&ip) || mapped.is_some_and(|m| entry.contains(&m)),
        None => {
            debug!("Skipping malformed allow-list entry: {:?}", raw.as_ref());
            false
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cidr_match() {
        let allowed = ["10.0.0.0/8"];
        assert!(matches("10.5.5.5", &allowed));
        assert!(!matches("11.0.0.0", &allowed));
    }

    #[test]
    fn test_cidr_is_not_string_prefix() {
        assert!(!matches("100.0.0.1", &["10.0.0.0/8"]));
        assert!(!matches("192.168.10.1", &["192.168.1.0/24"]));
    }

    #[test]
    fn test_literal_match() {
        assert!(matches("127.0.0.1", &["127.0.0.1"]));
        assert!(!matches("127.0.0.2", &["127.0.0.1"]));
    }

    #[test]
    fn test_malformed_entry_skipped() {
        let allowed = ["not-an-ip", "127.0.0.1"];
        assert!(matches("127.0.0.1", &allowed));
    }

    #[test]
    fn test_malformed_cidr_skipped() {
        let allowed = ["192.168.1.0/33", "/24", "10.0.0.0/8"];
        assert!(matches("10.1.2.3", &allowed));
        assert!(!matches("192.168.1.5", &allowed));
    }

    #[test]
    fn test_malformed_candidate_never_matches() {
        assert!(!matches("not-an-ip", &["0.0.0.0/0", "::/0"]));
        assert!(!matches("", &["127.0.0.1"]));
        assert!(!matches("256.0.0.1", &["0.0.0.0/0"]));
    }

    #[test]
    fn test_empty_allow_list() {
        let allowed: [&str; 0] = [];
        assert!(!matches("127.0.0.1", &allowed));
    }

    #[test]
    fn test_ipv6_literal_case_insensitive() {
        assert!(matches("2001:DB8::1", &["2001:db8::1"]));
        assert!(matches("2001:0db8:0000:0000:0000:0000:0000:0001", &["2001:db8::1"]));
    }

    #[test]
    fn test_ipv6_cidr() {
        let allowed = ["2001:db8::/32"];
        assert!(matches("2001:db8:ffff::1", &allowed));
        assert!(!matches("2001:db9::1", &allowed));
    }

    #[test]
    fn test_mixed_families_do_not_cross_match() {
        assert!(!matches("::1", &["127.0.0.1", "0.0.0.0/0"]));
        assert!(!matches("10.0.0.1", &["::/0"]));
    }

    #[test]
    fn test_ipv4_mapped_candidate() {
        assert!(matches("::ffff:10.1.1.1", &["10.0.0.0/8"]));
        assert!(matches("::ffff:127.0.0.1", &["127.0.0.1"]));
    }

    #[test]
    fn test_cidr_with_host_bits_set() {
        assert!(matches("192.168.1.200", &["192.168.1.7/24"]));
    }

    #[test]
    fn test_entries_are_trimmed() {
        assert!(matches("127.0.0.1", &[" 127.0.0.1 "]));
    }

    #[test]
    fn test_parse_entry() {
        assert!(matches!(parse_entry("127.0.0.1"), Some(AllowEntry::Addr(_))));
        assert!(matches!(parse_entry("10.0.0.0/8"), Some(AllowEntry::Net(_))));
        assert!(parse_entry("10.0.0.0/").is_none());
        assert!(parse_entry("hello").is_none());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::net::Ipv4Addr;

    proptest! {
        /// An address always matches its own /32
        #[test]
        fn prop_address_matches_own_host_route(a in any::<u8>(), b in any::<u8>(), c in any::<u8>(), d in any::<u8>()) {
            let ip = format!("{}.{}.{}.{}", a, b, c, d);
            let cidr = format!("{}/32", ip);
            prop_assert!(matches(&ip, &[cidr]));
            prop_assert!(matches(&ip, &[ip.clone()]));
        }

        /// CIDR matching agrees with manual prefix masking
        #[test]
        fn prop_cidr_agrees_with_mask(net in any::<u32>(), candidate in any::<u32>(), prefix in 0u8..=32) {
            let mask = if prefix == 0 { 0 } else { u32::MAX << (32 - prefix) };
            let expected = (net & mask) == (candidate & mask);
            let entry = format!("{}/{}", Ipv4Addr::from(net), prefix);
            let candidate = Ipv4Addr::from(candidate).to_string();
            prop_assert_eq!(matches(&candidate, &[entry]), expected);
        }

        /// Garbage entries never change the outcome of valid ones
        #[test]
        fn prop_garbage_entries_do_not_poison(garbage in "[a-z!@#]{1,12}", a in any::<u8>(), b in any::<u8>()) {
            let ip = format!("10.{}.{}.1", a, b);
            prop_assert!(matches(&ip, &[garbage.clone(), "10.0.0.0/8".to_string()]));
            prop_assert!(!matches(&ip, &[garbage]));
        }
    }
}
