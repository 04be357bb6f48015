//! Common utility functions used across modules.
//!
//! - [`random_alnum`] - Random alphanumeric tokens (cookie names, secrets)
//! - [`format_remaining`] - Human-readable time left
//! - [`mask_secret`] - Hide most of a secret for display

use chrono::Duration;
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of generated bypass cookie names
pub const COOKIE_NAME_LEN: usize = 8;

/// Length of generated bypass secrets
pub const SECRET_LEN: usize = 16;

/// Generate a random ASCII alphanumeric token.
///
/// # Examples
/// ```
/// use maintgate::utils::random_alnum;
/// let token = random_alnum(8);
/// assert_eq!(token.len(), 8);
/// assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn random_alnum(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Format a remaining duration, rounding up to whole minutes.
///
/// # Examples
/// ```
/// use chrono::Duration;
/// use maintgate::utils::format_remaining;
/// assert_eq!(format_remaining(Duration::seconds(30)), "1 minute");
/// assert_eq!(format_remaining(Duration::seconds(150)), "3 minutes");
/// assert_eq!(format_remaining(Duration::seconds(3720)), "1h 2m");
/// ```
pub fn format_remaining(remaining: Duration) -> String {
    let seconds = remaining.num_seconds().max(0);
    let minutes = (seconds + 59) / 60;
    if minutes < 60 {
        if minutes == 1 {
            "1 minute".to_string()
        } else {
            format!("{} minutes", minutes)
        }
    } else {
        format!("{}h {}m", minutes / 60, minutes % 60)
    }
}

/// Show only the first and last characters of a secret.
///
/// # Examples
/// ```
/// use maintgate::utils::mask_secret;
/// assert_eq!(mask_secret("abcdef123456"), "ab********56");
/// assert_eq!(mask_secret("abc"), "***");
/// ```
pub fn mask_secret(secret: &str) -> String {
    let len = secret.chars().count();
    if len <= 4 {
        return "*".repeat(len);
    }
    let head: String = secret.chars().take(2).collect();
    let tail: String = secret.chars().skip(len - 2).collect();
    format!("{}{}{}", head, "*".repeat(len - 4), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_alnum() {
        let a = random_alnum(COOKIE_NAME_LEN);
        assert_eq!(a.len(), COOKIE_NAME_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(random_alnum(0).is_empty());

        let b = random_alnum(SECRET_LEN);
        assert_eq!(b.len(), SECRET_LEN);
        assert_ne!(b, random_alnum(SECRET_LEN));
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(Duration::zero()), "0 minutes");
        assert_eq!(format_remaining(Duration::seconds(-10)), "0 minutes");
        assert_eq!(format_remaining(Duration::seconds(60)), "1 minute");
        assert_eq!(format_remaining(Duration::seconds(61)), "2 minutes");
        assert_eq!(format_remaining(Duration::seconds(3600)), "1h 0m");
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret(""), "");
        assert_eq!(mask_secret("abcd"), "****");
        assert_eq!(mask_secret("abcde"), "ab*de");
    }
}
