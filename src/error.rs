//! Error types for maintgate.
//!
//! A legitimate block is not an error: it is returned as
//! [`Verdict::Deny`](crate::gate::Verdict::Deny) by the gate.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Corrupted maintenance record: {0}")]
    CorruptedRecord(String),

    #[error("Maintenance mode is already active")]
    AlreadyActive,

    #[error("Maintenance mode is not active")]
    NotActive,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid IP address: {0}")]
    InvalidIp(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            GateError::Storage("disk full".into()).to_string(),
            "Storage error: disk full"
        );
        assert_eq!(
            GateError::AlreadyActive.to_string(),
            "Maintenance mode is already active"
        );
    }
}
