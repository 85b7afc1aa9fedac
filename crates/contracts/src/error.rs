//! Layered error definitions
//!
//! Categorized by source: config / input / sync / sink

use thiserror::Error;

use crate::Timestamp;

/// Unified error type
///
/// Every variant is fatal to the conversion run; nothing in the pipeline downgrades
/// one of these to a warning.
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Input Errors =====
    /// File extension the reader does not know how to decode
    #[error("unsupported file extension '{extension}' for {path}, expected one of {expected}")]
    UnsupportedExtension {
        path: String,
        extension: String,
        expected: &'static str,
    },

    /// Column schema version outside the supported set
    #[error("unknown {schema} schema version {version}, supported versions are 1 and 2")]
    UnknownSchemaVersion { schema: String, version: u8 },

    /// Point scan with an unusable shape
    #[error("invalid scan: {message}")]
    InvalidScan { message: String },

    // ===== Sync Errors =====
    /// Matched stamps further apart than the configured bound
    #[error(
        "sync violation: candidate {candidate} is {skew_ns}ns from reference {reference} (limit {limit_ns}ns)"
    )]
    SyncViolation {
        reference: Timestamp,
        candidate: Timestamp,
        skew_ns: u64,
        limit_ns: u64,
    },

    /// Two collections that must line up one-to-one do not
    #[error("count mismatch for {what}: expected {expected}, got {actual}")]
    CountMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    // ===== Sink Errors =====
    /// Record kind the sink cannot serialize
    #[error("sink '{sink_name}' cannot export {kind} records")]
    UnsupportedRecord { sink_name: String, kind: String },

    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create invalid scan error
    pub fn invalid_scan(message: impl Into<String>) -> Self {
        Self::InvalidScan {
            message: message.into(),
        }
    }

    /// Create count mismatch error
    pub fn count_mismatch(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::CountMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create unsupported record error
    pub fn unsupported_record(sink_name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::UnsupportedRecord {
            sink_name: sink_name.into(),
            kind: kind.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_violation_message() {
        let err = ContractError::SyncViolation {
            reference: 1_000,
            candidate: 2_000_001_000,
            skew_ns: 2_000_000_000,
            limit_ns: 500_000_000,
        };
        let msg = err.to_string();
        assert!(msg.contains("sync violation"));
        assert!(msg.contains("limit 500000000ns"));
    }

    #[test]
    fn test_unknown_version_message() {
        let err = ContractError::UnknownSchemaVersion {
            schema: "imu".into(),
            version: 3,
        };
        assert_eq!(
            err.to_string(),
            "unknown imu schema version 3, supported versions are 1 and 2"
        );
    }
}
