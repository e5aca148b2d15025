//! Shared helpers: timestamps, identity hashing and validation

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::error::{CoreError, CoreResult};

/// Formats a timestamp as ISO-8601 UTC with millisecond precision,
/// e.g. `2021-03-17T10:00:00.000Z`.
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an ISO-8601 timestamp with any offset into UTC.
pub fn parse_time(text: &str) -> CoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| CoreError::InvalidTime(text.to_string()))
}

/// Incremental SHA-256 over an ordered sequence of UTF-8 fields.
///
/// Fields are concatenated without separators; the order of `push` calls
/// is part of the identity and must never change for a given format.
#[derive(Clone, Default)]
pub struct IdentityDigest {
    hasher: Sha256,
}

impl IdentityDigest {
    /// Creates an empty digest
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a text field
    pub fn push(&mut self, field: &str) -> &mut Self {
        self.hasher.update(field.as_bytes());
        self
    }

    /// Appends a field rendered through `Display`
    pub fn push_display(&mut self, field: impl std::fmt::Display) -> &mut Self {
        self.push(&field.to_string())
    }

    /// Finishes the digest as 64 lowercase hex characters
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

/// Convenience: digest a single text value
pub fn sha256_hex(text: &str) -> String {
    let mut digest = IdentityDigest::new();
    digest.push(text);
    digest.finish()
}

/// Trait for types that can validate themselves
pub trait Validator {
    /// Validates the instance and returns errors if invalid
    fn validate(&self) -> Result<(), Vec<String>>;

    /// Returns true if the instance is valid
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
