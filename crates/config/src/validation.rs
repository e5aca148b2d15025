//! Validation of configuration values
//!
//! Every section implements [`ConfigSection`]; [`Validator`] holds the
//! field checks they share.

pub use crate::error::ValidationError;
use std::fmt::Display;

/// A named section of the config file
pub trait ConfigSection: Default {
    /// Checks every field, returning all problems found
    fn validate(&self) -> Result<(), Vec<ValidationError>>;

    /// Takes every value from `other`
    fn merge(&mut self, other: Self);

    /// Table name in the TOML file
    fn section_name(&self) -> &'static str;
}

/// Shared field checks
pub struct Validator;

impl Validator {
    /// Checks that `min <= value <= max`
    pub fn in_range<T>(value: T, min: T, max: T, field: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd + Display + Copy,
    {
        if value < min || value > max {
            Err(ValidationError::with_value(
                field,
                format!("must be between {} and {}", min, max),
                value,
            ))
        } else {
            Ok(())
        }
    }

    pub fn not_empty(value: &str, field: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            Err(ValidationError::new(field, "must not be empty"))
        } else {
            Ok(())
        }
    }

    /// Checks that an optional string, when present, is not blank
    pub fn not_blank_if_set(value: Option<&str>, field: &str) -> Result<(), ValidationError> {
        match value {
            Some(text) => Self::not_empty(text, field),
            None => Ok(()),
        }
    }

    /// Turns a list of field results into a section result
    pub fn collect_errors(
        results: Vec<Result<(), ValidationError>>,
    ) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = results.into_iter().filter_map(Result::err).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_range_bounds_are_inclusive() {
        assert!(Validator::in_range(60u64, 60, 86400, "sync.interval_secs").is_ok());
        assert!(Validator::in_range(86400u64, 60, 86400, "sync.interval_secs").is_ok());
        assert!(Validator::in_range(59u64, 60, 86400, "sync.interval_secs").is_err());
    }

    #[test]
    fn test_not_blank_if_set() {
        assert!(Validator::not_blank_if_set(None, "app.device_id").is_ok());
        assert!(Validator::not_blank_if_set(Some("urn:uuid:1"), "app.device_id").is_ok());
        assert!(Validator::not_blank_if_set(Some("  "), "app.device_id").is_err());
    }

    #[test]
    fn test_collect_errors_keeps_every_failure() {
        let results = vec![
            Ok(()),
            Err(ValidationError::new("a", "bad")),
            Err(ValidationError::new("b", "bad")),
        ];
        assert_eq!(Validator::collect_errors(results).unwrap_err().len(), 2);
        assert!(Validator::collect_errors(vec![Ok(())]).is_ok());
    }
}
