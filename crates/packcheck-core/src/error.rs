//! # Error Types: Structured Error Hierarchy
//!
//! Defines the error types shared by every packcheck crate. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Validation errors name the offending field and carry the rejected value,
//!   so API and CLI callers can point the user at the input to correct.
//! - Registry errors are defined in `packcheck-registry` and folded in here
//!   as strings to keep this crate at the leaf of the DAG.

use thiserror::Error;

/// Top-level error type for packcheck.
#[derive(Error, Debug)]
pub enum PackcheckError {
    /// Input failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Registry data is inconsistent or could not be loaded.
    #[error("registry error: {0}")]
    Registry(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Validation failure for a single input value.
///
/// Raised at the system boundary (request parsing, file loading) and by the
/// migration calculator when packaging parameters are not strictly positive
/// or the estimate overflows.
/// Retrying with the same input always yields the same error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A packaging parameter is zero, negative, or not a finite number.
    #[error("{field} must be a finite number greater than zero (got {value})")]
    NonPositiveParameter {
        /// Parameter name as exposed to callers (e.g. `food_mass`).
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// The migration estimate overflowed: every input was in range but the
    /// product is not a finite number.
    #[error("migration estimate for \"{substance}\" is not a finite number (got {value}); reduce the packaging parameters or contamination")]
    NonFiniteEstimate {
        /// Identifier of the substance, empty for a bare estimate.
        substance: String,
        /// The computed value.
        value: f64,
    },

    /// A contamination level is negative or not a finite number.
    #[error("contamination for \"{substance}\" must be a finite, non-negative number (got {value})")]
    InvalidContamination {
        /// Name or identifier of the substance.
        substance: String,
        /// The rejected value.
        value: f64,
    },

    /// A specific migration limit is negative or not a finite number.
    #[error("SML for regulation \"{regulation}\" must be a finite, non-negative number (got {value})")]
    InvalidSml {
        /// Regulation the limit belongs to.
        regulation: String,
        /// The rejected value.
        value: f64,
    },

    /// CAS registry number does not match `NNNNNNN-NN-N`.
    #[error("invalid CAS number format: \"{0}\" (expected 2-7 digits, 2 digits, 1 check digit)")]
    InvalidCasNumber(String),

    /// CAS registry number has the right shape but a wrong check digit.
    #[error("CAS number \"{value}\" fails checksum (expected check digit {expected})")]
    CasChecksumMismatch {
        /// The rejected value.
        value: String,
        /// The check digit the other digits call for.
        expected: u32,
    },

    /// A required text field is empty or whitespace-only.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// A text field exceeds its maximum length.
    #[error("{field} must not exceed {max} characters")]
    FieldTooLong {
        /// Field name.
        field: &'static str,
        /// Maximum permitted length in characters.
        max: usize,
    },

    /// A list has more entries than allowed.
    #[error("{field} must not contain more than {max} entries")]
    TooManyItems {
        /// Field name.
        field: &'static str,
        /// Maximum permitted number of entries.
        max: usize,
    },

    /// An identifier refers to a record that does not exist.
    #[error("{field} refers to unknown record \"{value}\"")]
    UnknownReference {
        /// Field holding the reference.
        field: &'static str,
        /// The unresolved identifier.
        value: String,
    },
}

impl ValidationError {
    /// Name of the field that failed validation, when one applies.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::NonPositiveParameter { field, .. } => Some(*field),
            Self::NonFiniteEstimate { .. } => None,
            Self::InvalidContamination { .. } => Some("contamination"),
            Self::InvalidSml { .. } => Some("sml_value"),
            Self::InvalidCasNumber(_) | Self::CasChecksumMismatch { .. } => Some("cas_number"),
            Self::EmptyField(field) => Some(*field),
            Self::FieldTooLong { field, .. }
            | Self::TooManyItems { field, .. }
            | Self::UnknownReference { field, .. } => Some(*field),
        }
    }
}

/// Check that a required text field is present and within `max` characters.
pub fn require_text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    if value.chars().count() > max {
        return Err(ValidationError::FieldTooLong { field, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_parameter_display_names_field() {
        let err = ValidationError::NonPositiveParameter {
            field: "food_mass",
            value: 0.0,
        };
        let msg = format!("{err}");
        assert!(msg.contains("food_mass"));
        assert!(msg.contains("greater than zero"));
        assert_eq!(err.field(), Some("food_mass"));
    }

    #[test]
    fn non_finite_estimate_has_no_single_field() {
        let err = ValidationError::NonFiniteEstimate {
            substance: "s1".to_string(),
            value: f64::INFINITY,
        };
        assert!(format!("{err}").contains("\"s1\" is not a finite number (got inf)"));
        assert_eq!(err.field(), None);
    }

    #[test]
    fn packcheck_error_wraps_validation() {
        let err: PackcheckError = ValidationError::EmptyField("name").into();
        let msg = format!("{err}");
        assert!(msg.starts_with("validation error"));
        assert!(msg.contains("name must not be empty"));
    }

    #[test]
    fn packcheck_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.yaml");
        let err: PackcheckError = io.into();
        assert!(format!("{err}").contains("missing.yaml"));
    }

    #[test]
    fn checksum_mismatch_reports_expected_digit() {
        let err = ValidationError::CasChecksumMismatch {
            value: "7732-18-4".to_string(),
            expected: 5,
        };
        assert!(format!("{err}").contains("expected check digit 5"));
        assert_eq!(err.field(), Some("cas_number"));
    }

    #[test]
    fn unknown_reference_names_field_and_value() {
        let err = ValidationError::UnknownReference {
            field: "regulation_id",
            value: "abc".to_string(),
        };
        assert_eq!(format!("{err}"), "regulation_id refers to unknown record \"abc\"");
        assert_eq!(err.field(), Some("regulation_id"));
    }

    #[test]
    fn require_text_rejects_blank_and_long() {
        assert_eq!(
            require_text("name", "   ", 10),
            Err(ValidationError::EmptyField("name"))
        );
        assert_eq!(
            require_text("name", "abcdefghijk", 10),
            Err(ValidationError::FieldTooLong {
                field: "name",
                max: 10
            })
        );
        assert!(require_text("name", "Bisphenol A", 255).is_ok());
    }
}
