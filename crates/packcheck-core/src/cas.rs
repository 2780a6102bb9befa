//! # CAS Registry Numbers
//!
//! A CAS registry number has the shape `NNNNNNN-NN-R`: two to seven digits,
//! two digits, and a single check digit `R`. The check digit is the sum of
//! every other digit, weighted by its position counted from the right
//! (starting at 1), modulo 10.
//!
//! [`CasNumber`] is validated at construction time, so holding one means the
//! format and check digit have already been verified. Input is normalized:
//! surrounding whitespace is dropped and the undashed form (`7732185`) is
//! accepted and rendered with dashes.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A validated CAS registry number, stored in canonical dashed form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CasNumber(String);

impl CasNumber {
    /// Parse and validate a CAS registry number.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCasNumber`] when the input does not
    /// have the `NNNNNNN-NN-N` shape, or [`ValidationError::CasChecksumMismatch`]
    /// when the check digit is wrong.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let invalid = || ValidationError::InvalidCasNumber(trimmed.to_string());

        let (body, check) = if trimmed.contains('-') {
            let parts: Vec<&str> = trimmed.split('-').collect();
            if parts.len() != 3 {
                return Err(invalid());
            }
            let (first, second, third) = (parts[0], parts[1], parts[2]);
            if !(2..=7).contains(&first.len()) || second.len() != 2 || third.len() != 1 {
                return Err(invalid());
            }
            (format!("{first}{second}"), third.to_string())
        } else {
            if !(5..=10).contains(&trimmed.len()) || !trimmed.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            let split = trimmed.len() - 1;
            (trimmed[..split].to_string(), trimmed[split..].to_string())
        };

        if !body.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let check_digit = check
            .chars()
            .next()
            .and_then(|c| c.to_digit(10))
            .ok_or_else(invalid)?;

        let expected = check_digit_for(&body);
        if expected != check_digit {
            return Err(ValidationError::CasChecksumMismatch {
                value: trimmed.to_string(),
                expected,
            });
        }

        let split = body.len() - 2;
        Ok(Self(format!("{}-{}-{}", &body[..split], &body[split..], check_digit)))
    }

    /// The canonical dashed form, e.g. `80-05-7`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Weighted digit sum modulo 10 over the digits preceding the check digit.
fn check_digit_for(body: &str) -> u32 {
    body.chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .zip(1u32..)
        .map(|(digit, weight)| digit * weight)
        .sum::<u32>()
        % 10
}

impl TryFrom<String> for CasNumber {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CasNumber> for String {
    fn from(value: CasNumber) -> Self {
        value.0
    }
}

impl std::str::FromStr for CasNumber {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for CasNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_numbers() {
        for cas in ["7732-18-5", "50-00-0", "80-05-7", "117-81-7", "9002-88-4"] {
            let parsed = CasNumber::parse(cas).unwrap();
            assert_eq!(parsed.as_str(), cas);
        }
    }

    #[test]
    fn rejects_wrong_check_digit() {
        let err = CasNumber::parse("7732-18-4").unwrap_err();
        assert_eq!(
            err,
            ValidationError::CasChecksumMismatch {
                value: "7732-18-4".to_string(),
                expected: 5,
            }
        );
    }

    #[test]
    fn normalizes_whitespace_and_undashed_form() {
        assert_eq!(CasNumber::parse("  80-05-7 ").unwrap().as_str(), "80-05-7");
        assert_eq!(CasNumber::parse("7732185").unwrap().as_str(), "7732-18-5");
        assert_eq!(CasNumber::parse("50000").unwrap().as_str(), "50-00-0");
    }

    #[test]
    fn rejects_malformed_shapes() {
        for bad in ["", "abc", "7732-18", "7732-1-85", "1-00-0", "12345678-00-0", "77a2-18-5", "7732-18-55"] {
            assert!(
                matches!(CasNumber::parse(bad), Err(ValidationError::InvalidCasNumber(_))),
                "expected format error for {bad:?}"
            );
        }
    }

    #[test]
    fn serde_validates_on_deserialize() {
        let ok: CasNumber = serde_json::from_str("\"117-81-7\"").unwrap();
        assert_eq!(ok.to_string(), "117-81-7");
        assert_eq!(serde_json::to_string(&ok).unwrap(), "\"117-81-7\"");
        assert!(serde_json::from_str::<CasNumber>("\"117-81-8\"").is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Appending the computed check digit always yields a valid number.
        #[test]
        fn computed_check_digit_validates(body in "[1-9][0-9]{3,8}") {
            let check = check_digit_for(&body);
            let split = body.len() - 2;
            let dashed = format!("{}-{}-{}", &body[..split], &body[split..], check);
            prop_assert!(CasNumber::parse(&dashed).is_ok());
            let undashed = format!("{body}{check}");
            let parsed = CasNumber::parse(&undashed).unwrap();
            prop_assert_eq!(parsed.as_str(), dashed.as_str());
        }

        /// Any other check digit is rejected.
        #[test]
        fn wrong_check_digit_rejected(body in "[1-9][0-9]{3,8}", offset in 1u32..10) {
            let wrong = (check_digit_for(&body) + offset) % 10;
            let split = body.len() - 2;
            let dashed = format!("{}-{}-{}", &body[..split], &body[split..], wrong);
            let is_checksum_error = matches!(
                CasNumber::parse(&dashed),
                Err(ValidationError::CasChecksumMismatch { .. })
            );
            prop_assert!(is_checksum_error);
        }
    }
}
