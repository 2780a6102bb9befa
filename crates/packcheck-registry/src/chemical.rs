//! # Chemicals
//!
//! A chemical record and its listings. A listing says that a regulation
//! covers the chemical, optionally with a specific migration limit (SML)
//! and a free-text restriction.

use chrono::{DateTime, Utc};
use packcheck_core::{require_text, CasNumber, ChemicalId, RegulationId, ValidationError};
use packcheck_migration::DEFAULT_SML_UNIT;
use serde::{Deserialize, Serialize};

/// Maximum length of a chemical name or synonym.
pub const MAX_NAME_LEN: usize = 255;

fn default_sml_unit() -> String {
    DEFAULT_SML_UNIT.to_string()
}

/// One regulation's entry for a chemical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulationListing {
    pub regulation_id: RegulationId,
    /// SML in `sml_unit`. `None` when the regulation lists the chemical
    /// without a numeric limit.
    #[serde(default)]
    pub sml_value: Option<f64>,
    #[serde(default = "default_sml_unit")]
    pub sml_unit: String,
    /// Free-text condition of use, e.g. "only in PET".
    #[serde(default)]
    pub restriction: Option<String>,
}

impl RegulationListing {
    pub fn new(regulation_id: RegulationId, sml_value: Option<f64>) -> Self {
        Self {
            regulation_id,
            sml_value,
            sml_unit: default_sml_unit(),
            restriction: None,
        }
    }

    /// An SML, when present, must be finite and non-negative.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.sml_value {
            Some(value) if !(value.is_finite() && value >= 0.0) => Err(ValidationError::InvalidSml {
                regulation: self.regulation_id.to_string(),
                value,
            }),
            _ => Ok(()),
        }
    }
}

/// A chemical record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chemical {
    pub id: ChemicalId,
    pub name: String,
    #[serde(default)]
    pub cas_number: Option<CasNumber>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    /// Listings in display order.
    #[serde(default)]
    pub listings: Vec<RegulationListing>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chemical {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ChemicalId::new(),
            name: name.into(),
            cas_number: None,
            synonyms: Vec::new(),
            listings: Vec::new(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_cas(mut self, cas: CasNumber) -> Self {
        self.cas_number = Some(cas);
        self
    }

    pub fn with_synonym(mut self, synonym: impl Into<String>) -> Self {
        self.synonyms.push(synonym.into());
        self
    }

    pub fn with_listing(mut self, listing: RegulationListing) -> Self {
        self.listings.push(listing);
        self
    }

    /// Whether any listing points at `regulation_id`.
    pub fn references(&self, regulation_id: &RegulationId) -> bool {
        self.listings.iter().any(|l| &l.regulation_id == regulation_id)
    }

    /// Check name, synonyms, and listing SMLs. Reports the first problem.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, MAX_NAME_LEN)?;
        for synonym in &self.synonyms {
            require_text("synonyms", synonym, MAX_NAME_LEN)?;
        }
        for listing in &self.listings {
            listing.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bpa() -> Chemical {
        Chemical::new("Bisphenol A")
            .with_cas(CasNumber::parse("80-05-7").unwrap())
            .with_synonym("BPA")
    }

    #[test]
    fn references_matches_listing() {
        let eu = RegulationId::new();
        let other = RegulationId::new();
        let chem = bpa().with_listing(RegulationListing::new(eu, Some(0.05)));
        assert!(chem.references(&eu));
        assert!(!chem.references(&other));
    }

    #[test]
    fn validate_accepts_zero_and_missing_sml() {
        let chem = bpa()
            .with_listing(RegulationListing::new(RegulationId::new(), Some(0.0)))
            .with_listing(RegulationListing::new(RegulationId::new(), None));
        assert!(chem.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_sml() {
        for value in [-1.0, f64::NAN, f64::INFINITY] {
            let chem = bpa().with_listing(RegulationListing::new(RegulationId::new(), Some(value)));
            assert_eq!(chem.validate().unwrap_err().field(), Some("sml_value"));
        }
    }

    #[test]
    fn validate_rejects_blank_synonym() {
        let chem = bpa().with_synonym("");
        assert_eq!(chem.validate(), Err(ValidationError::EmptyField("synonyms")));
    }

    #[test]
    fn listing_unit_defaults_on_deserialize() {
        let id = RegulationId::new();
        let json = format!(r#"{{"regulation_id": "{id}", "sml_value": 0.6}}"#);
        let listing: RegulationListing = serde_json::from_str(&json).unwrap();
        assert_eq!(listing.sml_unit, "mg/kg");
        assert_eq!(listing.restriction, None);
    }
}
