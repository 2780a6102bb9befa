//! # Substances and Regulatory Limits
//!
//! Input shapes for the calculator. Names and CAS numbers are display
//! fields only and never influence the arithmetic.

use serde::{Deserialize, Serialize};

/// Unit assumed for every SML value. No unit conversion is performed.
pub const DEFAULT_SML_UNIT: &str = "mg/kg";

fn default_sml_unit() -> String {
    DEFAULT_SML_UNIT.to_string()
}

/// One regulation's specific migration limit (SML) for a substance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulatoryLimit {
    /// Opaque identifier of the regulation.
    pub regulation_id: String,
    /// Regulation short name when it has one, otherwise its full name.
    pub display_name: String,
    /// SML in mg/kg. `None` means no threshold is known for this regulation.
    #[serde(default)]
    pub sml_value: Option<f64>,
    /// Display unit for `sml_value`.
    #[serde(default = "default_sml_unit")]
    pub sml_unit: String,
}

impl RegulatoryLimit {
    /// Limit with a known SML in the default unit.
    pub fn new(regulation_id: impl Into<String>, display_name: impl Into<String>, sml_value: f64) -> Self {
        Self {
            regulation_id: regulation_id.into(),
            display_name: display_name.into(),
            sml_value: Some(sml_value),
            sml_unit: default_sml_unit(),
        }
    }

    /// Limit for a regulation that lists the substance without a threshold.
    pub fn without_sml(regulation_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            regulation_id: regulation_id.into(),
            display_name: display_name.into(),
            sml_value: None,
            sml_unit: default_sml_unit(),
        }
    }

    /// The SML when it can be compared against: finite and greater than zero.
    pub fn usable_sml(&self) -> Option<f64> {
        self.sml_value.filter(|v| v.is_finite() && *v > 0.0)
    }
}

/// A chemical under evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substance {
    /// Opaque identifier (registry id, row number, or caller-chosen key).
    pub identifier: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Display-only CAS number, unvalidated at this layer.
    #[serde(default)]
    pub cas_number: Option<String>,
    /// Measured or assumed contamination in the packaging (Q, mg/kg).
    pub contamination: f64,
    /// Limits to classify against, in display order.
    #[serde(default)]
    pub applicable_limits: Vec<RegulatoryLimit>,
}

impl Substance {
    /// Substance with no applicable limits.
    pub fn new(identifier: impl Into<String>, name: impl Into<String>, contamination: f64) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            cas_number: None,
            contamination,
            applicable_limits: Vec::new(),
        }
    }

    /// Attach a CAS number for display.
    pub fn with_cas(mut self, cas_number: impl Into<String>) -> Self {
        self.cas_number = Some(cas_number.into());
        self
    }

    /// Append a limit, keeping insertion order.
    pub fn with_limit(mut self, limit: RegulatoryLimit) -> Self {
        self.applicable_limits.push(limit);
        self
    }
}
