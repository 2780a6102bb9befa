//! # Regulations
//!
//! A regulation is a named body of food-contact rules (e.g. "Commission
//! Regulation (EU) No 10/2011"). Chemicals reference regulations through
//! their listings; the regulation itself carries only descriptive data.

use chrono::{DateTime, Utc};
use packcheck_core::{require_text, RegulationId, ValidationError};
use serde::{Deserialize, Serialize};

/// Maximum length of a regulation's full name.
pub const MAX_NAME_LEN: usize = 255;
/// Maximum length of a regulation's short name.
pub const MAX_SHORT_NAME_LEN: usize = 64;

/// A regulation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regulation {
    pub id: RegulationId,
    /// Full official name.
    pub name: String,
    /// Abbreviation shown in tables and exports (e.g. "EU 10/2011").
    #[serde(default)]
    pub short_name: Option<String>,
    /// Issuing jurisdiction (e.g. "EU", "CN").
    #[serde(default)]
    pub jurisdiction: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub reference_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Regulation {
    /// New regulation with a fresh id and only the required name set.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: RegulationId::new(),
            name: name.into(),
            short_name: None,
            jurisdiction: None,
            description: None,
            reference_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_short_name(mut self, short_name: impl Into<String>) -> Self {
        self.short_name = Some(short_name.into());
        self
    }

    pub fn with_jurisdiction(mut self, jurisdiction: impl Into<String>) -> Self {
        self.jurisdiction = Some(jurisdiction.into());
        self
    }

    /// Short name when it is set and not blank, otherwise the full name.
    pub fn display_name(&self) -> &str {
        match self.short_name.as_deref() {
            Some(short) if !short.trim().is_empty() => short,
            _ => &self.name,
        }
    }

    /// Check required fields and length limits.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, MAX_NAME_LEN)?;
        if let Some(short) = &self.short_name {
            if short.chars().count() > MAX_SHORT_NAME_LEN {
                return Err(ValidationError::FieldTooLong {
                    field: "short_name",
                    max: MAX_SHORT_NAME_LEN,
                });
            }
        }
        Ok(())
    }
}
