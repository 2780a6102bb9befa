//! # Registry Snapshots
//!
//! A snapshot is a YAML or JSON file holding a whole registry: regulations
//! and chemicals, with chemicals referring to regulations by a
//! snapshot-local `key`. Snapshots seed the API at startup and back the CLI's
//! registry lookups.
//!
//! ```yaml
//! regulations:
//!   - key: eu-10-2011
//!     name: Commission Regulation (EU) No 10/2011
//!     short_name: EU 10/2011
//!     jurisdiction: EU
//! chemicals:
//!   - name: Bisphenol A
//!     cas_number: 80-05-7
//!     synonyms: [BPA]
//!     listings:
//!       - regulation: eu-10-2011
//!         sml_value: 0.05
//! ```
//!
//! Validation collects every problem rather than stopping at the first, so
//! an operator can fix a snapshot in one pass.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::Utc;
use packcheck_core::{CasNumber, ChemicalId, RegulationId};
use packcheck_migration::DEFAULT_SML_UNIT;
use serde::{Deserialize, Serialize};

use crate::chemical::{Chemical, RegulationListing};
use crate::error::RegistryError;
use crate::regulation::Regulation;

fn default_sml_unit() -> String {
    DEFAULT_SML_UNIT.to_string()
}

/// Regulation entry in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRegulation {
    /// Snapshot-local key that chemical listings refer to.
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub jurisdiction: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub reference_url: Option<String>,
}

/// Listing entry in a snapshot chemical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotListing {
    /// Key of a regulation in the same snapshot.
    pub regulation: String,
    #[serde(default)]
    pub sml_value: Option<f64>,
    #[serde(default = "default_sml_unit")]
    pub sml_unit: String,
    #[serde(default)]
    pub restriction: Option<String>,
}

/// Chemical entry in a snapshot. The CAS number stays a raw string here so
/// that a bad one is reported by [`RegistrySnapshot::validate`] together
/// with every other problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotChemical {
    pub name: String,
    #[serde(default)]
    pub cas_number: Option<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub listings: Vec<SnapshotListing>,
}

/// A whole registry as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    #[serde(default)]
    pub regulations: Vec<SnapshotRegulation>,
    #[serde(default)]
    pub chemicals: Vec<SnapshotChemical>,
}

impl RegistrySnapshot {
    /// Read and parse a snapshot. `.json` files are parsed as JSON, anything
    /// else as YAML.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let parsed = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };

        let snapshot: Self = parsed.map_err(|message| RegistryError::Parse {
            path: path.to_path_buf(),
            message,
        })?;

        tracing::debug!(
            path = %path.display(),
            regulations = snapshot.regulations.len(),
            chemicals = snapshot.chemicals.len(),
            "registry snapshot parsed"
        );
        Ok(snapshot)
    }

    /// Every consistency problem, in file order.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let mut keys = HashSet::new();
        for (i, reg) in self.regulations.iter().enumerate() {
            if reg.key.trim().is_empty() {
                problems.push(format!("regulations[{i}]: key must not be empty"));
            } else if !keys.insert(reg.key.as_str()) {
                problems.push(format!("regulations[{i}]: duplicate key \"{}\"", reg.key));
            }
            if reg.name.trim().is_empty() {
                problems.push(format!("regulations[{i}]: name must not be empty"));
            }
        }

        let mut seen_cas: HashMap<String, usize> = HashMap::new();
        for (i, chem) in self.chemicals.iter().enumerate() {
            if chem.name.trim().is_empty() {
                problems.push(format!("chemicals[{i}]: name must not be empty"));
            }

            if let Some(raw) = &chem.cas_number {
                match CasNumber::parse(raw) {
                    Ok(cas) => {
                        if let Some(first) = seen_cas.insert(cas.as_str().to_string(), i) {
                            problems.push(format!(
                                "chemicals[{i}]: CAS number {cas} already used by chemicals[{first}]"
                            ));
                        }
                    }
                    Err(e) => problems.push(format!("chemicals[{i}]: {e}")),
                }
            }

            for (j, listing) in chem.listings.iter().enumerate() {
                if !keys.contains(listing.regulation.as_str()) {
                    problems.push(format!(
                        "chemicals[{i}].listings[{j}]: unknown regulation \"{}\"",
                        listing.regulation
                    ));
                }
                if let Some(v) = listing.sml_value {
                    if !(v.is_finite() && v >= 0.0) {
                        problems.push(format!(
                            "chemicals[{i}].listings[{j}]: SML must be a finite, non-negative number (got {v})"
                        ));
                    }
                }
            }
        }

        problems
    }

    /// Fail with every problem found, or succeed if there are none.
    pub fn validate(&self) -> Result<(), RegistryError> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(RegistryError::Invalid(problems))
        }
    }

    /// Validate, then mint ids and build registry records.
    pub fn into_records(self) -> Result<(Vec<Regulation>, Vec<Chemical>), RegistryError> {
        self.validate()?;
        let now = Utc::now();

        let mut ids: HashMap<String, RegulationId> = HashMap::new();
        let regulations: Vec<Regulation> = self
            .regulations
            .into_iter()
            .map(|r| {
                let id = RegulationId::new();
                ids.insert(r.key, id);
                Regulation {
                    id,
                    name: r.name,
                    short_name: r.short_name,
                    jurisdiction: r.jurisdiction,
                    description: r.description,
                    reference_url: r.reference_url,
                    created_at: now,
                    updated_at: now,
                }
            })
            .collect();

        let mut chemicals = Vec::with_capacity(self.chemicals.len());
        for c in self.chemicals {
            let cas_number = c
                .cas_number
                .as_deref()
                .map(CasNumber::parse)
                .transpose()
                .map_err(|e| RegistryError::Invalid(vec![e.to_string()]))?;

            let listings = c
                .listings
                .into_iter()
                .filter_map(|l| {
                    ids.get(&l.regulation).map(|id| RegulationListing {
                        regulation_id: *id,
                        sml_value: l.sml_value,
                        sml_unit: l.sml_unit,
                        restriction: l.restriction,
                    })
                })
                .collect();

            chemicals.push(Chemical {
                id: ChemicalId::new(),
                name: c.name,
                cas_number,
                synonyms: c.synonyms,
                listings,
                notes: c.notes,
                created_at: now,
                updated_at: now,
            });
        }

        Ok((regulations, chemicals))
    }
}
