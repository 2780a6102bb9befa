//! # Chemical Search
//!
//! Filtering and pagination for the public browse surface. Results are
//! ordered by name (case-insensitive) and then by id, so the same query over
//! the same data always pages identically.

use packcheck_core::{CasNumber, RegulationId};
use serde::{Deserialize, Serialize};

use crate::chemical::Chemical;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 20;
/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: usize = 100;

/// Search filters. All present filters must match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChemicalQuery {
    /// Case-insensitive substring over name, synonyms, and CAS number.
    #[serde(default)]
    pub q: Option<String>,
    /// Exact CAS number, dashed or undashed.
    #[serde(default)]
    pub cas: Option<String>,
    /// Only chemicals listed by this regulation.
    #[serde(default)]
    pub regulation_id: Option<RegulationId>,
    /// Zero-based page index.
    #[serde(default)]
    pub page: usize,
    /// Requested page size; clamped to `1..=MAX_PAGE_SIZE`.
    #[serde(default)]
    pub size: Option<usize>,
}

impl ChemicalQuery {
    /// Page size after defaulting and clamping.
    pub fn effective_size(&self) -> usize {
        self.size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Whether `chemical` passes every filter.
    pub fn matches(&self, chemical: &Chemical) -> bool {
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let needle = q.to_lowercase();
            let hit = chemical.name.to_lowercase().contains(&needle)
                || chemical
                    .synonyms
                    .iter()
                    .any(|s| s.to_lowercase().contains(&needle))
                || chemical
                    .cas_number
                    .as_ref()
                    .is_some_and(|c| c.as_str().contains(&needle));
            if !hit {
                return false;
            }
        }

        if let Some(cas) = self.cas.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            let wanted = CasNumber::parse(cas)
                .map(|c| c.as_str().to_string())
                .unwrap_or_else(|_| cas.to_string());
            if chemical.cas_number.as_ref().map(CasNumber::as_str) != Some(wanted.as_str()) {
                return false;
            }
        }

        if let Some(regulation_id) = &self.regulation_id {
            if !chemical.references(regulation_id) {
                return false;
            }
        }

        true
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of matches across all pages.
    pub total: usize,
    pub page: usize,
    pub size: usize,
}

/// Filter, order, and paginate chemicals.
pub fn search<'a, I>(chemicals: I, query: &ChemicalQuery) -> Page<Chemical>
where
    I: IntoIterator<Item = &'a Chemical>,
{
    let mut matched: Vec<&Chemical> = chemicals.into_iter().filter(|c| query.matches(c)).collect();
    matched.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });

    let size = query.effective_size();
    let total = matched.len();
    let items = matched
        .into_iter()
        .skip(query.page.saturating_mul(size))
        .take(size)
        .cloned()
        .collect();

    Page {
        items,
        total,
        page: query.page,
        size,
    }
}
