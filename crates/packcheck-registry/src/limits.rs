//! # Limit Resolution
//!
//! Turns a registry chemical into the calculator's input shape: one
//! [`RegulatoryLimit`] per listing, labelled with the regulation's display
//! name.

use std::collections::HashMap;

use packcheck_core::RegulationId;
use packcheck_migration::{RegulatoryLimit, Substance};

use crate::chemical::Chemical;
use crate::regulation::Regulation;

/// Lookup of regulation display names by id.
///
/// Implemented for the plain collections used by the CLI and tests; the API
/// implements it over its shared store.
pub trait RegulationLookup {
    /// Display name of the regulation, or `None` if it is not known.
    fn display_name_of(&self, id: &RegulationId) -> Option<String>;
}

impl RegulationLookup for HashMap<RegulationId, Regulation> {
    fn display_name_of(&self, id: &RegulationId) -> Option<String> {
        self.get(id).map(|r| r.display_name().to_string())
    }
}

impl RegulationLookup for [Regulation] {
    fn display_name_of(&self, id: &RegulationId) -> Option<String> {
        self.iter()
            .find(|r| &r.id == id)
            .map(|r| r.display_name().to_string())
    }
}

impl RegulationLookup for Vec<Regulation> {
    fn display_name_of(&self, id: &RegulationId) -> Option<String> {
        self.as_slice().display_name_of(id)
    }
}

/// Resolve the limits that apply to `chemical`, in listing order.
///
/// Listings whose regulation is unknown are skipped with a warning. When
/// `filter` is given, only listings for those regulations are kept; the
/// filter's own order is ignored.
pub fn resolve_limits<L>(
    chemical: &Chemical,
    regulations: &L,
    filter: Option<&[RegulationId]>,
) -> Vec<RegulatoryLimit>
where
    L: RegulationLookup + ?Sized,
{
    chemical
        .listings
        .iter()
        .filter(|listing| filter.map_or(true, |ids| ids.contains(&listing.regulation_id)))
        .filter_map(|listing| {
            let Some(display_name) = regulations.display_name_of(&listing.regulation_id) else {
                tracing::warn!(
                    chemical_id = %chemical.id,
                    regulation_id = %listing.regulation_id,
                    "listing references unknown regulation, skipping"
                );
                return None;
            };
            Some(RegulatoryLimit {
                regulation_id: listing.regulation_id.to_string(),
                display_name,
                sml_value: listing.sml_value,
                sml_unit: listing.sml_unit.clone(),
            })
        })
        .collect()
}

/// Build a calculator substance from a registry chemical.
pub fn substance_for<L>(
    chemical: &Chemical,
    contamination: f64,
    regulations: &L,
    filter: Option<&[RegulationId]>,
) -> Substance
where
    L: RegulationLookup + ?Sized,
{
    Substance {
        identifier: chemical.id.to_string(),
        name: chemical.name.clone(),
        cas_number: chemical.cas_number.as_ref().map(|c| c.as_str().to_string()),
        contamination,
        applicable_limits: resolve_limits(chemical, regulations, filter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemical::RegulationListing;
    use packcheck_core::CasNumber;

    fn regulations() -> Vec<Regulation> {
        vec![
            Regulation::new("Commission Regulation (EU) No 10/2011").with_short_name("EU 10/2011"),
            Regulation::new("GB 9685-2016"),
        ]
    }

    #[test]
    fn resolves_in_listing_order_with_display_names() {
        let regs = regulations();
        let chem = Chemical::new("Bisphenol A")
            .with_listing(RegulationListing::new(regs[1].id, None))
            .with_listing(RegulationListing::new(regs[0].id, Some(0.05)));

        let limits = resolve_limits(&chem, &regs, None);
        let names: Vec<&str> = limits.iter().map(|l| l.display_name.as_str()).collect();
        assert_eq!(names, vec!["GB 9685-2016", "EU 10/2011"]);
        assert_eq!(limits[0].sml_value, None);
        assert_eq!(limits[1].sml_value, Some(0.05));
        assert_eq!(limits[1].regulation_id, regs[0].id.to_string());
    }

    #[test]
    fn unknown_regulations_are_skipped() {
        let regs = regulations();
        let chem = Chemical::new("X")
            .with_listing(RegulationListing::new(RegulationId::new(), Some(1.0)))
            .with_listing(RegulationListing::new(regs[0].id, Some(2.0)));
        let limits = resolve_limits(&chem, &regs, None);
        assert_eq!(limits.len(), 1);
        assert_eq!(limits[0].display_name, "EU 10/2011");
    }

    #[test]
    fn filter_keeps_listing_order() {
        let regs = regulations();
        let chem = Chemical::new("X")
            .with_listing(RegulationListing::new(regs[0].id, Some(1.0)))
            .with_listing(RegulationListing::new(regs[1].id, Some(2.0)));
        let filter = [regs[1].id, regs[0].id];
        let limits = resolve_limits(&chem, &regs, Some(&filter[..]));
        assert_eq!(limits[0].sml_value, Some(1.0));
        assert_eq!(limits[1].sml_value, Some(2.0));

        let only_gb = [regs[1].id];
        let limits = resolve_limits(&chem, &regs, Some(&only_gb[..]));
        assert_eq!(limits.len(), 1);
        assert_eq!(limits[0].display_name, "GB 9685-2016");
    }

    #[test]
    fn hashmap_lookup_matches_slice_lookup() {
        let regs = regulations();
        let map: HashMap<RegulationId, Regulation> = regs.iter().map(|r| (r.id, r.clone())).collect();
        assert_eq!(map.display_name_of(&regs[0].id).as_deref(), Some("EU 10/2011"));
        assert_eq!(map.display_name_of(&RegulationId::new()), None);
    }

    #[test]
    fn substance_carries_display_fields() {
        let regs = regulations();
        let chem = Chemical::new("Water")
            .with_cas(CasNumber::parse("7732185").unwrap())
            .with_listing(RegulationListing::new(regs[0].id, Some(60.0)));
        let s = substance_for(&chem, 5.0, &regs, None);
        assert_eq!(s.identifier, chem.id.to_string());
        assert_eq!(s.cas_number.as_deref(), Some("7732-18-5"));
        assert_eq!(s.contamination, 5.0);
        assert_eq!(s.applicable_limits.len(), 1);
    }
}
