//! # packcheck-registry: Chemical & Regulation Registry
//!
//! The admin-managed data behind the calculator:
//!
//! - **Regulations** (`regulation.rs`): named rule sets with a display name
//!   that prefers the short form.
//!
//! - **Chemicals** (`chemical.rs`): CAS-identified substances and their
//!   per-regulation listings (SML, unit, restriction).
//!
//! - **Search** (`search.rs`): case-insensitive filtering with stable
//!   ordering and pagination.
//!
//! - **Limit resolution** (`limits.rs`): converts a chemical's listings into
//!   calculator [`RegulatoryLimit`](packcheck_migration::RegulatoryLimit)s.
//!
//! - **Snapshots** (`snapshot.rs`): whole-registry YAML/JSON files used to
//!   seed the API and back the CLI.
//!
//! ## Crate Policy
//!
//! - Depends on `packcheck-core` and `packcheck-migration` internally.
//! - Storage-agnostic: records are plain data; the API owns persistence.

pub mod chemical;
pub mod error;
pub mod limits;
pub mod regulation;
pub mod search;
pub mod snapshot;

pub use chemical::{Chemical, RegulationListing};
pub use error::RegistryError;
pub use limits::{resolve_limits, substance_for, RegulationLookup};
pub use regulation::Regulation;
pub use search::{search, ChemicalQuery, Page, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use snapshot::RegistrySnapshot;
