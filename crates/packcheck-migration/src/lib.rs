//! # packcheck-migration: Packaging-Migration Calculator
//!
//! Estimates how much of a packaging contaminant migrates into food and
//! compares the estimate against each regulation's specific migration
//! limit (SML):
//!
//! - **Parameters** (`parameters.rs`): the shared food-contact scenario
//!   (contact area, thickness, density, food mass), validated to be
//!   strictly positive.
//!
//! - **Substances** (`substance.rs`): contamination level plus the ordered
//!   list of regulatory limits that apply.
//!
//! - **Evaluation** (`evaluation.rs`): `M = (Q × A × Lp × D) / F` and the
//!   tri-state pass / fail / unknown classification.
//!
//! - **Export** (`export.rs`): flattening of results into report rows and
//!   CSV rendering.
//!
//! ## Crate Policy
//!
//! - Pure and synchronous: no I/O, no shared state, safe to call from any
//!   number of concurrent requests.
//! - Results borrow their inputs; nothing is persisted here.

pub mod evaluation;
pub mod export;
pub mod parameters;
pub mod substance;

pub use evaluation::{classify, compute_m_value, evaluate, CalculationResult, LimitOutcome, Verdict};
pub use export::{ExportError, ExportRow, HEADERS};
pub use parameters::PackagingParameters;
pub use substance::{RegulatoryLimit, Substance, DEFAULT_SML_UNIT};
