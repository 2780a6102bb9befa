//! # packcheck-core: Foundational Types
//!
//! Shared type-system primitives for the packcheck workspace. Every other
//! crate depends on `packcheck-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `ChemicalId` and `RegulationId`
//!    are distinct types over UUIDs. No bare UUIDs cross crate boundaries.
//!
//! 2. **Validated `CasNumber`.** A CAS registry number is checked for shape
//!    and check digit when constructed, and stored in canonical dashed form.
//!
//! 3. **One `ValidationError`.** The migration calculator, registry loader,
//!    API and CLI all report bad input through the same enum, so the field
//!    name and rejected value reach the user unchanged.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `packcheck-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod cas;
pub mod error;
pub mod identity;

// Re-export primary types for ergonomic imports.
pub use cas::CasNumber;
pub use error::{require_text, PackcheckError, ValidationError};
pub use identity::{ChemicalId, RegulationId};
