//! # Route Modules
//!
//! Each module defines an Axum Router for one API surface area.
//! Routers are merged into the application in [`crate::app`].

pub mod chemicals;
pub mod migration;
pub mod regulations;
