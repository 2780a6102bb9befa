//! # packcheck-cli: Command-Line Interface
//!
//! Offline access to the calculator and registry, for batch runs and for
//! checking data files before they reach the API server.
//!
//! ## Subcommands
//!
//! - `calculate`: Migration calculation from a scenario file
//! - `cas`: CAS registry number validation
//! - `registry check`: Registry snapshot validation
//!
//! ## Crate Policy
//!
//! - CLI construction (argument parsing) is separated from business logic.
//! - Handler functions delegate to domain crates and return an exit code.

pub mod calculate;
pub mod cas;
pub mod registry;
