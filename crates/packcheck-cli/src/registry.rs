//! # Registry Subcommand
//!
//! Offline checks for registry snapshot files, the same files the API
//! server loads through `PACKCHECK_SEED`.
//!
//! ```bash
//! packcheck registry check registry.yaml
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use packcheck_registry::RegistrySnapshot;

/// Registry subcommand arguments.
#[derive(Args, Debug)]
pub struct RegistryArgs {
    #[command(subcommand)]
    pub command: RegistryCommand,
}

/// Available registry subcommands.
#[derive(Subcommand, Debug)]
pub enum RegistryCommand {
    /// Validate a snapshot and report every problem found.
    Check {
        /// Snapshot file (YAML, or JSON with a `.json` extension).
        snapshot: PathBuf,
    },
}

/// Execute the registry subcommand.
pub fn run_registry(args: &RegistryArgs) -> Result<u8> {
    match &args.command {
        RegistryCommand::Check { snapshot } => run_check(snapshot),
    }
}

fn run_check(path: &Path) -> Result<u8> {
    let snapshot = RegistrySnapshot::load(path)
        .with_context(|| format!("failed to load snapshot: {}", path.display()))?;
    let problems = snapshot.problems();

    if problems.is_empty() {
        println!("  snapshot:     {}", path.display());
        println!("  regulations:  {}", snapshot.regulations.len());
        println!("  chemicals:    {}", snapshot.chemicals.len());
        println!("  status:       OK");
        return Ok(0);
    }

    println!("{}: {} problem(s)", path.display(), problems.len());
    for problem in &problems {
        println!("  - {problem}");
    }
    Ok(1)
}
