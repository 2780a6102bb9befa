//! # CAS Subcommand
//!
//! Validates CAS registry numbers (format and check digit) and prints the
//! normalized dashed form of each valid one.
//!
//! ```bash
//! packcheck cas 7732-18-5 80057 7732-18-4
//! ```

use anyhow::Result;
use clap::Args;

use packcheck_core::{CasNumber, ValidationError};

/// Arguments for the cas subcommand.
#[derive(Args, Debug)]
pub struct CasArgs {
    /// CAS numbers to check, dashed or undashed.
    #[arg(required = true)]
    pub numbers: Vec<String>,
}

/// Check every input, keeping input order.
pub fn check_all(numbers: &[String]) -> Vec<(&str, Result<CasNumber, ValidationError>)> {
    numbers
        .iter()
        .map(|n| (n.as_str(), CasNumber::parse(n)))
        .collect()
}

/// Execute the cas subcommand. Exits with 1 if any number is invalid.
pub fn run_cas(args: &CasArgs) -> Result<u8> {
    let mut invalid = 0usize;
    for (input, outcome) in check_all(&args.numbers) {
        match outcome {
            Ok(cas) => println!("  OK       {input:<14} {cas}"),
            Err(e) => {
                invalid += 1;
                println!("  INVALID  {input:<14} {e}");
            }
        }
    }

    if invalid > 0 {
        println!();
        println!("{invalid} of {} CAS number(s) invalid", args.numbers.len());
        return Ok(1);
    }
    Ok(0)
}
