//! # packcheck CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use packcheck_cli::calculate::{run_calculate, CalculateArgs};
use packcheck_cli::cas::{run_cas, CasArgs};
use packcheck_cli::registry::{run_registry, RegistryArgs};

/// Food-contact packaging compliance toolkit.
///
/// Estimates worst-case migration of packaging substances into food and
/// classifies it against regulatory specific migration limits.
#[derive(Parser, Debug)]
#[command(name = "packcheck", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Calculate migration for every substance in a scenario file.
    Calculate(CalculateArgs),

    /// Validate CAS registry numbers.
    Cas(CasArgs),

    /// Registry snapshot operations.
    Registry(RegistryArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level. Logs go to stderr so
    // results on stdout stay pipeable.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Calculate(args) => run_calculate(&args),
        Commands::Cas(args) => run_cas(&args),
        Commands::Registry(args) => run_registry(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packcheck_cli::calculate::OutputFormat;
    use packcheck_cli::registry::RegistryCommand;
    use std::path::PathBuf;

    #[test]
    fn cli_parse_calculate_defaults() {
        let cli = Cli::try_parse_from(["packcheck", "calculate", "scenario.yaml"]).unwrap();
        if let Commands::Calculate(args) = cli.command {
            assert_eq!(args.scenario, PathBuf::from("scenario.yaml"));
            assert_eq!(args.format, OutputFormat::Table);
            assert!(args.registry.is_none());
            assert!(args.output.is_none());
        } else {
            panic!("expected calculate");
        }
    }

    #[test]
    fn cli_parse_calculate_all_flags() {
        let cli = Cli::try_parse_from([
            "packcheck",
            "-vv",
            "calculate",
            "scenario.json",
            "--registry",
            "registry.yaml",
            "--format",
            "csv",
            "--output",
            "out.csv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        if let Commands::Calculate(args) = cli.command {
            assert_eq!(args.format, OutputFormat::Csv);
            assert_eq!(args.registry, Some(PathBuf::from("registry.yaml")));
            assert_eq!(args.output, Some(PathBuf::from("out.csv")));
        } else {
            panic!("expected calculate");
        }
    }

    #[test]
    fn cli_parse_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["packcheck", "calculate", "s.yaml", "--format", "xml"]).is_err());
    }

    #[test]
    fn cli_parse_cas_requires_a_number() {
        assert!(Cli::try_parse_from(["packcheck", "cas"]).is_err());
        let cli = Cli::try_parse_from(["packcheck", "cas", "7732-18-5", "80057"]).unwrap();
        if let Commands::Cas(args) = cli.command {
            assert_eq!(args.numbers, ["7732-18-5", "80057"]);
        } else {
            panic!("expected cas");
        }
    }

    #[test]
    fn cli_parse_registry_check() {
        let cli = Cli::try_parse_from(["packcheck", "registry", "check", "registry.yaml"]).unwrap();
        if let Commands::Registry(args) = cli.command {
            let RegistryCommand::Check { snapshot } = args.command;
            assert_eq!(snapshot, PathBuf::from("registry.yaml"));
        } else {
            panic!("expected registry");
        }
    }
}
