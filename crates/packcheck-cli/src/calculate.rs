//! # Calculate Subcommand
//!
//! Runs the migration calculator over a scenario file and prints the results
//! as a table, JSON, or CSV.
//!
//! ## Usage
//!
//! ```bash
//! # Inline limits only:
//! packcheck calculate scenario.yaml
//!
//! # Resolve substances by CAS number against a registry snapshot:
//! packcheck calculate scenario.yaml --registry registry.yaml --format csv --output results.csv
//! ```
//!
//! ## Scenario format
//!
//! ```yaml
//! parameters:
//!   surface_area: 600   # cm²
//!   thickness: 0.1      # cm
//!   density: 1.0        # g/cm³
//!   food_mass: 1000     # g
//! substances:
//!   - cas: 80-05-7      # looked up in --registry when given
//!     contamination: 5  # mg/kg
//!   - name: Additive X
//!     contamination: 2.5
//!     limits:
//!       - regulation: In-house
//!         sml_value: 0.1
//! ```
//!
//! Registry limits come first, then the substance's inline limits.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use serde::Deserialize;

use packcheck_core::{CasNumber, ValidationError};
use packcheck_migration::export::{self, ExportRow};
use packcheck_migration::{
    evaluate, CalculationResult, PackagingParameters, RegulatoryLimit, Substance, DEFAULT_SML_UNIT,
};
use packcheck_registry::{substance_for, Chemical, Regulation, RegistrySnapshot};

/// Arguments for the calculate subcommand.
#[derive(Args, Debug)]
pub struct CalculateArgs {
    /// Scenario file (YAML, or JSON with a `.json` extension).
    pub scenario: PathBuf,

    /// Registry snapshot used to resolve substances by CAS number.
    #[arg(long)]
    pub registry: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Write output to this file instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Supported output formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

/// A calculation scenario: one packaging setup, many substances.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub parameters: PackagingParameters,
    #[serde(default)]
    pub substances: Vec<ScenarioSubstance>,
}

/// Substance entry in a scenario file.
#[derive(Debug, Deserialize)]
pub struct ScenarioSubstance {
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// CAS number. Names a registry chemical when a registry is loaded.
    #[serde(default)]
    pub cas: Option<String>,
    /// Contamination of the packaging material (Q, mg/kg).
    pub contamination: f64,
    #[serde(default)]
    pub limits: Vec<ScenarioLimit>,
}

/// Inline limit in a scenario file.
#[derive(Debug, Deserialize)]
pub struct ScenarioLimit {
    /// Regulation display name.
    pub regulation: String,
    #[serde(default)]
    pub sml_value: Option<f64>,
    #[serde(default)]
    pub sml_unit: Option<String>,
}

impl From<ScenarioLimit> for RegulatoryLimit {
    fn from(l: ScenarioLimit) -> Self {
        Self {
            regulation_id: l.regulation.clone(),
            display_name: l.regulation,
            sml_value: l.sml_value,
            sml_unit: l.sml_unit.unwrap_or_else(|| DEFAULT_SML_UNIT.to_string()),
        }
    }
}

impl Scenario {
    /// Load a scenario; `.json` files are parsed as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario: {}", path.display()))?;
        let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let scenario = if is_json {
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse scenario JSON: {}", path.display()))?
        } else {
            serde_yaml::from_str(&text)
                .with_context(|| format!("failed to parse scenario YAML: {}", path.display()))?
        };
        Ok(scenario)
    }
}

/// Registry records loaded from a snapshot.
#[derive(Debug)]
pub struct LoadedRegistry {
    pub regulations: Vec<Regulation>,
    pub chemicals: Vec<Chemical>,
}

impl LoadedRegistry {
    /// Load and validate a snapshot.
    pub fn load(path: &Path) -> Result<Self> {
        let (regulations, chemicals) = RegistrySnapshot::load(path)
            .and_then(RegistrySnapshot::into_records)
            .with_context(|| format!("failed to load registry: {}", path.display()))?;
        tracing::info!(
            regulations = regulations.len(),
            chemicals = chemicals.len(),
            "registry loaded"
        );
        Ok(Self {
            regulations,
            chemicals,
        })
    }

    fn by_cas(&self, cas: &CasNumber) -> Option<&Chemical> {
        self.chemicals
            .iter()
            .find(|c| c.cas_number.as_ref() == Some(cas))
    }
}

/// Turn scenario entries into calculator substances.
///
/// A CAS number found in `registry` pulls in the chemical's name and
/// limits; one that is not found is used for display only.
pub fn build_substances(
    entries: Vec<ScenarioSubstance>,
    registry: Option<&LoadedRegistry>,
) -> Result<Vec<Substance>> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| -> Result<Substance> {
            let position = index + 1;
            if !(entry.contamination.is_finite() && entry.contamination >= 0.0) {
                return Err(ValidationError::InvalidContamination {
                    substance: entry
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("substance {position}")),
                    value: entry.contamination,
                }
                .into());
            }
            let cas = entry
                .cas
                .as_deref()
                .map(CasNumber::parse)
                .transpose()
                .with_context(|| format!("substance {position}"))?;

            let from_registry = match (&cas, registry) {
                (Some(cas), Some(registry)) => {
                    let found = registry.by_cas(cas);
                    if found.is_none() {
                        tracing::warn!(cas = cas.as_str(), "CAS number not in registry, using inline data");
                    }
                    found.map(|chem| {
                        substance_for(chem, entry.contamination, registry.regulations.as_slice(), None)
                    })
                }
                _ => None,
            };

            let mut substance = match from_registry {
                Some(substance) => substance,
                None => {
                    let Some(name) = entry
                        .name
                        .clone()
                        .or_else(|| cas.as_ref().map(|c| c.as_str().to_string()))
                    else {
                        bail!("substance {position} needs a name or a CAS number");
                    };
                    Substance {
                        identifier: position.to_string(),
                        name,
                        cas_number: cas.as_ref().map(|c| c.as_str().to_string()),
                        contamination: entry.contamination,
                        applicable_limits: Vec::new(),
                    }
                }
            };

            if let Some(identifier) = entry.identifier {
                substance.identifier = identifier;
            }
            if let Some(name) = entry.name {
                substance.name = name;
            }
            substance
                .applicable_limits
                .extend(entry.limits.into_iter().map(RegulatoryLimit::from));
            Ok(substance)
        })
        .collect()
}

/// Render results in the requested format.
pub fn render(results: &[CalculationResult<'_>], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(results).context("failed to serialize results")?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Csv => export::to_csv(&export::rows(results)).context("failed to render CSV"),
        OutputFormat::Table => Ok(render_table(&export::rows(results))),
    }
}

/// Six decimals with trailing zeros dropped. Only the table rounds.
fn display_number(value: f64) -> String {
    let s = format!("{value:.6}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn render_table(rows: &[ExportRow]) -> String {
    let headers = ["SUBSTANCE", "CAS", "Q (mg/kg)", "M (mg/kg)", "REGULATION", "SML", "RESULT"];
    let cells: Vec<[String; 7]> = rows
        .iter()
        .map(|row| {
            [
                row.chemical_name.clone(),
                row.cas_number.clone(),
                display_number(row.contamination),
                display_number(row.m_value),
                row.regulation.clone(),
                row.sml_value
                    .map(|v| format!("{} {}", display_number(v), row.sml_unit))
                    .unwrap_or_else(|| "-".to_string()),
                row.result.as_str().to_uppercase(),
            ]
        })
        .collect();

    let mut widths = headers.map(|h| h.chars().count());
    for line in &cells {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_line = |fields: &[String]| {
        let padded: Vec<String> = fields
            .iter()
            .zip(widths)
            .map(|(field, width)| format!("{field:<width$}"))
            .collect();
        out.push_str(padded.join("  ").trim_end());
        out.push('\n');
    };
    push_line(&headers.map(String::from));
    for line in &cells {
        push_line(line);
    }
    out
}

/// Execute the calculate subcommand.
pub fn run_calculate(args: &CalculateArgs) -> Result<u8> {
    let scenario = Scenario::load(&args.scenario)?;
    let registry = args
        .registry
        .as_deref()
        .map(LoadedRegistry::load)
        .transpose()?;

    let substances = build_substances(scenario.substances, registry.as_ref())?;
    let results = evaluate(&scenario.parameters, &substances).context("invalid packaging parameters")?;
    let rendered = render(&results, args.format)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("failed to write output: {}", path.display()))?;
            tracing::info!(path = %path.display(), substances = results.len(), "results written");
        }
        None => {
            std::io::stdout()
                .write_all(rendered.as_bytes())
                .context("failed to write to stdout")?;
        }
    }

    Ok(0)
}
