//! # Tabular Export
//!
//! Flattens calculation results into one row per (substance, limit) with the
//! columns compliance reports use:
//!
//! | chemical name | CAS number | Q | M | regulation | SML | result |
//!
//! A substance without limits still gets a row, with empty regulation and
//! SML cells and an `unknown` result, so it is never silently dropped from
//! a report.

use serde::Serialize;
use thiserror::Error;

use crate::evaluation::{CalculationResult, Verdict};

/// Column headers, in output order.
pub const HEADERS: [&str; 7] = [
    "Chemical Name",
    "CAS Number",
    "Q (mg/kg)",
    "M (mg/kg)",
    "Regulation",
    "SML (mg/kg)",
    "Result",
];

/// One flattened export row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub chemical_name: String,
    pub cas_number: String,
    pub contamination: f64,
    pub m_value: f64,
    pub regulation: String,
    pub sml_value: Option<f64>,
    pub sml_unit: String,
    pub result: Verdict,
}

/// Flatten results into export rows, preserving result and limit order.
pub fn rows(results: &[CalculationResult<'_>]) -> Vec<ExportRow> {
    let mut out = Vec::new();
    for result in results {
        let substance = result.substance;
        let base = |regulation: String, sml_value: Option<f64>, sml_unit: String, verdict| ExportRow {
            chemical_name: substance.name.clone(),
            cas_number: substance.cas_number.clone().unwrap_or_default(),
            contamination: substance.contamination,
            m_value: result.m_value,
            regulation,
            sml_value,
            sml_unit,
            result: verdict,
        };

        if result.limit_outcomes.is_empty() {
            out.push(base(String::new(), None, String::new(), Verdict::Unknown));
            continue;
        }
        for outcome in &result.limit_outcomes {
            out.push(base(
                outcome.limit.display_name.clone(),
                outcome.limit.sml_value,
                outcome.limit.sml_unit.clone(),
                outcome.verdict,
            ));
        }
    }
    out
}

/// Failure to render export rows.
#[derive(Error, Debug)]
pub enum ExportError {
    /// A record could not be written.
    #[error("failed to write CSV record: {0}")]
    Csv(#[from] csv::Error),

    /// Buffered output could not be flushed.
    #[error("failed to flush CSV output: {0}")]
    Flush(#[from] std::io::Error),

    /// The rendered bytes are not UTF-8.
    #[error("CSV output is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Render rows as RFC 4180 CSV with a header line and CRLF line endings.
pub fn to_csv(rows: &[ExportRow]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(HEADERS)?;
    for row in rows {
        writer.write_record([
            row.chemical_name.clone(),
            row.cas_number.clone(),
            row.contamination.to_string(),
            row.m_value.to_string(),
            row.regulation.clone(),
            row.sml_value.map(|v| v.to_string()).unwrap_or_default(),
            row.result.as_str().to_string(),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}
