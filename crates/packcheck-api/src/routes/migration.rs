//! # Migration Calculation API
//!
//! `POST /v1/migration/calculate` runs the calculator over a batch of
//! substances; `POST /v1/migration/export` takes the same body and returns
//! the flattened results as CSV.
//!
//! A substance either references a registry chemical by `chemical_id`, in
//! which case its name, CAS number, and limits come from the registry, or
//! carries everything inline. Inline limits are appended after registry
//! limits, so both can be combined.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use packcheck_core::{require_text, CasNumber, RegulationId, ValidationError};
use packcheck_migration::export;
use packcheck_migration::{
    evaluate, CalculationResult, PackagingParameters, RegulatoryLimit, Substance, Verdict,
    DEFAULT_SML_UNIT,
};
use packcheck_registry::substance_for;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, optional_text, Validate};
use crate::state::AppState;

/// Maximum substances per calculation request.
pub const MAX_SUBSTANCES: usize = 500;

const MAX_NAME_LEN: usize = 255;

/// Packaging scenario shared by every substance in a request.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct ParametersInput {
    /// Contact area (cm²).
    pub surface_area: f64,
    /// Material thickness (cm).
    pub thickness: f64,
    /// Material density (g/cm³).
    pub density: f64,
    /// Food mass (g).
    pub food_mass: f64,
}

impl From<ParametersInput> for PackagingParameters {
    fn from(p: ParametersInput) -> Self {
        Self {
            surface_area: p.surface_area,
            thickness: p.thickness,
            density: p.density,
            food_mass: p.food_mass,
        }
    }
}

/// An inline regulatory limit.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LimitInput {
    /// Caller-chosen identifier; defaults to the display name.
    #[serde(default)]
    pub regulation_id: Option<String>,
    pub display_name: String,
    /// SML in mg/kg. Omit when unknown; the result is then `unknown`.
    #[serde(default)]
    pub sml_value: Option<f64>,
    #[serde(default)]
    pub sml_unit: Option<String>,
}

impl From<LimitInput> for RegulatoryLimit {
    fn from(l: LimitInput) -> Self {
        let display_name = l.display_name.trim().to_string();
        Self {
            regulation_id: l
                .regulation_id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| display_name.clone()),
            display_name,
            sml_value: l.sml_value,
            sml_unit: l
                .sml_unit
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SML_UNIT.to_string()),
        }
    }
}

/// One substance to evaluate.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubstanceInput {
    /// Caller-chosen key echoed in the result; defaults to the chemical id
    /// or the position in the request.
    #[serde(default)]
    pub identifier: Option<String>,
    /// Registry chemical supplying name, CAS number, and limits.
    #[serde(default)]
    pub chemical_id: Option<Uuid>,
    /// Restrict registry limits to these regulations.
    #[serde(default)]
    pub regulation_ids: Option<Vec<Uuid>>,
    /// Display name; required without `chemical_id`.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cas_number: Option<String>,
    /// Contamination of the packaging material (Q, mg/kg).
    pub contamination: f64,
    #[serde(default)]
    pub limits: Vec<LimitInput>,
}

impl SubstanceInput {
    fn label(&self, index: usize) -> String {
        self.name
            .clone()
            .or_else(|| self.identifier.clone())
            .unwrap_or_else(|| format!("substance {}", index + 1))
    }
}

/// Body of both calculation endpoints.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CalculateRequest {
    pub parameters: ParametersInput,
    pub substances: Vec<SubstanceInput>,
}

impl Validate for CalculateRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        PackagingParameters::from(self.parameters).validate()?;
        if self.substances.len() > MAX_SUBSTANCES {
            return Err(ValidationError::TooManyItems {
                field: "substances",
                max: MAX_SUBSTANCES,
            });
        }
        for (index, s) in self.substances.iter().enumerate() {
            if !(s.contamination.is_finite() && s.contamination >= 0.0) {
                return Err(ValidationError::InvalidContamination {
                    substance: s.label(index),
                    value: s.contamination,
                });
            }
            match (&s.name, s.chemical_id) {
                (Some(name), _) => require_text("name", name, MAX_NAME_LEN)?,
                (None, None) => return Err(ValidationError::EmptyField("name")),
                (None, Some(_)) => {}
            }
            optional_text("identifier", s.identifier.as_deref(), MAX_NAME_LEN)?;
            if let Some(cas) = s.cas_number.as_deref().filter(|c| !c.trim().is_empty()) {
                CasNumber::parse(cas)?;
            }
            for limit in &s.limits {
                require_text("display_name", &limit.display_name, MAX_NAME_LEN)?;
                if let Some(value) = limit.sml_value {
                    if !(value.is_finite() && value >= 0.0) {
                        return Err(ValidationError::InvalidSml {
                            regulation: limit.display_name.clone(),
                            value,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// A regulatory limit as returned by the API.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LimitResponse {
    pub regulation_id: String,
    pub display_name: String,
    pub sml_value: Option<f64>,
    pub sml_unit: String,
}

impl From<&RegulatoryLimit> for LimitResponse {
    fn from(l: &RegulatoryLimit) -> Self {
        Self {
            regulation_id: l.regulation_id.clone(),
            display_name: l.display_name.clone(),
            sml_value: l.sml_value,
            sml_unit: l.sml_unit.clone(),
        }
    }
}

/// Classification against one limit.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OutcomeResponse {
    #[serde(flatten)]
    pub limit: LimitResponse,
    /// `pass`, `fail`, or `unknown`.
    #[schema(value_type = String, example = "pass")]
    pub result: Verdict,
    /// `true`/`false`, or `null` when no SML is known.
    pub passed: Option<bool>,
}

/// Calculator output for one substance.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubstanceResult {
    pub identifier: String,
    pub name: String,
    pub cas_number: Option<String>,
    pub contamination: f64,
    /// Estimated migration into food (mg/kg), unrounded.
    pub m_value: f64,
    pub outcomes: Vec<OutcomeResponse>,
}

impl From<&CalculationResult<'_>> for SubstanceResult {
    fn from(r: &CalculationResult<'_>) -> Self {
        Self {
            identifier: r.substance.identifier.clone(),
            name: r.substance.name.clone(),
            cas_number: r.substance.cas_number.clone(),
            contamination: r.substance.contamination,
            m_value: r.m_value,
            outcomes: r
                .limit_outcomes
                .iter()
                .map(|o| OutcomeResponse {
                    limit: LimitResponse::from(o.limit),
                    result: o.verdict,
                    passed: o.verdict.passed(),
                })
                .collect(),
        }
    }
}

/// Outcome counts across the batch.
#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CalculationSummary {
    pub substances: usize,
    pub passed: usize,
    pub failed: usize,
    pub unknown: usize,
}

impl CalculationSummary {
    fn tally(results: &[CalculationResult<'_>]) -> Self {
        let mut summary = Self {
            substances: results.len(),
            ..Self::default()
        };
        for outcome in results.iter().flat_map(|r| &r.limit_outcomes) {
            match outcome.verdict {
                Verdict::Pass => summary.passed += 1,
                Verdict::Fail => summary.failed += 1,
                Verdict::Unknown => summary.unknown += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CalculateResponse {
    pub results: Vec<SubstanceResult>,
    pub summary: CalculationSummary,
}

/// Build the migration router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/migration/calculate", post(calculate))
        .route("/v1/migration/export", post(export_csv))
}

/// Turn request substances into calculator inputs, resolving registry
/// references.
fn build_substances(state: &AppState, inputs: Vec<SubstanceInput>) -> Result<Vec<Substance>, AppError> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            let mut substance = match input.chemical_id {
                Some(chemical_id) => {
                    let chemical = state.chemicals.get(&chemical_id).ok_or_else(|| {
                        ValidationError::UnknownReference {
                            field: "chemical_id",
                            value: chemical_id.to_string(),
                        }
                    })?;
                    let filter: Option<Vec<RegulationId>> = input
                        .regulation_ids
                        .map(|ids| ids.into_iter().map(RegulationId::from_uuid).collect());
                    let mut s = substance_for(
                        &chemical,
                        input.contamination,
                        &state.regulations,
                        filter.as_deref(),
                    );
                    if let Some(name) = input.name.filter(|n| !n.trim().is_empty()) {
                        s.name = name.trim().to_string();
                    }
                    s
                }
                None => Substance {
                    identifier: (index + 1).to_string(),
                    name: input.name.unwrap_or_default().trim().to_string(),
                    cas_number: None,
                    contamination: input.contamination,
                    applicable_limits: Vec::new(),
                },
            };

            if let Some(identifier) = input.identifier.filter(|i| !i.trim().is_empty()) {
                substance.identifier = identifier;
            }
            if let Some(cas) = input.cas_number.as_deref().filter(|c| !c.trim().is_empty()) {
                substance.cas_number = Some(CasNumber::parse(cas)?.as_str().to_string());
            }
            substance
                .applicable_limits
                .extend(input.limits.into_iter().map(RegulatoryLimit::from));
            Ok(substance)
        })
        .collect()
}

/// Validate, resolve, and prepare a request. Counts rejections.
fn prepare(
    state: &AppState,
    body: Result<Json<CalculateRequest>, JsonRejection>,
) -> Result<(PackagingParameters, Vec<Substance>), AppError> {
    let prepared = extract_validated_json(body).and_then(|req| {
        let substances = build_substances(state, req.substances)?;
        Ok((PackagingParameters::from(req.parameters), substances))
    });
    if prepared.is_err() {
        state.metrics.record_calculation("rejected");
    }
    prepared
}

/// Run the calculator, counting the request as evaluated or rejected.
fn evaluate_counted<'a>(
    state: &AppState,
    params: &PackagingParameters,
    substances: &'a [Substance],
) -> Result<Vec<CalculationResult<'a>>, AppError> {
    match evaluate(params, substances) {
        Ok(results) => {
            state.metrics.record_calculation("evaluated");
            Ok(results)
        }
        Err(e) => {
            state.metrics.record_calculation("rejected");
            Err(e.into())
        }
    }
}

/// POST /v1/migration/calculate: Estimate migration and classify it.
#[utoipa::path(
    post,
    path = "/v1/migration/calculate",
    request_body = CalculateRequest,
    responses(
        (status = 200, description = "Results in request order", body = CalculateResponse),
        (status = 422, description = "Invalid parameters or substances", body = crate::error::ErrorBody),
    ),
    tag = "migration"
)]
pub(crate) async fn calculate(
    State(state): State<AppState>,
    body: Result<Json<CalculateRequest>, JsonRejection>,
) -> Result<Json<CalculateResponse>, AppError> {
    let (params, substances) = prepare(&state, body)?;
    let results = evaluate_counted(&state, &params, &substances)?;

    let summary = CalculationSummary::tally(&results);
    tracing::info!(
        substances = summary.substances,
        failed = summary.failed,
        unknown = summary.unknown,
        "migration calculated"
    );

    Ok(Json(CalculateResponse {
        results: results.iter().map(SubstanceResult::from).collect(),
        summary,
    }))
}

/// POST /v1/migration/export: Calculate and download as CSV.
#[utoipa::path(
    post,
    path = "/v1/migration/export",
    request_body = CalculateRequest,
    responses(
        (status = 200, description = "One row per substance and limit", content_type = "text/csv", body = String),
        (status = 422, description = "Invalid parameters or substances", body = crate::error::ErrorBody),
    ),
    tag = "migration"
)]
pub(crate) async fn export_csv(
    State(state): State<AppState>,
    body: Result<Json<CalculateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let (params, substances) = prepare(&state, body)?;
    let results = evaluate_counted(&state, &params, &substances)?;

    let rows = export::rows(&results);
    let csv = export::to_csv(&rows)
        .map_err(|e| AppError::Internal(format!("CSV rendering failed: {e}")))?;
    tracing::info!(rows = rows.len(), "migration exported");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"migration-results.csv\"",
            ),
        ],
        csv,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use packcheck_registry::{Chemical, Regulation, RegulationListing};

    fn params() -> ParametersInput {
        ParametersInput {
            surface_area: 600.0,
            thickness: 0.1,
            density: 1.0,
            food_mass: 1000.0,
        }
    }

    fn inline(name: &str, contamination: f64) -> SubstanceInput {
        SubstanceInput {
            identifier: None,
            chemical_id: None,
            regulation_ids: None,
            name: Some(name.to_string()),
            cas_number: None,
            contamination,
            limits: Vec::new(),
        }
    }

    #[test]
    fn zero_food_mass_reports_field() {
        let mut p = params();
        p.food_mass = 0.0;
        let req = CalculateRequest {
            parameters: p,
            substances: vec![inline("A", 5.0)],
        };
        assert_eq!(req.validate().unwrap_err().field(), Some("food_mass"));
    }

    #[test]
    fn negative_contamination_rejected() {
        let req = CalculateRequest {
            parameters: params(),
            substances: vec![inline("A", -1.0)],
        };
        assert_eq!(req.validate().unwrap_err().field(), Some("contamination"));
    }

    #[test]
    fn inline_substance_needs_a_name() {
        let mut s = inline("A", 1.0);
        s.name = None;
        let req = CalculateRequest {
            parameters: params(),
            substances: vec![s],
        };
        assert_eq!(req.validate(), Err(ValidationError::EmptyField("name")));
    }

    #[test]
    fn too_many_substances_rejected() {
        let req = CalculateRequest {
            parameters: params(),
            substances: (0..=MAX_SUBSTANCES).map(|i| inline(&format!("S{i}"), 1.0)).collect(),
        };
        assert_eq!(req.validate().unwrap_err().field(), Some("substances"));
    }

    #[test]
    fn inline_limit_defaults() {
        let limit = RegulatoryLimit::from(LimitInput {
            regulation_id: None,
            display_name: " EU 10/2011 ".to_string(),
            sml_value: Some(0.6),
            sml_unit: None,
        });
        assert_eq!(limit.regulation_id, "EU 10/2011");
        assert_eq!(limit.sml_unit, DEFAULT_SML_UNIT);
    }

    #[test]
    fn registry_limits_precede_inline_limits() {
        let state = AppState::new();
        let reg = Regulation::new("Commission Regulation (EU) No 10/2011").with_short_name("EU 10/2011");
        let chem = Chemical::new("Bisphenol A").with_listing(RegulationListing::new(reg.id, Some(0.05)));
        state.regulations.insert(*reg.id.as_uuid(), reg);
        state.chemicals.insert(*chem.id.as_uuid(), chem.clone());

        let mut input = inline("ignored", 5.0);
        input.name = None;
        input.chemical_id = Some(*chem.id.as_uuid());
        input.limits.push(LimitInput {
            regulation_id: None,
            display_name: "In-house".to_string(),
            sml_value: None,
            sml_unit: None,
        });

        let substances = build_substances(&state, vec![input]).unwrap();
        let names: Vec<&str> = substances[0]
            .applicable_limits
            .iter()
            .map(|l| l.display_name.as_str())
            .collect();
        assert_eq!(names, ["EU 10/2011", "In-house"]);
        assert_eq!(substances[0].name, "Bisphenol A");
        assert_eq!(substances[0].identifier, chem.id.to_string());
    }

    #[test]
    fn unknown_chemical_is_validation_error() {
        let state = AppState::new();
        let mut input = inline("A", 1.0);
        input.chemical_id = Some(Uuid::new_v4());
        let err = build_substances(&state, vec![input]).unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::UnknownReference { field: "chemical_id", .. })
        ));
    }

    #[test]
    fn summary_counts_outcomes() {
        let substances = vec![Substance::new("1", "A", 5.0)
            .with_limit(RegulatoryLimit::new("a", "A", 0.5))
            .with_limit(RegulatoryLimit::new("b", "B", 0.3))
            .with_limit(RegulatoryLimit::without_sml("c", "C"))];
        let results = evaluate(&PackagingParameters::from(params()), &substances).unwrap();
        assert_eq!(
            CalculationSummary::tally(&results),
            CalculationSummary {
                substances: 1,
                passed: 1,
                failed: 1,
                unknown: 1,
            }
        );
    }
}
