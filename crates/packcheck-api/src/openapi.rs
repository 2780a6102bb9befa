//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "packcheck API",
        version = "0.1.0",
        description = "Food-contact packaging compliance service.\n\nProvides:\n- **Regulation registry** with short display names\n- **Chemical registry** with CAS numbers, synonyms, and per-regulation SMLs\n- **Migration calculator**: `M = (Q × A × Lp × D) / F`, classified against each SML\n- **CSV export** of calculation results\n\nHealth probes (`/health/*`) and `/metrics` live outside `/v1`.",
        license(name = "AGPL-3.0-or-later")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    paths(
        // ── Regulations ─────────────────────────────────────────────────
        crate::routes::regulations::create_regulation,
        crate::routes::regulations::list_regulations,
        crate::routes::regulations::get_regulation,
        crate::routes::regulations::update_regulation,
        crate::routes::regulations::delete_regulation,
        // ── Chemicals ───────────────────────────────────────────────────
        crate::routes::chemicals::create_chemical,
        crate::routes::chemicals::search_chemicals,
        crate::routes::chemicals::get_chemical,
        crate::routes::chemicals::update_chemical,
        crate::routes::chemicals::delete_chemical,
        crate::routes::chemicals::chemical_limits,
        // ── Migration ───────────────────────────────────────────────────
        crate::routes::migration::calculate,
        crate::routes::migration::export_csv,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
            crate::routes::regulations::RegulationRequest,
            crate::routes::regulations::RegulationResponse,
            crate::routes::chemicals::ListingRequest,
            crate::routes::chemicals::ChemicalRequest,
            crate::routes::chemicals::ListingResponse,
            crate::routes::chemicals::ChemicalResponse,
            crate::routes::chemicals::ChemicalPage,
            crate::routes::migration::ParametersInput,
            crate::routes::migration::LimitInput,
            crate::routes::migration::SubstanceInput,
            crate::routes::migration::CalculateRequest,
            crate::routes::migration::LimitResponse,
            crate::routes::migration::OutcomeResponse,
            crate::routes::migration::SubstanceResult,
            crate::routes::migration::CalculationSummary,
            crate::routes::migration::CalculateResponse,
        ),
    ),
    tags(
        (name = "regulations", description = "Regulations that set specific migration limits"),
        (name = "chemicals", description = "Chemical registry: CRUD, search, and limit resolution"),
        (name = "migration", description = "Worst-case migration calculation and CSV export"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
