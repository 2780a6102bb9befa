//! # Chemical API
//!
//! CRUD, search, and limit resolution for chemicals. CAS numbers are unique
//! across the registry, and every listing must reference an existing
//! regulation.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use packcheck_core::{require_text, CasNumber, ChemicalId, RegulationId, ValidationError};
use packcheck_migration::DEFAULT_SML_UNIT;
use packcheck_registry::chemical::MAX_NAME_LEN;
use packcheck_registry::{search, Chemical, ChemicalQuery, RegulationListing, RegulationLookup};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::{extract_query, extract_validated_json, optional_text, Validate};
use crate::routes::migration::LimitResponse;
use crate::state::AppState;

const MAX_SYNONYMS: usize = 50;
const MAX_LISTINGS: usize = 100;

/// One regulation listing in a chemical request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListingRequest {
    pub regulation_id: Uuid,
    /// SML in mg/kg; omit when the regulation sets no numeric limit.
    #[serde(default)]
    pub sml_value: Option<f64>,
    #[serde(default)]
    pub sml_unit: Option<String>,
    #[serde(default)]
    pub restriction: Option<String>,
}

/// Create or replace a chemical.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChemicalRequest {
    pub name: String,
    /// CAS registry number, dashed or undashed.
    #[serde(default)]
    pub cas_number: Option<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub listings: Vec<ListingRequest>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ChemicalRequest {
    /// Parsed CAS number; blank input means none.
    fn cas(&self) -> Result<Option<CasNumber>, ValidationError> {
        match self.cas_number.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => CasNumber::parse(raw).map(Some),
            _ => Ok(None),
        }
    }
}

impl Validate for ChemicalRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, MAX_NAME_LEN)?;
        self.cas()?;
        if self.synonyms.len() > MAX_SYNONYMS {
            return Err(ValidationError::TooManyItems {
                field: "synonyms",
                max: MAX_SYNONYMS,
            });
        }
        for synonym in &self.synonyms {
            require_text("synonyms", synonym, MAX_NAME_LEN)?;
        }
        if self.listings.len() > MAX_LISTINGS {
            return Err(ValidationError::TooManyItems {
                field: "listings",
                max: MAX_LISTINGS,
            });
        }
        for listing in &self.listings {
            if let Some(value) = listing.sml_value {
                if !(value.is_finite() && value >= 0.0) {
                    return Err(ValidationError::InvalidSml {
                        regulation: listing.regulation_id.to_string(),
                        value,
                    });
                }
            }
            optional_text("sml_unit", listing.sml_unit.as_deref(), 16)?;
            optional_text("restriction", listing.restriction.as_deref(), 500)?;
        }
        if let Some(notes) = &self.notes {
            if notes.chars().count() > 4000 {
                return Err(ValidationError::FieldTooLong {
                    field: "notes",
                    max: 4000,
                });
            }
        }
        Ok(())
    }
}

/// Listing as returned by the API, with the regulation's display name.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListingResponse {
    pub regulation_id: Uuid,
    /// `None` if the regulation no longer exists.
    pub regulation_name: Option<String>,
    pub sml_value: Option<f64>,
    pub sml_unit: String,
    pub restriction: Option<String>,
}

/// Chemical as returned by the API.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChemicalResponse {
    pub id: Uuid,
    pub name: String,
    pub cas_number: Option<String>,
    pub synonyms: Vec<String>,
    pub listings: Vec<ListingResponse>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChemicalResponse {
    fn build(chemical: Chemical, regulations: &impl RegulationLookup) -> Self {
        let listings = chemical
            .listings
            .into_iter()
            .map(|l| ListingResponse {
                regulation_id: *l.regulation_id.as_uuid(),
                regulation_name: regulations.display_name_of(&l.regulation_id),
                sml_value: l.sml_value,
                sml_unit: l.sml_unit,
                restriction: l.restriction,
            })
            .collect();
        Self {
            id: *chemical.id.as_uuid(),
            name: chemical.name,
            cas_number: chemical.cas_number.map(String::from),
            synonyms: chemical.synonyms,
            listings,
            notes: chemical.notes,
            created_at: chemical.created_at,
            updated_at: chemical.updated_at,
        }
    }
}

/// Search parameters for `GET /v1/chemicals`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Case-insensitive substring over name, synonyms, and CAS number.
    pub q: Option<String>,
    /// Exact CAS number.
    pub cas: Option<String>,
    /// Only chemicals listed by this regulation.
    pub regulation_id: Option<Uuid>,
    /// Zero-based page index.
    pub page: Option<usize>,
    /// Page size (default 20, max 100).
    pub size: Option<usize>,
}

impl From<SearchParams> for ChemicalQuery {
    fn from(p: SearchParams) -> Self {
        Self {
            q: p.q,
            cas: p.cas,
            regulation_id: p.regulation_id.map(RegulationId::from_uuid),
            page: p.page.unwrap_or(0),
            size: p.size,
        }
    }
}

/// One page of search results.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChemicalPage {
    pub items: Vec<ChemicalResponse>,
    /// Matches across all pages.
    pub total: usize,
    pub page: usize,
    pub size: usize,
}

/// Build the chemicals router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/chemicals", get(search_chemicals).post(create_chemical))
        .route(
            "/v1/chemicals/:id",
            get(get_chemical).put(update_chemical).delete(delete_chemical),
        )
        .route("/v1/chemicals/:id/limits", get(chemical_limits))
}

/// Turn request listings into registry listings, rejecting unknown regulations.
fn build_listings(state: &AppState, listings: Vec<ListingRequest>) -> Result<Vec<RegulationListing>, AppError> {
    listings
        .into_iter()
        .map(|l| {
            if state.regulations.get(&l.regulation_id).is_none() {
                return Err(ValidationError::UnknownReference {
                    field: "regulation_id",
                    value: l.regulation_id.to_string(),
                }
                .into());
            }
            Ok(RegulationListing {
                regulation_id: RegulationId::from_uuid(l.regulation_id),
                sml_value: l.sml_value,
                sml_unit: l
                    .sml_unit
                    .filter(|u| !u.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_SML_UNIT.to_string()),
                restriction: l.restriction,
            })
        })
        .collect()
}

fn clean_synonyms(synonyms: Vec<String>) -> Vec<String> {
    synonyms.into_iter().map(|s| s.trim().to_string()).collect()
}

fn duplicate_cas(cas: &CasNumber) -> AppError {
    AppError::Conflict(format!("CAS number {cas} is already registered"))
}

/// POST /v1/chemicals: Create a chemical.
#[utoipa::path(
    post,
    path = "/v1/chemicals",
    request_body = ChemicalRequest,
    responses(
        (status = 201, description = "Chemical created", body = ChemicalResponse),
        (status = 409, description = "CAS number already registered", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "chemicals"
)]
pub(crate) async fn create_chemical(
    State(state): State<AppState>,
    body: Result<Json<ChemicalRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ChemicalResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let cas_number = req.cas()?;
    let listings = build_listings(&state, req.listings)?;

    let mut record = Chemical::new(req.name.trim());
    record.cas_number = cas_number;
    record.synonyms = clean_synonyms(req.synonyms);
    record.listings = listings;
    record.notes = req.notes.filter(|n| !n.trim().is_empty());

    // Check and insert under one lock so two requests cannot both claim a CAS.
    let id = *record.id.as_uuid();
    state.chemicals.with_write(|map| {
        if let Some(cas) = &record.cas_number {
            if map.values().any(|c| c.cas_number.as_ref() == Some(cas)) {
                return Err(duplicate_cas(cas));
            }
        }
        map.insert(id, record.clone());
        Ok(())
    })?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::chemicals::insert(pool, &record).await {
            state.chemicals.remove(&id);
            return Err(AppError::persist_failed("chemical", e));
        }
    }

    tracing::info!(chemical_id = %record.id, name = %record.name, "chemical created");
    Ok((
        StatusCode::CREATED,
        Json(ChemicalResponse::build(record, &state.regulations)),
    ))
}

/// GET /v1/chemicals: Search and browse chemicals.
#[utoipa::path(
    get,
    path = "/v1/chemicals",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching chemicals", body = ChemicalPage),
        (status = 422, description = "Malformed query parameters", body = crate::error::ErrorBody),
    ),
    tag = "chemicals"
)]
pub(crate) async fn search_chemicals(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<ChemicalPage>, AppError> {
    let query = ChemicalQuery::from(extract_query(params)?);
    let chemicals = state.chemicals.list();
    let page = search(&chemicals, &query);

    Ok(Json(ChemicalPage {
        items: page
            .items
            .into_iter()
            .map(|c| ChemicalResponse::build(c, &state.regulations))
            .collect(),
        total: page.total,
        page: page.page,
        size: page.size,
    }))
}

/// GET /v1/chemicals/:id: Fetch a chemical.
#[utoipa::path(
    get,
    path = "/v1/chemicals/{id}",
    params(("id" = Uuid, Path, description = "Chemical ID")),
    responses(
        (status = 200, description = "Chemical found", body = ChemicalResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "chemicals"
)]
pub(crate) async fn get_chemical(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ChemicalResponse>, AppError> {
    let chemical = state
        .chemicals
        .get(&id)
        .ok_or_else(|| AppError::not_found("chemical", id))?;
    Ok(Json(ChemicalResponse::build(chemical, &state.regulations)))
}

/// PUT /v1/chemicals/:id: Replace a chemical's mutable fields.
#[utoipa::path(
    put,
    path = "/v1/chemicals/{id}",
    params(("id" = Uuid, Path, description = "Chemical ID")),
    request_body = ChemicalRequest,
    responses(
        (status = 200, description = "Chemical updated", body = ChemicalResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "CAS number already registered", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "chemicals"
)]
pub(crate) async fn update_chemical(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<ChemicalRequest>, JsonRejection>,
) -> Result<Json<ChemicalResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let cas_number = req.cas()?;
    let listings = build_listings(&state, req.listings)?;
    let synonyms = clean_synonyms(req.synonyms);
    let name = req.name.trim().to_string();
    let notes = req.notes.filter(|n| !n.trim().is_empty());

    let (previous, updated) = state.chemicals.with_write(|map| {
        let previous = map
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("chemical", id))?;
        if let Some(cas) = &cas_number {
            let taken = map
                .iter()
                .any(|(other, c)| *other != id && c.cas_number.as_ref() == Some(cas));
            if taken {
                return Err(duplicate_cas(cas));
            }
        }
        let updated = Chemical {
            name,
            cas_number,
            synonyms,
            listings,
            notes,
            updated_at: Utc::now(),
            ..previous.clone()
        };
        map.insert(id, updated.clone());
        Ok((previous, updated))
    })?;

    if let Some(pool) = &state.db_pool {
        let persisted = crate::db::chemicals::update(pool, &updated).await;
        if !matches!(persisted, Ok(true)) {
            // Restore only if no concurrent delete removed the record meanwhile.
            state.chemicals.update(&id, |current| *current = previous);
        }
        match persisted {
            Ok(true) => {}
            Ok(false) => return Err(AppError::not_found("chemical", id)),
            Err(e) => return Err(AppError::persist_failed("chemical", e)),
        }
    }

    tracing::info!(chemical_id = %updated.id, "chemical updated");
    Ok(Json(ChemicalResponse::build(updated, &state.regulations)))
}

/// DELETE /v1/chemicals/:id: Delete a chemical.
#[utoipa::path(
    delete,
    path = "/v1/chemicals/{id}",
    params(("id" = Uuid, Path, description = "Chemical ID")),
    responses(
        (status = 204, description = "Chemical deleted"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "chemicals"
)]
pub(crate) async fn delete_chemical(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.chemicals.get(&id).is_none() {
        return Err(AppError::not_found("chemical", id));
    }

    if let Some(pool) = &state.db_pool {
        crate::db::chemicals::delete(pool, &ChemicalId::from_uuid(id))
            .await
            .map_err(|e| AppError::persist_failed("chemical deletion", e))?;
    }
    state.chemicals.remove(&id);

    tracing::info!(chemical_id = %id, "chemical deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/chemicals/:id/limits: Limits that apply to a chemical.
#[utoipa::path(
    get,
    path = "/v1/chemicals/{id}/limits",
    params(("id" = Uuid, Path, description = "Chemical ID")),
    responses(
        (status = 200, description = "Resolved limits in listing order", body = Vec<LimitResponse>),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "chemicals"
)]
pub(crate) async fn chemical_limits(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<LimitResponse>>, AppError> {
    let chemical = state
        .chemicals
        .get(&id)
        .ok_or_else(|| AppError::not_found("chemical", id))?;
    let limits = packcheck_registry::resolve_limits(&chemical, &state.regulations, None);
    Ok(Json(limits.iter().map(LimitResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ChemicalRequest {
        ChemicalRequest {
            name: "Bisphenol A".to_string(),
            cas_number: Some("80-05-7".to_string()),
            synonyms: vec!["BPA".to_string()],
            listings: Vec::new(),
            notes: None,
        }
    }

    #[test]
    fn valid_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn rejects_bad_cas() {
        let mut req = request();
        req.cas_number = Some("80-05-8".to_string());
        assert_eq!(req.validate().unwrap_err().field(), Some("cas_number"));
    }

    #[test]
    fn blank_cas_means_none() {
        let mut req = request();
        req.cas_number = Some("  ".to_string());
        assert_eq!(req.cas(), Ok(None));
    }

    #[test]
    fn rejects_negative_sml() {
        let mut req = request();
        req.listings.push(ListingRequest {
            regulation_id: Uuid::new_v4(),
            sml_value: Some(-0.1),
            sml_unit: None,
            restriction: None,
        });
        assert_eq!(req.validate().unwrap_err().field(), Some("sml_value"));
    }

    #[test]
    fn unknown_regulation_is_validation_error() {
        let state = AppState::new();
        let listings = vec![ListingRequest {
            regulation_id: Uuid::new_v4(),
            sml_value: Some(1.0),
            sml_unit: None,
            restriction: None,
        }];
        let err = build_listings(&state, listings).unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::UnknownReference { field: "regulation_id", .. })
        ));
    }

    #[test]
    fn search_params_default_to_first_page() {
        let query = ChemicalQuery::from(SearchParams::default());
        assert_eq!(query.page, 0);
        assert_eq!(query.effective_size(), packcheck_registry::DEFAULT_PAGE_SIZE);
    }
}
