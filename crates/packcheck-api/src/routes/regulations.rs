//! # Regulation API
//!
//! CRUD for regulations. A regulation cannot be deleted while any chemical
//! still lists it.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use packcheck_core::{RegulationId, ValidationError};
use packcheck_registry::regulation::{MAX_NAME_LEN, MAX_SHORT_NAME_LEN};
use packcheck_registry::Regulation;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, optional_text, Validate};
use crate::state::AppState;

/// Create or replace a regulation.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegulationRequest {
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub jurisdiction: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub reference_url: Option<String>,
}

impl Validate for RegulationRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        packcheck_core::require_text("name", &self.name, MAX_NAME_LEN)?;
        if let Some(short) = &self.short_name {
            if short.chars().count() > MAX_SHORT_NAME_LEN {
                return Err(ValidationError::FieldTooLong {
                    field: "short_name",
                    max: MAX_SHORT_NAME_LEN,
                });
            }
        }
        optional_text("jurisdiction", self.jurisdiction.as_deref(), 64)?;
        optional_text("reference_url", self.reference_url.as_deref(), 2048)?;
        if let Some(description) = &self.description {
            if description.chars().count() > 4000 {
                return Err(ValidationError::FieldTooLong {
                    field: "description",
                    max: 4000,
                });
            }
        }
        Ok(())
    }
}

/// Regulation as returned by the API.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegulationResponse {
    pub id: Uuid,
    pub name: String,
    pub short_name: Option<String>,
    /// Short name when set, otherwise the full name.
    pub display_name: String,
    pub jurisdiction: Option<String>,
    pub description: Option<String>,
    pub reference_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Regulation> for RegulationResponse {
    fn from(r: Regulation) -> Self {
        Self {
            id: *r.id.as_uuid(),
            display_name: r.display_name().to_string(),
            name: r.name,
            short_name: r.short_name,
            jurisdiction: r.jurisdiction,
            description: r.description,
            reference_url: r.reference_url,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Build the regulations router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/regulations", get(list_regulations).post(create_regulation))
        .route(
            "/v1/regulations/:id",
            get(get_regulation)
                .put(update_regulation)
                .delete(delete_regulation),
        )
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// POST /v1/regulations: Create a regulation.
#[utoipa::path(
    post,
    path = "/v1/regulations",
    request_body = RegulationRequest,
    responses(
        (status = 201, description = "Regulation created", body = RegulationResponse),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "regulations"
)]
pub(crate) async fn create_regulation(
    State(state): State<AppState>,
    body: Result<Json<RegulationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegulationResponse>), AppError> {
    let req = extract_validated_json(body)?;

    let mut record = Regulation::new(req.name.trim());
    record.short_name = blank_to_none(req.short_name);
    record.jurisdiction = blank_to_none(req.jurisdiction);
    record.description = blank_to_none(req.description);
    record.reference_url = blank_to_none(req.reference_url);

    if let Some(pool) = &state.db_pool {
        crate::db::regulations::insert(pool, &record)
            .await
            .map_err(|e| AppError::persist_failed("regulation", e))?;
    }
    state.regulations.insert(*record.id.as_uuid(), record.clone());

    tracing::info!(regulation_id = %record.id, name = %record.name, "regulation created");
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// GET /v1/regulations: List regulations sorted by display name.
#[utoipa::path(
    get,
    path = "/v1/regulations",
    responses(
        (status = 200, description = "All regulations", body = Vec<RegulationResponse>),
    ),
    tag = "regulations"
)]
pub(crate) async fn list_regulations(State(state): State<AppState>) -> Json<Vec<RegulationResponse>> {
    Json(
        state
            .sorted_regulations()
            .into_iter()
            .map(RegulationResponse::from)
            .collect(),
    )
}

/// GET /v1/regulations/:id: Fetch a regulation.
#[utoipa::path(
    get,
    path = "/v1/regulations/{id}",
    params(("id" = Uuid, Path, description = "Regulation ID")),
    responses(
        (status = 200, description = "Regulation found", body = RegulationResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "regulations"
)]
pub(crate) async fn get_regulation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RegulationResponse>, AppError> {
    state
        .regulations
        .get(&id)
        .map(|r| Json(r.into()))
        .ok_or_else(|| AppError::not_found("regulation", id))
}

/// PUT /v1/regulations/:id: Replace a regulation's mutable fields.
#[utoipa::path(
    put,
    path = "/v1/regulations/{id}",
    params(("id" = Uuid, Path, description = "Regulation ID")),
    request_body = RegulationRequest,
    responses(
        (status = 200, description = "Regulation updated", body = RegulationResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "regulations"
)]
pub(crate) async fn update_regulation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<RegulationRequest>, JsonRejection>,
) -> Result<Json<RegulationResponse>, AppError> {
    let req = extract_validated_json(body)?;

    let previous = state
        .regulations
        .get(&id)
        .ok_or_else(|| AppError::not_found("regulation", id))?;

    let updated = Regulation {
        name: req.name.trim().to_string(),
        short_name: blank_to_none(req.short_name),
        jurisdiction: blank_to_none(req.jurisdiction),
        description: blank_to_none(req.description),
        reference_url: blank_to_none(req.reference_url),
        updated_at: Utc::now(),
        ..previous
    };

    if let Some(pool) = &state.db_pool {
        let found = crate::db::regulations::update(pool, &updated)
            .await
            .map_err(|e| AppError::persist_failed("regulation", e))?;
        if !found {
            return Err(AppError::not_found("regulation", id));
        }
    }
    // A delete may have landed while the database write was in flight.
    state
        .regulations
        .update(&id, |current| *current = updated.clone())
        .ok_or_else(|| AppError::not_found("regulation", id))?;

    tracing::info!(regulation_id = %updated.id, "regulation updated");
    Ok(Json(updated.into()))
}

/// DELETE /v1/regulations/:id: Delete an unreferenced regulation.
#[utoipa::path(
    delete,
    path = "/v1/regulations/{id}",
    params(("id" = Uuid, Path, description = "Regulation ID")),
    responses(
        (status = 204, description = "Regulation deleted"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Still listed by a chemical", body = crate::error::ErrorBody),
    ),
    tag = "regulations"
)]
pub(crate) async fn delete_regulation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.regulations.get(&id).is_none() {
        return Err(AppError::not_found("regulation", id));
    }

    let regulation_id = RegulationId::from_uuid(id);
    if state.chemicals.any(|c| c.references(&regulation_id)) {
        return Err(AppError::Conflict(format!(
            "regulation {id} is still listed by at least one chemical"
        )));
    }

    if let Some(pool) = &state.db_pool {
        crate::db::regulations::delete(pool, &regulation_id)
            .await
            .map_err(|e| AppError::persist_failed("regulation deletion", e))?;
    }
    state.regulations.remove(&id);

    tracing::info!(regulation_id = %id, "regulation deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str) -> RegulationRequest {
        RegulationRequest {
            name: name.to_string(),
            short_name: None,
            jurisdiction: None,
            description: None,
            reference_url: None,
        }
    }

    #[test]
    fn validate_requires_name() {
        assert_eq!(request("  ").validate(), Err(ValidationError::EmptyField("name")));
        assert!(request("EU 10/2011").validate().is_ok());
    }

    #[test]
    fn validate_limits_short_name() {
        let mut req = request("EU");
        req.short_name = Some("x".repeat(MAX_SHORT_NAME_LEN + 1));
        assert_eq!(req.validate().unwrap_err().field(), Some("short_name"));
    }

    #[test]
    fn response_carries_display_name() {
        let reg = Regulation::new("Commission Regulation (EU) No 10/2011").with_short_name("EU 10/2011");
        let response = RegulationResponse::from(reg.clone());
        assert_eq!(response.display_name, "EU 10/2011");
        assert_eq!(response.id, *reg.id.as_uuid());
    }

    #[test]
    fn blank_optional_fields_become_none() {
        assert_eq!(blank_to_none(Some("  ".into())), None);
        assert_eq!(blank_to_none(Some("EU".into())), Some("EU".into()));
    }

    #[tokio::test]
    async fn update_of_deleted_regulation_stays_deleted() {
        let state = AppState::new();
        let reg = Regulation::new("GB 9685-2016");
        let id = *reg.id.as_uuid();
        state.regulations.insert(id, reg);

        let renamed = update_regulation(State(state.clone()), Path(id), Ok(Json(request("GB 9685"))))
            .await
            .unwrap();
        assert_eq!(renamed.0.name, "GB 9685");

        delete_regulation(State(state.clone()), Path(id)).await.unwrap();
        let err = update_regulation(State(state.clone()), Path(id), Ok(Json(request("GB 9685-2016"))))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(state.regulations.get(&id).is_none());
    }
}
