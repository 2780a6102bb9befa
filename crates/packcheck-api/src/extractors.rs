//! # Custom Extractors & Validation
//!
//! Provides the [`Validate`] trait for request DTOs and a helper
//! to extract + validate JSON bodies in handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;
use packcheck_core::ValidationError;

use crate::error::AppError;

/// Trait for request types that can validate their business rules
/// beyond what serde deserialization checks.
pub trait Validate {
    /// Validate business rules, naming the offending field on failure.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
///
/// Handlers take `Result<Json<T>, JsonRejection>` so that rejections use the
/// structured error body instead of axum's plain-text default:
/// ```ignore
/// async fn handler(body: Result<Json<T>, JsonRejection>) -> Result<..., AppError> {
///     let req = extract_json(body)?;
/// }
/// ```
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate()?;
    Ok(value)
}

/// Extract query parameters, mapping parse errors to [`AppError::BadRequest`].
pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result
        .map(|Query(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Optional text field: when present it must be non-blank and within `max`.
pub fn optional_text(field: &'static str, value: Option<&str>, max: usize) -> Result<(), ValidationError> {
    match value {
        Some(v) => packcheck_core::require_text(field, v, max),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Uri;
    use serde::Deserialize;

    #[derive(Debug)]
    struct Named(String);

    #[derive(Debug, Deserialize)]
    struct Filter {
        id: Option<uuid::Uuid>,
    }

    impl Validate for Named {
        fn validate(&self) -> Result<(), ValidationError> {
            packcheck_core::require_text("name", &self.0, 10)
        }
    }

    #[test]
    fn validated_json_passes_valid_values() {
        let named = extract_validated_json(Ok(Json(Named("ok".into())))).unwrap();
        assert_eq!(named.0, "ok");
    }

    #[test]
    fn validated_json_rejects_invalid_values() {
        let err = extract_validated_json(Ok(Json(Named("".into())))).unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::EmptyField("name"))));
    }

    #[test]
    fn optional_text_allows_absent() {
        assert!(optional_text("short_name", None, 5).is_ok());
        assert!(optional_text("short_name", Some("toolong"), 5).is_err());
    }

    #[test]
    fn query_rejection_becomes_bad_request() {
        let uri: Uri = "/v1/chemicals?id=not-a-uuid".parse().unwrap();
        let err = extract_query(Query::<Filter>::try_from_uri(&uri)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let uri: Uri = "/v1/chemicals".parse().unwrap();
        let filter = extract_query(Query::<Filter>::try_from_uri(&uri)).unwrap();
        assert!(filter.id.is_none());
    }
}
