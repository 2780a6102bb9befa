//! # packcheck-api: Axum API Service
//!
//! HTTP surface for the packaging compliance stack, built on
//! Axum/Tower/Tokio.
//!
//! ## Routes
//!
//! | Path | Module | Purpose |
//! |------|--------|---------|
//! | `/v1/regulations/*` | [`routes::regulations`] | Regulation CRUD |
//! | `/v1/chemicals/*` | [`routes::chemicals`] | Chemical CRUD, search, limits |
//! | `/v1/migration/*` | [`routes::migration`] | Calculation and CSV export |
//! | `/openapi.json` | [`openapi`] | Generated OpenAPI document |
//! | `/health/*` | this module | Liveness and readiness probes |
//! | `/metrics` | this module | Prometheus scrape endpoint |
//!
//! ## Middleware Stack (Tower)
//!
//! TraceLayer → MetricsLayer → body limit
//!
//! ## Crate Policy
//!
//! - No business logic in route handlers; calculation lives in
//!   `packcheck-migration`, registry rules in `packcheck-registry`.
//! - All errors map to structured HTTP responses via `AppError`.

pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use state::{AppConfig, AppState};

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

/// Maximum accepted request body.
const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::regulations::router())
        .merge(routes::chemicals::router())
        .merge(routes::migration::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(BODY_LIMIT));

    let mut probes = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));
    if state.config.metrics_enabled {
        probes = probes.route("/metrics", get(prometheus_metrics));
    }

    let mut router = Router::new().merge(probes).merge(api);
    if state.config.metrics_enabled {
        router = router.layer(from_fn_with_state(
            state.clone(),
            middleware::metrics::metrics_middleware,
        ));
    }

    router
        .layer(middleware::tracing_layer::layer())
        .with_state(state)
}

/// GET /metrics: Prometheus metrics scrape endpoint.
///
/// Refreshes the registry gauges from `AppState`, then encodes everything in
/// Prometheus text exposition format.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    state
        .metrics
        .set_registry_sizes(state.chemicals.len(), state.regulations.len());

    match state.metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode Prometheus metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 "ready", or 503 when the configured database does
/// not answer.
async fn readiness(State(state): State<AppState>) -> Result<&'static str, AppError> {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("Database health check failed: {e}");
            return Err(AppError::ServiceUnavailable("database unreachable".into()));
        }
    }

    Ok("ready")
}
