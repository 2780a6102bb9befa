//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! ## Architecture
//!
//! AppState holds the registry (regulations and chemicals) in in-memory
//! stores. When a database pool is configured, writes go through to Postgres
//! and the stores are hydrated from it on startup, so reads stay
//! synchronous and never touch the database.
//!
//! Calculation requests are stateless and leave no trace here beyond a
//! metrics counter.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use packcheck_core::{PackcheckError, RegulationId};
use packcheck_registry::{Chemical, Regulation, RegistrySnapshot, RegulationLookup};
use parking_lot::RwLock;
use sqlx::PgPool;
use uuid::Uuid;

use crate::middleware::metrics::ApiMetrics;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not `tokio::sync`)
/// because we never hold the lock across `.await` points.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Retrieve a record by ID.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records, in no particular order.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Update a record in place. Returns the updated record, or `None` if not
    /// found; a missing record is never re-created.
    pub fn update(&self, id: &Uuid, f: impl FnOnce(&mut T)) -> Option<T> {
        let mut guard = self.data.write();
        let entry = guard.get_mut(id)?;
        f(entry);
        Some(entry.clone())
    }

    /// Run `f` against the whole map under one write lock.
    ///
    /// Used where a write depends on other records (uniqueness checks), so
    /// the check and the write cannot interleave with another request.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut HashMap<Uuid, T>) -> R) -> R {
        f(&mut self.data.write())
    }

    /// Remove a record by ID.
    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.data.write().remove(id)
    }

    /// Whether any record satisfies `pred`.
    pub fn any(&self, pred: impl Fn(&T) -> bool) -> bool {
        self.data.read().values().any(pred)
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl RegulationLookup for Store<Regulation> {
    fn display_name_of(&self, id: &RegulationId) -> Option<String> {
        self.data
            .read()
            .get(id.as_uuid())
            .map(|r| r.display_name().to_string())
    }
}

// -- Application State --------------------------------------------------------

/// Application configuration, read from the environment by the binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Whether `/metrics` and the metrics middleware are mounted.
    pub metrics_enabled: bool,
    /// Registry snapshot loaded into an empty registry at startup.
    pub seed_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            metrics_enabled: true,
            seed_path: None,
        }
    }
}

impl AppConfig {
    /// Build configuration from `PORT`, `PACKCHECK_METRICS_ENABLED`, and
    /// `PACKCHECK_SEED`.
    ///
    /// Metrics default to enabled unless the variable is exactly `"false"`
    /// (case-insensitive).
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let metrics_enabled = std::env::var("PACKCHECK_METRICS_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);
        let seed_path = std::env::var_os("PACKCHECK_SEED").map(PathBuf::from);
        Self {
            port,
            metrics_enabled,
            seed_path,
        }
    }
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub regulations: Store<Regulation>,
    pub chemicals: Store<Chemical>,

    /// PostgreSQL connection pool. `None` means in-memory only.
    pub db_pool: Option<PgPool>,

    /// Prometheus registry shared by the middleware and handlers.
    pub metrics: ApiMetrics,

    pub config: AppConfig,
}

impl AppState {
    /// Empty state with default configuration and no database.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    /// Empty state with the given configuration and optional database pool.
    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        Self {
            regulations: Store::new(),
            chemicals: Store::new(),
            db_pool,
            metrics: ApiMetrics::new(),
            config,
        }
    }

    /// Regulations sorted by display name (case-insensitive), then id.
    pub fn sorted_regulations(&self) -> Vec<Regulation> {
        let mut regulations = self.regulations.list();
        regulations.sort_by(|a, b| {
            a.display_name()
                .to_lowercase()
                .cmp(&b.display_name().to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        regulations
    }

    /// Hydrate in-memory stores from the database.
    ///
    /// Called once on startup when a database pool is available.
    pub async fn hydrate_from_db(&self) -> Result<(), String> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(()),
        };

        let regulations = crate::db::regulations::load_all(pool)
            .await
            .map_err(|e| format!("failed to load regulations: {e}"))?;
        let regulation_count = regulations.len();
        for record in regulations {
            self.regulations.insert(*record.id.as_uuid(), record);
        }

        let chemicals = crate::db::chemicals::load_all(pool)
            .await
            .map_err(|e| format!("failed to load chemicals: {e}"))?;
        let chemical_count = chemicals.len();
        for record in chemicals {
            self.chemicals.insert(*record.id.as_uuid(), record);
        }

        tracing::info!(
            regulations = regulation_count,
            chemicals = chemical_count,
            "Hydrated in-memory stores from database"
        );

        Ok(())
    }

    /// Load a registry snapshot into an empty registry.
    ///
    /// Skipped (returning `Ok(false)`) when the registry already holds data,
    /// so restarting against a populated database never duplicates records.
    /// Seeded records are persisted when a database is configured.
    pub async fn seed_from_snapshot(&self, path: &Path) -> Result<bool, PackcheckError> {
        if !self.regulations.is_empty() || !self.chemicals.is_empty() {
            tracing::info!(path = %path.display(), "registry not empty, skipping seed");
            return Ok(false);
        }

        let (regulations, chemicals) =
            RegistrySnapshot::load(path).and_then(RegistrySnapshot::into_records)?;

        if let Some(pool) = &self.db_pool {
            for record in &regulations {
                crate::db::regulations::insert(pool, record)
                    .await
                    .map_err(|e| PackcheckError::Registry(format!("failed to persist seeded regulation: {e}")))?;
            }
            for record in &chemicals {
                crate::db::chemicals::insert(pool, record)
                    .await
                    .map_err(|e| PackcheckError::Registry(format!("failed to persist seeded chemical: {e}")))?;
            }
        }

        let (regulation_count, chemical_count) = (regulations.len(), chemicals.len());
        for record in regulations {
            self.regulations.insert(*record.id.as_uuid(), record);
        }
        for record in chemicals {
            self.chemicals.insert(*record.id.as_uuid(), record);
        }

        tracing::info!(
            path = %path.display(),
            regulations = regulation_count,
            chemicals = chemical_count,
            "Seeded registry from snapshot"
        );
        Ok(true)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
