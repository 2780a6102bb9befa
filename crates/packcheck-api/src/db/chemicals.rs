//! Chemical persistence operations.
//!
//! Synonyms and listings are stored as JSONB. The CAS number column is
//! unique; the API checks uniqueness in memory before writing, so a
//! constraint violation here means the stores and the database diverged.

use chrono::{DateTime, Utc};
use packcheck_core::{CasNumber, ChemicalId};
use packcheck_registry::{Chemical, RegulationListing};
use sqlx::PgPool;
use uuid::Uuid;

fn to_json<T: serde::Serialize>(value: &T, what: &str) -> Result<serde_json::Value, sqlx::Error> {
    serde_json::to_value(value)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to serialize chemical {what}: {e}")))
}

/// Insert a new chemical record.
pub async fn insert(pool: &PgPool, record: &Chemical) -> Result<(), sqlx::Error> {
    let synonyms = to_json(&record.synonyms, "synonyms")?;
    let listings = to_json(&record.listings, "listings")?;

    sqlx::query(
        "INSERT INTO chemicals (id, name, cas_number, synonyms, listings, notes, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(record.id.as_uuid())
    .bind(&record.name)
    .bind(record.cas_number.as_ref().map(CasNumber::as_str))
    .bind(&synonyms)
    .bind(&listings)
    .bind(&record.notes)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Replace the mutable fields of a chemical.
pub async fn update(pool: &PgPool, record: &Chemical) -> Result<bool, sqlx::Error> {
    let synonyms = to_json(&record.synonyms, "synonyms")?;
    let listings = to_json(&record.listings, "listings")?;

    let result = sqlx::query(
        "UPDATE chemicals SET name = $1, cas_number = $2, synonyms = $3, listings = $4, notes = $5,
                updated_at = $6
         WHERE id = $7",
    )
    .bind(&record.name)
    .bind(record.cas_number.as_ref().map(CasNumber::as_str))
    .bind(&synonyms)
    .bind(&listings)
    .bind(&record.notes)
    .bind(record.updated_at)
    .bind(record.id.as_uuid())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a chemical by ID.
pub async fn delete(pool: &PgPool, id: &ChemicalId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM chemicals WHERE id = $1")
        .bind(id.as_uuid())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all chemicals into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Chemical>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ChemicalRow>(
        "SELECT id, name, cas_number, synonyms, listings, notes, created_at, updated_at
         FROM chemicals ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(ChemicalRow::into_record).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct ChemicalRow {
    id: Uuid,
    name: String,
    cas_number: Option<String>,
    synonyms: serde_json::Value,
    listings: serde_json::Value,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ChemicalRow {
    fn into_record(self) -> Chemical {
        let cas_number = self.cas_number.as_deref().and_then(|raw| {
            CasNumber::parse(raw)
                .map_err(|e| {
                    tracing::warn!(
                        id = %self.id,
                        cas_number = raw,
                        error = %e,
                        "invalid CAS number in database, dropping it"
                    );
                })
                .ok()
        });

        let synonyms: Vec<String> = serde_json::from_value(self.synonyms).unwrap_or_else(|e| {
            tracing::warn!(id = %self.id, error = %e, "failed to deserialize chemical synonyms, defaulting to empty");
            Vec::new()
        });

        let listings: Vec<RegulationListing> = serde_json::from_value(self.listings).unwrap_or_else(|e| {
            tracing::warn!(id = %self.id, error = %e, "failed to deserialize chemical listings, defaulting to empty");
            Vec::new()
        });

        Chemical {
            id: ChemicalId::from_uuid(self.id),
            name: self.name,
            cas_number,
            synonyms,
            listings,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
