//! Regulation persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `regulations` table.
//! The "no chemical references a deleted regulation" rule is enforced at
//! the application layer, not in SQL.

use chrono::{DateTime, Utc};
use packcheck_core::RegulationId;
use packcheck_registry::Regulation;
use sqlx::PgPool;
use uuid::Uuid;

/// Insert a new regulation record.
pub async fn insert(pool: &PgPool, record: &Regulation) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO regulations (id, name, short_name, jurisdiction, description, reference_url, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(record.id.as_uuid())
    .bind(&record.name)
    .bind(&record.short_name)
    .bind(&record.jurisdiction)
    .bind(&record.description)
    .bind(&record.reference_url)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Replace the mutable fields of a regulation.
pub async fn update(pool: &PgPool, record: &Regulation) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE regulations SET name = $1, short_name = $2, jurisdiction = $3, description = $4,
                reference_url = $5, updated_at = $6
         WHERE id = $7",
    )
    .bind(&record.name)
    .bind(&record.short_name)
    .bind(&record.jurisdiction)
    .bind(&record.description)
    .bind(&record.reference_url)
    .bind(record.updated_at)
    .bind(record.id.as_uuid())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a regulation by ID.
pub async fn delete(pool: &PgPool, id: &RegulationId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM regulations WHERE id = $1")
        .bind(id.as_uuid())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all regulations into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Regulation>, sqlx::Error> {
    let rows = sqlx::query_as::<_, RegulationRow>(
        "SELECT id, name, short_name, jurisdiction, description, reference_url, created_at, updated_at
         FROM regulations ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(RegulationRow::into_record).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct RegulationRow {
    id: Uuid,
    name: String,
    short_name: Option<String>,
    jurisdiction: Option<String>,
    description: Option<String>,
    reference_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RegulationRow {
    fn into_record(self) -> Regulation {
        Regulation {
            id: RegulationId::from_uuid(self.id),
            name: self.name,
            short_name: self.short_name,
            jurisdiction: self.jurisdiction,
            description: self.description,
            reference_url: self.reference_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
