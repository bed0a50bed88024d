//! Subject record lookups

use anyhow::Result;
use sqlx::SqlitePool;

/// Subject row as seeded at initialization
#[derive(Debug, Clone)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub display_name: String,
}

/// Load a subject record by name. A missing record is a configuration
/// error the caller handles (warn and skip), not a hard failure.
pub async fn fetch_subject(pool: &SqlitePool, name: &str) -> Result<Option<Subject>> {
    let row = sqlx::query_as::<_, (i64, String, String)>(
        "SELECT id, name, display_name FROM subjects WHERE name = ?",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(id, name, display_name)| Subject {
        id,
        name,
        display_name,
    }))
}
