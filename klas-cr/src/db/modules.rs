//! Module lookups

use anyhow::Result;
use klas_common::db::models::Module;
use sqlx::{Row, SqlitePool};

/// Load one module by id
pub async fn fetch_module(pool: &SqlitePool, id: i64) -> Result<Option<Module>> {
    let row = sqlx::query(
        r#"
        SELECT id, slug, title, subject, grade_band, strand, topic,
               standard_code, practice_target
        FROM modules
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| Module {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        subject: row.get("subject"),
        grade_band: row.get("grade_band"),
        strand: row.get("strand"),
        topic: row.get("topic"),
        standard_code: row.get("standard_code"),
        practice_target: row.get("practice_target"),
    }))
}

/// Grade/subject cell of one module, for readiness filtering
#[derive(Debug, Clone)]
pub struct ModuleCell {
    pub id: i64,
    pub grade_band: String,
    pub subject: String,
}

/// Resolve the grade/subject cell of each candidate module. Unknown ids
/// are simply absent from the result.
pub async fn fetch_cells_for_ids(pool: &SqlitePool, ids: &[i64]) -> Result<Vec<ModuleCell>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "SELECT id, grade_band, subject FROM modules WHERE id IN ({placeholders})"
    );

    let mut query = sqlx::query_as::<_, (i64, String, String)>(&sql);
    for id in ids {
        query = query.bind(id);
    }

    let rows = query.fetch_all(pool).await?;
    Ok(rows
        .into_iter()
        .map(|(id, grade_band, subject)| ModuleCell {
            id,
            grade_band,
            subject,
        })
        .collect())
}
