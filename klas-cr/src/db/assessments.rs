//! Assessment persistence

use anyhow::Result;
use klas_common::db::models::Provenance;
use sqlx::SqlitePool;
use std::collections::BTreeSet;

/// Existing assessment attached to a module
#[derive(Debug, Clone)]
pub struct ModuleAssessment {
    pub id: i64,
    pub title: String,
    pub purpose: Option<String>,
    pub standards: BTreeSet<String>,
}

/// First assessment attached to the module, if any
pub async fn fetch_by_module(
    pool: &SqlitePool,
    module_id: i64,
) -> Result<Option<ModuleAssessment>> {
    let row = sqlx::query_as::<_, (i64, String, Option<String>, Option<String>)>(
        r#"
        SELECT id, title, purpose, standards
        FROM assessments
        WHERE module_id = ?
        ORDER BY id
        LIMIT 1
        "#,
    )
    .bind(module_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some((id, title, purpose, standards_json)) => {
            let provenance =
                Provenance::from_columns(None, standards_json.as_deref(), None, None)?;
            Ok(Some(ModuleAssessment {
                id,
                title,
                purpose,
                standards: provenance.standards,
            }))
        }
        None => Ok(None),
    }
}

/// Merge metadata onto an existing assessment
pub async fn update_metadata(
    pool: &SqlitePool,
    assessment_id: i64,
    purpose: &str,
    standards_json: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE assessments
        SET purpose = ?, standards = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(purpose)
    .bind(standards_json)
    .bind(assessment_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert one assessment, returning its id
pub async fn insert_assessment(
    pool: &SqlitePool,
    module_id: i64,
    title: &str,
    provenance: &Provenance,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO assessments (module_id, title, purpose, standards, generated_by, extra)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(module_id)
    .bind(title)
    .bind(provenance.purpose.as_ref().map(|p| p.as_str().to_string()))
    .bind(provenance.standards_json())
    .bind(provenance.generated_by.map(|g| g.as_str()))
    .bind(provenance.extra_json())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Insert one section, returning its id
pub async fn insert_section(
    pool: &SqlitePool,
    assessment_id: i64,
    title: &str,
    position: i64,
) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO assessment_sections (assessment_id, title, position) VALUES (?, ?, ?)",
    )
    .bind(assessment_id)
    .bind(title)
    .bind(position)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Link a practice item into a section. Re-linking the same item is a
/// no-op so repeated runs stay idempotent.
pub async fn link_item(
    pool: &SqlitePool,
    section_id: i64,
    practice_item_id: i64,
    position: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO assessment_section_items (section_id, practice_item_id, position)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(section_id)
    .bind(practice_item_id)
    .bind(position)
    .execute(pool)
    .await?;

    Ok(())
}
