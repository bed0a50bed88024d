//! Practice item persistence

use anyhow::Result;
use klas_common::db::models::{ItemOption, Provenance};
use sqlx::SqlitePool;
use std::collections::BTreeSet;

/// Existing item tagged with a module's identity
#[derive(Debug, Clone)]
pub struct TaggedItem {
    pub id: i64,
    pub standards: BTreeSet<String>,
}

/// All items tagged with the module's slug, oldest first
pub async fn fetch_tagged_items(pool: &SqlitePool, module_slug: &str) -> Result<Vec<TaggedItem>> {
    let rows = sqlx::query_as::<_, (i64, Option<String>)>(
        r#"
        SELECT id, standards
        FROM practice_items
        WHERE module_slug = ?
        ORDER BY id
        "#,
    )
    .bind(module_slug)
    .fetch_all(pool)
    .await?;

    let mut items = Vec::with_capacity(rows.len());
    for (id, standards_json) in rows {
        // Validate the standards list at the store boundary
        let provenance = Provenance::from_columns(None, standards_json.as_deref(), None, None)?;
        items.push(TaggedItem {
            id,
            standards: provenance.standards,
        });
    }
    Ok(items)
}

/// Insert one practice item, returning its id
pub async fn insert_item(
    pool: &SqlitePool,
    module_slug: &str,
    stem: &str,
    options: &[ItemOption],
    tags: &[String],
    provenance: &Provenance,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO practice_items (module_slug, stem, options, tags, generated_by, standards, extra)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(module_slug)
    .bind(stem)
    .bind(serde_json::to_string(options)?)
    .bind(serde_json::to_string(tags)?)
    .bind(provenance.generated_by.map(|g| g.as_str()))
    .bind(provenance.standards_json())
    .bind(provenance.extra_json())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Replace an item's standards list with the given (already unioned) set
pub async fn update_item_standards(
    pool: &SqlitePool,
    item_id: i64,
    standards_json: &str,
) -> Result<()> {
    sqlx::query("UPDATE practice_items SET standards = ? WHERE id = ?")
        .bind(standards_json)
        .bind(item_id)
        .execute(pool)
        .await?;

    Ok(())
}
