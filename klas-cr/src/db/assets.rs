//! Enrichment asset persistence

use anyhow::Result;
use klas_common::db::models::{Provenance, StorageMode};
use sqlx::SqlitePool;

/// Count of a module's external-facing assets (link or embed storage)
pub async fn count_linkable(pool: &SqlitePool, module_id: i64) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM enrichment_assets
        WHERE module_id = ? AND storage_mode IN ('link', 'embed')
        "#,
    )
    .bind(module_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Insert one enrichment asset, returning its id
pub async fn insert_asset(
    pool: &SqlitePool,
    module_id: i64,
    title: &str,
    url: &str,
    storage_mode: StorageMode,
    provenance: &Provenance,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO enrichment_assets (module_id, title, url, storage_mode, generated_by, extra)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(module_id)
    .bind(title)
    .bind(url)
    .bind(storage_mode.as_str())
    .bind(provenance.generated_by.map(|g| g.as_str()))
    .bind(provenance.extra_json())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}
