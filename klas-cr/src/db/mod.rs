//! Database access for the content readiness service

pub mod assessments;
pub mod assets;
pub mod counts;
pub mod gaps;
pub mod modules;
pub mod practice_items;
pub mod subjects;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::path::Path;

/// Connect to the content database in read-only mode.
///
/// The coverage service only ever reads; the gap filler and the platform's
/// authoring surface own the writes.
pub async fn connect_readonly(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        anyhow::bail!(
            "Database not found: {}\nRun klas-gapfill or the platform importer first to initialize it.",
            db_path.display()
        );
    }

    let db_url = format!("sqlite://{}?mode=ro", db_path.display());

    SqlitePool::connect(&db_url)
        .await
        .context("Failed to connect to database in read-only mode")
}
