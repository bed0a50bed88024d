//! Database initialization
//!
//! Creates the content schema on first run and opens it thereafter. All
//! statements are idempotent so repeated startup is safe. Tests call
//! `init_schema` directly against an in-memory pool.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Fallback practice-item target for modules without their own
/// `practice_target`. The `module_coverage_gaps` view bakes in the same
/// value so the view and the gap filler agree on the baseline.
pub const DEFAULT_PRACTICE_TARGET: i64 = 10;

/// Launch subjects seeded into the `subjects` table
pub const SEED_SUBJECTS: [(&str, &str); 4] = [
    ("English Language Arts", "English Language Arts"),
    ("Mathematics", "Mathematics"),
    ("Science", "Science"),
    ("Social Studies", "Social Studies"),
];

/// Initialize database connection and create schema if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    init_schema(&pool).await?;

    Ok(pool)
}

/// Create tables, the coverage-gaps view, and seed rows on any pool
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subjects (
            id INTEGER PRIMARY KEY,
            name TEXT UNIQUE NOT NULL,
            display_name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS modules (
            id INTEGER PRIMARY KEY,
            slug TEXT UNIQUE NOT NULL,
            title TEXT NOT NULL,
            subject TEXT NOT NULL,
            grade_band TEXT NOT NULL,
            strand TEXT,
            topic TEXT,
            standard_code TEXT,
            practice_target INTEGER,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lessons (
            id INTEGER PRIMARY KEY,
            module_id INTEGER NOT NULL REFERENCES modules(id),
            title TEXT NOT NULL,
            position INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS practice_items (
            id INTEGER PRIMARY KEY,
            module_slug TEXT,
            stem TEXT NOT NULL,
            options TEXT NOT NULL DEFAULT '[]',
            tags TEXT NOT NULL DEFAULT '[]',
            generated_by TEXT,
            standards TEXT NOT NULL DEFAULT '[]',
            extra TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_practice_items_module_slug \
         ON practice_items(module_slug)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS assessments (
            id INTEGER PRIMARY KEY,
            module_id INTEGER REFERENCES modules(id),
            title TEXT NOT NULL,
            purpose TEXT,
            standards TEXT NOT NULL DEFAULT '[]',
            generated_by TEXT,
            extra TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS assessment_sections (
            id INTEGER PRIMARY KEY,
            assessment_id INTEGER NOT NULL REFERENCES assessments(id),
            title TEXT NOT NULL,
            position INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS assessment_section_items (
            section_id INTEGER NOT NULL REFERENCES assessment_sections(id),
            practice_item_id INTEGER NOT NULL REFERENCES practice_items(id),
            position INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (section_id, practice_item_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS enrichment_assets (
            id INTEGER PRIMARY KEY,
            module_id INTEGER NOT NULL REFERENCES modules(id),
            title TEXT NOT NULL,
            url TEXT NOT NULL,
            storage_mode TEXT NOT NULL,
            generated_by TEXT,
            extra TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Per-module "below baseline" view consumed by the gap filler. A module
    // appears once per deficiency source; the gap filler de-duplicates by
    // module id. Baselines: tagged practice count below the effective
    // target, no attached assessment, no link/embed asset.
    let gaps_view = format!(
        r#"
        CREATE VIEW IF NOT EXISTS module_coverage_gaps AS
        SELECT
            m.id AS module_id,
            m.slug AS slug,
            m.subject AS subject,
            m.grade_band AS grade_band,
            m.standard_code AS standard_code,
            COALESCE(p.practice_count, 0) AS practice_count,
            CASE WHEN COALESCE(p.practice_count, 0)
                      < COALESCE(m.practice_target, {target})
                 THEN 1 ELSE 0 END AS needs_practice,
            CASE WHEN COALESCE(a.assessment_count, 0) = 0
                 THEN 1 ELSE 0 END AS needs_assessment,
            CASE WHEN COALESCE(e.asset_count, 0) = 0
                 THEN 1 ELSE 0 END AS needs_external
        FROM modules m
        LEFT JOIN (
            SELECT module_slug, COUNT(*) AS practice_count
            FROM practice_items
            WHERE module_slug IS NOT NULL
            GROUP BY module_slug
        ) p ON p.module_slug = m.slug
        LEFT JOIN (
            SELECT module_id, COUNT(*) AS assessment_count
            FROM assessments
            WHERE module_id IS NOT NULL
            GROUP BY module_id
        ) a ON a.module_id = m.id
        LEFT JOIN (
            SELECT module_id, COUNT(*) AS asset_count
            FROM enrichment_assets
            WHERE storage_mode IN ('link', 'embed')
            GROUP BY module_id
        ) e ON e.module_id = m.id
        WHERE COALESCE(p.practice_count, 0) < COALESCE(m.practice_target, {target})
           OR COALESCE(a.assessment_count, 0) = 0
           OR COALESCE(e.asset_count, 0) = 0
        "#,
        target = DEFAULT_PRACTICE_TARGET
    );
    sqlx::query(&gaps_view).execute(pool).await?;

    for (name, display_name) in SEED_SUBJECTS {
        sqlx::query("INSERT OR IGNORE INTO subjects (name, display_name) VALUES (?, ?)")
            .bind(name)
            .bind(display_name)
            .execute(pool)
            .await?;
    }

    Ok(())
}
