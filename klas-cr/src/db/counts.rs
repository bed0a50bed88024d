//! Windowed bulk reads feeding the coverage aggregator
//!
//! Each query takes an inclusive `[from, to]` row window so the paginated
//! fetcher can walk the full relation. Stable ORDER BY keeps windows
//! consistent across pages.

use anyhow::Result;
use sqlx::SqlitePool;

/// Module attributes needed to place it in a grade/subject cell
#[derive(Debug, Clone)]
pub struct ModuleCellRow {
    pub id: i64,
    pub slug: String,
    pub subject: String,
    pub grade_band: String,
    pub strand: Option<String>,
}

pub async fn module_window(
    pool: &SqlitePool,
    from: i64,
    to: i64,
) -> Result<Vec<ModuleCellRow>> {
    let rows = sqlx::query_as::<_, (i64, String, String, String, Option<String>)>(
        r#"
        SELECT id, slug, subject, grade_band, strand
        FROM modules
        ORDER BY id
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(to - from + 1)
    .bind(from)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, slug, subject, grade_band, strand)| ModuleCellRow {
            id,
            slug,
            subject,
            grade_band,
            strand,
        })
        .collect())
}

/// Lesson count for one module
#[derive(Debug, Clone, Copy)]
pub struct ModuleLessonCount {
    pub module_id: i64,
    pub lesson_count: i64,
}

pub async fn lesson_count_window(
    pool: &SqlitePool,
    from: i64,
    to: i64,
) -> Result<Vec<ModuleLessonCount>> {
    let rows = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT module_id, COUNT(*) AS lesson_count
        FROM lessons
        GROUP BY module_id
        ORDER BY module_id
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(to - from + 1)
    .bind(from)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(module_id, lesson_count)| ModuleLessonCount {
            module_id,
            lesson_count,
        })
        .collect())
}

/// Practice-item count for one module slug
#[derive(Debug, Clone)]
pub struct SlugItemCount {
    pub module_slug: String,
    pub item_count: i64,
}

pub async fn practice_count_window(
    pool: &SqlitePool,
    from: i64,
    to: i64,
) -> Result<Vec<SlugItemCount>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT module_slug, COUNT(*) AS item_count
        FROM practice_items
        WHERE module_slug IS NOT NULL
        GROUP BY module_slug
        ORDER BY module_slug
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(to - from + 1)
    .bind(from)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(module_slug, item_count)| SlugItemCount {
            module_slug,
            item_count,
        })
        .collect())
}
