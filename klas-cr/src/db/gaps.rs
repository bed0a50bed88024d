//! Reads from the `module_coverage_gaps` view
//!
//! The view yields one row per module that is below any individual
//! baseline, with the three deficiency flags and the current tagged
//! practice count. The gap filler drives off this view rather than
//! recomputing baselines itself.

use anyhow::Result;
use sqlx::SqlitePool;

/// One below-baseline module as reported by the view
#[derive(Debug, Clone)]
pub struct GapRow {
    pub module_id: i64,
    pub slug: String,
    pub subject: String,
    pub grade_band: String,
    pub standard_code: Option<String>,
    pub practice_count: i64,
    pub needs_practice: bool,
    pub needs_assessment: bool,
    pub needs_external: bool,
}

pub async fn gap_window(pool: &SqlitePool, from: i64, to: i64) -> Result<Vec<GapRow>> {
    let rows = sqlx::query_as::<_, (i64, String, String, String, Option<String>, i64, i64, i64, i64)>(
        r#"
        SELECT module_id, slug, subject, grade_band, standard_code,
               practice_count, needs_practice, needs_assessment, needs_external
        FROM module_coverage_gaps
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
        .map(
            |(
                module_id,
                slug,
                subject,
                grade_band,
                standard_code,
                practice_count,
                needs_practice,
                needs_assessment,
                needs_external,
            )| GapRow {
                module_id,
                slug,
                subject,
                grade_band,
                standard_code,
                practice_count,
                needs_practice: needs_practice != 0,
                needs_assessment: needs_assessment != 0,
                needs_external: needs_external != 0,
            },
        )
        .collect())
}
