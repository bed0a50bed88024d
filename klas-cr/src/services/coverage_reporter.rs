//! Coverage aggregation and reporting
//!
//! Assembles raw per-cell counts from windowed bulk reads, classifies every
//! in-scope grade/subject cell, and serves the result through a TTL-bound
//! snapshot cache. The reporting surface never raises to its callers: on a
//! failed recompute it degrades to the last good snapshot, or an empty
//! report if none exists yet.

use crate::cache::SnapshotCache;
use crate::db;
use crate::services::coverage_evaluator::evaluate_cell;
use crate::services::paginated_fetcher::{fetch_all_pages, FetchOptions};
use crate::services::threshold_policy::{
    beta_thresholds_for, is_in_scope, launch_cells, thresholds_for,
};
use crate::types::{
    CellCounts, CoverageStatus, CoverageSummary, DegradeMode, GapSummaryEntry,
    GradeSubjectCoverage,
};
use chrono::Utc;
use klas_common::grades::grade_sort_key;
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::warn;

/// Cache key of the coverage snapshot
const COVERAGE_CACHE_KEY: &str = "content_coverage";

/// Snapshot time-to-live
pub const COVERAGE_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Default number of worst gaps reported in a summary
pub const DEFAULT_TOP_GAPS: usize = 5;

/// Coverage reporting service over a read connection
pub struct CoverageReporter {
    db: SqlitePool,
    cache: SnapshotCache<Vec<GradeSubjectCoverage>>,
    fetch_options: FetchOptions,
    top_gaps: usize,
}

/// Per-cell accumulator while folding bulk reads
#[derive(Default)]
struct CellAccum {
    module_count: i64,
    lesson_count: i64,
    question_count: i64,
    strand_lessons: HashMap<String, i64>,
}

impl CoverageReporter {
    pub fn new(db: SqlitePool, cache: SnapshotCache<Vec<GradeSubjectCoverage>>) -> Self {
        Self {
            db,
            cache,
            fetch_options: FetchOptions::default(),
            top_gaps: DEFAULT_TOP_GAPS,
        }
    }

    pub fn with_fetch_options(mut self, fetch_options: FetchOptions) -> Self {
        self.fetch_options = fetch_options;
        self
    }

    pub fn with_top_gaps(mut self, top_gaps: usize) -> Self {
        self.top_gaps = top_gaps;
        self
    }

    /// Current coverage of every in-scope grade/subject cell, sorted by
    /// grade order then subject name. Cached for five minutes;
    /// `force_refresh` bypasses the cache. Never fails: a failed recompute
    /// degrades to the last good snapshot or an empty report.
    pub async fn get_content_coverage(&self, force_refresh: bool) -> Vec<GradeSubjectCoverage> {
        if !force_refresh {
            if let Some((snapshot, fresh)) = self.cache.get(COVERAGE_CACHE_KEY) {
                if fresh {
                    return snapshot;
                }
            }
        }

        match self.compute_coverage().await {
            Ok(coverage) => {
                self.cache
                    .set(COVERAGE_CACHE_KEY, coverage.clone(), COVERAGE_CACHE_TTL);
                coverage
            }
            Err(err) => {
                warn!(error = %err, "Coverage computation failed, serving last known snapshot");
                self.cache
                    .get(COVERAGE_CACHE_KEY)
                    .map(|(snapshot, _)| snapshot)
                    .unwrap_or_default()
            }
        }
    }

    /// Whether a cell is in scope and at or above the requested tier
    pub async fn is_grade_subject_ready(
        &self,
        grade: &str,
        subject: &str,
        allow_beta: bool,
    ) -> bool {
        if !is_in_scope(grade, subject) {
            return false;
        }

        let required = if allow_beta {
            CoverageStatus::Beta
        } else {
            CoverageStatus::Ready
        };

        self.get_content_coverage(false)
            .await
            .iter()
            .find(|cell| cell.grade == grade && cell.subject == subject)
            .map_or(false, |cell| cell.status >= required)
    }

    /// Rollup of the current snapshot with the worst in-scope gaps first
    pub async fn get_coverage_summary(&self) -> CoverageSummary {
        let coverage = self.get_content_coverage(false).await;

        let total_cells = coverage.len();
        let count_of = |status: CoverageStatus| {
            coverage.iter().filter(|cell| cell.status == status).count()
        };
        let ready_count = count_of(CoverageStatus::Ready);

        let mut gaps: Vec<&GradeSubjectCoverage> = coverage
            .iter()
            .filter(|cell| cell.status < CoverageStatus::Ready)
            .collect();
        gaps.sort_by(|a, b| {
            a.status
                .cmp(&b.status)
                .then_with(|| grade_sort_key(&a.grade).cmp(&grade_sort_key(&b.grade)))
                .then_with(|| a.subject.cmp(&b.subject))
        });

        let top_gaps = gaps
            .into_iter()
            .take(self.top_gaps)
            .map(|cell| GapSummaryEntry {
                grade: cell.grade.clone(),
                subject: cell.subject.clone(),
                status: cell.status,
                detail: cell.details.first().cloned().unwrap_or_default(),
            })
            .collect();

        CoverageSummary {
            total_cells,
            ready_count,
            beta_count: count_of(CoverageStatus::Beta),
            thin_count: count_of(CoverageStatus::Thin),
            empty_count: count_of(CoverageStatus::Empty),
            ready_percent: if total_cells == 0 {
                0.0
            } else {
                ready_count as f64 * 100.0 / total_cells as f64
            },
            top_gaps,
            generated_at: Utc::now(),
        }
    }

    /// Restrict candidate module ids to those whose cell is in scope and at
    /// or above the requested tier. Input order is preserved. On a failed
    /// module lookup the behavior follows `degrade`; callers gating
    /// recommendation surfacing pass `DegradeMode::PassThrough`.
    pub async fn filter_modules_by_readiness(
        &self,
        module_ids: &[i64],
        allow_beta: bool,
        degrade: DegradeMode,
    ) -> Vec<i64> {
        let cells = match db::modules::fetch_cells_for_ids(&self.db, module_ids).await {
            Ok(cells) => cells,
            Err(err) => match degrade {
                DegradeMode::PassThrough => {
                    warn!(
                        error = %err,
                        "Module readiness lookup failed, passing candidate set through unfiltered"
                    );
                    return module_ids.to_vec();
                }
                DegradeMode::Empty => {
                    warn!(error = %err, "Module readiness lookup failed, dropping candidate set");
                    return Vec::new();
                }
            },
        };

        let required = if allow_beta {
            CoverageStatus::Beta
        } else {
            CoverageStatus::Ready
        };

        let coverage = self.get_content_coverage(false).await;
        let status_by_cell: HashMap<(&str, &str), CoverageStatus> = coverage
            .iter()
            .map(|cell| ((cell.grade.as_str(), cell.subject.as_str()), cell.status))
            .collect();

        let passing: HashSet<i64> = cells
            .iter()
            .filter(|cell| {
                is_in_scope(&cell.grade_band, &cell.subject)
                    && status_by_cell
                        .get(&(cell.grade_band.as_str(), cell.subject.as_str()))
                        .map_or(false, |status| *status >= required)
            })
            .map(|cell| cell.id)
            .collect();

        module_ids
            .iter()
            .copied()
            .filter(|id| passing.contains(id))
            .collect()
    }

    /// Recompute the full snapshot from the store
    async fn compute_coverage(&self) -> anyhow::Result<Vec<GradeSubjectCoverage>> {
        let opts = &self.fetch_options;

        let modules = fetch_all_pages("module rows", opts, |from, to| {
            let pool = self.db.clone();
            async move { db::counts::module_window(&pool, from, to).await }
        })
        .await?;

        let lesson_counts = fetch_all_pages("lesson counts", opts, |from, to| {
            let pool = self.db.clone();
            async move { db::counts::lesson_count_window(&pool, from, to).await }
        })
        .await?;

        let practice_counts = fetch_all_pages("practice item counts", opts, |from, to| {
            let pool = self.db.clone();
            async move { db::counts::practice_count_window(&pool, from, to).await }
        })
        .await?;

        let lessons_by_module: HashMap<i64, i64> = lesson_counts
            .into_iter()
            .map(|row| (row.module_id, row.lesson_count))
            .collect();
        let items_by_slug: HashMap<String, i64> = practice_counts
            .into_iter()
            .map(|row| (row.module_slug, row.item_count))
            .collect();

        let mut cells: HashMap<(String, String), CellAccum> = HashMap::new();
        for module in modules {
            if !is_in_scope(&module.grade_band, &module.subject) {
                continue;
            }
            let accum = cells
                .entry((module.grade_band.clone(), module.subject.clone()))
                .or_default();
            let module_lessons = lessons_by_module.get(&module.id).copied().unwrap_or(0);
            accum.module_count += 1;
            accum.lesson_count += module_lessons;
            accum.question_count += items_by_slug.get(&module.slug).copied().unwrap_or(0);
            if let Some(strand) = module.strand {
                *accum.strand_lessons.entry(strand).or_insert(0) += module_lessons;
            }
        }

        let mut coverage = Vec::new();
        for (grade, subject) in launch_cells() {
            let full = thresholds_for(grade, subject);
            let beta = beta_thresholds_for(grade, subject);
            let accum = cells
                .remove(&(grade.to_string(), subject.to_string()))
                .unwrap_or_default();

            let counts = CellCounts {
                module_count: accum.module_count,
                lesson_count: accum.lesson_count,
                question_count: accum.question_count,
                strands_meeting_min: accum
                    .strand_lessons
                    .values()
                    .filter(|&&lessons| lessons >= full.min_lessons_per_strand)
                    .count() as i64,
                total_strands: accum.strand_lessons.len() as i64,
            };

            let evaluation = evaluate_cell(&counts, &full, &beta);
            coverage.push(GradeSubjectCoverage {
                grade: grade.to_string(),
                subject: subject.to_string(),
                status: evaluation.status,
                counts,
                avg_questions_per_lesson: counts.avg_questions_per_lesson(),
                details: evaluation.details,
            });
        }

        coverage.sort_by(|a, b| {
            grade_sort_key(&a.grade)
                .cmp(&grade_sort_key(&b.grade))
                .then_with(|| a.subject.cmp(&b.subject))
        });

        Ok(coverage)
    }
}
