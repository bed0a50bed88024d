//! Integration tests for coverage aggregation and reporting
//!
//! All tests run against the real schema in memory and inject a manual
//! clock into the snapshot cache so TTL behavior is tested without
//! sleeping.

use klas_cr::cache::test_support::ManualClock;
use klas_cr::cache::SnapshotCache;
use klas_cr::services::paginated_fetcher::FetchOptions;
use klas_cr::services::threshold_policy::launch_cells;
use klas_cr::services::CoverageReporter;
use klas_cr::types::{CoverageStatus, DegradeMode};
use klas_common::db::init_schema;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

/// Single connection so every query sees the same in-memory database
async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    init_schema(&pool).await.expect("Failed to create schema");
    pool
}

fn fast_fetch() -> FetchOptions {
    FetchOptions {
        page_size: 100,
        max_retries: 0,
        base_delay: Duration::from_millis(1),
    }
}

fn reporter_with_clock(pool: &SqlitePool, clock: Arc<ManualClock>) -> CoverageReporter {
    CoverageReporter::new(pool.clone(), SnapshotCache::new(clock))
        .with_fetch_options(fast_fetch())
}

fn reporter(pool: &SqlitePool) -> CoverageReporter {
    reporter_with_clock(pool, Arc::new(ManualClock::new()))
}

async fn insert_module(
    pool: &SqlitePool,
    slug: &str,
    subject: &str,
    grade_band: &str,
    strand: Option<&str>,
) -> i64 {
    let result = sqlx::query(
        "INSERT INTO modules (slug, title, subject, grade_band, strand) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(slug)
    .bind(format!("Module {slug}"))
    .bind(subject)
    .bind(grade_band)
    .bind(strand)
    .execute(pool)
    .await
    .unwrap();
    result.last_insert_rowid()
}

async fn insert_lessons(pool: &SqlitePool, module_id: i64, count: i64) {
    for n in 0..count {
        sqlx::query("INSERT INTO lessons (module_id, title, position) VALUES (?, ?, ?)")
            .bind(module_id)
            .bind(format!("Lesson {n}"))
            .bind(n)
            .execute(pool)
            .await
            .unwrap();
    }
}

async fn insert_items(pool: &SqlitePool, slug: &str, count: i64) {
    for n in 0..count {
        sqlx::query("INSERT INTO practice_items (module_slug, stem) VALUES (?, ?)")
            .bind(slug)
            .bind(format!("Question {n}"))
            .execute(pool)
            .await
            .unwrap();
    }
}

/// 5 modules, 4 lessons each, 4 questions per lesson, one strand per
/// module: comfortably clears the default full tier.
async fn seed_ready_cell(pool: &SqlitePool, subject: &str, grade: &str) -> Vec<i64> {
    let mut ids = Vec::new();
    for n in 0..5 {
        let slug = format!("{}-{}-m{}", subject.to_lowercase().replace(' ', "-"), grade, n);
        let strand = format!("Strand {n}");
        let id = insert_module(pool, &slug, subject, grade, Some(&strand)).await;
        insert_lessons(pool, id, 4).await;
        insert_items(pool, &slug, 16).await;
        ids.push(id);
    }
    ids
}

#[tokio::test]
async fn fresh_database_reports_every_launch_cell_empty() {
    let pool = setup_pool().await;
    let coverage = reporter(&pool).get_content_coverage(false).await;

    assert_eq!(coverage.len(), launch_cells().len());
    assert!(coverage
        .iter()
        .all(|cell| cell.status == CoverageStatus::Empty));

    // Sorted by grade order then subject name
    assert_eq!(coverage[0].grade, "K");
    assert_eq!(coverage[0].subject, "English Language Arts");
    let grade_nine_positions: Vec<usize> = coverage
        .iter()
        .enumerate()
        .filter(|(_, cell)| cell.grade == "9")
        .map(|(i, _)| i)
        .collect();
    let grade_ten_first = coverage.iter().position(|cell| cell.grade == "10").unwrap();
    assert!(grade_nine_positions.iter().all(|&i| i < grade_ten_first));
}

#[tokio::test]
async fn partially_covered_cell_reports_beta_with_shortfalls() {
    let pool = setup_pool().await;
    // Grade 6 Mathematics: 3 modules, 10 lessons, 2 questions per lesson
    let m1 = insert_module(&pool, "m-a", "Mathematics", "6", Some("Ratios")).await;
    let m2 = insert_module(&pool, "m-b", "Mathematics", "6", None).await;
    let m3 = insert_module(&pool, "m-c", "Mathematics", "6", None).await;
    insert_lessons(&pool, m1, 4).await;
    insert_lessons(&pool, m2, 3).await;
    insert_lessons(&pool, m3, 3).await;
    insert_items(&pool, "m-a", 8).await;
    insert_items(&pool, "m-b", 6).await;
    insert_items(&pool, "m-c", 6).await;

    let coverage = reporter(&pool).get_content_coverage(false).await;
    let cell = coverage
        .iter()
        .find(|cell| cell.grade == "6" && cell.subject == "Mathematics")
        .unwrap();

    assert_eq!(cell.status, CoverageStatus::Beta);
    assert_eq!(cell.counts.module_count, 3);
    assert_eq!(cell.counts.lesson_count, 10);
    assert_eq!(cell.avg_questions_per_lesson, 2.0);
    assert!(cell.details.contains(&"Only 3/5 modules".to_string()));
    assert!(cell.details.contains(&"Only 10/20 lessons".to_string()));
}

#[tokio::test]
async fn fully_covered_cell_reports_ready() {
    let pool = setup_pool().await;
    seed_ready_cell(&pool, "Mathematics", "3").await;

    let service = reporter(&pool);
    let coverage = service.get_content_coverage(false).await;
    let cell = coverage
        .iter()
        .find(|cell| cell.grade == "3" && cell.subject == "Mathematics")
        .unwrap();

    assert_eq!(cell.status, CoverageStatus::Ready, "{:?}", cell.details);
    assert!(cell.details.is_empty());
    assert!(service.is_grade_subject_ready("3", "Mathematics", false).await);
}

#[tokio::test]
async fn snapshot_is_cached_until_ttl_or_forced_refresh() {
    let pool = setup_pool().await;
    let clock = Arc::new(ManualClock::new());
    let service = reporter_with_clock(&pool, clock.clone());

    // Prime the cache on an empty store
    let first = service.get_content_coverage(false).await;
    assert!(first.iter().all(|c| c.status == CoverageStatus::Empty));

    seed_ready_cell(&pool, "Science", "5").await;

    // Within the TTL the stale snapshot is served
    let cached = service.get_content_coverage(false).await;
    let cell = cached
        .iter()
        .find(|c| c.grade == "5" && c.subject == "Science")
        .unwrap();
    assert_eq!(cell.status, CoverageStatus::Empty);

    // Forced refresh bypasses the cache
    let refreshed = service.get_content_coverage(true).await;
    let cell = refreshed
        .iter()
        .find(|c| c.grade == "5" && c.subject == "Science")
        .unwrap();
    assert_eq!(cell.status, CoverageStatus::Ready);

    // And the TTL lapse alone also triggers a recompute
    seed_ready_cell(&pool, "Mathematics", "5").await;
    clock.advance(Duration::from_secs(5 * 60 + 1));
    let after_ttl = service.get_content_coverage(false).await;
    let cell = after_ttl
        .iter()
        .find(|c| c.grade == "5" && c.subject == "Mathematics")
        .unwrap();
    assert_eq!(cell.status, CoverageStatus::Ready);
}

#[tokio::test]
async fn failed_recompute_degrades_to_last_good_snapshot() {
    let pool = setup_pool().await;
    let service = reporter(&pool);
    seed_ready_cell(&pool, "Mathematics", "4").await;

    let first = service.get_content_coverage(false).await;
    assert!(!first.is_empty());

    sqlx::query("DROP TABLE lessons").execute(&pool).await.unwrap();

    // Forced refresh fails underneath and serves the previous snapshot
    let degraded = service.get_content_coverage(true).await;
    assert_eq!(degraded.len(), first.len());
    let cell = degraded
        .iter()
        .find(|c| c.grade == "4" && c.subject == "Mathematics")
        .unwrap();
    assert_eq!(cell.status, CoverageStatus::Ready);
}

#[tokio::test]
async fn failed_recompute_with_no_snapshot_returns_empty() {
    let pool = setup_pool().await;
    sqlx::query("DROP TABLE lessons").execute(&pool).await.unwrap();

    let coverage = reporter(&pool).get_content_coverage(false).await;
    assert!(coverage.is_empty());
}

#[tokio::test]
async fn readiness_gate_requires_scope_and_tier() {
    let pool = setup_pool().await;
    let service = reporter(&pool);
    // Beta-level cell: 3 modules, 10 lessons, 2 questions per lesson
    for n in 0..3 {
        let slug = format!("m-beta-{n}");
        let id = insert_module(&pool, &slug, "Mathematics", "6", None).await;
        insert_lessons(&pool, id, 4).await;
        insert_items(&pool, &slug, 8).await;
    }

    assert!(!service.is_grade_subject_ready("6", "Mathematics", false).await);
    assert!(service.is_grade_subject_ready("6", "Mathematics", true).await);
    // Out-of-scope pairs are never ready, whatever their counts
    assert!(!service.is_grade_subject_ready("11", "Social Studies", true).await);
}

#[tokio::test]
async fn summary_counts_statuses_and_ranks_worst_gaps_first() {
    let pool = setup_pool().await;
    let service = reporter(&pool);
    seed_ready_cell(&pool, "Mathematics", "6").await;

    let summary = service.get_coverage_summary().await;
    let total = launch_cells().len();
    assert_eq!(summary.total_cells, total);
    assert_eq!(summary.ready_count, 1);
    assert_eq!(summary.empty_count, total - 1);
    assert!((summary.ready_percent - 100.0 / total as f64).abs() < 0.01);

    // Worst first: empty cells lead, ordered by grade then subject
    assert_eq!(summary.top_gaps.len(), 5);
    assert_eq!(summary.top_gaps[0].grade, "K");
    assert_eq!(summary.top_gaps[0].subject, "English Language Arts");
    assert_eq!(summary.top_gaps[0].status, CoverageStatus::Empty);
    assert_eq!(summary.top_gaps[0].detail, "No modules");
}

#[tokio::test]
async fn module_filter_keeps_only_ready_cells_and_preserves_order() {
    let pool = setup_pool().await;
    let service = reporter(&pool);
    let ready_ids = seed_ready_cell(&pool, "Mathematics", "3").await;
    let thin_id = insert_module(&pool, "m-thin", "Science", "7", None).await;
    insert_lessons(&pool, thin_id, 1).await;

    let candidates = vec![thin_id, ready_ids[0], 9999, ready_ids[1]];
    let filtered = service
        .filter_modules_by_readiness(&candidates, false, DegradeMode::PassThrough)
        .await;
    assert_eq!(filtered, vec![ready_ids[0], ready_ids[1]]);
}

#[tokio::test]
async fn module_filter_degrades_per_requested_mode() {
    let pool = setup_pool().await;
    let service = reporter(&pool);
    sqlx::query("DROP TABLE modules").execute(&pool).await.unwrap();

    let candidates = vec![1, 2, 3];
    let passed = service
        .filter_modules_by_readiness(&candidates, true, DegradeMode::PassThrough)
        .await;
    assert_eq!(passed, candidates);

    let dropped = service
        .filter_modules_by_readiness(&candidates, true, DegradeMode::Empty)
        .await;
    assert!(dropped.is_empty());
}
