//! Integration tests for database initialization and graceful reopening

use klas_common::db::init::{init_database, DEFAULT_PRACTICE_TARGET, SEED_SUBJECTS};
use std::path::PathBuf;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let test_db = format!("/tmp/klas-test-db-{}.db", std::process::id());
    let db_path = PathBuf::from(&test_db);

    // Ensure database doesn't exist
    let _ = std::fs::remove_file(&db_path);

    let result = init_database(&db_path).await;
    assert!(
        result.is_ok(),
        "Database initialization failed: {:?}",
        result.err()
    );
    assert!(db_path.exists(), "Database file was not created");

    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn test_database_opens_existing() {
    let test_db = format!("/tmp/klas-test-db-existing-{}.db", std::process::id());
    let db_path = PathBuf::from(&test_db);

    let _ = std::fs::remove_file(&db_path);

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());

    // Open database second time (should succeed without re-seeding)
    let pool2 = init_database(&db_path).await;
    assert!(
        pool2.is_ok(),
        "Failed to open existing database: {:?}",
        pool2.err()
    );

    let subject_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subjects")
        .fetch_one(pool2.as_ref().unwrap())
        .await
        .unwrap();
    assert_eq!(subject_count, SEED_SUBJECTS.len() as i64);

    drop(pool1);
    drop(pool2);
    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn test_gaps_view_respects_module_practice_target() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("klas.db");

    let pool = init_database(&db_path).await.unwrap();

    // Module with an explicit target of 2 and exactly 2 tagged items is not
    // practice-deficient even though 2 < DEFAULT_PRACTICE_TARGET.
    assert!(2 < DEFAULT_PRACTICE_TARGET);
    sqlx::query(
        "INSERT INTO modules (slug, title, subject, grade_band, practice_target) \
         VALUES ('m-frac', 'Fractions', 'Mathematics', '4', 2)",
    )
    .execute(&pool)
    .await
    .unwrap();
    for n in 0..2 {
        sqlx::query("INSERT INTO practice_items (module_slug, stem) VALUES ('m-frac', ?)")
            .bind(format!("Question {n}"))
            .execute(&pool)
            .await
            .unwrap();
    }

    let needs_practice: i64 = sqlx::query_scalar(
        "SELECT needs_practice FROM module_coverage_gaps WHERE slug = 'm-frac'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(needs_practice, 0);
}
