//! Content Gap-Fill Batch Job
//!
//! Brings every below-baseline module up to the minimum practice-item,
//! baseline-assessment, and enrichment-resource bar. Safe to re-run: every
//! create is preceded by an existence check keyed on the module's identity.
//!
//! **Usage:**
//! ```bash
//! klas-gapfill [--grade-band 6 --grade-band 7] [--database <FILE>] [--practice-target <N>]
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::error;

use klas_cr::services::{GapFiller, GapFillerConfig};

/// Content gap-fill batch job
#[derive(Parser, Debug)]
#[command(name = "klas-gapfill")]
#[command(about = "Backfill practice items, baseline assessments, and enrichment assets")]
#[command(version)]
struct Args {
    /// Only process modules in these grade bands (repeatable; default all)
    #[arg(long = "grade-band", value_name = "BAND")]
    grade_band: Vec<String>,

    /// Path to the content database
    #[arg(short, long, env = "KLAS_DATABASE")]
    database: Option<String>,

    /// Practice items required per module, unless the module overrides it
    #[arg(long, value_name = "N")]
    practice_target: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let db_path = klas_common::config::resolve_database_path(args.database.as_deref())?;
    let pool = klas_common::db::init_database(&db_path).await?;

    let mut config = GapFillerConfig::default();
    if let Some(target) = args.practice_target {
        config.default_practice_target = target;
    }

    let filler = GapFiller::new(pool).with_config(config);
    let report = filler.run(&args.grade_band).await;

    // Summary line prints regardless of partial failure
    println!(
        "Processed {} modules ({} skipped, {} items, {} assessments created, {} updated, {} assets)",
        report.modules_processed,
        report.modules_skipped,
        report.items_created,
        report.assessments_created,
        report.assessments_updated,
        report.assets_created,
    );

    if let Some(fatal) = report.fatal {
        error!("Gap-fill run aborted: {fatal}");
        std::process::exit(1);
    }

    Ok(())
}
