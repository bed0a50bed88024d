//! klas-cr (Content Readiness) - Coverage reporting service
//!
//! Read-only HTTP service exposing the coverage snapshot, summary, and
//! readiness gates over the shared content database. Backfill runs happen
//! out of band via the klas-gapfill binary; their writes become visible
//! here when the snapshot cache next refreshes.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use klas_cr::{build_router, AppState};

/// Command-line arguments for klas-cr
#[derive(Parser, Debug)]
#[command(name = "klas-cr")]
#[command(about = "Content readiness reporting service for KLAS")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5780", env = "KLAS_CR_PORT")]
    port: u16,

    /// Path to the content database
    #[arg(short, long, env = "KLAS_DATABASE")]
    database: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "klas_cr=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting KLAS Content Readiness (klas-cr)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let db_path = klas_common::config::resolve_database_path(args.database.as_deref())?;
    info!("Database: {}", db_path.display());

    // The reporting service only ever reads the store
    let pool = klas_cr::db::connect_readonly(&db_path)
        .await
        .context("Failed to open content database")?;
    info!("Database connection established (read-only)");

    let state = AppState::new(pool);
    let app = build_router(state).layer(tower_http::trace::TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", args.port)).await?;
    info!("Listening on http://127.0.0.1:{}", args.port);
    info!("Health check: http://127.0.0.1:{}/health", args.port);

    axum::serve(listener, app).await?;

    Ok(())
}
