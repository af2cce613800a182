use registrar::{
    config::{database, seed},
    core::{dashboard, enrollment},
    errors::Result,
};
use dotenvy::dotenv;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also come from the environment
    dotenv().ok();

    // 3. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db)
        .await
        .inspect_err(|e| error!("Failed to create tables: {e}"))?;

    // 4. Seed accounts and courses when a seed file is present
    let seed_path = seed::default_seed_path();
    if Path::new(&seed_path).exists() {
        let config = seed::load_config(&seed_path)?;
        let summary = seed::seed_database(&db, &config)
            .await
            .inspect_err(|e| error!("Failed to seed database from {seed_path}: {e}"))?;
        info!(
            "Seeded {} accounts ({} already present) and {} courses ({} already present)",
            summary.accounts_created,
            summary.accounts_skipped,
            summary.courses_created,
            summary.courses_skipped
        );
    } else {
        warn!("Seed file {seed_path} not found; starting with the existing data only");
    }

    // 5. Report ledger health
    let stats = dashboard::admin_stats(&db).await?;
    info!(
        "Registrar ready: {} students, {} faculty, {} courses, {} enrollments",
        stats.students, stats.faculty, stats.courses, stats.enrollments
    );
    let drifts = enrollment::audit_enrolled_counts(&db).await?;
    if !drifts.is_empty() {
        warn!("{} course counters disagree with their enrollments", drifts.len());
    }

    Ok(())
}
