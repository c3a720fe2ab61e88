use std::sync::Arc;

use anyhow::Result;
use olist_etl::{
    config::Config,
    error::EtlError,
    pipeline::{Pipeline, TableOutcome},
    store::s3::S3Store,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) configuration, read once ─────────────────────────────────
    let config = Config::from_env()?;
    info!(bucket = %config.bucket, run_date = %config.run_date, "configuration");

    // ─── 3) run the staging pass ─────────────────────────────────────
    let store = Arc::new(S3Store::new(config.bucket.clone()).await);
    let pipeline = Pipeline::new(store, &config);
    let summary = pipeline.run().await?;

    // ─── 4) report per-table outcomes ────────────────────────────────
    for outcome in &summary.outcomes {
        match outcome {
            TableOutcome::Staged(t) => {
                info!(table = %t.table, key = %t.staging_key, rows = t.rows, "staged");
                if let Some(f) = &t.finding {
                    warn!(table = %f.table, rule = f.rule, count = f.count, "anomaly");
                }
            }
            TableOutcome::Failed { table, error } => {
                error!(table = %table, error = %error, "failed");
            }
        }
    }

    let failed = summary.failed_tables();
    if !failed.is_empty() {
        return Err(EtlError::TablesFailed { tables: failed }.into());
    }
    info!("all tables staged");
    Ok(())
}
