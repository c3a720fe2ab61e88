use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use olist_etl::{
    config::Config,
    pipeline::raw_prefix,
    store::{s3::S3Store, ObjectStore},
};
use tokio::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Upload local source extracts into the raw area for the run date. The
/// bucket and run date come from the environment, like the staging run.
#[derive(Parser, Debug)]
struct Args {
    /// Directory holding the source CSV files
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
}

/// All `*.csv` files directly under `dir`, sorted by path. Errors when the
/// directory is missing or holds no CSV files at all.
async fn discover_csvs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("data directory not found at {}", dir.display());
    }
    let mut files = Vec::new();
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("reading {}", dir.display()))?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "csv") {
            files.push(path);
        }
    }
    if files.is_empty() {
        bail!("no CSV files found in {}", dir.display());
    }
    files.sort();
    Ok(files)
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let files = discover_csvs(&args.data_dir).await?;

    let prefix = raw_prefix(&config.run_date);
    let store = S3Store::new(config.bucket.clone()).await;

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("source file has no name")?;
        let key = format!("{prefix}/{name}");
        info!(file = %path.display(), %key, "uploading");
        let bytes = fs::read(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        store.put(&key, bytes).await?;
    }

    info!("all files uploaded");
    Ok(())
}
