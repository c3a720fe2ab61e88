use std::env;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};

use crate::error::EtlError;

const BUCKET_VAR: &str = "S3_BUCKET_NAME";
const RUN_DATE_VAR: &str = "RUN_DATE";

pub const RUN_DATE_FORMAT: &str = "%Y-%m-%d";

/// Process configuration, read once at startup and passed down. Nothing in
/// the pipeline reads the environment directly.
#[derive(Debug, Clone)]
pub struct Config {
    pub bucket: String,
    /// Logical batch date (`YYYY-MM-DD`) partitioning the raw and staging
    /// areas. Defaults to today (UTC) when `RUN_DATE` is unset.
    pub run_date: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bucket = env::var(BUCKET_VAR).map_err(|_| EtlError::MissingBucket)?;
        let run_date = match env::var(RUN_DATE_VAR) {
            Ok(v) => v,
            Err(_) => Utc::now().date_naive().to_string(),
        };
        NaiveDate::parse_from_str(&run_date, RUN_DATE_FORMAT)
            .with_context(|| format!("{RUN_DATE_VAR} must be YYYY-MM-DD, got {run_date:?}"))?;
        Ok(Self { bucket, run_date })
    }
}
