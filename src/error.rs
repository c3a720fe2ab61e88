use thiserror::Error;

/// Fatal and run-level failures with a stable shape the binaries can match
/// on. Everything else travels as `anyhow::Error` with context attached.
#[derive(Debug, Error)]
pub enum EtlError {
    /// Configuration error; aborts before any I/O.
    #[error("S3_BUCKET_NAME environment variable is not set")]
    MissingBucket,

    /// Discovery error: an empty raw area points at upstream scheduling,
    /// not at data quality.
    #[error("no CSV files found under {prefix}")]
    NoInputs { prefix: String },

    /// One or more tables failed to stage; unrelated tables still ran.
    #[error("{} table(s) failed to stage: {}", tables.len(), tables.join(", "))]
    TablesFailed { tables: Vec<String> },
}
