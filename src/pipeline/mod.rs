use std::io::Cursor;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::compute::concat_batches;
use arrow::csv::{reader::Format, ReaderBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::future::join_all;
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::anomaly::{self, AnomalyFinding};
use crate::clean;
use crate::config::Config;
use crate::error::EtlError;
use crate::store::ObjectStore;
use crate::transform;

const CSV_SUFFIX: &str = ".csv";
const STAGING_EXTENSION: &str = "parquet";
const DEFAULT_CONCURRENCY: usize = 4;

pub fn raw_prefix(run_date: &str) -> String {
    format!("raw/{run_date}")
}

/// Staging destination for one table: a pure function of run date and table
/// name, so re-running a date against unchanged inputs replaces in place.
pub fn staging_key(run_date: &str, table_name: &str) -> String {
    format!("staging/{run_date}/{table_name}.{STAGING_EXTENSION}")
}

/// Table name is the raw filename with its extension stripped.
pub fn table_name_from_key(key: &str) -> String {
    let filename = key.rsplit('/').next().unwrap_or(key);
    filename
        .strip_suffix(CSV_SUFFIX)
        .unwrap_or(filename)
        .to_string()
}

/// One staged table.
#[derive(Debug)]
pub struct StagedTable {
    pub table: String,
    pub staging_key: String,
    pub rows: usize,
    pub finding: Option<AnomalyFinding>,
}

/// Per-table outcome, in sorted raw-key order.
#[derive(Debug)]
pub enum TableOutcome {
    Staged(StagedTable),
    Failed { table: String, error: String },
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<TableOutcome>,
}

impl RunSummary {
    pub fn failed_tables(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                TableOutcome::Failed { table, .. } => Some(table.clone()),
                TableOutcome::Staged(_) => None,
            })
            .collect()
    }

    pub fn findings(&self) -> impl Iterator<Item = &AnomalyFinding> {
        self.outcomes.iter().filter_map(|o| match o {
            TableOutcome::Staged(t) => t.finding.as_ref(),
            TableOutcome::Failed { .. } => None,
        })
    }
}

/// Drives one raw-to-staging pass: discover raw CSV objects for the run
/// date, clean and transform each independently, and land parquet artifacts
/// under the staging prefix.
pub struct Pipeline {
    store: Arc<dyn ObjectStore>,
    run_date: String,
    concurrency: usize,
}

impl Pipeline {
    pub fn new(store: Arc<dyn ObjectStore>, config: &Config) -> Self {
        Self {
            store,
            run_date: config.run_date.clone(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fatal only when configuration or discovery fails. Per-file failures
    /// are isolated: each file runs as its own task, a failure neither
    /// aborts nor cancels the others, and the summary records every outcome
    /// in sorted-key order.
    pub async fn run(&self) -> Result<RunSummary> {
        let prefix = raw_prefix(&self.run_date);
        let mut keys: Vec<String> = self
            .store
            .list(&prefix)
            .await?
            .into_iter()
            .filter(|k| k.ends_with(CSV_SUFFIX))
            .collect();
        if keys.is_empty() {
            return Err(EtlError::NoInputs { prefix }.into());
        }
        keys.sort();
        info!(run_date = %self.run_date, files = keys.len(), "staging run start");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(keys.len());
        for key in keys {
            let store = Arc::clone(&self.store);
            let run_date = self.run_date.clone();
            let semaphore = Arc::clone(&semaphore);
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                let table = table_name_from_key(&key);
                match stage_one(store.as_ref(), &run_date, &key).await {
                    Ok(staged) => TableOutcome::Staged(staged),
                    Err(e) => {
                        let error = format!("{e:#}");
                        error!(table = %table, %error, "staging failed");
                        TableOutcome::Failed { table, error }
                    }
                }
            }));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for joined in join_all(handles).await {
            outcomes.push(joined.context("staging task panicked")?);
        }

        let summary = RunSummary { outcomes };
        let failed = summary.failed_tables();
        info!(
            run_date = %self.run_date,
            staged = summary.outcomes.len() - failed.len(),
            failed = failed.len(),
            anomalies = summary.findings().count(),
            "staging run complete"
        );
        Ok(summary)
    }
}

/// Read one raw object, normalize, apply its table transform (if any),
/// check its anomaly rule, and land the parquet artifact.
async fn stage_one(store: &dyn ObjectStore, run_date: &str, key: &str) -> Result<StagedTable> {
    let table = table_name_from_key(key);
    let dest = staging_key(run_date, &table);
    info!(%key, %dest, "processing");

    let bytes = store.get(key).await?;
    let batch = read_csv(&bytes).with_context(|| format!("parsing {key}"))?;
    let batch = clean::normalize(&batch).with_context(|| format!("normalizing {table}"))?;

    let table_transform = transform::transform_for(&table);
    let batch = match table_transform {
        Some(t) => t
            .apply(&batch)
            .with_context(|| format!("transforming {table}"))?,
        None => batch,
    };

    let finding = table_transform
        .and_then(|t| t.anomaly_rule())
        .and_then(|rule| anomaly::check(&batch, &table, rule));

    let data = write_parquet(&batch).with_context(|| format!("serializing {table}"))?;
    store.put(&dest, data).await?;
    info!(%key, %dest, rows = batch.num_rows(), "staged");

    Ok(StagedTable {
        table,
        staging_key: dest,
        rows: batch.num_rows(),
        finding,
    })
}

/// Parse a whole raw CSV object into a single batch, with column types
/// inferred from the full file. A header-only file yields a zero-row batch.
pub fn read_csv(bytes: &[u8]) -> Result<RecordBatch> {
    let format = Format::default().with_header(true);
    let (schema, _) = format
        .infer_schema(Cursor::new(bytes), None)
        .context("inferring CSV schema")?;

    // A column with no data rows infers as Null; parquet needs a real type.
    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|f| {
            if f.data_type() == &DataType::Null {
                Field::new(f.name(), DataType::Utf8, true)
            } else {
                f.as_ref().clone()
            }
        })
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let reader = ReaderBuilder::new(Arc::clone(&schema))
        .with_format(format)
        .build(Cursor::new(bytes))
        .context("creating CSV reader")?;
    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .context("reading CSV rows")?;
    if batches.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }
    concat_batches(&schema, &batches).map_err(Into::into)
}

/// Serialize one batch to an in-memory parquet file.
pub fn write_parquet(batch: &RecordBatch) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let cursor = Cursor::new(&mut buffer);

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(cursor, batch.schema(), Some(props))
        .context("creating parquet writer")?;
    writer.write(batch).context("writing batch to parquet")?;
    writer.close().context("closing parquet writer")?;

    Ok(buffer)
}
