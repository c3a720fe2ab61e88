use arrow::array::{Array, StringArray};
use arrow::record_batch::RecordBatch;
use tracing::{debug, warn};

/// A table-specific consistency predicate: rows whose status column holds
/// `status_value` while `timestamp_column` is null.
#[derive(Debug, Clone)]
pub struct AnomalyRule {
    pub name: &'static str,
    pub status_column: &'static str,
    pub status_value: &'static str,
    pub timestamp_column: &'static str,
}

/// Count of rows violating one rule for one table. Observational only;
/// a finding never blocks or mutates the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnomalyFinding {
    pub table: String,
    pub rule: &'static str,
    pub count: usize,
}

/// Evaluate `rule` against a transformed batch. Either referenced column
/// being absent, or a zero violation count, yields no finding.
pub fn check(batch: &RecordBatch, table: &str, rule: &AnomalyRule) -> Option<AnomalyFinding> {
    let schema = batch.schema();
    let status_idx = schema.index_of(rule.status_column).ok()?;
    let ts_idx = schema.index_of(rule.timestamp_column).ok()?;

    let Some(status) = batch
        .column(status_idx)
        .as_any()
        .downcast_ref::<StringArray>()
    else {
        debug!(
            table,
            column = rule.status_column,
            "status column is not a string column, skipping rule"
        );
        return None;
    };
    let timestamps = batch.column(ts_idx);

    let count = (0..batch.num_rows())
        .filter(|&row| {
            !status.is_null(row)
                && status.value(row) == rule.status_value
                && timestamps.is_null(row)
        })
        .count();

    if count == 0 {
        return None;
    }
    warn!(table, rule = rule.name, count, "anomaly detected");
    Some(AnomalyFinding {
        table: table.to_string(),
        rule: rule.name,
        count,
    })
}
