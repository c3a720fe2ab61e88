use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use arrow::array::ArrayRef;
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use tracing::warn;

/// Canonical identifier form of a column header: lower-cased, surrounding
/// whitespace stripped, internal whitespace and hyphens become underscores.
pub fn canonical_name(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() || c == '-' { '_' } else { c })
        .collect()
}

/// Rename every column to its canonical form. Two source names collapsing
/// into one canonical name resolve last-write-wins: the later column keeps
/// the slot of the earlier one.
pub fn canonicalize_columns(batch: &RecordBatch) -> Result<RecordBatch> {
    let mut fields: Vec<Field> = Vec::with_capacity(batch.num_columns());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(batch.num_columns());
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(batch.num_columns());

    for (i, field) in batch.schema().fields().iter().enumerate() {
        let name = canonical_name(field.name());
        let renamed = Field::new(&name, field.data_type().clone(), field.is_nullable());
        let column = batch.column(i).clone();
        match slots.get(&name) {
            Some(&slot) => {
                warn!(
                    column = %name,
                    dropped = %field.name(),
                    "canonical name collision, keeping the later column"
                );
                fields[slot] = renamed;
                columns[slot] = column;
            }
            None => {
                slots.insert(name, fields.len());
                fields.push(renamed);
                columns.push(column);
            }
        }
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).map_err(Into::into)
}
