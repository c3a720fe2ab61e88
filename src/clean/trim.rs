use std::sync::Arc;

use anyhow::Result;
use arrow::array::{Array, ArrayRef, StringArray};
use arrow::record_batch::RecordBatch;

/// Strip surrounding whitespace from every non-null value of every string
/// column. Null cells stay null; a trimmed value may become the empty
/// string, but a null never does. Non-string columns pass through untouched.
pub fn trim_string_columns(batch: &RecordBatch) -> Result<RecordBatch> {
    let mut columns = Vec::with_capacity(batch.num_columns());
    for column in batch.columns() {
        if let Some(strings) = column.as_any().downcast_ref::<StringArray>() {
            let trimmed: StringArray = strings.iter().map(|opt| opt.map(str::trim)).collect();
            columns.push(Arc::new(trimmed) as ArrayRef);
        } else {
            columns.push(column.clone());
        }
    }
    RecordBatch::try_new(batch.schema(), columns).map_err(Into::into)
}
