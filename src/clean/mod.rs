use anyhow::Result;
use arrow::record_batch::RecordBatch;

pub mod dedup;
pub mod names;
pub mod trim;

pub use names::canonical_name;

/// Table-agnostic cleaning applied to every dataset before any per-table
/// transform: canonical column names, trimmed string cells, exact-duplicate
/// rows removed. Trimming runs before deduplication, so rows that differ
/// only in surrounding whitespace collapse and a second pass is a no-op.
pub fn normalize(batch: &RecordBatch) -> Result<RecordBatch> {
    let batch = names::canonicalize_columns(batch)?;
    let batch = trim::trim_string_columns(&batch)?;
    dedup::dedup_rows(&batch)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Array, ArrayRef, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;

    use super::*;

    fn batch(columns: Vec<(&str, ArrayRef)>) -> RecordBatch {
        let fields: Vec<Field> = columns
            .iter()
            .map(|(name, col)| Field::new(*name, col.data_type().clone(), true))
            .collect();
        let arrays = columns.into_iter().map(|(_, col)| col).collect();
        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap()
    }

    #[test]
    fn normalize_renames_trims_and_dedups() {
        let input = batch(vec![
            (
                "Order ID",
                Arc::new(StringArray::from(vec![" a ", "a", "b"])) as ArrayRef,
            ),
            (
                " Order-Status ",
                Arc::new(StringArray::from(vec!["x", "x", "y"])) as ArrayRef,
            ),
        ]);

        let out = normalize(&input).unwrap();
        let schema = out.schema();
        let names: Vec<&str> = schema
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect();
        assert_eq!(names, vec!["order_id", "order_status"]);

        // " a"/"a" collapse once trimmed; first occurrence survives.
        assert_eq!(out.num_rows(), 2);
        let ids = out
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(ids.value(0), "a");
        assert_eq!(ids.value(1), "b");
    }

    #[test]
    fn normalize_is_idempotent() {
        let input = batch(vec![
            (
                "Order ID",
                Arc::new(StringArray::from(vec![
                    Some(" a "),
                    Some("a"),
                    Some("b"),
                    None,
                ])) as ArrayRef,
            ),
            (
                "Qty",
                Arc::new(Int64Array::from(vec![Some(1), Some(1), Some(2), None])) as ArrayRef,
            ),
        ]);

        let once = normalize(&input).unwrap();
        let twice = normalize(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn normalize_accepts_empty_batch() {
        let schema = Arc::new(Schema::new(vec![Field::new(
            "Order ID",
            DataType::Utf8,
            true,
        )]));
        let input = RecordBatch::new_empty(schema);

        let out = normalize(&input).unwrap();
        assert_eq!(out.num_rows(), 0);
        assert_eq!(out.schema().field(0).name(), "order_id");
    }
}
