use std::collections::HashSet;

use anyhow::{Context, Result};
use arrow::array::{Array, UInt32Array};
use arrow::compute::take;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;

/// Remove rows that are identical across every column, null positions
/// included. The first occurrence survives; the order of surviving rows is
/// unchanged.
pub fn dedup_rows(batch: &RecordBatch) -> Result<RecordBatch> {
    if batch.num_rows() == 0 {
        return Ok(batch.clone());
    }

    let mut seen: HashSet<Vec<(bool, String)>> = HashSet::with_capacity(batch.num_rows());
    let mut keep: Vec<u32> = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let mut key = Vec::with_capacity(batch.num_columns());
        for column in batch.columns() {
            let is_null = column.is_null(row);
            let repr = if is_null {
                String::new()
            } else {
                array_value_to_string(column, row).context("formatting cell for row identity")?
            };
            key.push((is_null, repr));
        }
        if seen.insert(key) {
            keep.push(row as u32);
        }
    }

    if keep.len() == batch.num_rows() {
        return Ok(batch.clone());
    }

    let indices = UInt32Array::from(keep);
    let columns = batch
        .columns()
        .iter()
        .map(|c| take(c.as_ref(), &indices, None))
        .collect::<Result<Vec<_>, _>>()
        .context("materializing deduplicated rows")?;
    RecordBatch::try_new(batch.schema(), columns).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};

    use super::*;

    fn two_column_batch(a: Vec<Option<&str>>, b: Vec<Option<&str>>) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("a", DataType::Utf8, true),
            Field::new("b", DataType::Utf8, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(a)),
                Arc::new(StringArray::from(b)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn removes_exact_duplicates_keeping_first() {
        let batch = two_column_batch(
            vec![Some("A"), Some("A"), Some("B")],
            vec![Some("1"), Some("1"), Some("2")],
        );
        let out = dedup_rows(&batch).unwrap();
        assert_eq!(out.num_rows(), 2);
        let a = out
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(a.value(0), "A");
        assert_eq!(a.value(1), "B");
    }

    #[test]
    fn near_duplicates_survive() {
        let batch = two_column_batch(
            vec![Some("A"), Some("A"), Some("B")],
            vec![Some("1"), Some("1x"), Some("2")],
        );
        let out = dedup_rows(&batch).unwrap();
        assert_eq!(out.num_rows(), 3);
    }

    #[test]
    fn null_and_empty_string_are_distinct_rows() {
        let batch = two_column_batch(vec![Some("A"), Some("A")], vec![None, Some("")]);
        let out = dedup_rows(&batch).unwrap();
        assert_eq!(out.num_rows(), 2);
        let b = out
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert!(b.is_null(0));
        assert_eq!(b.value(1), "");
    }

    #[test]
    fn duplicate_rows_with_matching_nulls_collapse() {
        let batch = two_column_batch(vec![Some("A"), Some("A")], vec![None, None]);
        let out = dedup_rows(&batch).unwrap();
        assert_eq!(out.num_rows(), 1);
    }
}
