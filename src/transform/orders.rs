use std::sync::Arc;

use anyhow::Result;
use arrow::array::{Array, ArrayRef, StringArray, TimestampMillisecondBuilder};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;

use super::{dates, TableTransform};
use crate::anomaly::AnomalyRule;

/// Timestamp-bearing columns of the orders extract. Any given extract may
/// carry only a subset; absent columns are skipped.
pub const DATE_COLUMNS: &[&str] = &[
    "order_purchase_timestamp",
    "order_approved_at",
    "order_delivered_carrier_date",
    "order_delivered_customer_date",
    "order_estimated_delivery_date",
];

// The rule's target column is taken from the parsed-column set above, so
// the predicate and the parser cannot drift onto different names.
const DELIVERED_DATE: &str = DATE_COLUMNS[3];

static DELIVERED_WITHOUT_DATE: AnomalyRule = AnomalyRule {
    name: "delivered_without_delivery_date",
    status_column: "order_status",
    status_value: "delivered",
    timestamp_column: DELIVERED_DATE,
};

/// Domain transform for the orders table: recognized date columns move from
/// their textual form to `Timestamp(ms)`, null-coalescing anything that does
/// not parse.
pub struct Orders;

impl TableTransform for Orders {
    fn table_name(&self) -> &'static str {
        "olist_orders_dataset"
    }

    fn apply(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        let mut fields = Vec::with_capacity(batch.num_columns());
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(batch.num_columns());

        for (i, field) in batch.schema().fields().iter().enumerate() {
            let column = batch.column(i);
            let is_date_column = DATE_COLUMNS.contains(&field.name().as_str());
            match (is_date_column, column.as_any().downcast_ref::<StringArray>()) {
                (true, Some(strings)) => {
                    let mut builder = TimestampMillisecondBuilder::with_capacity(strings.len());
                    for value in strings.iter() {
                        builder.append_option(value.and_then(dates::parse_timestamp_millis));
                    }
                    fields.push(Field::new(
                        field.name(),
                        DataType::Timestamp(TimeUnit::Millisecond, None),
                        true,
                    ));
                    columns.push(Arc::new(builder.finish()) as ArrayRef);
                }
                // Already temporal (CSV inference got there first), or not
                // a recognized date column.
                _ => {
                    fields.push(field.as_ref().clone());
                    columns.push(column.clone());
                }
            }
        }

        RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).map_err(Into::into)
    }

    fn anomaly_rule(&self) -> Option<&AnomalyRule> {
        Some(&DELIVERED_WITHOUT_DATE)
    }
}
