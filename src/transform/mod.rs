use std::collections::HashMap;

use anyhow::Result;
use arrow::record_batch::RecordBatch;
use once_cell::sync::Lazy;

use crate::anomaly::AnomalyRule;

pub mod dates;
pub mod orders;

/// Table-specific cleaning layered on top of generic normalization. Each
/// implementation owns its table's domain rules, including the consistency
/// rule (if any) checked after it runs.
pub trait TableTransform: Sync {
    fn table_name(&self) -> &'static str;

    fn apply(&self, batch: &RecordBatch) -> Result<RecordBatch>;

    fn anomaly_rule(&self) -> Option<&AnomalyRule> {
        None
    }
}

static REGISTRY: Lazy<HashMap<&'static str, &'static dyn TableTransform>> = Lazy::new(|| {
    let transforms: [&'static dyn TableTransform; 1] = [&orders::Orders];
    transforms.into_iter().map(|t| (t.table_name(), t)).collect()
});

/// Exact-match lookup by table name. `None` means the table has no domain
/// transform and passes through unchanged; adding a table touches only the
/// registry above, never the orchestrator.
pub fn transform_for(table_name: &str) -> Option<&'static dyn TableTransform> {
    REGISTRY.get(table_name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_table_resolves() {
        let t = transform_for("olist_orders_dataset").unwrap();
        assert_eq!(t.table_name(), "olist_orders_dataset");
        assert!(t.anomaly_rule().is_some());
    }

    #[test]
    fn unknown_table_resolves_to_identity() {
        assert!(transform_for("olist_customers_dataset").is_none());
        assert!(transform_for("").is_none());
    }
}
