//! Table output for ledger snapshots.

use chrono::{DateTime, SecondsFormat};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use txledger_core::Transaction;

use super::LedgerInfo;

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.to_vec());
    table
}

/// One row per customer: shape, size, marker and totals.
pub fn summary_table(infos: &[LedgerInfo]) -> String {
    let mut table = new_table(&[
        "Customer", "Shape", "Size", "Next id", "Count", "Sum", "Average",
    ]);
    for info in infos {
        table.add_row(vec![
            info.customer.clone(),
            info.shape
                .map(|shape| shape.to_string())
                .unwrap_or_else(|| "-".to_string()),
            info.size.to_string(),
            info.next_id.to_string(),
            info.aggregate.count.to_string(),
            info.aggregate.sum.to_string(),
            info.aggregate
                .average
                .map(|avg| format!("{:.2}", avg))
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    table.to_string()
}

/// The listed entries of one customer, decoded where possible.
pub fn entries_table(info: &LedgerInfo) -> String {
    let mut table = new_table(&["Id", "Time", "Amount", "Label"]);
    for (id, value) in &info.entries {
        let row = match Transaction::decode(value) {
            Ok(txn) => vec![
                id.to_string(),
                format_timestamp(txn.timestamp),
                txn.amount.to_string(),
                if txn.is_marker() {
                    "(marker)".to_string()
                } else {
                    txn.label.unwrap_or_default()
                },
            ],
            Err(_) => vec![id.to_string(), "-".to_string(), value.to_string(), String::new()],
        };
        table.add_row(row);
    }
    table.to_string()
}

fn format_timestamp(epoch: f64) -> String {
    DateTime::from_timestamp_millis((epoch * 1_000.0) as i64)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| epoch.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use txledger_core::{Aggregate, Value, ValueShape};

    fn info(entries: Vec<(i64, Value)>) -> LedgerInfo {
        LedgerInfo {
            customer: "alice".to_string(),
            shape: Some(ValueShape::Map),
            size: entries.len(),
            next_id: 4,
            aggregate: Aggregate {
                count: 3,
                sum: 60,
                average: Some(20.0),
                markers: 0,
                skipped: 0,
            },
            entries,
        }
    }

    #[test]
    fn test_summary_table_lists_totals() {
        let rendered = summary_table(&[info(Vec::new())]);
        assert!(rendered.contains("alice"));
        assert!(rendered.contains("map"));
        assert!(rendered.contains("20.00"));
    }

    #[test]
    fn test_entries_table_marks_markers() {
        let rendered = entries_table(&info(vec![
            (
                3,
                Transaction::new(0.0, 10)
                    .with_label("coffee")
                    .encode(ValueShape::Map),
            ),
            (2, Transaction::marker(60.0).encode(ValueShape::Map)),
        ]));
        assert!(rendered.contains("coffee"));
        assert!(rendered.contains("(marker)"));
        assert!(rendered.contains("1970-01-01T00:01:00Z"));
    }
}
