//! JSON output formatting for ledger snapshots.

use super::LedgerInfo;

/// Convert a ledger snapshot to JSON for output.
pub fn info_json(info: &LedgerInfo) -> serde_json::Value {
    let entries: Vec<serde_json::Value> = info
        .entries
        .iter()
        .map(|(id, value)| serde_json::json!({ "id": id, "value": value.to_json() }))
        .collect();
    serde_json::json!({
        "customer": info.customer,
        "shape": info.shape,
        "size": info.size,
        "next_id": info.next_id,
        "aggregate": info.aggregate,
        "entries": entries,
    })
}

/// Convert multiple snapshots to a JSON array for output.
pub fn infos_json(infos: &[LedgerInfo]) -> Vec<serde_json::Value> {
    infos.iter().map(info_json).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use txledger_core::{Aggregate, Transaction, ValueShape};

    #[test]
    fn test_info_json_fields() {
        let info = LedgerInfo {
            customer: "alice".to_string(),
            shape: Some(ValueShape::List),
            size: 1,
            next_id: 8,
            aggregate: Aggregate {
                count: 1,
                sum: 10,
                average: Some(10.0),
                markers: 0,
                skipped: 0,
            },
            entries: vec![(7, Transaction::new(5.0, 10).encode(ValueShape::List))],
        };

        let json = info_json(&info);
        assert_eq!(json["customer"], "alice");
        assert_eq!(json["shape"], "list");
        assert_eq!(json["next_id"], 8);
        assert_eq!(json["aggregate"]["sum"], 10);
        assert_eq!(json["aggregate"]["average"], 10.0);
        assert_eq!(json["entries"][0]["id"], 7);
        assert_eq!(json["entries"][0]["value"][1], 10);
    }
}
