//! Alert filter: contracts with High risk or High priority

use crate::types::alert::ContractAlert;
use crate::types::contract::ContractRecord;
use tracing::info;

/// Select the contracts that need attention, in table order. Records are
/// not modified.
pub fn filter(records: &[ContractRecord]) -> Vec<ContractAlert> {
    let alerts: Vec<ContractAlert> = records
        .iter()
        .enumerate()
        .filter_map(|(row, record)| ContractAlert::evaluate(row, record))
        .collect();

    info!(
        contracts = records.len(),
        alerts = alerts.len(),
        "Alert filter applied"
    );
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::alert::RiskLevel;
    use crate::types::contract::Priority;

    fn record(value: f64, priority: Priority) -> ContractRecord {
        let mut record = ContractRecord::new("PT Alpha", "Tender", value, 10.0, 1.0);
        record.priority = priority;
        record
    }

    #[test]
    fn test_alert_set_matches_predicate_exactly() {
        let records = vec![
            record(11e9, Priority::Label("Low".into())),
            record(1e9, Priority::Label("High".into())),
            record(6e9, Priority::Label("Medium".into())),
            record(1e9, Priority::Code(0)),
            record(12e9, Priority::Label("Tinggi".into())),
            record(1e9, Priority::Unclassified),
        ];

        let alerts = filter(&records);
        let rows: Vec<usize> = alerts.iter().map(|a| a.row).collect();
        assert_eq!(rows, vec![0, 1, 4]);

        for (row, record) in records.iter().enumerate() {
            let expected = record.risk_level == RiskLevel::High || record.priority.is_high();
            assert_eq!(rows.contains(&row), expected, "row {}", row);
        }
    }

    #[test]
    fn test_sentinel_priority_degrades_to_risk_only() {
        let records = vec![
            record(11e9, Priority::Unclassified),
            record(6e9, Priority::Unclassified),
            record(1e9, Priority::Unclassified),
        ];

        let alerts = filter(&records);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].row, 0);
        assert!(alerts.iter().all(|a| !a.priority.is_high()));
    }

    #[test]
    fn test_empty_table() {
        assert!(filter(&[]).is_empty());
    }
}
