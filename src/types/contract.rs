//! Contract record data structures

use crate::features::{self, DerivedFeatures};
use crate::risk;
use crate::types::alert::RiskLevel;
use serde::Serialize;
use std::fmt;

/// Shown in place of a priority when the classifier did not run
pub const PRIORITY_SENTINEL: &str = "model not loaded";

/// Priority produced by the external classifier.
///
/// Resolved once, right after inference. `Unclassified` is not a fourth
/// priority level: it never compares equal to any label.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// The classifier was unavailable or failed
    Unclassified,
    /// Human-readable category
    Label(String),
    /// Raw classifier code with no entry in the fitted vocabulary
    Code(i64),
}

impl Priority {
    /// Whether this priority is the High level
    pub fn is_high(&self) -> bool {
        match self {
            Priority::Label(label) => RiskLevel::from_label(label) == Some(RiskLevel::High),
            Priority::Unclassified | Priority::Code(_) => false,
        }
    }

    pub fn is_classified(&self) -> bool {
        !matches!(self, Priority::Unclassified)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Unclassified => f.write_str(PRIORITY_SENTINEL),
            Priority::Label(label) => f.write_str(label),
            Priority::Code(code) => write!(f, "{}", code),
        }
    }
}

/// One procurement contract with everything derived for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractRecord {
    /// Vendor name (`nama_vendor`)
    pub vendor_name: String,

    /// Procurement type (`jenis_pengadaan`)
    pub procurement_type: String,

    /// Contract value (`nilai_kontrak`)
    pub contract_value: f64,

    /// Contract duration (`durasi_kontrak`)
    pub contract_duration: f64,

    /// Renewal delay (`delay_perpanjangan_kontrak`)
    pub renewal_delay: f64,

    /// `renewal_delay / contract_duration`, 0 when undefined
    pub delay_duration_ratio: f64,

    /// `contract_value / contract_duration`, 0 when undefined
    pub value_per_day: f64,

    /// Rule-based risk, fixed at construction
    pub risk_level: RiskLevel,

    pub priority: Priority,

    /// Experimental regressor output; advisory only
    pub predicted_duration: Option<f64>,
}

impl ContractRecord {
    /// Build a record from its raw columns. Ratios and risk level are
    /// derived here and never recomputed.
    pub fn new(
        vendor_name: impl Into<String>,
        procurement_type: impl Into<String>,
        contract_value: f64,
        contract_duration: f64,
        renewal_delay: f64,
    ) -> Self {
        let DerivedFeatures {
            delay_duration_ratio,
            value_per_day,
        } = features::derive(contract_value, contract_duration, renewal_delay);

        Self {
            vendor_name: vendor_name.into(),
            procurement_type: procurement_type.into(),
            contract_value,
            contract_duration,
            renewal_delay,
            delay_duration_ratio,
            value_per_day,
            risk_level: risk::classify(contract_value, contract_duration, renewal_delay),
            priority: Priority::Unclassified,
            predicted_duration: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_derives_on_construction() {
        let record = ContractRecord::new("PT Alpha", "Tender", 6e9, 200.0, 20.0);

        assert_eq!(record.delay_duration_ratio, 0.1);
        assert_eq!(record.value_per_day, 3e7);
        assert_eq!(record.risk_level, RiskLevel::Medium);
        assert_eq!(record.priority, Priority::Unclassified);
        assert!(record.predicted_duration.is_none());
    }

    #[test]
    fn test_sentinel_is_not_a_level() {
        assert_eq!(Priority::Unclassified.to_string(), PRIORITY_SENTINEL);
        assert!(!Priority::Unclassified.is_high());
        assert!(!Priority::Unclassified.is_classified());
        assert!(!Priority::Label(PRIORITY_SENTINEL.to_string()).is_high());
        assert_ne!(
            Priority::Unclassified,
            Priority::Label(PRIORITY_SENTINEL.to_string())
        );
    }

    #[test]
    fn test_priority_high_detection() {
        assert!(Priority::Label("High".into()).is_high());
        assert!(Priority::Label("Tinggi".into()).is_high());
        assert!(!Priority::Label("Medium".into()).is_high());
        assert!(!Priority::Code(2).is_high());
        assert_eq!(Priority::Code(7).to_string(), "7");
    }
}
