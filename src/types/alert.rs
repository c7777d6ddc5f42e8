//! Risk levels and contract alert data structures

use crate::types::contract::{ContractRecord, Priority};
use serde::Serialize;
use std::fmt;

/// Risk level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// All levels, highest first
    pub const ALL: [RiskLevel; 3] = [RiskLevel::High, RiskLevel::Medium, RiskLevel::Low];

    /// Display label
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::High => "High",
            RiskLevel::Medium => "Medium",
            RiskLevel::Low => "Low",
        }
    }

    /// Parse a level label. Accepts the English labels and the Indonesian
    /// ones the training data used, case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" | "tinggi" => Some(RiskLevel::High),
            "medium" | "sedang" => Some(RiskLevel::Medium),
            "low" | "rendah" => Some(RiskLevel::Low),
            _ => None,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Why a contract ended up in the alert set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertReason {
    HighRisk,
    HighPriority,
}

impl AlertReason {
    pub fn label(self) -> &'static str {
        match self {
            AlertReason::HighRisk => "high risk",
            AlertReason::HighPriority => "high priority",
        }
    }
}

/// Alert raised for a high-risk or high-priority contract
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractAlert {
    /// Position of the contract in the uploaded table
    pub row: usize,

    pub vendor_name: String,

    pub procurement_type: String,

    pub risk_level: RiskLevel,

    pub priority: Priority,

    /// Conditions that triggered the alert (never empty)
    pub reasons: Vec<AlertReason>,
}

impl ContractAlert {
    /// Build an alert for a record, or `None` when nothing triggers.
    pub fn evaluate(row: usize, record: &ContractRecord) -> Option<Self> {
        let mut reasons = Vec::new();
        if record.risk_level == RiskLevel::High {
            reasons.push(AlertReason::HighRisk);
        }
        if record.priority.is_high() {
            reasons.push(AlertReason::HighPriority);
        }
        if reasons.is_empty() {
            return None;
        }

        Some(Self {
            row,
            vendor_name: record.vendor_name.clone(),
            procurement_type: record.procurement_type.clone(),
            risk_level: record.risk_level,
            priority: record.priority.clone(),
            reasons,
        })
    }

    /// Comma-separated reasons for display
    pub fn reasons_label(&self) -> String {
        self.reasons
            .iter()
            .map(|r| r.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
