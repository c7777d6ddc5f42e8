//! Rule-based contract risk classification.
//!
//! Fixed thresholds, evaluated in order; the first tier whose clause fires
//! wins. No learned parameters are involved.

use crate::types::alert::RiskLevel;

/// Thresholds for one risk tier. A contract reaches the tier when any of
/// its values is strictly above the matching limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskTier {
    pub contract_value: f64,
    pub contract_duration: f64,
    pub renewal_delay: f64,
}

impl RiskTier {
    fn matches(&self, contract_value: f64, contract_duration: f64, renewal_delay: f64) -> bool {
        contract_value > self.contract_value
            || contract_duration > self.contract_duration
            || renewal_delay > self.renewal_delay
    }
}

/// Lower bound of the High tier
pub const HIGH: RiskTier = RiskTier {
    contract_value: 10e9,
    contract_duration: 300.0,
    renewal_delay: 30.0,
};

/// Lower bound of the Medium tier
pub const MEDIUM: RiskTier = RiskTier {
    contract_value: 5e9,
    contract_duration: 180.0,
    renewal_delay: 15.0,
};

/// Classify one contract. Total over all reals: NaN compares false and
/// falls through to `Low` like any value under the limits.
pub fn classify(contract_value: f64, contract_duration: f64, renewal_delay: f64) -> RiskLevel {
    if HIGH.matches(contract_value, contract_duration, renewal_delay) {
        RiskLevel::High
    } else if MEDIUM.matches(contract_value, contract_duration, renewal_delay) {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_examples() {
        assert_eq!(classify(11e9, 10.0, 1.0), RiskLevel::High);
        assert_eq!(classify(6e9, 10.0, 1.0), RiskLevel::Medium);
        assert_eq!(classify(1e9, 10.0, 1.0), RiskLevel::Low);
    }

    #[test]
    fn test_value_boundaries_are_strict() {
        assert_eq!(classify(10e9, 10.0, 1.0), RiskLevel::Medium);
        assert_eq!(classify(10e9 + 1.0, 10.0, 1.0), RiskLevel::High);
        assert_eq!(classify(5e9, 10.0, 1.0), RiskLevel::Low);
        assert_eq!(classify(5e9 + 1.0, 10.0, 1.0), RiskLevel::Medium);
    }

    #[test]
    fn test_duration_and_delay_clauses() {
        assert_eq!(classify(0.0, 300.0, 0.0), RiskLevel::Medium);
        assert_eq!(classify(0.0, 301.0, 0.0), RiskLevel::High);
        assert_eq!(classify(0.0, 180.0, 0.0), RiskLevel::Low);
        assert_eq!(classify(0.0, 0.0, 30.0), RiskLevel::Medium);
        assert_eq!(classify(0.0, 0.0, 31.0), RiskLevel::High);
        assert_eq!(classify(0.0, 0.0, 16.0), RiskLevel::Medium);
    }

    #[test]
    fn test_first_match_wins() {
        // Medium by value, High by delay
        assert_eq!(classify(6e9, 10.0, 45.0), RiskLevel::High);
    }

    #[test]
    fn test_negative_and_zero_inputs_fall_to_low() {
        assert_eq!(classify(-1e12, -5.0, -100.0), RiskLevel::Low);
        assert_eq!(classify(0.0, 0.0, 0.0), RiskLevel::Low);
        assert_eq!(classify(f64::NAN, f64::NAN, f64::NAN), RiskLevel::Low);
    }

    #[test]
    fn test_deterministic() {
        for _ in 0..3 {
            assert_eq!(classify(7.5e9, 250.0, 20.0), RiskLevel::Medium);
        }
    }
}
