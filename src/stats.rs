//! Statistics collected over one pipeline run.

use crate::types::alert::RiskLevel;
use crate::types::contract::ContractRecord;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::info;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Dataset,
    Features,
    Risk,
    Priority,
    Duration,
    Alerts,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Dataset => "dataset",
            Stage::Features => "features",
            Stage::Risk => "risk",
            Stage::Priority => "priority",
            Stage::Duration => "duration (experimental)",
            Stage::Alerts => "alerts",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Run statistics
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Contracts processed
    pub contracts: usize,
    /// Cells rewritten by the fill policy
    pub filled_cells: usize,
    /// Wall time per stage
    pub stage_times: Vec<(Stage, Duration)>,
    /// Contracts per risk level
    pub risk_counts: BTreeMap<&'static str, usize>,
    /// Contracts per displayed priority
    pub priority_counts: BTreeMap<String, usize>,
    /// Alerts raised
    pub alerts: usize,
}

impl RunStats {
    pub fn record_stage(&mut self, stage: Stage, elapsed: Duration) {
        self.stage_times.push((stage, elapsed));
    }

    /// Count risk and priority levels over the final records
    pub fn record_distribution(&mut self, records: &[ContractRecord]) {
        self.contracts = records.len();
        self.risk_counts.clear();
        self.priority_counts.clear();
        for level in RiskLevel::ALL {
            self.risk_counts.insert(level.label(), 0);
        }
        for record in records {
            *self.risk_counts.entry(record.risk_level.label()).or_insert(0) += 1;
            *self
                .priority_counts
                .entry(record.priority.to_string())
                .or_insert(0) += 1;
        }
    }

    pub fn risk_count(&self, level: RiskLevel) -> usize {
        self.risk_counts.get(level.label()).copied().unwrap_or(0)
    }

    /// Alert share in percent
    pub fn alert_rate(&self) -> f64 {
        if self.contracts > 0 {
            (self.alerts as f64 / self.contracts as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn total_time(&self) -> Duration {
        self.stage_times.iter().map(|(_, d)| *d).sum()
    }

    /// Log a summary of the run
    pub fn log_summary(&self) {
        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║          CONTRACT MONITORING PIPELINE - RUN SUMMARY          ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Contracts Processed: {:>8}  │  Cells Filled: {:>8}       ║",
            self.contracts, self.filled_cells
        );
        info!(
            "║ Alerts Raised:       {:>8}  │  Alert Rate: {:>6.1}%        ║",
            self.alerts,
            self.alert_rate()
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Risk Levels:                                                 ║");
        for level in RiskLevel::ALL {
            let count = self.risk_count(level);
            let pct = if self.contracts > 0 {
                (count as f64 / self.contracts as f64) * 100.0
            } else {
                0.0
            };
            let bar: String = "█".repeat(((pct / 5.0) as usize).min(20));
            info!("║   {:8}: {:>6} ({:>5.1}%) {}", level.label(), count, pct, bar);
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Priorities:                                                  ║");
        for (priority, count) in &self.priority_counts {
            info!("║   {:20}: {:>6}", priority, count);
        }
        info!("╚══════════════════════════════════════════════════════════════╝");

        info!("Stage times (μs):");
        for (stage, elapsed) in &self.stage_times {
            info!("  {}: {}", stage, elapsed.as_micros());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::contract::Priority;

    #[test]
    fn test_distribution() {
        let mut records = vec![
            ContractRecord::new("A", "Tender", 11e9, 10.0, 1.0),
            ContractRecord::new("B", "Tender", 11e9, 10.0, 1.0),
            ContractRecord::new("C", "Tender", 1e9, 10.0, 1.0),
        ];
        records[2].priority = Priority::Label("Low".into());

        let mut stats = RunStats::default();
        stats.record_distribution(&records);
        stats.alerts = 2;

        assert_eq!(stats.risk_count(RiskLevel::High), 2);
        assert_eq!(stats.risk_count(RiskLevel::Medium), 0);
        assert_eq!(stats.risk_count(RiskLevel::Low), 1);
        assert_eq!(stats.priority_counts.get("model not loaded"), Some(&2));
        assert_eq!(stats.priority_counts.get("Low"), Some(&1));
        assert!((stats.alert_rate() - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_stage_times() {
        let mut stats = RunStats::default();
        stats.record_stage(Stage::Dataset, Duration::from_micros(100));
        stats.record_stage(Stage::Risk, Duration::from_micros(50));

        assert_eq!(stats.total_time(), Duration::from_micros(150));
        assert_eq!(stats.alert_rate(), 0.0);
        stats.log_summary();
    }
}
