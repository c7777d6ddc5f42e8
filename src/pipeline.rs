//! One linear pass over an uploaded dataset.
//!
//! Dataset problems are fatal. Model stages are isolated: a failing priority
//! stage leaves every priority at the sentinel, a failing duration stage
//! only drops the experimental predictions. Risk, alerts and export always
//! run.

use crate::alerts;
use crate::config::AppConfig;
use crate::dataset::RawTable;
use crate::error::{DatasetError, FeatureError, StageError};
use crate::export::CsvExporter;
use crate::features::{FeatureLayout, FeatureMatrix};
use crate::models::loader::ModelBundle;
use crate::models::{duration, priority};
use crate::stats::{RunStats, Stage};
use crate::types::alert::{ContractAlert, RiskLevel};
use crate::types::contract::{ContractRecord, Priority};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Outcome of a stage as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Success,
    Warning,
    Error,
}

/// Inline status message for one stage
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    pub stage: Stage,
    pub status: StageStatus,
    pub message: String,
}

impl StageReport {
    fn new(stage: Stage, status: StageStatus, message: impl Into<String>) -> Self {
        Self {
            stage,
            status,
            message: message.into(),
        }
    }
}

/// Result of a run over one upload
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Upload after the fill policy
    pub table: RawTable,
    /// One record per table row
    pub records: Vec<ContractRecord>,
    /// Input the priority classifier saw, when it ran
    pub priority_input: Option<FeatureMatrix>,
    /// Whether the experimental duration stage produced predictions
    pub duration_ran: bool,
    pub alerts: Vec<ContractAlert>,
    pub reports: Vec<StageReport>,
    pub stats: RunStats,
}

impl PipelineRun {
    /// Report of a given stage, if it ran
    pub fn report(&self, stage: Stage) -> Option<&StageReport> {
        self.reports.iter().find(|r| r.stage == stage)
    }

    /// Export the monitored table. Only called on explicit request.
    pub fn export<P: AsRef<Path>>(&self, path: P, delimiter: u8) -> Result<usize> {
        CsvExporter::new(delimiter).write(path, &self.table, &self.records)
    }
}

/// Pipeline over a loaded model bundle
pub struct Pipeline<'a> {
    bundle: &'a ModelBundle,
    priority_layout: Result<FeatureLayout, FeatureError>,
    with_duration: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(bundle: &'a ModelBundle, config: &AppConfig, with_duration: bool) -> Self {
        Self {
            bundle,
            priority_layout: FeatureLayout::new(config.priority.features.as_slice()),
            with_duration,
        }
    }

    /// Read an upload from disk and run it
    pub fn run_path<P: AsRef<Path>>(&self, path: P) -> Result<PipelineRun, DatasetError> {
        self.run(RawTable::from_path(path)?)
    }

    /// Run every stage over an uploaded table
    pub fn run(&self, mut table: RawTable) -> Result<PipelineRun, DatasetError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut stats = RunStats::default();
        let mut reports = Vec::new();
        info!(run_id = %run_id, rows = table.len(), "Pipeline run started");

        // Missing columns abort before anything is derived
        let start = Instant::now();
        table.ensure_required_columns()?;
        stats.record_stage(Stage::Dataset, start.elapsed());
        reports.push(StageReport::new(
            Stage::Dataset,
            StageStatus::Success,
            format!("{} contracts loaded", table.len()),
        ));

        let start = Instant::now();
        stats.filled_cells = table.fill_missing();
        let mut records = table.records()?;
        stats.record_stage(Stage::Features, start.elapsed());
        reports.push(StageReport::new(
            Stage::Features,
            StageStatus::Success,
            format!(
                "Derived delay/duration and value/day ratios, {} missing cells set to 0",
                stats.filled_cells
            ),
        ));

        let start = Instant::now();
        stats.record_distribution(&records);
        stats.record_stage(Stage::Risk, start.elapsed());
        reports.push(StageReport::new(
            Stage::Risk,
            StageStatus::Success,
            format!(
                "High: {}, Medium: {}, Low: {}",
                stats.risk_count(RiskLevel::High),
                stats.risk_count(RiskLevel::Medium),
                stats.risk_count(RiskLevel::Low)
            ),
        ));

        let start = Instant::now();
        let (priority_input, report) = self.run_priority(&mut records);
        stats.record_stage(Stage::Priority, start.elapsed());
        reports.push(report);

        let mut duration_ran = false;
        if self.with_duration {
            let start = Instant::now();
            let report = self.run_duration(&mut records);
            duration_ran = report.status == StageStatus::Success;
            stats.record_stage(Stage::Duration, start.elapsed());
            reports.push(report);
        }

        let start = Instant::now();
        let alerts = alerts::filter(&records);
        stats.record_stage(Stage::Alerts, start.elapsed());
        stats.alerts = alerts.len();
        reports.push(StageReport::new(
            Stage::Alerts,
            StageStatus::Success,
            format!("{} contracts with high risk or high priority", alerts.len()),
        ));

        stats.record_distribution(&records);
        info!(
            run_id = %run_id,
            contracts = records.len(),
            alerts = alerts.len(),
            "Pipeline run complete"
        );

        Ok(PipelineRun {
            run_id,
            started_at,
            table,
            records,
            priority_input,
            duration_ran,
            alerts,
            reports,
            stats,
        })
    }

    fn priority_stage(
        &self,
        records: &[ContractRecord],
    ) -> Result<priority::PriorityOutcome, StageError> {
        let model = self.bundle.priority_model.as_ref().map_err(Clone::clone)?;
        let layout = self.priority_layout.as_ref().map_err(Clone::clone)?;
        priority::predict(model.as_ref(), layout, records, &self.bundle.encoders)
    }

    fn run_priority(&self, records: &mut [ContractRecord]) -> (Option<FeatureMatrix>, StageReport) {
        match self.priority_stage(records) {
            Ok(outcome) => {
                for (record, priority) in records.iter_mut().zip(outcome.priorities) {
                    record.priority = priority;
                }
                let report = if outcome.undecoded > 0 {
                    StageReport::new(
                        Stage::Priority,
                        StageStatus::Warning,
                        format!(
                            "Priority model ran; {} codes outside the priority vocabulary \
                             are shown raw",
                            outcome.undecoded
                        ),
                    )
                } else {
                    StageReport::new(
                        Stage::Priority,
                        StageStatus::Success,
                        "Priority model loaded and applied",
                    )
                };
                (Some(outcome.input), report)
            }
            Err(e) => {
                error!(error = %e, "Priority stage failed, priorities set to sentinel");
                for record in records.iter_mut() {
                    record.priority = Priority::Unclassified;
                }
                (
                    None,
                    StageReport::new(
                        Stage::Priority,
                        StageStatus::Error,
                        format!("Failed to load or run the priority model: {}", e),
                    ),
                )
            }
        }
    }

    fn duration_stage(&self, records: &[ContractRecord]) -> Result<Vec<f64>, StageError> {
        let model = self.bundle.duration_model.as_ref().map_err(Clone::clone)?;
        let layout = self.bundle.duration_layout.as_ref().map_err(Clone::clone)?;
        duration::predict(model.as_ref(), layout, records, &self.bundle.encoders)
    }

    fn run_duration(&self, records: &mut [ContractRecord]) -> StageReport {
        match self.duration_stage(records) {
            Ok(predictions) => {
                for (record, value) in records.iter_mut().zip(predictions) {
                    record.predicted_duration = Some(value);
                }
                StageReport::new(Stage::Duration, StageStatus::Success, duration::ADVISORY_NOTE)
            }
            Err(e) => {
                warn!(error = %e, "Duration stage unavailable");
                StageReport::new(
                    Stage::Duration,
                    StageStatus::Warning,
                    format!("Duration model is not available: {}", e),
                )
            }
        }
    }
}
