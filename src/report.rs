//! Text rendering of a pipeline run

use crate::features::FeatureMatrix;
use crate::models::duration::ADVISORY_NOTE;
use crate::pipeline::{PipelineRun, StageStatus};
use crate::types::contract::ContractRecord;
use std::fmt;
use std::path::Path;

const SPARK: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const RULE: &str = "──────────────────────────────────────────────────────────────────────────────";

/// Renders a finished run as plain text
pub struct Report<'a> {
    run: &'a PipelineRun,
    input: Option<&'a Path>,
    preview_rows: usize,
}

impl<'a> Report<'a> {
    pub fn new(run: &'a PipelineRun) -> Self {
        Self {
            run,
            input: None,
            preview_rows: 5,
        }
    }

    pub fn with_input(mut self, input: &'a Path) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    fn header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CONTRACT MONITORING")?;
        writeln!(f, "{}", RULE)?;
        writeln!(f, "Run:     {}", self.run.run_id)?;
        writeln!(f, "Started: {}", self.run.started_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        if let Some(input) = self.input {
            writeln!(f, "Input:   {}", input.display())?;
        }
        writeln!(f)?;
        for report in &self.run.reports {
            let tag = match report.status {
                StageStatus::Success => "[ok]  ",
                StageStatus::Warning => "[warn]",
                StageStatus::Error => "[err] ",
            };
            writeln!(f, "{} {:<24} {}", tag, report.stage.label(), report.message)?;
        }
        Ok(())
    }

    fn preview(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = &self.run.table;
        let shown = self.preview_rows.min(table.len());
        section(
            f,
            &format!("Data preview (first {} of {} rows)", shown, table.len()),
        )?;
        writeln!(f, "{}", table.headers().join(" | "))?;
        for row in table.rows().iter().take(self.preview_rows) {
            writeln!(f, "{}", row.join(" | "))?;
        }
        Ok(())
    }

    fn priority_input(&self, f: &mut fmt::Formatter<'_>, input: &FeatureMatrix) -> fmt::Result {
        section(f, "Priority model input")?;
        for column in input.columns() {
            write!(f, "{:>22}", clip(column, 21))?;
        }
        writeln!(f)?;
        for row in 0..input.rows().min(self.preview_rows) {
            for value in input.row(row) {
                write!(f, "{:>22}", format!("{:.4}", value))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }

    fn monitoring(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        section(f, "Monitoring table")?;
        writeln!(
            f,
            "{:>4}  {:<24} {:<16} {:>18} {:>9} {:>7}  {:<7} {}",
            "#", "Vendor", "Procurement", "Value", "Duration", "Delay", "Risk", "Priority"
        )?;
        for (row, record) in self.run.records.iter().enumerate() {
            record_line(f, row, record)?;
        }
        Ok(())
    }

    fn alerts(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alerts = &self.run.alerts;
        section(f, &format!("Alerts ({})", alerts.len()))?;
        if alerts.is_empty() {
            return writeln!(f, "No contracts with high risk or high priority.");
        }
        for alert in alerts {
            writeln!(
                f,
                "{:>4}  {:<24} {:<16} {:<7} {:<18} {}",
                alert.row,
                clip(&alert.vendor_name, 24),
                clip(&alert.procurement_type, 16),
                alert.risk_level,
                clip(&alert.priority.to_string(), 18),
                alert.reasons_label()
            )?;
        }
        Ok(())
    }

    fn duration(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        section(f, "Duration prediction (experimental)")?;
        let mut actual = Vec::with_capacity(self.run.records.len());
        let mut predicted = Vec::with_capacity(self.run.records.len());
        writeln!(f, "{:>4}  {:>12} {:>12}", "#", "Actual", "Predicted")?;
        for (row, record) in self.run.records.iter().enumerate() {
            let prediction = record.predicted_duration.unwrap_or(0.0);
            writeln!(f, "{:>4}  {:>12.1} {:>12.1}", row, record.contract_duration, prediction)?;
            actual.push(record.contract_duration);
            predicted.push(prediction);
        }
        writeln!(f)?;
        let (lo, hi) = bounds(actual.iter().chain(predicted.iter()).copied());
        writeln!(f, "Actual     {}", sparkline(&actual, lo, hi))?;
        writeln!(f, "Predicted  {}", sparkline(&predicted, lo, hi))?;
        writeln!(f)?;
        writeln!(f, "Note: {}", ADVISORY_NOTE)
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.header(f)?;
        self.preview(f)?;
        if let Some(input) = &self.run.priority_input {
            self.priority_input(f, input)?;
        }
        self.monitoring(f)?;
        self.alerts(f)?;
        if self.run.duration_ran {
            self.duration(f)?;
        }
        Ok(())
    }
}

fn section(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{}", title)?;
    writeln!(f, "{}", RULE)
}

fn record_line(f: &mut fmt::Formatter<'_>, row: usize, record: &ContractRecord) -> fmt::Result {
    writeln!(
        f,
        "{:>4}  {:<24} {:<16} {:>18.0} {:>9.0} {:>7.0}  {:<7} {}",
        row,
        clip(&record.vendor_name, 24),
        clip(&record.procurement_type, 16),
        record.contract_value,
        record.contract_duration,
        record.renewal_delay,
        record.risk_level,
        record.priority
    )
}

/// Truncate to `width` characters
fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut clipped: String = text.chars().take(width.saturating_sub(1)).collect();
        clipped.push('…');
        clipped
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
        .unwrap_or((0.0, 0.0))
}

/// One block character per value, scaled to `[lo, hi]`
pub fn sparkline(values: &[f64], lo: f64, hi: f64) -> String {
    let span = hi - lo;
    values
        .iter()
        .map(|&v| {
            if !v.is_finite() || span <= 0.0 {
                return SPARK[0];
            }
            let scaled = ((v - lo) / span * (SPARK.len() - 1) as f64).round();
            SPARK[(scaled.max(0.0) as usize).min(SPARK.len() - 1)]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::dataset::RawTable;
    use crate::models::loader::ModelBundle;
    use crate::pipeline::Pipeline;

    fn run() -> PipelineRun {
        let table = RawTable::from_reader(
            "\
nama_vendor,jenis_pengadaan,nilai_kontrak,durasi_kontrak,delay_perpanjangan_kontrak
PT Alpha,Tender,11000000000,10,1
PT Beta,Langsung,1000000000,10,1
"
            .as_bytes(),
        )
        .unwrap();
        Pipeline::new(&ModelBundle::empty(), &AppConfig::default(), false)
            .run(table)
            .unwrap()
    }

    #[test]
    fn test_render_without_models() {
        let run = run();
        let text = Report::new(&run)
            .with_input(Path::new("contracts.csv"))
            .to_string();

        assert!(text.contains(&run.run_id.to_string()));
        assert!(text.contains("Input:   contracts.csv"));
        assert!(text.contains("[err]  priority"));
        assert!(text.contains("Alerts (1)"));
        assert!(text.contains("model not loaded"));
        assert!(!text.contains("Priority model input"));
        assert!(!text.contains(ADVISORY_NOTE));
    }

    #[test]
    fn test_duration_panel_when_ran() {
        let mut run = run();
        run.records[0].predicted_duration = Some(12.0);
        run.records[1].predicted_duration = Some(8.0);
        run.duration_ran = true;

        let text = Report::new(&run).to_string();
        assert!(text.contains("Duration prediction (experimental)"));
        assert!(text.contains(ADVISORY_NOTE));
    }

    #[test]
    fn test_preview_row_limit() {
        let run = run();
        let text = Report::new(&run).with_preview_rows(1).to_string();
        assert!(text.contains("Data preview (first 1 of 2 rows)"));
        assert!(text.contains("PT Alpha | Tender"));
        assert!(!text.contains("PT Beta | Langsung"));
    }

    #[test]
    fn test_sparkline_scaling() {
        assert_eq!(sparkline(&[0.0, 7.0, 3.5], 0.0, 7.0), "▁█▅");
        assert_eq!(sparkline(&[5.0, 5.0], 5.0, 5.0), "▁▁");
        assert_eq!(bounds([3.0, f64::NAN, -1.0].into_iter()), (-1.0, 3.0));
    }

    #[test]
    fn test_clip() {
        assert_eq!(clip("PT Alpha", 24), "PT Alpha");
        assert_eq!(clip("Koperasi Jaya", 5), "Kope…");
    }
}
