//! Export of the monitored table to a delimited file

use crate::dataset::RawTable;
use crate::features::{DELAY_DURATION_RATIO, VALUE_PER_DAY};
use crate::types::contract::ContractRecord;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Risk level column
pub const RISK_LEVEL: &str = "Risk Level";
/// Priority column
pub const PRIORITY: &str = "Priority";
/// Predicted duration column, present only when the regressor ran
pub const PREDICTED_DURATION: &str = "Predicted_Duration";

/// Column headers of the monitored table: upload columns, then derived ones
pub fn headers(table: &RawTable, records: &[ContractRecord]) -> Vec<String> {
    let mut headers = table.headers().to_vec();
    headers.extend(
        [DELAY_DURATION_RATIO, VALUE_PER_DAY, RISK_LEVEL, PRIORITY]
            .iter()
            .map(|h| h.to_string()),
    );
    if has_predictions(records) {
        headers.push(PREDICTED_DURATION.to_string());
    }
    headers
}

/// Cells of one monitored row
pub fn row(raw: &[String], record: &ContractRecord, with_prediction: bool) -> Vec<String> {
    let mut cells = raw.to_vec();
    cells.push(record.delay_duration_ratio.to_string());
    cells.push(record.value_per_day.to_string());
    cells.push(record.risk_level.to_string());
    cells.push(record.priority.to_string());
    if with_prediction {
        cells.push(
            record
                .predicted_duration
                .map(|v| v.to_string())
                .unwrap_or_default(),
        );
    }
    cells
}

fn has_predictions(records: &[ContractRecord]) -> bool {
    records.iter().any(|r| r.predicted_duration.is_some())
}

/// Writes the whole monitored table, original columns first
#[derive(Debug, Clone)]
pub struct CsvExporter {
    delimiter: u8,
}

impl CsvExporter {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Write to `path`, replacing any existing file
    pub fn write<P: AsRef<Path>>(
        &self,
        path: P,
        table: &RawTable,
        records: &[ContractRecord],
    ) -> Result<usize> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create export file {}", path.display()))?;
        let rows = self
            .to_writer(file, table, records)
            .with_context(|| format!("Failed to write export file {}", path.display()))?;

        info!(path = %path.display(), rows = rows, "Monitoring table exported");
        Ok(rows)
    }

    /// Write to any writer. Returns the number of data rows written.
    pub fn to_writer<W: Write>(
        &self,
        writer: W,
        table: &RawTable,
        records: &[ContractRecord],
    ) -> Result<usize> {
        anyhow::ensure!(
            table.len() == records.len(),
            "table has {} rows but {} records",
            table.len(),
            records.len()
        );

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(writer);

        writer.write_record(headers(table, records))?;
        let with_prediction = has_predictions(records);
        for (raw, record) in table.rows().iter().zip(records) {
            writer.write_record(row(raw, record, with_prediction))?;
        }
        writer.flush()?;

        Ok(records.len())
    }
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new(b',')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::contract::Priority;

    fn table() -> (RawTable, Vec<ContractRecord>) {
        let mut table = RawTable::from_reader(
            "\
nama_vendor,jenis_pengadaan,nilai_kontrak,durasi_kontrak,delay_perpanjangan_kontrak
PT Alpha,Tender,12000000000,400,10
\"PT Beta, Tbk\",Langsung,1000000,0,
"
            .as_bytes(),
        )
        .unwrap();
        table.fill_missing();
        let mut records = table.records().unwrap();
        records[0].priority = Priority::Label("High".into());
        (table, records)
    }

    #[test]
    fn test_export_layout() {
        let (table, records) = table();
        let mut out = Vec::new();
        let rows = CsvExporter::default().to_writer(&mut out, &table, &records).unwrap();
        assert_eq!(rows, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "nama_vendor,jenis_pengadaan,nilai_kontrak,durasi_kontrak,delay_perpanjangan_kontrak,\
             ratio_delay_durasi,nilai_per_hari,Risk Level,Priority"
        );
        assert_eq!(lines[1], "PT Alpha,Tender,12000000000,400,10,0.025,30000000,High,High");
        assert_eq!(
            lines[2],
            "\"PT Beta, Tbk\",Langsung,1000000,0,0,0,0,Low,model not loaded"
        );
    }

    #[test]
    fn test_prediction_column_only_when_present() {
        let (table, mut records) = table();
        assert!(!headers(&table, &records).contains(&PREDICTED_DURATION.to_string()));

        records[1].predicted_duration = Some(120.5);
        let headers = headers(&table, &records);
        assert_eq!(headers.last().map(String::as_str), Some(PREDICTED_DURATION));
        assert_eq!(row(&table.rows()[0], &records[0], true).last().unwrap(), "");
        assert_eq!(row(&table.rows()[1], &records[1], true).last().unwrap(), "120.5");
    }

    #[test]
    fn test_export_twice_is_byte_identical() {
        let (table, records) = table();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitoring.csv");
        let exporter = CsvExporter::new(b';');

        exporter.write(&path, &table, &records).unwrap();
        let first = std::fs::read(&path).unwrap();
        exporter.write(&path, &table, &records).unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
        assert!(String::from_utf8(first).unwrap().starts_with("nama_vendor;"));
    }

    #[test]
    fn test_export_overwrites_existing_file() {
        let (table, records) = table();
        let file = tempfile::NamedTempFile::new().unwrap();
        let old = "old content that is longer than nothing\n".repeat(50);
        std::fs::write(file.path(), old).unwrap();

        CsvExporter::default().write(file.path(), &table, &records).unwrap();
        let text = std::fs::read_to_string(file.path()).unwrap();
        assert!(!text.contains("old content"));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let (table, records) = table();
        let err = CsvExporter::default()
            .write("/nonexistent/dir/out.csv", &table, &records)
            .unwrap_err();
        assert!(err.to_string().contains("Failed to create export file"));
    }
}
