//! Dataset loader for uploaded contract files.
//!
//! The whole file is read into memory. Every cell keeps its original text so
//! the export reproduces the upload; the fill policy rewrites missing cells
//! to `0` across the entire table and non-finite numbers in the numeric
//! columns.

use crate::error::DatasetError;
use crate::types::contract::ContractRecord;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Vendor name column
pub const VENDOR_NAME: &str = "nama_vendor";
/// Procurement type column
pub const PROCUREMENT_TYPE: &str = "jenis_pengadaan";
/// Contract value column
pub const CONTRACT_VALUE: &str = "nilai_kontrak";
/// Contract duration column
pub const CONTRACT_DURATION: &str = "durasi_kontrak";
/// Renewal delay column
pub const RENEWAL_DELAY: &str = "delay_perpanjangan_kontrak";

/// Columns every upload must carry
pub const REQUIRED_COLUMNS: [&str; 5] = [
    VENDOR_NAME,
    PROCUREMENT_TYPE,
    CONTRACT_VALUE,
    CONTRACT_DURATION,
    RENEWAL_DELAY,
];

/// Tokens read as a missing value
const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-nan", "-NaN", "null", "NULL", "None", "#N/A", "<NA>",
];

/// Uploaded table, cells kept as text
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table from headers and rows. Rows are padded with empty
    /// (missing) cells or cut to the header width; readers reject long rows
    /// before they get here.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Read a delimited file with a header row
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        info!(path = %path.display(), "Reading contract dataset");
        let reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        Self::from_csv(reader)
    }

    /// Read delimited text from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        Self::from_csv(reader)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, DatasetError> {
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(DatasetError::MissingHeader);
        }

        let mut rows = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            // Short rows are padded with missing cells, long ones are malformed
            if record.len() > headers.len() {
                return Err(DatasetError::RaggedRow {
                    row,
                    expected: headers.len(),
                    found: record.len(),
                });
            }
            rows.push(record.iter().map(str::to_string).collect());
        }

        let table = Self::new(headers, rows);
        info!(
            rows = table.len(),
            columns = table.headers.len(),
            "Dataset loaded"
        );
        Ok(table)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Fail unless every required column is present
    pub fn ensure_required_columns(&self) -> Result<(), DatasetError> {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| self.column_index(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DatasetError::MissingColumns(missing))
        }
    }

    /// Replace every missing cell in the table with `0`, text columns
    /// included. Non-finite numbers are zeroed only in the numeric columns.
    /// Returns the number of cells rewritten.
    pub fn fill_missing(&mut self) -> usize {
        let numeric: Vec<usize> = [CONTRACT_VALUE, CONTRACT_DURATION, RENEWAL_DELAY]
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect();

        let mut filled = 0;
        for row in &mut self.rows {
            for (col, cell) in row.iter_mut().enumerate() {
                if is_missing(cell) || (numeric.contains(&col) && is_non_finite(cell)) {
                    *cell = "0".to_string();
                    filled += 1;
                }
            }
        }
        debug!(cells = filled, "Filled missing values");
        filled
    }

    /// Typed records for the required columns
    pub fn records(&self) -> Result<Vec<ContractRecord>, DatasetError> {
        self.ensure_required_columns()?;
        let idx = |name: &str| self.column_index(name).unwrap_or_default();
        let (vendor, procurement) = (idx(VENDOR_NAME), idx(PROCUREMENT_TYPE));
        let (value, duration, delay) = (
            idx(CONTRACT_VALUE),
            idx(CONTRACT_DURATION),
            idx(RENEWAL_DELAY),
        );

        self.rows
            .iter()
            .enumerate()
            .map(|(row_no, row)| -> Result<ContractRecord, DatasetError> {
                let number = |col: usize, name: &str| parse_number(row_no, name, &row[col]);
                Ok(ContractRecord::new(
                    row[vendor].clone(),
                    row[procurement].clone(),
                    number(value, CONTRACT_VALUE)?,
                    number(duration, CONTRACT_DURATION)?,
                    number(delay, RENEWAL_DELAY)?,
                ))
            })
            .collect()
    }
}

fn is_missing(cell: &str) -> bool {
    MISSING_TOKENS.contains(&cell.trim())
}

fn is_non_finite(cell: &str) -> bool {
    cell.trim()
        .parse::<f64>()
        .map(|v| !v.is_finite())
        .unwrap_or(false)
}

/// Parse a numeric cell. Missing or non-finite values count as 0, matching
/// the fill policy.
fn parse_number(row: usize, column: &str, cell: &str) -> Result<f64, DatasetError> {
    let trimmed = cell.trim();
    if is_missing(trimmed) {
        return Ok(0.0);
    }
    trimmed
        .parse::<f64>()
        .map(crate::features::finite_or_zero)
        .map_err(|_| DatasetError::NotNumeric {
            row,
            column: column.to_string(),
            value: cell.to_string(),
        })
}
