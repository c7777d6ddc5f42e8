//! Feature derivation and model input assembly.
//!
//! Derived ratios are computed per contract with undefined results mapped
//! to 0. Model inputs are assembled in the exact column order a model was
//! trained with; the order is carried by a [`FeatureLayout`].

use crate::error::{FeatureError, StageError};
use crate::models::encoder::EncoderSet;
use crate::types::contract::{ContractRecord, Priority};

/// Column name of the delay/duration ratio
pub const DELAY_DURATION_RATIO: &str = "ratio_delay_durasi";
/// Column name of the value-per-day ratio
pub const VALUE_PER_DAY: &str = "nilai_per_hari";

/// Ratios derived from a contract's raw columns
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedFeatures {
    pub delay_duration_ratio: f64,
    pub value_per_day: f64,
}

/// Derive both ratios. A zero or missing duration gives NaN or an
/// infinity, which becomes 0.
pub fn derive(contract_value: f64, contract_duration: f64, renewal_delay: f64) -> DerivedFeatures {
    DerivedFeatures {
        delay_duration_ratio: finite_or_zero(renewal_delay / contract_duration),
        value_per_day: finite_or_zero(contract_value / contract_duration),
    }
}

/// Replace NaN and infinities with 0
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Where a model input column takes its value from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureSource {
    ContractValue,
    ContractDuration,
    RenewalDelay,
    DelayDurationRatio,
    ValuePerDay,
    VendorCode,
    ProcurementTypeCode,
    RiskLevelCode,
    PriorityCode,
}

impl FeatureSource {
    /// Resolve a training-time feature name
    pub fn from_name(name: &str) -> Result<Self, FeatureError> {
        let source = match name.trim() {
            "nilai_kontrak" | "contract_value" => FeatureSource::ContractValue,
            "durasi_kontrak" | "contract_duration" => FeatureSource::ContractDuration,
            "delay_perpanjangan_kontrak" | "renewal_delay" => FeatureSource::RenewalDelay,
            "ratio_delay_durasi" | "delay_duration_ratio" => FeatureSource::DelayDurationRatio,
            "nilai_per_hari" | "value_per_day" => FeatureSource::ValuePerDay,
            "nama_vendor_encoded" | "vendor_encoded" => FeatureSource::VendorCode,
            "jenis_pengadaan_encoded" | "procurement_type_encoded" => {
                FeatureSource::ProcurementTypeCode
            }
            "risk_level_encoded" => FeatureSource::RiskLevelCode,
            "priority_encoded" => FeatureSource::PriorityCode,
            other => return Err(FeatureError::UnknownFeature(other.to_string())),
        };
        Ok(source)
    }

    fn value(
        self,
        row: usize,
        record: &ContractRecord,
        encoders: &EncoderSet,
    ) -> Result<f64, StageError> {
        let value = match self {
            FeatureSource::ContractValue => record.contract_value,
            FeatureSource::ContractDuration => record.contract_duration,
            FeatureSource::RenewalDelay => record.renewal_delay,
            FeatureSource::DelayDurationRatio => record.delay_duration_ratio,
            FeatureSource::ValuePerDay => record.value_per_day,
            FeatureSource::VendorCode => encoders.vendor()?.encode(&record.vendor_name)? as f64,
            FeatureSource::ProcurementTypeCode => {
                encoders.procurement_type()?.encode(&record.procurement_type)? as f64
            }
            FeatureSource::RiskLevelCode => {
                encoders.risk_level()?.encode_level(record.risk_level)? as f64
            }
            FeatureSource::PriorityCode => match &record.priority {
                Priority::Label(label) => encoders.priority()?.encode(label)? as f64,
                // Raw classifier output is already a code
                Priority::Code(code) => *code as f64,
                Priority::Unclassified => {
                    return Err(FeatureError::UnclassifiedPriority { row }.into())
                }
            },
        };
        Ok(value)
    }
}

/// Ordered model input columns
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureLayout {
    names: Vec<String>,
    sources: Vec<FeatureSource>,
}

impl FeatureLayout {
    pub fn new<S: AsRef<str>>(names: &[S]) -> Result<Self, FeatureError> {
        if names.is_empty() {
            return Err(FeatureError::EmptyLayout);
        }
        let sources = names
            .iter()
            .map(|name| FeatureSource::from_name(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            names: names.iter().map(|n| n.as_ref().trim().to_string()).collect(),
            sources,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn sources(&self) -> &[FeatureSource] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Assemble the model input for all records
    pub fn assemble(
        &self,
        records: &[ContractRecord],
        encoders: &EncoderSet,
    ) -> Result<FeatureMatrix, StageError> {
        let mut data = Vec::with_capacity(records.len() * self.len());
        for (row, record) in records.iter().enumerate() {
            for source in &self.sources {
                data.push(source.value(row, record, encoders)? as f32);
            }
        }

        Ok(FeatureMatrix {
            columns: self.names.clone(),
            rows: records.len(),
            data,
        })
    }
}

/// Row-major `f32` model input
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: usize,
    data: Vec<f32>,
}

impl FeatureMatrix {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of features per row
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn row(&self, idx: usize) -> &[f32] {
        let width = self.width();
        &self.data[idx * width..(idx + 1) * width]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EncodeError;
    use crate::models::encoder::LabelEncoder;
    use crate::types::alert::RiskLevel;

    fn encoders() -> EncoderSet {
        let enc = |column: &str, classes: &[&str]| {
            let classes = classes.iter().map(|c| c.to_string()).collect();
            Ok(LabelEncoder::from_classes(column, classes).unwrap())
        };
        EncoderSet {
            vendor: enc("nama_vendor", &["PT Alpha", "PT Beta"]),
            procurement_type: enc("jenis_pengadaan", &["Langsung", "Tender"]),
            risk_level: enc("risk_level", &["Rendah", "Sedang", "Tinggi"]),
            priority: enc("priority", &["High", "Low", "Medium"]),
        }
    }

    #[test]
    fn test_zero_duration_gives_zero_ratios() {
        let derived = derive(1e9, 0.0, 10.0);
        assert_eq!(derived.delay_duration_ratio, 0.0);
        assert_eq!(derived.value_per_day, 0.0);

        // 0 / 0 is NaN
        let derived = derive(0.0, 0.0, 0.0);
        assert_eq!(derived.delay_duration_ratio, 0.0);
        assert_eq!(derived.value_per_day, 0.0);
    }

    #[test]
    fn test_ratios_always_finite() {
        let cases = [
            (1e9, 100.0, 5.0),
            (1e308, 1e-308, 1.0),
            (-1e9, -0.0, 4.0),
            (f64::NAN, 10.0, f64::INFINITY),
        ];
        for (value, duration, delay) in cases {
            let derived = derive(value, duration, delay);
            assert!(derived.delay_duration_ratio.is_finite());
            assert!(derived.value_per_day.is_finite());
        }
        assert_eq!(derive(1e9, 100.0, 5.0).value_per_day, 1e7);
    }

    #[test]
    fn test_unknown_feature_name() {
        assert_eq!(
            FeatureLayout::new(&["nilai_kontrak", "umur_vendor"]).unwrap_err(),
            FeatureError::UnknownFeature("umur_vendor".into())
        );
        assert_eq!(
            FeatureLayout::new::<&str>(&[]).unwrap_err(),
            FeatureError::EmptyLayout
        );
    }

    #[test]
    fn test_assemble_follows_layout_order() {
        let layout = FeatureLayout::new(&[
            "delay_perpanjangan_kontrak",
            "nilai_kontrak",
            "jenis_pengadaan_encoded",
            "risk_level_encoded",
            "nama_vendor_encoded",
        ])
        .unwrap();
        let records = vec![
            ContractRecord::new("PT Beta", "Tender", 11e9, 10.0, 1.0),
            ContractRecord::new("PT Alpha", "Langsung", 1e6, 10.0, 2.0),
        ];

        let matrix = layout.assemble(&records, &encoders()).unwrap();
        assert_eq!(matrix.rows(), 2);
        assert_eq!(matrix.width(), 5);
        assert_eq!(matrix.row(0), &[1.0, 11e9 as f32, 1.0, 2.0, 1.0]);
        assert_eq!(matrix.row(1), &[2.0, 1e6, 0.0, 0.0, 0.0]);
        assert_eq!(records[0].risk_level, RiskLevel::High);
    }

    #[test]
    fn test_assemble_reports_unseen_vendor() {
        let layout = FeatureLayout::new(&["nama_vendor_encoded"]).unwrap();
        let records = vec![ContractRecord::new("PT Baru", "Tender", 1.0, 1.0, 1.0)];

        let err = layout.assemble(&records, &encoders()).unwrap_err();
        assert!(matches!(
            err,
            StageError::Encode(EncodeError::UnseenCategory { ref value, .. }) if value == "PT Baru"
        ));
    }

    #[test]
    fn test_priority_code_from_label_or_raw_code() {
        let layout = FeatureLayout::new(&["priority_encoded"]).unwrap();
        let mut records = vec![
            ContractRecord::new("PT Alpha", "Tender", 1.0, 1.0, 1.0),
            ContractRecord::new("PT Alpha", "Tender", 1.0, 1.0, 1.0),
        ];
        records[0].priority = Priority::Label("Medium".into());
        records[1].priority = Priority::Code(9);

        let matrix = layout.assemble(&records, &encoders()).unwrap();
        assert_eq!(matrix.data(), &[2.0, 9.0]);

        records[1].priority = Priority::Unclassified;
        assert!(matches!(
            layout.assemble(&records, &encoders()),
            Err(StageError::Feature(FeatureError::UnclassifiedPriority { row: 1 }))
        ));
    }
}
