//! Priority prediction.
//!
//! Runs the classifier once over all contracts and resolves its output to a
//! [`Priority`] per row immediately: labels are kept, codes are decoded
//! through the fitted priority vocabulary.

use crate::error::{FeatureError, StageError};
use crate::features::{FeatureLayout, FeatureMatrix};
use crate::models::encoder::EncoderSet;
use crate::models::predictor::{Predictor, PredictorOutput};
use crate::types::contract::{ContractRecord, Priority};
use tracing::{debug, warn};

/// Result of a successful priority stage
#[derive(Debug, Clone)]
pub struct PriorityOutcome {
    /// Model input, kept for display
    pub input: FeatureMatrix,
    /// One priority per contract
    pub priorities: Vec<Priority>,
    /// Codes with no entry in the priority vocabulary, passed through raw
    pub undecoded: usize,
}

/// Predict priorities for all records
pub fn predict(
    predictor: &dyn Predictor,
    layout: &FeatureLayout,
    records: &[ContractRecord],
    encoders: &EncoderSet,
) -> Result<PriorityOutcome, StageError> {
    let input = layout.assemble(records, encoders)?;
    if records.is_empty() {
        return Ok(PriorityOutcome {
            input,
            priorities: Vec::new(),
            undecoded: 0,
        });
    }
    let output = predictor
        .predict(&input)
        .map_err(|e| StageError::Inference(format!("{}: {:#}", predictor.name(), e)))?;

    if output.len() != records.len() {
        return Err(FeatureError::RowCountMismatch {
            expected: records.len(),
            actual: output.len(),
        }
        .into());
    }

    let (priorities, undecoded) = resolve(output, encoders)?;
    if undecoded > 0 {
        warn!(
            count = undecoded,
            "Priority codes outside the fitted vocabulary, kept as raw codes"
        );
    }
    debug!(rows = priorities.len(), "Priorities resolved");

    Ok(PriorityOutcome {
        input,
        priorities,
        undecoded,
    })
}

/// Turn classifier output into priorities. Returns the number of codes that
/// could not be decoded.
pub fn resolve(
    output: PredictorOutput,
    encoders: &EncoderSet,
) -> Result<(Vec<Priority>, usize), StageError> {
    let codes = match output {
        PredictorOutput::Labels(labels) => {
            return Ok((labels.into_iter().map(Priority::Label).collect(), 0));
        }
        PredictorOutput::Codes(codes) => codes,
        PredictorOutput::Values(values) => integral_codes(&values)?,
    };

    let encoder = match encoders.priority() {
        Ok(encoder) => Some(encoder),
        Err(e) => {
            warn!(error = %e, "Cannot decode priority codes");
            None
        }
    };

    let mut undecoded = 0;
    let priorities = codes
        .into_iter()
        .map(|code| match encoder.map(|enc| enc.decode(code)) {
            Some(Ok(label)) => Priority::Label(label.to_string()),
            _ => {
                undecoded += 1;
                Priority::Code(code)
            }
        })
        .collect();
    Ok((priorities, undecoded))
}

/// Float-typed class codes, as some exporters emit them
fn integral_codes(values: &[f64]) -> Result<Vec<i64>, StageError> {
    values
        .iter()
        .map(|&v| -> Result<i64, StageError> {
            if v.is_finite() && v.fract() == 0.0 {
                Ok(v as i64)
            } else {
                Err(FeatureError::UnexpectedOutput {
                    expected: "priority codes",
                    found: format!("non-integral value {}", v),
                }
                .into())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ArtifactError, EncodeError};
    use crate::models::encoder::LabelEncoder;
    use anyhow::Result;

    struct Fixed(PredictorOutput);

    impl Predictor for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn predict(&self, _features: &FeatureMatrix) -> Result<PredictorOutput> {
            Ok(self.0.clone())
        }
    }

    struct Broken;

    impl Predictor for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn predict(&self, features: &FeatureMatrix) -> Result<PredictorOutput> {
            anyhow::bail!("expected 3 features, got {}", features.width())
        }
    }

    fn encoders() -> EncoderSet {
        let mut set = EncoderSet::unavailable();
        set.vendor =
            Ok(LabelEncoder::from_classes("nama_vendor", vec!["PT Alpha".into()]).unwrap());
        set.procurement_type =
            Ok(LabelEncoder::from_classes("jenis_pengadaan", vec!["Tender".into()]).unwrap());
        set.priority = Ok(LabelEncoder::from_classes(
            "priority",
            vec!["High".into(), "Low".into(), "Medium".into()],
        )
        .unwrap());
        set
    }

    fn records(n: usize) -> Vec<ContractRecord> {
        (0..n)
            .map(|i| ContractRecord::new("PT Alpha", "Tender", 1e9 * i as f64, 100.0, 5.0))
            .collect()
    }

    fn layout() -> FeatureLayout {
        FeatureLayout::new(&crate::config::PriorityConfig::default().features).unwrap()
    }

    #[test]
    fn test_labels_pass_through() {
        let model = Fixed(PredictorOutput::Labels(vec!["Tinggi".into(), "Rendah".into()]));
        let outcome = predict(&model, &layout(), &records(2), &encoders()).unwrap();

        assert_eq!(
            outcome.priorities,
            vec![Priority::Label("Tinggi".into()), Priority::Label("Rendah".into())]
        );
        assert_eq!(outcome.input.width(), 5);
        assert_eq!(outcome.undecoded, 0);
    }

    #[test]
    fn test_codes_are_decoded() {
        let model = Fixed(PredictorOutput::Codes(vec![0, 2, 1]));
        let outcome = predict(&model, &layout(), &records(3), &encoders()).unwrap();

        assert_eq!(
            outcome.priorities,
            vec![
                Priority::Label("High".into()),
                Priority::Label("Medium".into()),
                Priority::Label("Low".into()),
            ]
        );
    }

    #[test]
    fn test_unknown_code_kept_raw() {
        let (priorities, undecoded) =
            resolve(PredictorOutput::Codes(vec![1, 7]), &encoders()).unwrap();
        assert_eq!(priorities, vec![Priority::Label("Low".into()), Priority::Code(7)]);
        assert_eq!(undecoded, 1);
        assert!(!priorities[1].is_high());
    }

    #[test]
    fn test_float_codes() {
        let (priorities, _) =
            resolve(PredictorOutput::Values(vec![0.0, 2.0]), &encoders()).unwrap();
        assert_eq!(priorities[0], Priority::Label("High".into()));

        assert!(matches!(
            resolve(PredictorOutput::Values(vec![0.4]), &encoders()),
            Err(StageError::Feature(FeatureError::UnexpectedOutput { .. }))
        ));
    }

    #[test]
    fn test_codes_without_encoder() {
        let mut set = encoders();
        set.priority = Err(ArtifactError::Unavailable("priority encoder".into()));
        let (priorities, undecoded) = resolve(PredictorOutput::Codes(vec![0]), &set).unwrap();
        assert_eq!(priorities, vec![Priority::Code(0)]);
        assert_eq!(undecoded, 1);
    }

    #[test]
    fn test_inference_failure_is_a_stage_error() {
        let err = predict(&Broken, &layout(), &records(1), &encoders()).unwrap_err();
        assert!(matches!(
            err,
            StageError::Inference(ref msg) if msg.starts_with("broken: expected 3")
        ));
    }

    #[test]
    fn test_row_count_mismatch() {
        let model = Fixed(PredictorOutput::Codes(vec![0]));
        assert!(matches!(
            predict(&model, &layout(), &records(2), &encoders()),
            Err(StageError::Feature(FeatureError::RowCountMismatch { expected: 2, actual: 1 }))
        ));
    }

    #[test]
    fn test_unseen_vendor_fails_stage() {
        let recs = vec![ContractRecord::new("PT Baru", "Tender", 1.0, 1.0, 1.0)];
        let model = Fixed(PredictorOutput::Codes(vec![0]));
        assert!(matches!(
            predict(&model, &layout(), &recs, &encoders()),
            Err(StageError::Encode(EncodeError::UnseenCategory { .. }))
        ));
    }
}
