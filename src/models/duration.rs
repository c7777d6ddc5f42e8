//! Experimental contract duration prediction.
//!
//! The regressor is order-sensitive: its input is assembled in the order
//! given by the feature-order descriptor shipped with it, encoded risk and
//! priority codes included. Predictions are advisory only.

use crate::error::{FeatureError, StageError};
use crate::features::FeatureLayout;
use crate::models::encoder::EncoderSet;
use crate::models::predictor::{Predictor, PredictorOutput};
use crate::types::contract::ContractRecord;
use tracing::debug;

/// Shown with every duration prediction
pub const ADVISORY_NOTE: &str =
    "Predicted durations are for evaluation only and must not drive operational decisions.";

/// Predict a duration for every record
pub fn predict(
    predictor: &dyn Predictor,
    layout: &FeatureLayout,
    records: &[ContractRecord],
    encoders: &EncoderSet,
) -> Result<Vec<f64>, StageError> {
    let input = layout.assemble(records, encoders)?;
    if records.is_empty() {
        return Ok(Vec::new());
    }
    let output = predictor
        .predict(&input)
        .map_err(|e| StageError::Inference(format!("{}: {:#}", predictor.name(), e)))?;

    let values = match output {
        PredictorOutput::Values(values) => values,
        PredictorOutput::Codes(codes) => codes.into_iter().map(|c| c as f64).collect(),
        PredictorOutput::Labels(_) => {
            return Err(FeatureError::UnexpectedOutput {
                expected: "durations",
                found: "labels".to_string(),
            }
            .into())
        }
    };

    // Some regressors emit [rows, 1]; anything else is a shape mismatch
    if values.len() != records.len() {
        return Err(FeatureError::RowCountMismatch {
            expected: records.len(),
            actual: values.len(),
        }
        .into());
    }

    debug!(rows = values.len(), features = ?layout.names(), "Durations predicted");
    Ok(values)
}
