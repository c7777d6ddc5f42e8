//! Predictor capability and its ONNX Runtime implementation

use crate::features::FeatureMatrix;
use crate::models::loader::LoadedModel;
use anyhow::{Context, Result};
use ort::value::Tensor;
use std::sync::RwLock;
use tracing::debug;

/// Raw output of a predictor, one entry per input row
#[derive(Debug, Clone, PartialEq)]
pub enum PredictorOutput {
    /// Category names
    Labels(Vec<String>),
    /// Integer class codes
    Codes(Vec<i64>),
    /// Real values (regression output, or float-typed class codes)
    Values(Vec<f64>),
}

impl PredictorOutput {
    pub fn len(&self) -> usize {
        match self {
            PredictorOutput::Labels(v) => v.len(),
            PredictorOutput::Codes(v) => v.len(),
            PredictorOutput::Values(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short description for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            PredictorOutput::Labels(_) => "labels",
            PredictorOutput::Codes(_) => "integer codes",
            PredictorOutput::Values(_) => "real values",
        }
    }
}

/// A pre-trained model invoked once per upload on the whole feature matrix
pub trait Predictor {
    /// Name used in logs and reports
    fn name(&self) -> &str;

    fn predict(&self, features: &FeatureMatrix) -> Result<PredictorOutput>;
}

/// Which output of an ONNX graph carries the prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Classifier label output
    Label,
    /// Regressor value output
    Value,
}

/// Predictor backed by an ONNX Runtime session
pub struct OnnxPredictor {
    name: String,
    model: RwLock<LoadedModel>,
}

impl OnnxPredictor {
    pub fn new(model: LoadedModel) -> Self {
        Self {
            name: model.name.clone(),
            model: RwLock::new(model),
        }
    }
}

impl Predictor for OnnxPredictor {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<PredictorOutput> {
        let mut model = self
            .model
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        run_session(&mut model, features)
    }
}

/// Run a session on `[rows, width]` input
fn run_session(model: &mut LoadedModel, features: &FeatureMatrix) -> Result<PredictorOutput> {
    let shape = vec![features.rows() as i64, features.width() as i64];
    let input_tensor = Tensor::from_array((shape, features.data().to_vec()))
        .context("Failed to create input tensor")?;

    let model_name = model.name.clone();
    let output_name = model.output_name.clone();

    let outputs = model
        .session
        .run(ort::inputs![model.input_name.as_str() => input_tensor])?;

    let output = outputs
        .get(output_name.as_str())
        .with_context(|| format!("Model {} has no output '{}'", model_name, output_name))?;

    let prediction = if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
        PredictorOutput::Codes(data.to_vec())
    } else if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
        PredictorOutput::Values(data.iter().map(|&v| v as f64).collect())
    } else if let Ok((_, data)) = output.try_extract_tensor::<f64>() {
        PredictorOutput::Values(data.to_vec())
    } else if let Ok((_, labels)) = output.try_extract_strings() {
        PredictorOutput::Labels(labels)
    } else {
        anyhow::bail!(
            "Output '{}' of model {} has unsupported type {:?}",
            output_name,
            model_name,
            output.dtype()
        );
    };

    debug!(
        model = %model_name,
        output = %output_name,
        kind = prediction.kind(),
        rows = prediction.len(),
        "Inference complete"
    );
    Ok(prediction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_len_and_kind() {
        let labels = PredictorOutput::Labels(vec!["High".into(), "Low".into()]);
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.kind(), "labels");

        let values = PredictorOutput::Values(vec![]);
        assert!(values.is_empty());
        assert_eq!(PredictorOutput::Codes(vec![1]).kind(), "integer codes");
    }
}
