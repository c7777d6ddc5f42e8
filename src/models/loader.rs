//! Artifact loading: ONNX models, encoders and the feature-order descriptor.
//!
//! Everything is loaded once at pipeline start into a [`ModelBundle`]. A
//! missing or broken artifact does not fail the load; its slot keeps the
//! error and the stage that needs it reports it.

use crate::config::AppConfig;
use crate::error::ArtifactError;
use crate::features::FeatureLayout;
use crate::models::encoder::{EncoderSet, LabelEncoder};
use crate::models::predictor::{OnnxPredictor, OutputKind, Predictor};
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// Loaded ONNX model with metadata
pub struct LoadedModel {
    /// Model name
    pub name: String,
    /// ONNX Runtime session
    pub session: Session,
    /// Input name for the model
    pub input_name: String,
    /// Output carrying the prediction
    pub output_name: String,
}

/// Loader for ONNX models
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load a single ONNX model from file
    pub fn load_model<P: AsRef<Path>>(
        &self,
        path: P,
        name: &str,
        kind: OutputKind,
    ) -> Result<LoadedModel> {
        let path = path.as_ref();

        info!(
            model = %name,
            path = %path.display(),
            threads = self.onnx_threads,
            "Loading ONNX model"
        );

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_names: Vec<&str> = session.outputs.iter().map(|o| o.name.as_str()).collect();
        let output_name = select_output(&output_names, kind)
            .with_context(|| format!("Model {} declares no outputs", name))?
            .to_string();

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            name: name.to_string(),
            session,
            input_name,
            output_name,
        })
    }
}

/// Pick the prediction output: the label output for classifiers, the first
/// non-probability output for regressors.
fn select_output<'a>(names: &[&'a str], kind: OutputKind) -> Option<&'a str> {
    let preferred = match kind {
        OutputKind::Label => names.iter().find(|n| n.contains("label")),
        OutputKind::Value => names.iter().find(|n| !n.contains("prob")),
    };
    preferred.or_else(|| names.first()).copied()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureOrderArtifact {
    Wrapped { features: Vec<String> },
    Bare(Vec<String>),
}

/// Load the feature-order descriptor paired with the duration regressor
pub fn load_feature_layout<P: AsRef<Path>>(path: P) -> Result<FeatureLayout, ArtifactError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ArtifactError::NotFound(path.to_path_buf()));
    }
    let invalid = |message: String| ArtifactError::Invalid {
        path: path.to_path_buf(),
        message,
    };

    let raw = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    let names = match serde_json::from_str::<FeatureOrderArtifact>(&raw)
        .map_err(|e| invalid(e.to_string()))?
    {
        FeatureOrderArtifact::Wrapped { features } | FeatureOrderArtifact::Bare(features) => {
            features
        }
    };
    let layout = FeatureLayout::new(&names).map_err(|e| invalid(e.to_string()))?;

    info!(path = %path.display(), features = ?layout.names(), "Feature order loaded");
    Ok(layout)
}

/// Duration regressor input order: the descriptor shipped with the model
/// when present, the configured order otherwise
fn duration_layout(config: &AppConfig) -> Result<FeatureLayout, ArtifactError> {
    let descriptor = config.artifacts.path_of(&config.artifacts.duration_features);
    if descriptor.exists() {
        return load_feature_layout(descriptor);
    }

    let layout = FeatureLayout::new(config.duration.features.as_slice()).map_err(|e| {
        ArtifactError::Invalid {
            path: descriptor.clone(),
            message: format!("no descriptor and duration.features is unusable: {}", e),
        }
    })?;
    info!(features = ?layout.names(), "Using configured duration feature order");
    Ok(layout)
}

/// Every artifact a run depends on, injected into the pipeline
pub struct ModelBundle {
    pub encoders: EncoderSet,
    pub priority_model: Result<Box<dyn Predictor>, ArtifactError>,
    pub duration_model: Result<Box<dyn Predictor>, ArtifactError>,
    pub duration_layout: Result<FeatureLayout, ArtifactError>,
}

impl ModelBundle {
    /// Bundle with nothing loaded
    pub fn empty() -> Self {
        Self {
            encoders: EncoderSet::unavailable(),
            priority_model: Err(ArtifactError::Unavailable("priority classifier".into())),
            duration_model: Err(ArtifactError::Unavailable("duration regressor".into())),
            duration_layout: Err(ArtifactError::Unavailable("duration feature order".into())),
        }
    }

    /// Load all artifacts named in the configuration. The duration
    /// artifacts are only touched when `with_duration` is set.
    pub fn load(config: &AppConfig, with_duration: bool) -> Self {
        let artifacts = &config.artifacts;
        let encoder = |file: &str, column: &str| {
            let result = LabelEncoder::load(artifacts.path_of(file), column);
            if let Err(e) = &result {
                warn!(column = %column, error = %e, "Encoder unavailable");
            }
            result
        };

        let encoders = EncoderSet {
            vendor: encoder(&artifacts.vendor_encoder, crate::dataset::VENDOR_NAME),
            procurement_type: encoder(
                &artifacts.procurement_encoder,
                crate::dataset::PROCUREMENT_TYPE,
            ),
            risk_level: encoder(&artifacts.risk_encoder, "risk_level"),
            priority: encoder(&artifacts.priority_encoder, "priority"),
        };

        let priority_path = artifacts.path_of(&artifacts.priority_model);
        let duration_path = artifacts.path_of(&artifacts.duration_model);

        // Only bring up the runtime when there is a model file to load
        let wants_runtime = priority_path.exists() || (with_duration && duration_path.exists());
        let loader = if wants_runtime {
            ModelLoader::with_threads(artifacts.onnx_threads).map_err(|e| format!("{:#}", e))
        } else {
            Err("no model files present".to_string())
        };

        let load_onnx = |path: &Path,
                         name: &str,
                         kind: OutputKind|
         -> Result<Box<dyn Predictor>, ArtifactError> {
            if !path.exists() {
                return Err(ArtifactError::NotFound(path.to_path_buf()));
            }
            let loader = loader.as_ref().map_err(|message| ArtifactError::Invalid {
                path: path.to_path_buf(),
                message: message.clone(),
            })?;
            let model = loader
                .load_model(path, name, kind)
                .map_err(|e| ArtifactError::Invalid {
                    path: path.to_path_buf(),
                    message: format!("{:#}", e),
                })?;
            Ok(Box::new(OnnxPredictor::new(model)))
        };

        let priority_model = load_onnx(&priority_path, "priority", OutputKind::Label);
        if let Err(e) = &priority_model {
            warn!(error = %e, "Priority classifier unavailable");
        }

        let (duration_model, duration_layout) = if with_duration {
            let model = load_onnx(&duration_path, "duration", OutputKind::Value);
            let layout = duration_layout(config);
            if let Err(e) = &model {
                warn!(error = %e, "Duration regressor unavailable");
            }
            if let Err(e) = &layout {
                warn!(error = %e, "Duration feature order unavailable");
            }
            (model, layout)
        } else {
            let disabled = |what: &str| {
                ArtifactError::Unavailable(format!("{} (experimental panel disabled)", what))
            };
            (
                Err(disabled("duration regressor")),
                Err(disabled("duration feature order")),
            )
        };

        Self {
            encoders,
            priority_model,
            duration_model,
            duration_layout,
        }
    }
}
