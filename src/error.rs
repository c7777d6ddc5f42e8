//! Error types for the pipeline stages

use std::path::PathBuf;
use thiserror::Error;

/// Malformed upload. Fatal: the run stops before any derived computation.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset has no header row")]
    MissingHeader,

    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("row {row}: expected {expected} fields, saw {found}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row}: column '{column}' is not numeric: {value:?}")]
    NotNumeric {
        row: usize,
        column: String,
        value: String,
    },
}

/// Failure to load a pre-fitted encoder, model or feature-order descriptor.
#[derive(Debug, Clone, Error)]
pub enum ArtifactError {
    #[error("artifact not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to load artifact {}: {message}", .path.display())]
    Invalid { path: PathBuf, message: String },

    #[error("{0} was not loaded")]
    Unavailable(String),
}

/// Categorical encoding failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("category mismatch in '{column}': {value:?} was not seen when the encoder was fitted")]
    UnseenCategory { column: String, value: String },

    #[error("code {code} is outside the fitted vocabulary of '{column}' ({size} classes)")]
    UnknownCode {
        column: String,
        code: i64,
        size: usize,
    },
}

/// Shape or column mismatch while assembling a model input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("unknown feature '{0}'")]
    UnknownFeature(String),

    #[error("feature layout is empty")]
    EmptyLayout,

    #[error("model returned {actual} predictions for {expected} rows")]
    RowCountMismatch { expected: usize, actual: usize },

    #[error("row {row}: priority is unclassified and cannot be encoded")]
    UnclassifiedPriority { row: usize },

    #[error("model output is not usable as {expected}: {found}")]
    UnexpectedOutput {
        expected: &'static str,
        found: String,
    },
}

/// Failure of an optional model stage. The stage degrades, the run goes on.
#[derive(Debug, Clone, Error)]
pub enum StageError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error("inference failed: {0}")]
    Inference(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message() {
        let err =
            DatasetError::MissingColumns(vec!["nilai_kontrak".into(), "durasi_kontrak".into()]);
        assert_eq!(
            err.to_string(),
            "missing required column(s): nilai_kontrak, durasi_kontrak"
        );
    }

    #[test]
    fn test_unseen_category_message() {
        let err = EncodeError::UnseenCategory {
            column: "nama_vendor".into(),
            value: "PT Baru".into(),
        };
        assert!(err.to_string().contains("category mismatch"));
        assert!(err.to_string().contains("PT Baru"));
    }
}
