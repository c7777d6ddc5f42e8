//! Pre-fitted categorical encoders.
//!
//! An encoder artifact is the ordered vocabulary a label encoder was fitted
//! on; the code of a class is its position. Artifacts are JSON, either
//! `{"classes": [...]}` or a bare array.

use crate::error::{ArtifactError, EncodeError};
use crate::types::alert::RiskLevel;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

#[derive(Deserialize)]
#[serde(untagged)]
enum EncoderArtifact {
    Wrapped { classes: Vec<String> },
    Bare(Vec<String>),
}

/// Fitted label encoder with its inverse mapping
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    column: String,
    classes: Vec<String>,
    codes: HashMap<String, i64>,
}

impl LabelEncoder {
    /// Build an encoder from an ordered vocabulary. Duplicates are rejected
    /// since they would make decoding ambiguous.
    pub fn from_classes(column: &str, classes: Vec<String>) -> Result<Self, String> {
        let mut codes = HashMap::with_capacity(classes.len());
        for (code, class) in classes.iter().enumerate() {
            if codes.insert(class.clone(), code as i64).is_some() {
                return Err(format!("duplicate class {:?}", class));
            }
        }
        Ok(Self {
            column: column.to_string(),
            classes,
            codes,
        })
    }

    /// Load an encoder artifact from a JSON file
    pub fn load<P: AsRef<Path>>(path: P, column: &str) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ArtifactError::NotFound(path.to_path_buf()));
        }
        let invalid = |message: String| ArtifactError::Invalid {
            path: path.to_path_buf(),
            message,
        };

        let raw = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let classes = match serde_json::from_str::<EncoderArtifact>(&raw)
            .map_err(|e| invalid(e.to_string()))?
        {
            EncoderArtifact::Wrapped { classes } | EncoderArtifact::Bare(classes) => classes,
        };
        let encoder = Self::from_classes(column, classes).map_err(invalid)?;

        info!(
            column = %column,
            path = %path.display(),
            classes = encoder.len(),
            "Encoder loaded"
        );
        Ok(encoder)
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Ordered vocabulary
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Code of a value; unseen values are a category mismatch
    pub fn encode(&self, value: &str) -> Result<i64, EncodeError> {
        self.codes
            .get(value)
            .copied()
            .ok_or_else(|| EncodeError::UnseenCategory {
                column: self.column.clone(),
                value: value.to_string(),
            })
    }

    /// Value of a code produced by this encoder
    pub fn decode(&self, code: i64) -> Result<&str, EncodeError> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| self.classes.get(idx))
            .map(String::as_str)
            .ok_or_else(|| EncodeError::UnknownCode {
                column: self.column.clone(),
                code,
                size: self.classes.len(),
            })
    }

    /// Code of a risk level. Exact label first, then any class naming the
    /// same level (the vocabulary may carry localized labels).
    pub fn encode_level(&self, level: RiskLevel) -> Result<i64, EncodeError> {
        if let Ok(code) = self.encode(level.label()) {
            return Ok(code);
        }
        self.classes
            .iter()
            .position(|class| RiskLevel::from_label(class) == Some(level))
            .map(|idx| idx as i64)
            .ok_or_else(|| EncodeError::UnseenCategory {
                column: self.column.clone(),
                value: level.label().to_string(),
            })
    }
}

/// The four encoders the models were trained with. Each slot keeps its load
/// error so the stage that needs it can report why it is missing.
#[derive(Debug, Clone)]
pub struct EncoderSet {
    pub vendor: Result<LabelEncoder, ArtifactError>,
    pub procurement_type: Result<LabelEncoder, ArtifactError>,
    pub risk_level: Result<LabelEncoder, ArtifactError>,
    pub priority: Result<LabelEncoder, ArtifactError>,
}

impl EncoderSet {
    /// Set with no encoder available
    pub fn unavailable() -> Self {
        let missing = |name: &str| Err(ArtifactError::Unavailable(format!("{} encoder", name)));
        Self {
            vendor: missing("vendor"),
            procurement_type: missing("procurement type"),
            risk_level: missing("risk level"),
            priority: missing("priority"),
        }
    }

    pub fn vendor(&self) -> Result<&LabelEncoder, ArtifactError> {
        self.vendor.as_ref().map_err(Clone::clone)
    }

    pub fn procurement_type(&self) -> Result<&LabelEncoder, ArtifactError> {
        self.procurement_type.as_ref().map_err(Clone::clone)
    }

    pub fn risk_level(&self) -> Result<&LabelEncoder, ArtifactError> {
        self.risk_level.as_ref().map_err(Clone::clone)
    }

    pub fn priority(&self) -> Result<&LabelEncoder, ArtifactError> {
        self.priority.as_ref().map_err(Clone::clone)
    }
}
