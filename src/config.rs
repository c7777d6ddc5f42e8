//! Configuration management for the contract monitoring pipeline

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub priority: PriorityConfig,
    #[serde(default)]
    pub duration: DurationConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Locations of the pre-fitted encoder and model artifacts
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// Directory all artifact file names are resolved against
    pub dir: String,
    pub vendor_encoder: String,
    pub procurement_encoder: String,
    pub risk_encoder: String,
    pub priority_encoder: String,
    /// ONNX priority classifier
    pub priority_model: String,
    /// ONNX duration regressor (experimental)
    pub duration_model: String,
    /// Feature-order descriptor paired with the duration regressor
    pub duration_features: String,
    /// Number of threads for ONNX inference per model
    pub onnx_threads: usize,
}

impl ArtifactsConfig {
    /// Resolve an artifact file name against the artifact directory
    pub fn path_of(&self, file_name: &str) -> PathBuf {
        Path::new(&self.dir).join(file_name)
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: "models".to_string(),
            vendor_encoder: "encoder_vendor.json".to_string(),
            procurement_encoder: "encoder_jenis_pengadaan.json".to_string(),
            risk_encoder: "encoder_risk_level.json".to_string(),
            priority_encoder: "encoder_priority.json".to_string(),
            priority_model: "model_priority_rf.onnx".to_string(),
            duration_model: "model_durasi_xgb.onnx".to_string(),
            duration_features: "duration_feature_order.json".to_string(),
            onnx_threads: 1,
        }
    }
}

/// Priority classifier input layout
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PriorityConfig {
    /// Ordered feature names fed to the classifier
    pub features: Vec<String>,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            features: default_priority_features(),
        }
    }
}

fn default_priority_features() -> Vec<String> {
    [
        "nilai_kontrak",
        "durasi_kontrak",
        "delay_perpanjangan_kontrak",
        "nama_vendor_encoded",
        "jenis_pengadaan_encoded",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Experimental duration panel
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DurationConfig {
    pub enabled: bool,
    /// Regressor input order used when no feature-order descriptor ships
    /// with the model. A descriptor file takes precedence.
    pub features: Vec<String>,
}

impl Default for DurationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            features: default_duration_features(),
        }
    }
}

fn default_duration_features() -> Vec<String> {
    [
        "delay_perpanjangan_kontrak",
        "nilai_kontrak",
        "ratio_delay_durasi",
        "nilai_per_hari",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Export configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// File name used when the export is triggered without a path
    pub default_filename: String,
    /// Single-character field delimiter
    pub delimiter: String,
}

impl ExportConfig {
    /// Delimiter as the byte the CSV writer expects
    pub fn delimiter_byte(&self) -> Result<u8> {
        match self.delimiter.as_bytes() {
            [byte] => Ok(*byte),
            _ => anyhow::bail!(
                "export.delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            ),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_filename: "contract_monitoring.csv".to_string(),
            delimiter: ",".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path, falling back to defaults
    /// when the file does not exist
    pub fn load() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_PATH);
        if path.exists() {
            Self::load_from_path(path)
        } else {
            info!(path = %path.display(), "No configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        let config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.export.delimiter_byte()?;
        if self.priority.features.is_empty() {
            anyhow::bail!("priority.features must name at least one feature");
        }
        Ok(())
    }
}
