//! Contract Monitoring Library
//!
//! Loads procurement contract datasets, classifies rule-based risk, predicts
//! priority with a pre-trained classifier, raises alerts and exports the
//! monitored table.

pub mod alerts;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod features;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod risk;
pub mod stats;
pub mod types;

pub use config::AppConfig;
pub use dataset::RawTable;
pub use models::loader::ModelBundle;
pub use pipeline::{Pipeline, PipelineRun};
pub use report::Report;
pub use types::{alert::ContractAlert, contract::ContractRecord};
