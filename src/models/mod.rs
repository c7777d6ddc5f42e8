//! Model adapters: label encoders, ONNX predictors and the two model stages

pub mod duration;
pub mod encoder;
pub mod loader;
pub mod predictor;
pub mod priority;

pub use encoder::{EncoderSet, LabelEncoder};
pub use loader::{ModelBundle, ModelLoader};
pub use predictor::{OnnxPredictor, Predictor, PredictorOutput};
