//! Model Module
//!
//! Watering-need classification.
//! - `inference`: classifier backends (ONNX session + bootstrap logistic)
//! - `predictor`: verdict assembly on top of the classifier

pub mod inference;
pub mod predictor;

pub use inference::{ModelError, ModelMetadata, WateringClassifier};
pub use predictor::{verdict_from_probability, WateringPredictor};
