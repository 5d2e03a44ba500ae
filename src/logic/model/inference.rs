//! Inference Engine - Watering Classifier Backends
//!
//! Load và chạy ONNX model khi có artifact; fallback là logistic model
//! bootstrap từ synthetic data. Prediction trong microseconds, không cần
//! Python runtime.

use chrono::{DateTime, Utc};
use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::logic::sensors::FEATURE_COUNT;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Seed for the bootstrap training set, fixed so every boot learns the
/// same fallback weights
const BOOTSTRAP_SEED: u64 = 42;

/// Soil moisture below this labels a bootstrap sample "needs water"
const BOOTSTRAP_DRY_THRESHOLD: f32 = 400.0;

/// Bootstrap gradient-descent epochs and learning rate
const BOOTSTRAP_EPOCHS: usize = 400;
const BOOTSTRAP_LEARNING_RATE: f32 = 0.1;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug)]
pub struct ModelError(pub String);

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ModelError: {}", self.0)
    }
}

impl std::error::Error for ModelError {}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_path: String,
    pub model_type: String, // "onnx" hoặc "logreg"
    pub features: usize,
    pub sha256: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

/// Logistic regression over z-scored features
///
/// The bootstrap fallback when no ONNX artifact is available. Trained once
/// at startup on deterministic synthetic data, mirroring how the device is
/// seeded before it has real history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: [f32; FEATURE_COUNT],
    pub bias: f32,
    pub means: [f32; FEATURE_COUNT],
    pub stds: [f32; FEATURE_COUNT],
}

impl LogisticModel {
    /// Positive-class ("needs water") probability for one feature vector
    pub fn probability(&self, features: &[f32; FEATURE_COUNT]) -> f32 {
        let mut z = self.bias;
        for i in 0..FEATURE_COUNT {
            let x = (features[i] - self.means[i]) / self.stds[i];
            z += self.weights[i] * x;
        }
        sigmoid(z)
    }

    /// Train on a synthetic 30-day drying curve.
    ///
    /// Soil declines from ~1000 toward ~550 with jitter; samples with soil
    /// below the dry threshold are labeled "needs water". Both classes are
    /// guaranteed present before fitting.
    pub fn bootstrap() -> Self {
        let mut rng = StdRng::seed_from_u64(BOOTSTRAP_SEED);

        let mut samples: Vec<[f32; FEATURE_COUNT]> = Vec::with_capacity(30);
        let mut labels: Vec<f32> = Vec::with_capacity(30);

        for day in 1..=30u32 {
            let soil = 1000.0 - (day as f32) * 15.0 + rng.gen_range(-50.0..50.0);
            let temp = 25.0 + rng.gen_range(-5.0..5.0);
            let humidity = 60.0 + rng.gen_range(-10.0..10.0);
            let light = 500.0 + rng.gen_range(-100.0..100.0);

            samples.push([soil, temp, humidity, light]);
            labels.push(if soil < BOOTSTRAP_DRY_THRESHOLD { 1.0 } else { 0.0 });
        }

        // Guarantee both classes in the training set
        if labels.iter().all(|&y| y == 0.0) {
            for y in labels.iter_mut().take(5) {
                *y = 1.0;
            }
        } else if labels.iter().all(|&y| y == 1.0) {
            for y in labels.iter_mut().take(5) {
                *y = 0.0;
            }
        }

        Self::fit(&samples, &labels)
    }

    /// Batch gradient descent on logistic loss over z-scored inputs
    fn fit(samples: &[[f32; FEATURE_COUNT]], labels: &[f32]) -> Self {
        let n = samples.len().max(1) as f32;

        let mut means = [0.0f32; FEATURE_COUNT];
        for s in samples {
            for i in 0..FEATURE_COUNT {
                means[i] += s[i];
            }
        }
        for m in means.iter_mut() {
            *m /= n;
        }

        let mut stds = [0.0f32; FEATURE_COUNT];
        for s in samples {
            for i in 0..FEATURE_COUNT {
                stds[i] += (s[i] - means[i]).powi(2);
            }
        }
        for s in stds.iter_mut() {
            *s = (*s / n).sqrt().max(1e-8);
        }

        let scaled: Vec<[f32; FEATURE_COUNT]> = samples
            .iter()
            .map(|s| {
                let mut x = [0.0f32; FEATURE_COUNT];
                for i in 0..FEATURE_COUNT {
                    x[i] = (s[i] - means[i]) / stds[i];
                }
                x
            })
            .collect();

        let mut weights = [0.0f32; FEATURE_COUNT];
        let mut bias = 0.0f32;

        for _ in 0..BOOTSTRAP_EPOCHS {
            let mut grad_w = [0.0f32; FEATURE_COUNT];
            let mut grad_b = 0.0f32;

            for (x, &y) in scaled.iter().zip(labels.iter()) {
                let mut z = bias;
                for i in 0..FEATURE_COUNT {
                    z += weights[i] * x[i];
                }
                let err = sigmoid(z) - y;
                for i in 0..FEATURE_COUNT {
                    grad_w[i] += err * x[i];
                }
                grad_b += err;
            }

            for i in 0..FEATURE_COUNT {
                weights[i] -= BOOTSTRAP_LEARNING_RATE * grad_w[i] / n;
            }
            bias -= BOOTSTRAP_LEARNING_RATE * grad_b / n;
        }

        Self {
            weights,
            bias,
            means,
            stds,
        }
    }
}

fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

// ============================================================================
// CHECKSUM
// ============================================================================

/// SHA-256 of a model artifact, hex-encoded
pub fn file_sha256(path: &str) -> Result<String, ModelError> {
    let bytes = std::fs::read(path)
        .map_err(|e| ModelError(format!("Failed to read artifact {}: {}", path, e)))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

// ============================================================================
// WATERING CLASSIFIER
// ============================================================================

/// Classifier facade: ONNX session if an artifact is loaded, bootstrap
/// logistic model otherwise. Owned by the predictor - no global session.
#[derive(Debug)]
pub struct WateringClassifier {
    session: Option<Mutex<Session>>,
    bootstrap: LogisticModel,
    metadata: ModelMetadata,
}

impl WateringClassifier {
    /// Classifier with only the bootstrap fallback
    pub fn bootstrap_only() -> Self {
        Self {
            session: None,
            bootstrap: LogisticModel::bootstrap(),
            metadata: ModelMetadata {
                model_path: "<bootstrap>".to_string(),
                model_type: "logreg".to_string(),
                features: FEATURE_COUNT,
                sha256: None,
                loaded_at: Utc::now(),
            },
        }
    }

    /// Load an ONNX artifact, verifying its checksum first when one is
    /// pinned. The bootstrap model is still trained as the fallback path.
    pub fn load_onnx(model_path: &str, expected_sha256: Option<&str>) -> Result<Self, ModelError> {
        log::info!("Loading ONNX model from: {}", model_path);

        if !std::path::Path::new(model_path).exists() {
            return Err(ModelError(format!("Model not found: {}", model_path)));
        }

        let digest = file_sha256(model_path)?;
        if let Some(expected) = expected_sha256 {
            if !digest.eq_ignore_ascii_case(expected) {
                return Err(ModelError(format!(
                    "Checksum mismatch for {}: expected {}, got {}",
                    model_path, expected, digest
                )));
            }
        }

        let session = Session::builder()
            .map_err(|e| ModelError(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ModelError(format!("Failed to set optimization: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| ModelError(format!("Failed to load model: {}", e)))?;

        log::info!("ONNX model loaded successfully");

        Ok(Self {
            session: Some(Mutex::new(session)),
            bootstrap: LogisticModel::bootstrap(),
            metadata: ModelMetadata {
                model_path: model_path.to_string(),
                model_type: "onnx".to_string(),
                features: FEATURE_COUNT,
                sha256: Some(digest),
                loaded_at: Utc::now(),
            },
        })
    }

    pub fn is_onnx_loaded(&self) -> bool {
        self.session.is_some()
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Positive-class probability: ONNX if loaded, bootstrap otherwise.
    /// Returns which backend answered alongside the probability.
    pub fn probability(
        &self,
        features: &[f32; FEATURE_COUNT],
    ) -> Result<(f32, &'static str), ModelError> {
        if self.session.is_some() {
            match self.probability_onnx(features) {
                Ok(p) => return Ok((p, "onnx")),
                Err(e) => {
                    log::debug!("ONNX inference failed ({}), using bootstrap model", e);
                }
            }
        }
        Ok((self.bootstrap.probability(features), "bootstrap"))
    }

    /// Run the ONNX session on a single [1, FEATURE_COUNT] input
    fn probability_onnx(&self, features: &[f32; FEATURE_COUNT]) -> Result<f32, ModelError> {
        let session_mutex = self
            .session
            .as_ref()
            .ok_or_else(|| ModelError("Model not loaded".to_string()))?;
        let mut session = session_mutex.lock();

        let input_array = Array2::<f32>::from_shape_vec((1, FEATURE_COUNT), features.to_vec())
            .map_err(|e| ModelError(format!("Array error: {}", e)))?;

        let output_name = session
            .outputs()
            .first()
            .map(|o| o.name().to_string())
            .ok_or_else(|| ModelError("No output defined".to_string()))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| ModelError(format!("Tensor error: {}", e)))?;

        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| ModelError(format!("Inference failed: {}", e)))?;

        let output = outputs
            .get(&output_name)
            .ok_or_else(|| ModelError("No output".to_string()))?;

        let output_tensor = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError(format!("Extract error: {}", e)))?;

        let data = output_tensor.1;

        // Single sigmoid output, or [p_no, p_yes] softmax pair
        let probability = match data.len() {
            0 => return Err(ModelError("Empty model output".to_string())),
            1 => data[0],
            _ => data[1],
        };

        Ok(probability.clamp(0.0, 1.0))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_bootstrap_is_deterministic() {
        let a = LogisticModel::bootstrap();
        let b = LogisticModel::bootstrap();
        assert_eq!(a.weights, b.weights);
        assert_eq!(a.bias, b.bias);
    }

    #[test]
    fn test_bootstrap_orders_dry_above_wet() {
        let model = LogisticModel::bootstrap();
        let dry = model.probability(&[100.0, 25.0, 60.0, 550.0]);
        let wet = model.probability(&[900.0, 25.0, 60.0, 550.0]);
        assert!(dry > wet, "dry {} should exceed wet {}", dry, wet);
        assert!((0.0..=1.0).contains(&dry));
        assert!((0.0..=1.0).contains(&wet));
    }

    #[test]
    fn test_classifier_falls_back_without_artifact() {
        let classifier = WateringClassifier::bootstrap_only();
        assert!(!classifier.is_onnx_loaded());
        let (p, method) = classifier.probability(&[300.0, 25.0, 60.0, 550.0]).unwrap();
        assert_eq!(method, "bootstrap");
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn test_missing_artifact_is_an_error() {
        let err = WateringClassifier::load_onnx("/no/such/model.onnx", None).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_checksum_mismatch_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a real model").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let err = WateringClassifier::load_onnx(&path, Some("deadbeef")).unwrap_err();
        assert!(err.to_string().contains("Checksum mismatch"));
    }

    #[test]
    fn test_file_sha256_stable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"leafguard").unwrap();
        let path = file.path().to_string_lossy().to_string();

        assert_eq!(file_sha256(&path).unwrap(), file_sha256(&path).unwrap());
    }
}
