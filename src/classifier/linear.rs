//! Small linear reference model loaded from JSON.
//!
//! Pools the window over time, applies `W·x + b` and a softmax. Good enough to
//! drive the pipeline end to end without a deep-learning runtime.

use crate::classifier::{Classifier, WindowTensor};
use crate::error::{Result, SignSyncError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How the window is collapsed into one feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pooling {
    /// Elementwise mean over all time steps.
    #[default]
    Mean,
    /// Only the most recent time step.
    Last,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LinearModelFile {
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
    #[serde(default)]
    pooling: Pooling,
}

/// Linear softmax classifier over a pooled window.
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    name: String,
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
    pooling: Pooling,
    features: usize,
}

impl LinearClassifier {
    /// Build from explicit parameters. `weights` is K rows of D values.
    pub fn new(weights: Vec<Vec<f32>>, bias: Vec<f32>, pooling: Pooling) -> Result<Self> {
        if weights.is_empty() {
            return Err(SignSyncError::invalid("classifier.weights", "no classes"));
        }
        if bias.len() != weights.len() {
            return Err(SignSyncError::ShapeMismatch {
                what: "classifier bias".to_string(),
                expected: weights.len(),
                actual: bias.len(),
            });
        }
        let features = weights[0].len();
        if features == 0 {
            return Err(SignSyncError::invalid("classifier.weights", "empty rows"));
        }
        if let Some(row) = weights.iter().find(|row| row.len() != features) {
            return Err(SignSyncError::ShapeMismatch {
                what: "classifier weight row".to_string(),
                expected: features,
                actual: row.len(),
            });
        }

        Ok(Self {
            name: "linear".to_string(),
            weights,
            bias,
            pooling,
            features,
        })
    }

    /// Load a model file: `{"weights": [[..], ..], "bias": [..], "pooling": "mean"}`.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SignSyncError::ClassifierModelNotFound {
                    path: path.display().to_string(),
                }
            } else {
                SignSyncError::ClassifierLoad {
                    path: path.display().to_string(),
                    message: e.to_string(),
                }
            }
        })?;
        let file: LinearModelFile =
            serde_json::from_str(&contents).map_err(|e| SignSyncError::ClassifierLoad {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        let mut model = Self::new(file.weights, file.bias, file.pooling)?;
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            model.name = stem.to_string();
        }
        Ok(model)
    }

    fn pool(&self, window: &WindowTensor) -> Vec<f32> {
        match self.pooling {
            Pooling::Last => window
                .step(window.steps().saturating_sub(1))
                .map(<[f32]>::to_vec)
                .unwrap_or_else(|| vec![0.0; self.features]),
            Pooling::Mean => {
                let mut pooled = vec![0.0f32; self.features];
                for step in window.as_slice().chunks_exact(self.features) {
                    for (acc, value) in pooled.iter_mut().zip(step) {
                        *acc += value;
                    }
                }
                if window.steps() > 0 {
                    let steps = window.steps() as f32;
                    pooled.iter_mut().for_each(|v| *v /= steps);
                }
                pooled
            }
        }
    }
}

/// Numerically stable softmax.
fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

impl Classifier for LinearClassifier {
    fn classify(&self, window: &WindowTensor) -> Result<Vec<f32>> {
        if window.features() != self.features {
            return Err(SignSyncError::ShapeMismatch {
                what: "classifier input features".to_string(),
                expected: self.features,
                actual: window.features(),
            });
        }

        let pooled = self.pool(window);
        let logits: Vec<f32> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(&pooled).map(|(w, x)| w * x).sum::<f32>() + b)
            .collect();

        if logits.iter().any(|l| !l.is_finite()) {
            return Err(SignSyncError::Classification {
                message: "non-finite logits".to_string(),
            });
        }
        Ok(softmax(&logits))
    }

    fn num_classes(&self) -> usize {
        self.weights.len()
    }

    fn expected_features(&self) -> Option<usize> {
        Some(self.features)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
