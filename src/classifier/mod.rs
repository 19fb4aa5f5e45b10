//! Sequence classifier interface.
//!
//! The trained model is external; the pipeline only needs a window in and a
//! score vector out.

pub mod linear;

use crate::error::{Result, SignSyncError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub use linear::{LinearClassifier, Pooling};

/// Point-in-time copy of the sliding window, shaped `(1, steps, features)`.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowTensor {
    data: Vec<f32>,
    steps: usize,
    features: usize,
}

impl WindowTensor {
    /// Build from row-major data. `data.len()` must equal `steps * features`.
    pub fn new(data: Vec<f32>, steps: usize, features: usize) -> Result<Self> {
        if data.len() != steps * features {
            return Err(SignSyncError::ShapeMismatch {
                what: "window tensor".to_string(),
                expected: steps * features,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            steps,
            features,
        })
    }

    /// Caller guarantees `data.len() == steps * features`.
    pub(crate) fn from_rows(data: Vec<f32>, steps: usize, features: usize) -> Self {
        debug_assert_eq!(data.len(), steps * features);
        Self {
            data,
            steps,
            features,
        }
    }

    /// Tensor shape as `[batch, steps, features]`.
    pub fn shape(&self) -> [usize; 3] {
        [1, self.steps, self.features]
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn features(&self) -> usize {
        self.features
    }

    /// Feature vector of one time step, oldest first.
    pub fn step(&self, index: usize) -> Option<&[f32]> {
        if index >= self.steps {
            return None;
        }
        let start = index * self.features;
        Some(&self.data[start..start + self.features])
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Trait for window classifiers.
///
/// This trait allows swapping implementations (real model vs mock).
pub trait Classifier: Send + Sync {
    /// Score a window. Returns one non-negative score per class.
    fn classify(&self, window: &WindowTensor) -> Result<Vec<f32>>;

    /// Number of classes K in every returned vector.
    fn num_classes(&self) -> usize;

    /// Feature width D the model expects, when it is known up front.
    fn expected_features(&self) -> Option<usize> {
        None
    }

    /// Name of the loaded model
    fn name(&self) -> &str;
}

/// Implement Classifier for Arc<T> to allow sharing across sessions.
impl<T: Classifier + ?Sized> Classifier for Arc<T> {
    fn classify(&self, window: &WindowTensor) -> Result<Vec<f32>> {
        (**self).classify(window)
    }

    fn num_classes(&self) -> usize {
        (**self).num_classes()
    }

    fn expected_features(&self) -> Option<usize> {
        (**self).expected_features()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Scripted classifier for testing.
///
/// Returns queued responses in order, then keeps repeating the last one.
#[derive(Debug, Clone)]
pub struct MockClassifier {
    name: String,
    classes: usize,
    script: Arc<Mutex<MockScript>>,
}

#[derive(Debug)]
struct MockScript {
    queued: VecDeque<std::result::Result<Vec<f32>, String>>,
    last: std::result::Result<Vec<f32>, String>,
    calls: usize,
}

impl MockClassifier {
    /// Create a mock with `classes` outputs that always answers a uniform vector.
    pub fn new(classes: usize) -> Self {
        let uniform = vec![1.0 / classes.max(1) as f32; classes];
        Self {
            name: "mock".to_string(),
            classes,
            script: Arc::new(Mutex::new(MockScript {
                queued: VecDeque::new(),
                last: Ok(uniform),
                calls: 0,
            })),
        }
    }

    /// Queue a response for the next call.
    pub fn with_response(self, probs: Vec<f32>) -> Self {
        self.push(Ok(probs));
        self
    }

    /// Queue several responses.
    pub fn with_responses(self, responses: Vec<Vec<f32>>) -> Self {
        for probs in responses {
            self.push(Ok(probs));
        }
        self
    }

    /// Queue a failure for the next call.
    pub fn with_failure(self, message: &str) -> Self {
        self.push(Err(message.to_string()));
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Number of classify calls so far (shared across clones).
    pub fn calls(&self) -> usize {
        self.script.lock().map(|s| s.calls).unwrap_or(0)
    }

    fn push(&self, response: std::result::Result<Vec<f32>, String>) {
        if let Ok(mut script) = self.script.lock() {
            script.queued.push_back(response);
        }
    }
}

impl Classifier for MockClassifier {
    fn classify(&self, _window: &WindowTensor) -> Result<Vec<f32>> {
        let mut script = self
            .script
            .lock()
            .map_err(|_| SignSyncError::Classification {
                message: "mock script poisoned".to_string(),
            })?;
        script.calls += 1;
        if let Some(next) = script.queued.pop_front() {
            script.last = next;
        }
        script
            .last
            .clone()
            .map_err(|message| SignSyncError::Classification { message })
    }

    fn num_classes(&self) -> usize {
        self.classes
    }

    fn name(&self) -> &str {
        &self.name
    }
}
