//! Bounded FIFO of the most recent feature vectors.

use crate::classifier::WindowTensor;
use crate::error::{Result, SignSyncError};
use crate::pipeline::features::FeatureVector;
use std::collections::VecDeque;

/// Sliding window of the last N frames fed to the sequence classifier.
#[derive(Debug, Clone)]
pub struct SequenceWindow {
    frames: VecDeque<FeatureVector>,
    capacity: usize,
    feature_dims: Option<usize>,
}

impl SequenceWindow {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(SignSyncError::invalid(
                "pipeline.window_size",
                "must be at least 1",
            ));
        }
        Ok(Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
            feature_dims: None,
        })
    }

    /// Append a vector, evicting the oldest one when already full.
    ///
    /// The first vector fixes the feature width; any later vector of a
    /// different length is rejected and leaves the window untouched.
    pub fn push(&mut self, vector: FeatureVector) -> Result<()> {
        match self.feature_dims {
            Some(dims) if dims != vector.len() => {
                return Err(SignSyncError::ShapeMismatch {
                    what: "feature vector".to_string(),
                    expected: dims,
                    actual: vector.len(),
                });
            }
            Some(_) => {}
            None => self.feature_dims = Some(vector.len()),
        }

        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(vector);
        Ok(())
    }

    pub fn is_full(&self) -> bool {
        self.frames.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Width fixed by the first push, if any.
    pub fn feature_dims(&self) -> Option<usize> {
        self.feature_dims
    }

    /// Copy the window in chronological order, shaped `(1, len, D)`.
    pub fn snapshot(&self) -> WindowTensor {
        let features = self.feature_dims.unwrap_or(0);
        let mut data = Vec::with_capacity(self.frames.len() * features);
        for frame in &self.frames {
            data.extend_from_slice(frame.as_slice());
        }
        WindowTensor::from_rows(data, self.frames.len(), features)
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
