//! Moving average over the last M probability vectors.

use crate::error::{Result, SignSyncError};
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct ProbabilitySmoother {
    history: VecDeque<Vec<f32>>,
    capacity: usize,
    classes: usize,
}

impl ProbabilitySmoother {
    pub fn new(capacity: usize, classes: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(SignSyncError::invalid(
                "pipeline.smoothing_window",
                "must be at least 1",
            ));
        }
        if classes == 0 {
            return Err(SignSyncError::invalid("classes", "classifier reports zero classes"));
        }
        Ok(Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
            classes,
        })
    }

    /// Record one classifier output. Its length must equal the class count.
    pub fn push(&mut self, probs: Vec<f32>) -> Result<()> {
        if probs.len() != self.classes {
            return Err(SignSyncError::ShapeMismatch {
                what: "probability vector".to_string(),
                expected: self.classes,
                actual: probs.len(),
            });
        }
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(probs);
        Ok(())
    }

    /// Elementwise mean of the held vectors, `None` before the first push.
    pub fn mean(&self) -> Option<Vec<f32>> {
        if self.history.is_empty() {
            return None;
        }
        let mut sum = vec![0.0f32; self.classes];
        for probs in &self.history {
            for (acc, p) in sum.iter_mut().zip(probs) {
                *acc += p;
            }
        }
        let count = self.history.len() as f32;
        Some(sum.into_iter().map(|s| s / count).collect())
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn classes(&self) -> usize {
        self.classes
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &[f32], b: &[f32]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-6)
    }

    #[test]
    fn rejects_zero_sizes() {
        assert!(ProbabilitySmoother::new(0, 2).is_err());
        assert!(ProbabilitySmoother::new(3, 0).is_err());
    }

    #[test]
    fn empty_has_no_mean() {
        let smoother = ProbabilitySmoother::new(3, 2).unwrap();
        assert!(smoother.mean().is_none());
    }

    #[test]
    fn warm_up_mean_covers_pushed_vectors_only() {
        let mut smoother = ProbabilitySmoother::new(10, 2).unwrap();
        smoother.push(vec![1.0, 0.0]).unwrap();
        smoother.push(vec![0.0, 1.0]).unwrap();

        assert_eq!(smoother.len(), 2);
        assert!(close(&smoother.mean().unwrap(), &[0.5, 0.5]));
    }

    #[test]
    fn mean_covers_last_m_once_full() {
        let mut smoother = ProbabilitySmoother::new(2, 2).unwrap();
        smoother.push(vec![1.0, 0.0]).unwrap();
        smoother.push(vec![0.0, 1.0]).unwrap();
        smoother.push(vec![0.0, 1.0]).unwrap();

        assert_eq!(smoother.len(), 2);
        assert!(close(&smoother.mean().unwrap(), &[0.0, 1.0]));
    }

    #[test]
    fn wrong_length_is_rejected_without_mutation() {
        let mut smoother = ProbabilitySmoother::new(3, 2).unwrap();
        smoother.push(vec![0.4, 0.6]).unwrap();

        let result = smoother.push(vec![0.2, 0.3, 0.5]);
        assert!(matches!(
            result,
            Err(SignSyncError::ShapeMismatch {
                expected: 2,
                actual: 3,
                ..
            })
        ));
        assert_eq!(smoother.len(), 1);
    }

    #[test]
    fn clear_resets_history() {
        let mut smoother = ProbabilitySmoother::new(3, 1).unwrap();
        smoother.push(vec![1.0]).unwrap();
        smoother.clear();
        assert!(smoother.is_empty());
        assert!(smoother.mean().is_none());
    }
}
