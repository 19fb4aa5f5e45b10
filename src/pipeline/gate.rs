//! Argmax plus confidence threshold over the smoothed distribution.

use crate::error::{Result, SignSyncError};
use crate::pipeline::types::StableLabel;

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateDecision {
    pub label: StableLabel,
    /// Highest score in the evaluated vector (0.0 when nothing scored).
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct StabilityGate {
    threshold: f32,
}

impl StabilityGate {
    pub fn new(threshold: f32) -> Result<Self> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(SignSyncError::invalid(
                "pipeline.confidence_threshold",
                format!("must be a finite value >= 0, got {threshold}"),
            ));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Pick the top class, or `NoGesture` when it is below the threshold.
    ///
    /// Ties go to the lowest index. NaN scores never win.
    pub fn evaluate(&self, probs: &[f32]) -> GateDecision {
        let mut best: Option<(usize, f32)> = None;
        for (index, &score) in probs.iter().enumerate() {
            if score.is_nan() {
                continue;
            }
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((index, score)),
            }
        }

        match best {
            Some((index, confidence)) if confidence >= self.threshold => GateDecision {
                label: StableLabel::Class(index),
                confidence,
            },
            Some((_, confidence)) => GateDecision {
                label: StableLabel::NoGesture,
                confidence,
            },
            None => GateDecision {
                label: StableLabel::NoGesture,
                confidence: 0.0,
            },
        }
    }
}
