//! Stride gating: decides which frames run the classifier.

use crate::error::{Result, SignSyncError};

#[derive(Debug, Clone)]
pub struct InferenceScheduler {
    stride: u64,
    frame: u64,
}

impl InferenceScheduler {
    pub fn new(stride: u64) -> Result<Self> {
        if stride == 0 {
            return Err(SignSyncError::invalid("pipeline.stride", "must be at least 1"));
        }
        Ok(Self { stride, frame: 0 })
    }

    /// Count one processed frame and report whether inference runs on it.
    ///
    /// The counter advances on every call, whether or not the window is full.
    pub fn advance(&mut self, window_full: bool) -> bool {
        self.frame += 1;
        window_full && self.frame % self.stride == 0
    }

    /// Frames processed so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }
}
