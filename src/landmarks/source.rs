use crate::error::{Result, SignSyncError};
use crate::landmarks::FrameDetections;
use std::collections::VecDeque;

/// Trait for per-frame landmark producers.
///
/// This trait allows swapping implementations (live extractor, replay file, mock).
pub trait LandmarkSource: Send {
    /// Start producing frames.
    fn start(&mut self) -> Result<()>;

    /// Stop producing frames.
    fn stop(&mut self) -> Result<()>;

    /// Read the next frame's detections.
    ///
    /// Live sources block until the next frame is available.
    /// Returns `Ok(None)` once the stream has ended.
    fn read_frame(&mut self) -> Result<Option<FrameDetections>>;

    /// True for sources with a natural end (replay files, fixtures).
    ///
    /// Frames from finite sources are never dropped under backpressure.
    fn is_finite(&self) -> bool {
        false
    }
}

/// Mock landmark source for testing
#[derive(Debug, Clone, Default)]
pub struct MockLandmarkSource {
    frames: VecDeque<FrameDetections>,
    is_started: bool,
    should_fail_start: bool,
    should_fail_read: bool,
    error_message: String,
}

impl MockLandmarkSource {
    /// Create a mock source that yields the given frames, then ends.
    pub fn new(frames: Vec<FrameDetections>) -> Self {
        Self {
            frames: frames.into(),
            error_message: "mock landmark error".to_string(),
            ..Default::default()
        }
    }

    /// Create a mock source yielding `count` frames with nothing detected.
    pub fn empty_frames(count: usize) -> Self {
        Self::new(vec![FrameDetections::empty(); count])
    }

    /// Configure the mock to fail on start
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the mock to fail on read
    pub fn with_read_failure(mut self) -> Self {
        self.should_fail_read = true;
        self
    }

    /// Configure the error message for failures
    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    pub fn is_started(&self) -> bool {
        self.is_started
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl LandmarkSource for MockLandmarkSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            return Err(SignSyncError::LandmarkSource {
                message: self.error_message.clone(),
            });
        }
        self.is_started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.is_started = false;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<FrameDetections>> {
        if self.should_fail_read {
            return Err(SignSyncError::LandmarkSource {
                message: self.error_message.clone(),
            });
        }
        Ok(self.frames.pop_front())
    }

    fn is_finite(&self) -> bool {
        true
    }
}
