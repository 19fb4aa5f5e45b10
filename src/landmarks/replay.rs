//! JSON-lines landmark source for recorded sessions and piped extractors.
//!
//! One JSON object per line, keyed by region name:
//! `{"pose": [{"x": 0.5, "y": 0.4, "z": -0.1, "visibility": 0.98}, ...], "face": null}`

use crate::error::{Result, SignSyncError};
use crate::landmarks::FrameDetections;
use crate::landmarks::source::LandmarkSource;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

/// Landmark source that replays frames from a JSON-lines stream.
pub struct ReplaySource {
    reader: Box<dyn BufRead + Send>,
    line_number: usize,
    frame_interval: Option<Duration>,
    next_deadline: Option<Instant>,
}

impl ReplaySource {
    /// Create from any reader (for testing/flexibility).
    pub fn from_reader(reader: Box<dyn Read + Send>) -> Self {
        Self {
            reader: Box::new(BufReader::new(reader)),
            line_number: 0,
            frame_interval: None,
            next_deadline: None,
        }
    }

    /// Open a recorded session file.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| SignSyncError::LandmarkSource {
            message: format!("Failed to open {}: {}", path.display(), e),
        })?;
        Ok(Self::from_reader(Box::new(file)))
    }

    /// Read frames from stdin.
    pub fn from_stdin() -> Self {
        Self::from_reader(Box::new(std::io::stdin()))
    }

    /// Pace frames at a fixed interval instead of reading as fast as possible.
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = Some(interval).filter(|d| !d.is_zero());
        self
    }

    fn wait_for_deadline(&mut self) {
        let Some(interval) = self.frame_interval else {
            return;
        };
        let now = Instant::now();
        if let Some(deadline) = self.next_deadline
            && deadline > now
        {
            thread::sleep(deadline - now);
        }
        self.next_deadline = Some(self.next_deadline.unwrap_or(now).max(now) + interval);
    }
}

impl LandmarkSource for ReplaySource {
    fn start(&mut self) -> Result<()> {
        self.next_deadline = None;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<FrameDetections>> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self
                .reader
                .read_line(&mut line)
                .map_err(|e| SignSyncError::LandmarkSource {
                    message: format!("Failed to read line {}: {}", self.line_number + 1, e),
                })?;
            if read == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            if !line.trim().is_empty() {
                break;
            }
        }

        let frame: FrameDetections =
            serde_json::from_str(line.trim()).map_err(|e| SignSyncError::LandmarkSource {
                message: format!("Invalid frame on line {}: {}", self.line_number, e),
            })?;

        self.wait_for_deadline();
        Ok(Some(frame))
    }

    fn is_finite(&self) -> bool {
        true
    }
}
