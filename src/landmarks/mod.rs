//! Landmark input: region layouts, per-frame detections and sources.
//!
//! The vision extractor is external. Each frame it reports, per tracked
//! region, either a list of points or nothing at all.

pub mod replay;
pub mod source;

use crate::defaults;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use replay::ReplaySource;
pub use source::{LandmarkSource, MockLandmarkSource};

/// A single tracked point in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            visibility: None,
        }
    }

    pub fn with_visibility(mut self, visibility: f32) -> Self {
        self.visibility = Some(visibility);
        self
    }
}

/// Detection result for one region in one frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Option<Vec<Landmark>>", into = "Option<Vec<Landmark>>")]
pub enum RegionDetection {
    Present(Vec<Landmark>),
    #[default]
    Absent,
}

impl From<Option<Vec<Landmark>>> for RegionDetection {
    fn from(points: Option<Vec<Landmark>>) -> Self {
        match points {
            Some(points) => RegionDetection::Present(points),
            None => RegionDetection::Absent,
        }
    }
}

impl From<RegionDetection> for Option<Vec<Landmark>> {
    fn from(detection: RegionDetection) -> Self {
        match detection {
            RegionDetection::Present(points) => Some(points),
            RegionDetection::Absent => None,
        }
    }
}

/// Declared shape of one tracked region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionLayout {
    pub name: String,
    pub points: usize,
    /// Whether each point carries a visibility channel after x, y, z.
    #[serde(default)]
    pub visibility: bool,
}

impl RegionLayout {
    pub fn new(name: &str, points: usize, visibility: bool) -> Self {
        Self {
            name: name.to_string(),
            points,
            visibility,
        }
    }

    /// Values per point.
    pub fn channels(&self) -> usize {
        if self.visibility { 4 } else { 3 }
    }

    /// Length of this region's sub-segment in the feature vector.
    pub fn dims(&self) -> usize {
        self.points * self.channels()
    }

    /// Holistic layout the reference model was trained on:
    /// pose, face, left hand, right hand.
    pub fn holistic() -> Vec<RegionLayout> {
        vec![
            RegionLayout::new("pose", defaults::POSE_POINTS, true),
            RegionLayout::new("face", defaults::FACE_POINTS, false),
            RegionLayout::new("left_hand", defaults::HAND_POINTS, false),
            RegionLayout::new("right_hand", defaults::HAND_POINTS, false),
        ]
    }
}

/// Everything the extractor reported for one frame, keyed by region name.
///
/// Regions that are not mentioned are absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameDetections {
    regions: BTreeMap<String, RegionDetection>,
}

impl FrameDetections {
    /// A frame where nothing was detected.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, name: &str, detection: RegionDetection) -> Self {
        self.regions.insert(name.to_string(), detection);
        self
    }

    pub fn with_points(self, name: &str, points: Vec<Landmark>) -> Self {
        self.with_region(name, RegionDetection::Present(points))
    }

    pub fn region(&self, name: &str) -> &RegionDetection {
        static ABSENT: RegionDetection = RegionDetection::Absent;
        self.regions.get(name).unwrap_or(&ABSENT)
    }

    /// Number of regions reported as present.
    pub fn present_count(&self) -> usize {
        self.regions
            .values()
            .filter(|d| matches!(d, RegionDetection::Present(_)))
            .count()
    }
}
