//! Fixed-width feature vectors from per-region landmark detections.

use crate::error::{Result, SignSyncError};
use crate::landmarks::{FrameDetections, Landmark, RegionDetection, RegionLayout};
use std::collections::HashSet;

/// One frame's flattened features, always `dims()` long.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

/// Which regions contributed real data to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegionCoverage {
    pub present: usize,
    pub absent: usize,
    /// Present, but with a point count that does not match the layout.
    pub malformed: usize,
}

impl RegionCoverage {
    pub fn is_complete(&self) -> bool {
        self.absent == 0 && self.malformed == 0
    }
}

/// Flattens detections into a fixed-length vector following a region layout.
#[derive(Debug, Clone)]
pub struct FeatureVectorBuilder {
    layouts: Vec<RegionLayout>,
    dims: usize,
}

impl FeatureVectorBuilder {
    pub fn new(layouts: Vec<RegionLayout>) -> Result<Self> {
        if layouts.is_empty() {
            return Err(SignSyncError::invalid("regions", "at least one region is required"));
        }
        let mut seen = HashSet::new();
        for layout in &layouts {
            if layout.points == 0 {
                return Err(SignSyncError::invalid(
                    "regions",
                    format!("region '{}' declares zero points", layout.name),
                ));
            }
            if !seen.insert(layout.name.as_str()) {
                return Err(SignSyncError::invalid(
                    "regions",
                    format!("region '{}' is declared twice", layout.name),
                ));
            }
        }
        let dims = layouts.iter().map(RegionLayout::dims).sum();
        Ok(Self { layouts, dims })
    }

    /// Total feature vector length D.
    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn layouts(&self) -> &[RegionLayout] {
        &self.layouts
    }

    /// Build the vector for one frame. Absent or malformed regions are zero-filled.
    pub fn build(&self, detections: &FrameDetections) -> (FeatureVector, RegionCoverage) {
        let mut values = Vec::with_capacity(self.dims);
        let mut coverage = RegionCoverage::default();

        for layout in &self.layouts {
            match detections.region(&layout.name) {
                RegionDetection::Present(points) if points.len() == layout.points => {
                    coverage.present += 1;
                    for point in points {
                        push_point(&mut values, point, layout.visibility);
                    }
                }
                RegionDetection::Present(points) => {
                    coverage.malformed += 1;
                    tracing::warn!(
                        region = %layout.name,
                        expected = layout.points,
                        actual = points.len(),
                        "landmark count mismatch, zero-filling region"
                    );
                    values.resize(values.len() + layout.dims(), 0.0);
                }
                RegionDetection::Absent => {
                    coverage.absent += 1;
                    values.resize(values.len() + layout.dims(), 0.0);
                }
            }
        }

        debug_assert_eq!(values.len(), self.dims);
        (FeatureVector(values), coverage)
    }
}

fn push_point(values: &mut Vec<f32>, point: &Landmark, visibility: bool) {
    values.extend_from_slice(&[point.x, point.y, point.z]);
    if visibility {
        values.push(point.visibility.unwrap_or(0.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(n: usize, base: f32) -> Vec<Landmark> {
        (0..n)
            .map(|i| {
                let v = base + i as f32;
                Landmark::new(v, v + 0.1, v + 0.2).with_visibility(0.5)
            })
            .collect()
    }

    fn small_layout() -> Vec<RegionLayout> {
        vec![
            RegionLayout::new("pose", 2, true),
            RegionLayout::new("hand", 3, false),
        ]
    }

    #[test]
    fn dims_is_sum_of_regions() {
        let builder = FeatureVectorBuilder::new(small_layout()).unwrap();
        assert_eq!(builder.dims(), 2 * 4 + 3 * 3);

        let holistic = FeatureVectorBuilder::new(RegionLayout::holistic()).unwrap();
        assert_eq!(holistic.dims(), 1662);
    }

    #[test]
    fn length_is_constant_for_every_presence_combination() {
        let builder = FeatureVectorBuilder::new(RegionLayout::holistic()).unwrap();
        let names = ["pose", "face", "left_hand", "right_hand"];
        let sizes = [33, 468, 21, 21];

        for mask in 0u8..16 {
            let mut frame = FrameDetections::empty();
            for (bit, (name, size)) in names.iter().zip(sizes).enumerate() {
                if mask & (1 << bit) != 0 {
                    frame = frame.with_points(name, points(size, 0.0));
                }
            }
            let (vector, coverage) = builder.build(&frame);
            assert_eq!(vector.len(), 1662, "mask {mask:04b}");
            assert_eq!(coverage.present, mask.count_ones() as usize);
            assert_eq!(coverage.present + coverage.absent, 4);
        }
    }

    #[test]
    fn present_region_flattens_in_point_order() {
        let builder = FeatureVectorBuilder::new(small_layout()).unwrap();
        let frame = FrameDetections::empty()
            .with_points("pose", points(2, 1.0))
            .with_points("hand", points(3, 10.0));

        let (vector, coverage) = builder.build(&frame);
        assert!(coverage.is_complete());
        let v = vector.as_slice();
        // pose point 0 with visibility, then point 1
        assert_eq!(&v[0..4], &[1.0, 1.1, 1.2, 0.5]);
        assert_eq!(&v[4..8], &[2.0, 2.1, 2.2, 0.5]);
        // hand points carry no visibility channel
        assert_eq!(&v[8..11], &[10.0, 10.1, 10.2]);
        assert_eq!(&v[14..17], &[12.0, 12.1, 12.2]);
    }

    #[test]
    fn absent_region_is_zero_filled_in_place() {
        let builder = FeatureVectorBuilder::new(small_layout()).unwrap();
        let frame = FrameDetections::empty().with_points("hand", points(3, 1.0));

        let (vector, coverage) = builder.build(&frame);
        assert_eq!(coverage.absent, 1);
        assert!(vector.as_slice()[0..8].iter().all(|v| *v == 0.0));
        assert_eq!(vector.as_slice()[8], 1.0);
    }

    #[test]
    fn missing_visibility_is_written_as_zero() {
        let builder = FeatureVectorBuilder::new(vec![RegionLayout::new("pose", 1, true)]).unwrap();
        let frame = FrameDetections::empty().with_points("pose", vec![Landmark::new(0.3, 0.4, 0.5)]);

        let (vector, _) = builder.build(&frame);
        assert_eq!(vector.as_slice(), &[0.3, 0.4, 0.5, 0.0]);
    }

    #[test]
    fn wrong_point_count_is_malformed_and_zero_filled() {
        let builder = FeatureVectorBuilder::new(small_layout()).unwrap();
        let frame = FrameDetections::empty().with_points("hand", points(5, 1.0));

        let (vector, coverage) = builder.build(&frame);
        assert_eq!(vector.len(), builder.dims());
        assert_eq!(coverage.malformed, 1);
        assert!(!coverage.is_complete());
        assert!(vector.as_slice().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn unknown_regions_are_ignored() {
        let builder = FeatureVectorBuilder::new(small_layout()).unwrap();
        let frame = FrameDetections::empty().with_points("tail", points(7, 1.0));
        let (vector, coverage) = builder.build(&frame);
        assert_eq!(vector.len(), builder.dims());
        assert_eq!(coverage.absent, 2);
    }

    #[test]
    fn rejects_invalid_layouts() {
        assert!(FeatureVectorBuilder::new(vec![]).is_err());
        assert!(FeatureVectorBuilder::new(vec![RegionLayout::new("pose", 0, true)]).is_err());
        assert!(
            FeatureVectorBuilder::new(vec![
                RegionLayout::new("hand", 21, false),
                RegionLayout::new("hand", 21, false),
            ])
            .is_err()
        );
    }
}
