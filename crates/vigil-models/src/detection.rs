//! Raw per-frame detector output.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geometry::BBox;

/// A single detection produced by the external object detector.
///
/// Detections are ephemeral: they carry no identity and are consumed by the
/// tracker within the frame they were produced.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Detection {
    /// Bounding box in normalized coordinates [0, 1]
    pub bbox: BBox,
    /// Detector confidence [0, 1]
    pub score: f32,
}

impl Detection {
    pub fn new(bbox: BBox, score: f32) -> Self {
        Self { bbox, score }
    }

    /// Normalized area of the detection box.
    pub fn area(&self) -> f32 {
        self.bbox.area()
    }

    /// Height-over-width ratio of the detection box.
    pub fn aspect_ratio(&self) -> f32 {
        self.bbox.aspect_ratio()
    }
}
