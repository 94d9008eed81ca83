//! Normalized bounding-box geometry.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box with `x`/`y` at the top-left corner.
///
/// Coordinates are normalized to [0, 1] relative to the frame dimensions,
/// but every operation works in any shared coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Box area.
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Height-over-width ratio; 0 when the box has no width.
    pub fn aspect_ratio(&self) -> f32 {
        if self.width <= 0.0 {
            0.0
        } else {
            self.height / self.width
        }
    }

    /// Center point of the box.
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Intersection over union with another box, in [0, 1].
    ///
    /// Disjoint boxes yield exactly 0, identical boxes 1. A zero-area
    /// union yields 0 rather than an error.
    pub fn iou(&self, other: &BBox) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let inter_w = (x2 - x1).max(0.0);
        let inter_h = (y2 - y1).max(0.0);
        let intersection = inter_w * inter_h;

        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iou_identical() {
        let b = BBox::new(0.1, 0.2, 0.3, 0.4);
        assert!((b.iou(&b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_disjoint_is_exactly_zero() {
        let a = BBox::new(0.0, 0.0, 0.2, 0.2);
        let b = BBox::new(0.5, 0.5, 0.2, 0.2);
        assert_eq!(a.iou(&b), 0.0);
        // Touching edges do not overlap either
        let c = BBox::new(0.2, 0.0, 0.2, 0.2);
        assert_eq!(a.iou(&c), 0.0);
    }

    #[test]
    fn test_iou_symmetric() {
        let a = BBox::new(0.0, 0.0, 0.4, 0.4);
        let b = BBox::new(0.2, 0.1, 0.4, 0.5);
        assert!((a.iou(&b) - b.iou(&a)).abs() < 1e-6);
    }

    #[test]
    fn test_iou_half_overlap() {
        // Two 2x2 boxes offset by 1 along x: intersection 2, union 6
        let a = BBox::new(0.0, 0.0, 2.0, 2.0);
        let b = BBox::new(1.0, 0.0, 2.0, 2.0);
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_contained() {
        // B fully inside A: intersection = area(B), union = area(A)
        let a = BBox::new(0.0, 0.0, 4.0, 4.0);
        let b = BBox::new(1.0, 1.0, 2.0, 2.0);
        assert!((a.iou(&b) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_iou_zero_area_union() {
        let a = BBox::new(0.3, 0.3, 0.0, 0.0);
        assert_eq!(a.iou(&a), 0.0);
    }

    #[test]
    fn test_aspect_ratio() {
        let tall = BBox::new(0.0, 0.0, 0.1, 0.4);
        assert!((tall.aspect_ratio() - 4.0).abs() < 1e-6);
        let degenerate = BBox::new(0.0, 0.0, 0.0, 0.4);
        assert_eq!(degenerate.aspect_ratio(), 0.0);
    }

    #[test]
    fn test_center() {
        let b = BBox::new(0.0, 0.0, 1.0, 0.5);
        let (cx, cy) = b.center();
        assert!((cx - 0.5).abs() < 1e-6);
        assert!((cy - 0.25).abs() < 1e-6);
    }
}
