//! Bounding box geometry: overlap, distance, displacement and smoothing.

use nalgebra::Vector4;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in normalized screen coordinates.
///
/// All coordinates are fractions of the frame size in `[0, 1]` with a
/// top-left origin. Two conversion helpers are provided:
/// - TLWH: Top-Left X, Top-Left Y, Width, Height (the native layout)
/// - TLBR: Top-Left X, Top-Left Y, Bottom-Right X, Bottom-Right Y
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left x coordinate
    pub x: f32,
    /// Top-left y coordinate
    pub y: f32,
    /// Width of the bounding box
    pub width: f32,
    /// Height of the bounding box
    pub height: f32,
}

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from TLBR format (top-left x, top-left y, bottom-right x, bottom-right y).
    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    /// Convert to TLWH format: (x, y, width, height).
    #[inline]
    pub fn to_tlwh(&self) -> [f32; 4] {
        [self.x, self.y, self.width, self.height]
    }

    #[inline]
    pub(crate) fn to_vector(self) -> Vector4<f32> {
        Vector4::new(self.x, self.y, self.width, self.height)
    }

    #[inline]
    pub(crate) fn from_vector(v: Vector4<f32>) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }

    /// Get the center point of the bounding box.
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Get the area of the bounding box. Negative extents count as empty.
    #[inline]
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// True when every field is finite and the extents are non-negative.
    pub fn is_well_formed(&self) -> bool {
        self.to_tlwh().iter().all(|v| v.is_finite()) && self.width >= 0.0 && self.height >= 0.0
    }

    /// Calculate Intersection over Union (IoU) with another bounding box.
    ///
    /// Returns 0 for disjoint or degenerate boxes.
    pub fn iou(&self, other: &Rect) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let inter_width = (x2 - x1).max(0.0);
        let inter_height = (y2 - y1).max(0.0);
        let inter_area = inter_width * inter_height;

        let union_area = self.area() + other.area() - inter_area;

        if union_area > 0.0 {
            (inter_area / union_area).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Euclidean distance between the two box centers.
    pub fn center_distance(&self, other: &Rect) -> f32 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
    }

    /// Component-wise change from `self` to `newer`.
    pub fn displacement_to(&self, newer: &Rect) -> Displacement {
        Displacement::from_vector(newer.to_vector() - self.to_vector())
    }

    /// Shift every component by `d`.
    pub fn translated(&self, d: &Displacement) -> Rect {
        Rect::from_vector(self.to_vector() + d.to_vector())
    }
}

/// Per-component box delta `{dx, dy, dw, dh}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Displacement {
    pub dx: f32,
    pub dy: f32,
    pub dw: f32,
    pub dh: f32,
}

impl Displacement {
    pub const ZERO: Displacement = Displacement {
        dx: 0.0,
        dy: 0.0,
        dw: 0.0,
        dh: 0.0,
    };

    #[inline]
    pub fn new(dx: f32, dy: f32, dw: f32, dh: f32) -> Self {
        Self { dx, dy, dw, dh }
    }

    /// Length of the positional part `(dx, dy)`.
    #[inline]
    pub fn magnitude(&self) -> f32 {
        (self.dx * self.dx + self.dy * self.dy).sqrt()
    }

    #[inline]
    pub(crate) fn to_vector(self) -> Vector4<f32> {
        Vector4::new(self.dx, self.dy, self.dw, self.dh)
    }

    #[inline]
    pub(crate) fn from_vector(v: Vector4<f32>) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }

    /// `self * (1 - weight) + sample * weight`, per component.
    pub fn blend(&self, sample: &Displacement, weight: f32) -> Displacement {
        Displacement::from_vector(self.to_vector().lerp(&sample.to_vector(), weight))
    }
}

/// Intersection over Union of two boxes.
#[inline]
pub fn iou(a: &Rect, b: &Rect) -> f32 {
    a.iou(b)
}

/// Distance between box centers, in normalized units.
#[inline]
pub fn center_distance(a: &Rect, b: &Rect) -> f32 {
    a.center_distance(b)
}

/// Component-wise difference `new - old`.
#[inline]
pub fn displacement(old: &Rect, new: &Rect) -> Displacement {
    old.displacement_to(new)
}

/// Exponential moving average of two boxes: `old * (1 - alpha) + new * alpha`.
///
/// With no history (`old == None`) the new box is returned unchanged.
/// `alpha` is clamped to `[0, 1]`.
pub fn exponential_smooth(old: Option<&Rect>, new: &Rect, alpha: f32) -> Rect {
    match old {
        None => *new,
        Some(old) => {
            let alpha = alpha.clamp(0.0, 1.0);
            if alpha == 0.0 {
                return *old;
            }
            if alpha == 1.0 {
                return *new;
            }
            Rect::from_vector(old.to_vector().lerp(&new.to_vector(), alpha))
        }
    }
}

/// Calculate IoU matrix between two sets of bounding boxes.
///
/// Returns a matrix of shape (M, N) where M is the length of `boxes_a`
/// and N is the length of `boxes_b`.
pub fn iou_batch(boxes_a: &[Rect], boxes_b: &[Rect]) -> Array2<f32> {
    let mut ious = Array2::zeros((boxes_a.len(), boxes_b.len()));
    for (i, a) in boxes_a.iter().enumerate() {
        for (j, b) in boxes_b.iter().enumerate() {
            ious[[i, j]] = a.iou(b);
        }
    }
    ious
}
