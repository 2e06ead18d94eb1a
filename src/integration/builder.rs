//! Builder for creating Detection objects from various input formats.

use crate::tracker::{ColorTag, Detection, Rect, SourceKind};

/// Builder for creating `Detection` objects from various input formats.
///
/// Coordinates are normalized to the frame. Defaults: empty label,
/// yellow, fast source, confidence 0.
#[derive(Debug, Clone)]
pub struct DetectionBuilder {
    label: String,
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    confidence: f32,
    color: ColorTag,
    source: SourceKind,
}

impl Default for DetectionBuilder {
    fn default() -> Self {
        Self {
            label: String::new(),
            x1: 0.0,
            y1: 0.0,
            x2: 0.0,
            y2: 0.0,
            confidence: 0.0,
            color: ColorTag::default(),
            source: SourceKind::Fast,
        }
    }
}

impl DetectionBuilder {
    /// Create a new detection builder.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.x1 = cx - w / 2.0;
        self.y1 = cy - h / 2.0;
        self.x2 = cx + w / 2.0;
        self.y2 = cy + h / 2.0;
        self
    }

    /// Set bounding box in TLWH format (left, top, width, height).
    pub fn tlwh(mut self, x: f32, y: f32, w: f32, h: f32) -> Self {
        self.x1 = x;
        self.y1 = y;
        self.x2 = x + w;
        self.y2 = y + h;
        self
    }

    /// Set the confidence score.
    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn color(mut self, color: ColorTag) -> Self {
        self.color = color;
        self
    }

    pub fn source(mut self, source: SourceKind) -> Self {
        self.source = source;
        self
    }

    /// Build the final `Detection`.
    pub fn build(self) -> Detection {
        Detection::new(
            self.label,
            Rect::from_tlbr(self.x1, self.y1, self.x2, self.y2),
            self.confidence,
            self.color,
            self.source,
        )
    }
}
