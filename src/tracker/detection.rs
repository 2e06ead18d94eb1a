//! Detection input for the tracker.

use serde::{Deserialize, Serialize};

use crate::tracker::rect::Rect;

/// Presentation hint carried from the detector to the renderer.
///
/// Unknown color names deserialize to [`ColorTag::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    /// Hazards and prohibitive signs
    Red,
    /// Caution
    #[default]
    Yellow,
    /// Safe to proceed
    Green,
    Blue,
    #[serde(other)]
    Other,
}

impl ColorTag {
    /// Parse a color name, case-insensitively. Unknown names map to `Other`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "red" => ColorTag::Red,
            "yellow" => ColorTag::Yellow,
            "green" => ColorTag::Green,
            "blue" => ColorTag::Blue,
            _ => ColorTag::Other,
        }
    }
}

/// Which upstream detector produced a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Low-latency, lower-accuracy local detector.
    Fast,
    /// High-latency, authoritative remote detector.
    Refined,
}

/// A single "something was seen here" observation, without identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class name as reported by the detector
    pub label: String,
    /// Bounding box in normalized TLWH format
    pub bbox: Rect,
    /// Detection confidence score in `[0, 1]`
    pub confidence: f32,
    pub color: ColorTag,
    pub source: SourceKind,
}

impl Detection {
    pub fn new(
        label: impl Into<String>,
        bbox: Rect,
        confidence: f32,
        color: ColorTag,
        source: SourceKind,
    ) -> Self {
        Self {
            label: label.into(),
            bbox,
            confidence,
            color,
            source,
        }
    }

    /// Shorthand for a fast-source detection.
    pub fn fast(label: impl Into<String>, bbox: Rect, confidence: f32, color: ColorTag) -> Self {
        Self::new(label, bbox, confidence, color, SourceKind::Fast)
    }

    /// Shorthand for a refined-source detection.
    pub fn refined(label: impl Into<String>, bbox: Rect, confidence: f32, color: ColorTag) -> Self {
        Self::new(label, bbox, confidence, color, SourceKind::Refined)
    }

    /// A detection is usable when its box is finite with non-negative extents
    /// and its confidence lies in `[0, 1]`.
    pub fn is_well_formed(&self) -> bool {
        self.bbox.is_well_formed()
            && self.confidence.is_finite()
            && (0.0..=1.0).contains(&self.confidence)
    }
}
