//! Parsing of the remote vision model's JSON reply.
//!
//! The refined detector is prompted to answer with
//! `{"detections": [{"label", "bbox": [x, y, w, h], "color"}]}`, but in
//! practice the JSON may arrive wrapped in a markdown code fence or
//! surrounded by prose.

use std::fmt;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::ResponseError;
use crate::integration::builder::DetectionBuilder;
use crate::integration::detector::DetectionSource;
use crate::integration::frame::Frame;
use crate::tracker::{ColorTag, Detection, SourceKind};

/// Confidence assumed when the model omits one.
pub const DEFAULT_REFINED_CONFIDENCE: f32 = 0.85;

/// Parse a reply into refined detections.
///
/// Entries without a `label` or without four numeric `bbox` values are
/// skipped. A missing `color` means yellow.
pub fn parse_refined_response(text: &str) -> Result<Vec<Detection>, ResponseError> {
    let body = strip_code_fence(text.trim());
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => {
            let start = body.find('{').ok_or(ResponseError::NoJson)?;
            let end = body.rfind('}').ok_or(ResponseError::NoJson)?;
            if end < start {
                return Err(ResponseError::NoJson);
            }
            serde_json::from_str(&body[start..=end])?
        }
    };

    let Some(items) = value.get("detections").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    let detections: Vec<Detection> = items.iter().filter_map(parse_item).collect();
    if detections.len() < items.len() {
        debug!(
            kept = detections.len(),
            skipped = items.len() - detections.len(),
            "incomplete refined detections skipped"
        );
    }
    Ok(detections)
}

fn parse_item(item: &Value) -> Option<Detection> {
    let label = item.get("label")?.as_str()?;
    let bbox = item.get("bbox")?.as_array()?;
    if bbox.len() < 4 {
        return None;
    }
    let mut coords = [0.0f32; 4];
    for (slot, v) in coords.iter_mut().zip(bbox) {
        *slot = v.as_f64()? as f32;
    }
    let color = item
        .get("color")
        .and_then(Value::as_str)
        .map(ColorTag::from_name)
        .unwrap_or(ColorTag::Yellow);
    let confidence = item
        .get("confidence")
        .and_then(Value::as_f64)
        .map(|c| c as f32)
        .unwrap_or(DEFAULT_REFINED_CONFIDENCE);

    Some(
        DetectionBuilder::new()
            .label(label)
            .tlwh(coords[0], coords[1], coords[2], coords[3])
            .confidence(confidence)
            .color(color)
            .source(SourceKind::Refined)
            .build(),
    )
}

/// Contents of the first ```` ```json ```` block, else of the first plain
/// fenced block, else the text unchanged.
fn strip_code_fence(text: &str) -> &str {
    let inner = if let Some((_, rest)) = text.split_once("```json") {
        rest
    } else if let Some((_, rest)) = text.split_once("```") {
        rest
    } else {
        return text;
    };
    inner.split("```").next().unwrap_or(inner).trim()
}

#[derive(Debug, Error)]
pub enum ReplyDetectorError<E: fmt::Display + fmt::Debug> {
    #[error("request to the vision service failed: {0}")]
    Transport(E),
    #[error(transparent)]
    Response(#[from] ResponseError),
}

/// Refined detector backed by a service that answers with JSON text.
///
/// `transport` sends the frame (however the service expects it) and
/// returns the raw reply body.
pub struct JsonReplyDetector<T> {
    transport: T,
}

impl<T> JsonReplyDetector<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T, E> DetectionSource for JsonReplyDetector<T>
where
    T: FnMut(&Frame) -> Result<String, E>,
    E: fmt::Display + fmt::Debug,
{
    type Error = ReplyDetectorError<E>;

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error> {
        let text = (self.transport)(frame).map_err(ReplyDetectorError::Transport)?;
        parse_refined_response(&text).map_err(|err| {
            warn!(%err, "unusable reply from vision service");
            err.into()
        })
    }
}
