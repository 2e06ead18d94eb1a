//! Trait for object detection backends feeding the tracker.

use std::fmt;

use crate::integration::frame::Frame;
use crate::tracker::Detection;

/// Trait for object detection backends.
///
/// Implement this trait to connect a detector (local model, remote
/// service, scripted test source) to the overlay. Implementations tag
/// their detections with the matching [`SourceKind`].
///
/// # Example
///
/// ```ignore
/// use anchortrack::{DetectionSource, Detection, Frame};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl DetectionSource for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error> {
///         // Run inference and return detections
///         Ok(vec![])
///     }
/// }
/// ```
///
/// [`SourceKind`]: crate::tracker::SourceKind
pub trait DetectionSource {
    /// Error type for detection failures.
    type Error: fmt::Display;

    /// Run inference on one camera frame.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error>;
}

/// Adapts a closure into a [`DetectionSource`].
pub struct FnDetector<F>(pub F);

impl<F, E> DetectionSource for FnDetector<F>
where
    F: FnMut(&Frame) -> Result<Vec<Detection>, E>,
    E: fmt::Display,
{
    type Error = E;

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error> {
        (self.0)(frame)
    }
}

impl<D: DetectionSource + ?Sized> DetectionSource for Box<D> {
    type Error = D::Error;

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error> {
        (**self).detect(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::DetectionBuilder;

    #[test]
    fn test_fn_detector() {
        let mut calls = 0;
        let mut detector = FnDetector(|frame: &Frame| -> Result<Vec<Detection>, String> {
            calls += 1;
            Ok(vec![
                DetectionBuilder::new()
                    .label("walk")
                    .tlwh(0.0, 0.0, frame.width() as f32 / 1000.0, 0.1)
                    .confidence(0.8)
                    .build(),
            ])
        });
        let frame = Frame::new(vec![0u8; 4], 100, 1, 0);
        let dets = detector.detect(&frame).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].bbox.width, 0.1);
        drop(detector);
        assert_eq!(calls, 1);
    }
}
