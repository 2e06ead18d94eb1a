//! Camera frames and the mailbox the camera adapter publishes into.

use std::sync::{Arc, Mutex, PoisonError};

/// One captured camera image. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Frame {
    data: Arc<[u8]>,
    width: u32,
    height: u32,
    captured_at: u64,
}

impl Frame {
    pub fn new(data: impl Into<Arc<[u8]>>, width: u32, height: u32, captured_at: u64) -> Self {
        Self {
            data: data.into(),
            width,
            height,
            captured_at,
        }
    }

    /// Raw image bytes (format is agreed between camera and detectors).
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Clock time (ms) of capture.
    pub fn captured_at(&self) -> u64 {
        self.captured_at
    }
}

/// Where the cycles fetch the frame to run detection on.
pub trait FrameSource: Send + Sync {
    /// Most recent frame, or `None` before the camera delivers one.
    fn latest_frame(&self) -> Option<Frame>;
}

/// Single-slot mailbox: the camera adapter overwrites, cycles read.
#[derive(Debug, Clone, Default)]
pub struct LatestFrame {
    slot: Arc<Mutex<Option<Frame>>>,
}

impl LatestFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, frame: Frame) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame);
    }

    pub fn clear(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl FrameSource for LatestFrame {
    fn latest_frame(&self) -> Option<Frame> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
