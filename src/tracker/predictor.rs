//! Constant-velocity box extrapolation with camera-motion compensation.

use serde::{Deserialize, Serialize};

use crate::tracker::rect::{Displacement, Rect};
use crate::tracker::track::Track;

/// Size change is damped so a noisy velocity estimate cannot inflate boxes.
const SIZE_DAMPING: f32 = 0.5;

/// Screen-space shift caused by the device moving between ticks, in
/// normalized units. Subtracted from object motion so labels stay
/// anchored to the world rather than to the screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraMotion {
    pub dx: f32,
    pub dy: f32,
}

impl CameraMotion {
    pub const ZERO: CameraMotion = CameraMotion { dx: 0.0, dy: 0.0 };

    pub fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }

    /// Non-finite readings are treated as "no motion".
    pub fn sanitized(self) -> Self {
        if self.dx.is_finite() && self.dy.is_finite() {
            self
        } else {
            CameraMotion::ZERO
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MotionPredictor {
    max_missed_frames: u32,
}

impl MotionPredictor {
    pub fn new(max_missed_frames: u32) -> Self {
        Self { max_missed_frames }
    }

    /// Predicted box for `track` this tick.
    ///
    /// Tracks that were matched last tick, or that have coasted past the
    /// missed-frame cap, stay at their smoothed box.
    pub fn predict(&self, track: &Track, camera: CameraMotion) -> Rect {
        if track.missed_frame_count == 0 || track.missed_frame_count > self.max_missed_frames {
            return track.smoothed_box;
        }
        let v = &track.velocity;
        let step = Displacement::new(
            v.dx - camera.dx,
            v.dy - camera.dy,
            v.dw * SIZE_DAMPING,
            v.dh * SIZE_DAMPING,
        );
        track.smoothed_box.translated(&step)
    }
}
