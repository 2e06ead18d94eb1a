//! Camera-motion compensation sources.

use std::sync::{Mutex, PoisonError};

use crate::tracker::CameraMotion;

/// Supplies the per-tick camera shift. `None` means "no reading", which
/// the fast cycle treats as zero motion.
pub trait MotionSource: Send + Sync {
    fn camera_motion(&self) -> Option<CameraMotion>;
}

/// No motion sensor available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMotion;

impl MotionSource for NoMotion {
    fn camera_motion(&self) -> Option<CameraMotion> {
        None
    }
}

/// Constant shift every tick.
#[derive(Debug, Clone, Copy)]
pub struct StaticMotion(pub CameraMotion);

impl MotionSource for StaticMotion {
    fn camera_motion(&self) -> Option<CameraMotion> {
        Some(self.0)
    }
}

#[derive(Debug, Default)]
struct OrientationState {
    last: Option<(f32, f32)>,
    pending_yaw: f32,
    pending_pitch: f32,
}

/// Converts device orientation readings into screen-space shift.
///
/// Yaw grows when the device turns right, pitch when it tilts up, both in
/// degrees. Rotation accumulated between two `camera_motion` calls is
/// divided by the camera field of view: turning right by a full
/// horizontal FOV shifts the scene one screen width to the left.
#[derive(Debug)]
pub struct OrientationMotion {
    horizontal_fov_deg: f32,
    vertical_fov_deg: f32,
    state: Mutex<OrientationState>,
}

impl OrientationMotion {
    pub fn new(horizontal_fov_deg: f32, vertical_fov_deg: f32) -> Self {
        Self {
            horizontal_fov_deg,
            vertical_fov_deg,
            state: Mutex::new(OrientationState::default()),
        }
    }

    /// Feed one sensor reading.
    pub fn record(&self, yaw_deg: f32, pitch_deg: f32) {
        if !yaw_deg.is_finite() || !pitch_deg.is_finite() {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((last_yaw, last_pitch)) = state.last {
            state.pending_yaw += wrap_degrees(yaw_deg - last_yaw);
            state.pending_pitch += pitch_deg - last_pitch;
        }
        state.last = Some((yaw_deg, pitch_deg));
    }
}

impl MotionSource for OrientationMotion {
    fn camera_motion(&self) -> Option<CameraMotion> {
        if self.horizontal_fov_deg <= 0.0 || self.vertical_fov_deg <= 0.0 {
            return None;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.last.is_none() {
            return None;
        }
        let motion = CameraMotion::new(
            state.pending_yaw / self.horizontal_fov_deg,
            -state.pending_pitch / self.vertical_fov_deg,
        );
        state.pending_yaw = 0.0;
        state.pending_pitch = 0.0;
        Some(motion)
    }
}

/// Map an angle difference into `[-180, 180)`.
fn wrap_degrees(delta: f32) -> f32 {
    (delta + 180.0).rem_euclid(360.0) - 180.0
}
