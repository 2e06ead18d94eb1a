//! Single tracked object (Track) for label anchoring.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tracker::detection::{ColorTag, Detection};
use crate::tracker::rect::{Displacement, Rect, exponential_smooth};
use crate::tracker::track_state::TrackState;

/// Weight of the newest displacement sample in the velocity estimate.
const VELOCITY_SAMPLE_WEIGHT: f32 = 0.3;
/// Upper bound on the adaptive smoothing factor.
const MAX_SMOOTHING: f32 = 0.6;
/// How strongly speed raises the smoothing factor.
const SPEED_GAIN: f32 = 2.0;

/// Opaque track identifier, unique for the lifetime of a [`TrackStore`].
///
/// [`TrackStore`]: crate::tracker::TrackStore
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Smoothed per-tick displacement estimate.
pub type Velocity = Displacement;

/// Single tracked object.
#[derive(Debug, Clone)]
pub struct Track {
    /// Unique track identifier
    pub id: TrackId,
    /// Currently displayed label
    pub label: String,
    pub color: ColorTag,
    /// Last box received from a matching detection
    pub raw_box: Rect,
    /// Exponentially smoothed display box
    pub smoothed_box: Rect,
    /// Motion-extrapolated box; equals `smoothed_box` until a tick is missed
    pub predicted_box: Rect,
    pub velocity: Velocity,
    /// Confidence of the last matching detection
    pub confidence: f32,
    /// Clock time (ms) of the last match or of creation
    pub last_matched_at: u64,
    /// Consecutive ticks without a match
    pub missed_frame_count: u32,
    pub state: TrackState,
}

impl Track {
    /// Create a track from a detection. All three boxes start at the detection box.
    ///
    /// The initial state is chosen by the caller: association births are
    /// `Tentative` and fusion births `Locked`, whatever the detection's source.
    pub fn new(id: TrackId, detection: &Detection, state: TrackState, now_ms: u64) -> Self {
        Self {
            id,
            label: detection.label.clone(),
            color: detection.color,
            raw_box: detection.bbox,
            smoothed_box: detection.bbox,
            predicted_box: detection.bbox,
            velocity: Velocity::ZERO,
            confidence: detection.confidence,
            last_matched_at: now_ms,
            missed_frame_count: 0,
            state,
        }
    }

    pub fn refined_label_locked(&self) -> bool {
        self.state.is_locked()
    }

    /// True while the track is being coasted on prediction.
    pub fn is_predicted(&self) -> bool {
        self.missed_frame_count > 0
    }

    /// Box the renderer should draw.
    pub fn display_box(&self) -> Rect {
        if self.is_predicted() {
            self.predicted_box
        } else {
            self.smoothed_box
        }
    }

    /// Milliseconds since the last match, saturating at zero for clocks
    /// that read earlier than `last_matched_at`.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_matched_at)
    }

    pub(crate) fn mark_missed(&mut self) {
        self.missed_frame_count = self.missed_frame_count.saturating_add(1);
    }

    /// Apply a fast-source match: geometry, velocity and confidence always
    /// follow the detection; label and color only while unlocked.
    pub(crate) fn apply_match(&mut self, detection: &Detection, base_smoothing: f32, now_ms: u64) {
        self.missed_frame_count = 0;
        self.last_matched_at = now_ms;
        self.confidence = detection.confidence;

        if !self.refined_label_locked() {
            self.label.clone_from(&detection.label);
            self.color = detection.color;
        }
        self.state = self.state.on_fast_match();

        let sample = self.raw_box.displacement_to(&detection.bbox);
        self.velocity = self.velocity.blend(&sample, VELOCITY_SAMPLE_WEIGHT);
        self.raw_box = detection.bbox;

        let alpha = (base_smoothing + sample.magnitude() * SPEED_GAIN).min(MAX_SMOOTHING);
        self.smoothed_box = exponential_smooth(Some(&self.smoothed_box), &detection.bbox, alpha);
        self.predicted_box = self.smoothed_box;
    }

    /// Take over a refined label. Geometry is left untouched.
    pub(crate) fn apply_refined_label(&mut self, detection: &Detection) {
        self.label.clone_from(&detection.label);
        self.color = detection.color;
        self.state = self.state.on_fusion();
    }
}
