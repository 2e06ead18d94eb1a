mod association;
mod config;
mod detection;
mod engine;
mod fusion;
mod lifecycle;
mod predictor;
mod rect;
mod snapshot;
mod track;
mod track_state;
mod track_store;

pub use association::{
    AssignmentResult, AssociationReport, Candidate, UNMATCHABLE, associate, greedy_assignment,
    match_score, score_matrix,
};
pub use config::TrackerConfig;
pub use detection::{ColorTag, Detection, SourceKind};
pub use engine::{FastPass, RefinedPass, Tracker};
pub use fusion::{FusionReport, fuse};
pub use lifecycle::{expire, is_expired};
pub use predictor::{CameraMotion, MotionPredictor};
pub use rect::{
    Displacement, Rect, center_distance, displacement, exponential_smooth, iou, iou_batch,
};
pub use snapshot::{Snapshot, SnapshotEntry};
pub use track::{Track, TrackId, Velocity};
pub use track_state::TrackState;
pub use track_store::TrackStore;
