//! Object tracking and label fusion for AR annotation overlays.
//!
//! Per-frame detections from a fast local detector are associated to
//! persistent tracks, coasted through detection gaps with a
//! camera-compensated motion model, and smoothed for display. A slower,
//! authoritative detector refines track labels without touching geometry.
//!
//! - [`tracker`] is the engine: pure, single-threaded, time injected.
//! - [`integration`] wires detectors, frames, motion and a clock into two
//!   periodic cycles sharing one [`Tracker`].

pub mod error;
pub mod integration;
pub mod tracker;

pub use error::{ConfigError, DetectorError, ResponseError};
pub use integration::{
    DetectionBuilder, DetectionSource, Frame, Orchestrator, OverlayConfig, OverlaySources,
};
pub use tracker::{
    CameraMotion, ColorTag, Detection, Rect, Snapshot, SnapshotEntry, SourceKind, Track, TrackId,
    TrackState, Tracker, TrackerConfig,
};
