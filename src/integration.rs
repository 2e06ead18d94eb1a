//! Integration module connecting the tracker to its platform collaborators.
//!
//! This module provides the seams the platform adapter plugs into: detector
//! backends, the camera frame mailbox, camera-motion and clock sources, and
//! the orchestrator that drives the fast and refined cycles.

mod builder;
mod clock;
mod detector;
mod frame;
mod motion;
mod pipeline;
mod refined_response;
mod worker;

pub use builder::DetectionBuilder;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use detector::{DetectionSource, FnDetector};
pub use frame::{Frame, FrameSource, LatestFrame};
pub use motion::{MotionSource, NoMotion, OrientationMotion, StaticMotion};
pub use pipeline::{
    FastCycle, Orchestrator, OrchestratorError, OverlayConfig, OverlaySources, RefinedCycle,
};
pub use refined_response::{
    DEFAULT_REFINED_CONFIDENCE, JsonReplyDetector, ReplyDetectorError, parse_refined_response,
};
pub use worker::DetectorWorker;
