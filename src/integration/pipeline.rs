//! Frame orchestrator: drives the fast and refined cycles against one tracker.
//!
//! Both cycles run on their own thread and share the [`Tracker`] behind a
//! single mutex. Detector calls happen outside the lock; each pass
//! (association + expiry, or fusion + expiry) holds it from start to end.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, select};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, DetectorError};
use crate::integration::clock::Clock;
use crate::integration::detector::DetectionSource;
use crate::integration::frame::FrameSource;
use crate::integration::motion::MotionSource;
use crate::integration::worker::DetectorWorker;
use crate::tracker::{Detection, FastPass, RefinedPass, Snapshot, Tracker, TrackerConfig};

/// Snapshots the renderer may fall behind by before new ones are dropped.
const SNAPSHOT_BACKLOG: usize = 2;

/// Full overlay configuration: cycle timing plus tracker parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayConfig {
    /// Minimum spacing between fast-cycle ticks
    pub processing_interval_ms: u64,
    /// Minimum spacing between refined-cycle ticks
    pub refined_interval_ms: u64,
    /// Fast detector calls slower than this count as an empty batch
    pub fast_timeout_ms: u64,
    /// Refined detector calls slower than this count as an empty batch
    pub refined_timeout_ms: u64,
    #[serde(flatten)]
    pub tracker: TrackerConfig,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            processing_interval_ms: 100,
            refined_interval_ms: 1_500,
            fast_timeout_ms: 250,
            refined_timeout_ms: 5_000,
            tracker: TrackerConfig::default(),
        }
    }
}

impl OverlayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("processingIntervalMs", self.processing_interval_ms),
            ("refinedIntervalMs", self.refined_interval_ms),
            ("fastTimeoutMs", self.fast_timeout_ms),
            ("refinedTimeoutMs", self.refined_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::NotPositive { name });
            }
        }
        self.tracker.validate()
    }

    /// Parse and validate a JSON configuration. Missing keys take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: OverlayConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to start worker thread: {0}")]
    Spawn(#[from] io::Error),
}

/// External collaborators shared by both cycles.
#[derive(Clone)]
pub struct OverlaySources {
    pub frames: Arc<dyn FrameSource>,
    pub motion: Arc<dyn MotionSource>,
    pub clock: Arc<dyn Clock>,
}

fn lock(tracker: &Mutex<Tracker>) -> MutexGuard<'_, Tracker> {
    // A pass never leaves the tracker half-updated, so a poisoned lock
    // still guards a consistent store.
    tracker.lock().unwrap_or_else(PoisonError::into_inner)
}

fn run_detector(worker: &DetectorWorker, sources: &OverlaySources) -> Option<Vec<Detection>> {
    let frame = sources.frames.latest_frame()?;
    match worker.detect(frame) {
        Ok(detections) => Some(detections),
        Err(err @ (DetectorError::Busy | DetectorError::Timeout(_))) => {
            warn!(detector = worker.name(), %err, "no detections this tick");
            Some(Vec::new())
        }
        Err(err) => {
            warn!(detector = worker.name(), %err, "detector failed; treating as empty batch");
            Some(Vec::new())
        }
    }
}

/// One fast-cycle step: detect, associate, expire, publish a snapshot.
pub struct FastCycle {
    tracker: Arc<Mutex<Tracker>>,
    detector: DetectorWorker,
    sources: OverlaySources,
    snapshots: Sender<Snapshot>,
}

impl FastCycle {
    pub fn new(
        tracker: Arc<Mutex<Tracker>>,
        detector: DetectorWorker,
        sources: OverlaySources,
        snapshots: Sender<Snapshot>,
    ) -> Self {
        Self {
            tracker,
            detector,
            sources,
            snapshots,
        }
    }

    /// Without a frame this is a prediction-only pass.
    pub fn run_once(&self) -> FastPass {
        let detections = run_detector(&self.detector, &self.sources).unwrap_or_default();
        let camera = self.sources.motion.camera_motion().unwrap_or_default();
        let now = self.sources.clock.now_ms();

        let pass = lock(&self.tracker).update(&detections, camera, now);

        match self.snapshots.try_send(pass.snapshot.clone()) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(_)) => debug!("renderer is behind; snapshot dropped"),
        }
        pass
    }
}

/// One refined-cycle step: detect, fuse, expire.
pub struct RefinedCycle {
    tracker: Arc<Mutex<Tracker>>,
    detector: DetectorWorker,
    sources: OverlaySources,
}

impl RefinedCycle {
    pub fn new(
        tracker: Arc<Mutex<Tracker>>,
        detector: DetectorWorker,
        sources: OverlaySources,
    ) -> Self {
        Self {
            tracker,
            detector,
            sources,
        }
    }

    /// Returns `None` when there is no frame to send yet.
    pub fn run_once(&self) -> Option<RefinedPass> {
        let detections = run_detector(&self.detector, &self.sources)?;
        let now = self.sources.clock.now_ms();
        Some(lock(&self.tracker).refine(&detections, now))
    }
}

/// Runs both cycles on background threads until stopped.
///
/// # Example
///
/// ```ignore
/// let frames = LatestFrame::new();
/// let sources = OverlaySources {
///     frames: Arc::new(frames.clone()),
///     motion: Arc::new(NoMotion),
///     clock: Arc::new(MonotonicClock::new()),
/// };
/// let overlay = Orchestrator::spawn(OverlayConfig::default(), fast, refined, sources)?;
/// for snapshot in overlay.snapshots() {
///     draw(&snapshot);
/// }
/// ```
pub struct Orchestrator {
    tracker: Arc<Mutex<Tracker>>,
    clock: Arc<dyn Clock>,
    snapshots: Receiver<Snapshot>,
    stop: Option<Sender<()>>,
    handles: Vec<JoinHandle<()>>,
}

impl Orchestrator {
    pub fn spawn<F, R>(
        config: OverlayConfig,
        fast: F,
        refined: R,
        sources: OverlaySources,
    ) -> Result<Self, OrchestratorError>
    where
        F: DetectionSource + Send + 'static,
        R: DetectionSource + Send + 'static,
    {
        config.validate()?;
        let tracker = Arc::new(Mutex::new(Tracker::new(config.tracker.clone())?));
        let (snapshot_tx, snapshot_rx) = bounded(SNAPSHOT_BACKLOG);
        let (stop_tx, stop_rx) = bounded::<()>(0);

        let fast_cycle = FastCycle::new(
            Arc::clone(&tracker),
            DetectorWorker::spawn("fast", fast, Duration::from_millis(config.fast_timeout_ms))?,
            sources.clone(),
            snapshot_tx,
        );
        let refined_cycle = RefinedCycle::new(
            Arc::clone(&tracker),
            DetectorWorker::spawn(
                "refined",
                refined,
                Duration::from_millis(config.refined_timeout_ms),
            )?,
            sources.clone(),
        );

        let mut orchestrator = Self {
            tracker,
            clock: sources.clock,
            snapshots: snapshot_rx,
            stop: Some(stop_tx),
            handles: Vec::with_capacity(2),
        };

        let fast_interval = Duration::from_millis(config.processing_interval_ms);
        let fast_stop = stop_rx.clone();
        orchestrator.handles.push(
            thread::Builder::new()
                .name("fast-cycle".into())
                .spawn(move || {
                    drive(fast_interval, &fast_stop, || {
                        fast_cycle.run_once();
                    })
                })?,
        );

        let refined_interval = Duration::from_millis(config.refined_interval_ms);
        orchestrator.handles.push(
            thread::Builder::new()
                .name("refined-cycle".into())
                .spawn(move || {
                    drive(refined_interval, &stop_rx, || {
                        refined_cycle.run_once();
                    })
                })?,
        );

        info!(
            fast_interval_ms = config.processing_interval_ms,
            refined_interval_ms = config.refined_interval_ms,
            "overlay started"
        );
        Ok(orchestrator)
    }

    /// Snapshots published after each fast-cycle pass.
    pub fn snapshots(&self) -> &Receiver<Snapshot> {
        &self.snapshots
    }

    /// Snapshot of the current store, independent of the channel.
    pub fn latest_snapshot(&self) -> Snapshot {
        let now = self.clock.now_ms();
        lock(&self.tracker).snapshot(now)
    }

    /// Read-only access to the tracker between passes.
    pub fn inspect<T>(&self, f: impl FnOnce(&Tracker) -> T) -> T {
        f(&lock(&self.tracker))
    }

    /// Stop both cycles. Passes already running complete first.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.stop.take().is_none() {
            return;
        }
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                warn!("cycle thread panicked");
            }
        }
        info!("overlay stopped");
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Call `step` at most once per `interval` until `stop` disconnects.
fn drive(interval: Duration, stop: &Receiver<()>, mut step: impl FnMut()) {
    let mut next = Instant::now() + interval;
    loop {
        let wait = next.saturating_duration_since(Instant::now());
        select! {
            recv(stop) -> _ => break,
            default(wait) => {
                next = Instant::now() + interval;
                step();
            }
        }
    }
}
