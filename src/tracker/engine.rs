//! Tracker: the per-store engine sequencing association, fusion and expiry.

use crate::error::ConfigError;
use crate::tracker::association::{self, AssociationReport};
use crate::tracker::config::TrackerConfig;
use crate::tracker::detection::Detection;
use crate::tracker::fusion::{self, FusionReport};
use crate::tracker::lifecycle;
use crate::tracker::predictor::CameraMotion;
use crate::tracker::snapshot::Snapshot;
use crate::tracker::track::TrackId;
use crate::tracker::track_store::TrackStore;

/// Result of one fast-cycle pass.
#[derive(Debug, Clone)]
pub struct FastPass {
    pub association: AssociationReport,
    pub expired: Vec<TrackId>,
    pub snapshot: Snapshot,
}

/// Result of one refined-cycle pass.
#[derive(Debug, Clone)]
pub struct RefinedPass {
    pub fusion: FusionReport,
    pub expired: Vec<TrackId>,
}

/// Owns one track store and the configuration driving it.
///
/// Every method takes `&mut self`, so a pass can never interleave with
/// another on the same store; share a `Tracker` across threads behind a
/// single mutex held for a whole pass.
#[derive(Debug, Clone)]
pub struct Tracker {
    store: TrackStore,
    config: TrackerConfig,
}

impl Tracker {
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            store: TrackStore::new(),
            config,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn store(&self) -> &TrackStore {
        &self.store
    }

    /// Predict, match and create. Never deletes tracks.
    pub fn associate(
        &mut self,
        detections: &[Detection],
        camera: CameraMotion,
        now_ms: u64,
    ) -> AssociationReport {
        association::associate(&mut self.store, &self.config, detections, camera, now_ms)
    }

    /// Fuse refined labels. Never moves or deletes tracks.
    pub fn fuse(&mut self, detections: &[Detection], now_ms: u64) -> FusionReport {
        fusion::fuse(&mut self.store, &self.config, detections, now_ms)
    }

    pub fn expire(&mut self, now_ms: u64) -> Vec<TrackId> {
        lifecycle::expire(&mut self.store, &self.config, now_ms)
    }

    pub fn snapshot(&self, now_ms: u64) -> Snapshot {
        Snapshot::capture(&self.store, now_ms)
    }

    /// One fast-cycle step: association, expiry, then a snapshot.
    pub fn update(
        &mut self,
        detections: &[Detection],
        camera: CameraMotion,
        now_ms: u64,
    ) -> FastPass {
        let association = self.associate(detections, camera, now_ms);
        let expired = self.expire(now_ms);
        FastPass {
            association,
            expired,
            snapshot: self.snapshot(now_ms),
        }
    }

    /// One refined-cycle step: fusion, then expiry.
    pub fn refine(&mut self, detections: &[Detection], now_ms: u64) -> RefinedPass {
        let fusion = self.fuse(detections, now_ms);
        let expired = self.expire(now_ms);
        RefinedPass { fusion, expired }
    }
}
