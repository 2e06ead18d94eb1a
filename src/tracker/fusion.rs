//! Label fusion from the refined detector.
//!
//! Refined detections are slower and spatially stale, so they only ever
//! change a track's label and lock it. Geometry stays with the fast path.

use tracing::debug;

use crate::tracker::config::TrackerConfig;
use crate::tracker::detection::Detection;
use crate::tracker::rect::{Rect, iou_batch};
use crate::tracker::track::TrackId;
use crate::tracker::track_state::TrackState;
use crate::tracker::track_store::TrackStore;

/// Outcome of one fusion pass. Indices refer to the input batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FusionReport {
    /// Detections whose label was fused into an existing track
    pub fused: Vec<(usize, TrackId)>,
    /// Detections that created a new, already locked track
    pub created: Vec<(usize, TrackId)>,
    /// Malformed detections
    pub rejected: Vec<usize>,
}

/// Fuse a batch of refined detections into `store`.
///
/// Each detection relabels the track it overlaps most, provided the IoU
/// exceeds the fusion threshold; otherwise it becomes a new locked track.
/// Confidence does not gate fusion.
pub fn fuse(
    store: &mut TrackStore,
    config: &TrackerConfig,
    detections: &[Detection],
    now_ms: u64,
) -> FusionReport {
    let mut report = FusionReport::default();

    for (idx, det) in detections.iter().enumerate() {
        if !det.is_well_formed() {
            report.rejected.push(idx);
            continue;
        }

        // Tracks born earlier in this batch are candidates too.
        let ids = store.ids();
        let boxes: Vec<Rect> = store.all().map(|t| t.smoothed_box).collect();
        let ious = iou_batch(&[det.bbox], &boxes);

        let mut best: Option<(usize, f32)> = None;
        for (col, &iou) in ious.row(0).iter().enumerate() {
            if best.is_none_or(|(_, b)| iou > b) {
                best = Some((col, iou));
            }
        }

        match best {
            Some((col, iou)) if iou > config.fusion_threshold => {
                let id = ids[col];
                if let Some(track) = store.get_mut(id) {
                    debug!(
                        track = %id,
                        from = %track.label,
                        to = %det.label,
                        iou,
                        "refined label fused"
                    );
                    track.apply_refined_label(det);
                    report.fused.push((idx, id));
                }
            }
            _ => {
                let track = store.create(det, TrackState::Locked, now_ms);
                debug!(
                    track = %track.id,
                    label = %track.label,
                    "track born from refined detection"
                );
                report.created.push((idx, track.id));
            }
        }
    }

    report
}
