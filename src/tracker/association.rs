//! Per-tick association of detections to tracks.
//!
//! Matching is greedy in detection input order: each detection takes the
//! best-scoring track still free, so a track is matched at most once per
//! tick. There is no global optimisation; earlier detections win ties.

use ndarray::Array2;
use tracing::debug;

use crate::tracker::config::TrackerConfig;
use crate::tracker::detection::Detection;
use crate::tracker::predictor::{CameraMotion, MotionPredictor};
use crate::tracker::rect::Rect;
use crate::tracker::track::TrackId;
use crate::tracker::track_state::TrackState;
use crate::tracker::track_store::TrackStore;

/// Weight of overlap in the match score; the rest goes to center proximity.
const IOU_WEIGHT: f32 = 0.7;
const PROXIMITY_WEIGHT: f32 = 0.3;
/// Center distance under which a pair is a candidate regardless of overlap.
const MAX_CENTER_DISTANCE: f32 = 0.3;

/// Score of a pair that failed gating.
pub const UNMATCHABLE: f32 = f32::NEG_INFINITY;

/// Boxes of one track considered during matching.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub id: TrackId,
    pub predicted: Rect,
    pub smoothed: Rect,
}

/// Outcome of one association pass. Indices refer to the input batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssociationReport {
    /// Detections that updated an existing track
    pub matched: Vec<(usize, TrackId)>,
    /// Detections that started a new track
    pub created: Vec<(usize, TrackId)>,
    /// Well-formed detections below the confidence threshold
    pub filtered: Vec<usize>,
    /// Malformed detections
    pub rejected: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_detections: Vec<usize>,
}

/// Similarity of a detection to a track, or [`UNMATCHABLE`] when the pair
/// neither overlaps enough nor sits close enough.
pub fn match_score(detection: &Rect, candidate: &Candidate, tracking_threshold: f32) -> f32 {
    let iou = detection
        .iou(&candidate.predicted)
        .max(detection.iou(&candidate.smoothed));
    let dist = detection.center_distance(&candidate.smoothed);

    if iou > tracking_threshold || dist < MAX_CENTER_DISTANCE {
        IOU_WEIGHT * iou + PROXIMITY_WEIGHT * (1.0 / (1.0 + dist))
    } else {
        UNMATCHABLE
    }
}

/// Score matrix of shape (detections, candidates).
pub fn score_matrix(
    detections: &[Rect],
    candidates: &[Candidate],
    tracking_threshold: f32,
) -> Array2<f32> {
    let mut scores = Array2::from_elem((detections.len(), candidates.len()), UNMATCHABLE);
    for (i, d) in detections.iter().enumerate() {
        for (j, c) in candidates.iter().enumerate() {
            scores[[i, j]] = match_score(d, c, tracking_threshold);
        }
    }
    scores
}

/// Row-by-row greedy assignment. Each row takes the highest-scoring free
/// column; the first column wins ties. Columns are used at most once.
pub fn greedy_assignment(scores: &Array2<f32>) -> AssignmentResult {
    let (num_rows, num_cols) = scores.dim();
    let mut taken = vec![false; num_cols];
    let mut matches = Vec::new();
    let mut unmatched_detections = Vec::new();

    for (row, row_scores) in scores.rows().into_iter().enumerate() {
        let mut best: Option<(usize, f32)> = None;
        for (col, &score) in row_scores.iter().enumerate() {
            if taken[col] || score == UNMATCHABLE || score.is_nan() {
                continue;
            }
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((col, score));
            }
        }
        match best {
            Some((col, _)) => {
                taken[col] = true;
                matches.push((row, col));
            }
            None => unmatched_detections.push(row),
        }
    }
    debug_assert_eq!(matches.len() + unmatched_detections.len(), num_rows);

    AssignmentResult {
        matches,
        unmatched_detections,
    }
}

/// Run one association pass against `store`.
///
/// Every live track first counts a miss and gets a fresh prediction; a
/// match then resets it. Surviving detections either update exactly one
/// track or create exactly one. No track is deleted here.
pub fn associate(
    store: &mut TrackStore,
    config: &TrackerConfig,
    detections: &[Detection],
    camera: CameraMotion,
    now_ms: u64,
) -> AssociationReport {
    let predictor = MotionPredictor::new(config.max_missed_frames);
    let camera = camera.sanitized();
    let mut report = AssociationReport::default();

    // Step 1: predict
    for track in store.all_mut() {
        track.mark_missed();
        track.predicted_box = predictor.predict(track, camera);
    }

    // Step 2: filter
    let mut accepted = Vec::with_capacity(detections.len());
    for (idx, det) in detections.iter().enumerate() {
        if !det.is_well_formed() {
            report.rejected.push(idx);
        } else if det.confidence < config.min_confidence {
            report.filtered.push(idx);
        } else {
            accepted.push(idx);
        }
    }

    // Step 3: greedy matching
    let candidates: Vec<Candidate> = store
        .all()
        .map(|t| Candidate {
            id: t.id,
            predicted: t.predicted_box,
            smoothed: t.smoothed_box,
        })
        .collect();
    let det_rects: Vec<Rect> = accepted.iter().map(|&i| detections[i].bbox).collect();
    let scores = score_matrix(&det_rects, &candidates, config.tracking_threshold);
    let AssignmentResult {
        matches,
        unmatched_detections,
    } = greedy_assignment(&scores);

    // Step 4: update matched tracks
    for (row, col) in matches {
        let idx = accepted[row];
        let id = candidates[col].id;
        if let Some(track) = store.get_mut(id) {
            track.apply_match(&detections[idx], config.base_smoothing_factor, now_ms);
            report.matched.push((idx, id));
        }
    }

    // Step 5: births, unlocked whatever the source
    for row in unmatched_detections {
        let idx = accepted[row];
        let track = store.create(&detections[idx], TrackState::Tentative, now_ms);
        debug!(track = %track.id, label = %track.label, "track born");
        report.created.push((idx, track.id));
    }

    debug!(
        matched = report.matched.len(),
        created = report.created.len(),
        filtered = report.filtered.len(),
        rejected = report.rejected.len(),
        "association pass"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::detection::ColorTag;

    fn candidate(id: u64, rect: Rect) -> Candidate {
        Candidate {
            id: TrackId(id),
            predicted: rect,
            smoothed: rect,
        }
    }

    fn fast(label: &str, rect: Rect, confidence: f32) -> Detection {
        Detection::fast(label, rect, confidence, ColorTag::Yellow)
    }

    #[test]
    fn test_score_gating() {
        let c = candidate(1, Rect::new(0.1, 0.1, 0.2, 0.2));
        // Same box: iou 1, distance 0
        let same = match_score(&Rect::new(0.1, 0.1, 0.2, 0.2), &c, 0.3);
        assert!((same - 1.0).abs() < 1e-6);

        // Far away and disjoint
        let far = match_score(&Rect::new(0.8, 0.8, 0.1, 0.1), &c, 0.3);
        assert_eq!(far, UNMATCHABLE);

        // Disjoint but centers close: proximity alone passes the gate
        let near = match_score(&Rect::new(0.31, 0.1, 0.05, 0.05), &c, 0.3);
        assert!(near > 0.0 && near < PROXIMITY_WEIGHT + 1e-6);
    }

    #[test]
    fn test_score_uses_best_of_predicted_and_smoothed() {
        let c = Candidate {
            id: TrackId(1),
            predicted: Rect::new(0.5, 0.5, 0.2, 0.2),
            smoothed: Rect::new(0.1, 0.1, 0.2, 0.2),
        };
        let at_prediction = match_score(&Rect::new(0.5, 0.5, 0.2, 0.2), &c, 0.3);
        // iou 1 against prediction, distance measured against smoothed box
        let dist = (0.4f32 * 0.4 * 2.0).sqrt();
        assert!((at_prediction - (0.7 + 0.3 / (1.0 + dist))).abs() < 1e-5);
    }

    #[test]
    fn test_greedy_first_detection_wins() {
        let candidates = [candidate(1, Rect::new(0.1, 0.1, 0.2, 0.2))];
        let dets = [Rect::new(0.12, 0.1, 0.2, 0.2), Rect::new(0.1, 0.1, 0.2, 0.2)];
        let result = greedy_assignment(&score_matrix(&dets, &candidates, 0.3));
        // The second detection fits better but comes later in input order.
        assert_eq!(result.matches, vec![(0, 0)]);
        assert_eq!(result.unmatched_detections, vec![1]);
    }

    #[test]
    fn test_greedy_picks_best_free_track() {
        let candidates = [
            candidate(1, Rect::new(0.1, 0.1, 0.2, 0.2)),
            candidate(2, Rect::new(0.15, 0.1, 0.2, 0.2)),
        ];
        let dets = [Rect::new(0.15, 0.1, 0.2, 0.2), Rect::new(0.15, 0.1, 0.2, 0.2)];
        let result = greedy_assignment(&score_matrix(&dets, &candidates, 0.3));
        assert_eq!(result.matches, vec![(0, 1), (1, 0)]);
        assert!(result.unmatched_detections.is_empty());
    }

    #[test]
    fn test_greedy_tie_goes_to_first_column() {
        let scores = Array2::from_elem((1, 3), 0.5);
        assert_eq!(greedy_assignment(&scores).matches, vec![(0, 0)]);
    }

    #[test]
    fn test_empty_inputs() {
        let empty = greedy_assignment(&Array2::from_elem((0, 2), 0.0));
        assert!(empty.matches.is_empty() && empty.unmatched_detections.is_empty());

        let no_tracks = greedy_assignment(&Array2::from_elem((2, 0), 0.0));
        assert_eq!(no_tracks.unmatched_detections, vec![0, 1]);
    }

    #[test]
    fn test_associate_filters_and_rejects() {
        let mut store = TrackStore::new();
        let config = TrackerConfig::default();
        let mut broken = fast("x", Rect::new(0.1, 0.1, 0.1, 0.1), 0.9);
        broken.bbox.y = f32::INFINITY;
        let dets = vec![
            fast("weak", Rect::new(0.5, 0.5, 0.1, 0.1), 0.2),
            broken,
            fast("stop_sign", Rect::new(0.1, 0.1, 0.2, 0.2), 0.9),
        ];

        let report = associate(&mut store, &config, &dets, CameraMotion::ZERO, 0);
        assert_eq!(report.filtered, vec![0]);
        assert_eq!(report.rejected, vec![1]);
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.created[0].0, 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_associate_births_are_unlocked_for_any_source() {
        let mut store = TrackStore::new();
        let config = TrackerConfig::default();
        let bbox = Rect::new(0.1, 0.1, 0.2, 0.2);
        let det = Detection::refined("stop_sign", bbox, 0.9, ColorTag::Red);

        let report = associate(&mut store, &config, &[det], CameraMotion::ZERO, 0);
        let track = store.get(report.created[0].1).unwrap();
        assert!(!track.refined_label_locked());
        assert_eq!(track.state, TrackState::Tentative);

        // A later fast match may still relabel it.
        let report = associate(
            &mut store,
            &config,
            &[fast("yield_sign", Rect::new(0.1, 0.1, 0.2, 0.2), 0.9)],
            CameraMotion::ZERO,
            10,
        );
        let track = store.get(report.matched[0].1).unwrap();
        assert_eq!(track.label, "yield_sign");
    }

    #[test]
    fn test_associate_empty_batch_only_coasts() {
        let mut store = TrackStore::new();
        let config = TrackerConfig::default();
        associate(
            &mut store,
            &config,
            &[fast("car", Rect::new(0.1, 0.1, 0.2, 0.2), 0.9)],
            CameraMotion::ZERO,
            0,
        );
        for tick in 1..=20u32 {
            let report = associate(&mut store, &config, &[], CameraMotion::ZERO, tick as u64);
            assert_eq!(report, AssociationReport::default());
            assert_eq!(store.len(), 1);
            assert_eq!(store.all().next().map(|t| t.missed_frame_count), Some(tick));
        }
    }
}
