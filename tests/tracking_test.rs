use std::collections::HashSet;

use anchortrack::tracker::{associate, exponential_smooth, iou};
use anchortrack::{CameraMotion, ColorTag, Detection, Rect, TrackState, Tracker, TrackerConfig};
use assert_approx_eq::assert_approx_eq;

fn fast(label: &str, x: f32, y: f32, w: f32, h: f32) -> Detection {
    Detection::fast(label, Rect::new(x, y, w, h), 0.9, ColorTag::Red)
}

fn refined(label: &str, x: f32, y: f32, w: f32, h: f32) -> Detection {
    Detection::refined(label, Rect::new(x, y, w, h), 0.85, ColorTag::Green)
}

fn tracker() -> Tracker {
    Tracker::new(TrackerConfig::default()).unwrap()
}

#[test]
fn test_new_track_from_empty_store() {
    let mut tracker = tracker();
    let report = tracker.associate(&[fast("stop_sign", 0.1, 0.1, 0.2, 0.2)], CameraMotion::ZERO, 0);

    assert_eq!(report.created.len(), 1);
    assert!(report.matched.is_empty());
    assert_eq!(tracker.store().len(), 1);

    let track = tracker.store().get(report.created[0].1).unwrap();
    assert_eq!(track.label, "stop_sign");
    assert_eq!(track.smoothed_box, Rect::new(0.1, 0.1, 0.2, 0.2));
    assert_eq!(track.missed_frame_count, 0);
}

#[test]
fn test_small_shift_keeps_identity() {
    let mut tracker = tracker();
    let id = tracker
        .associate(&[fast("stop_sign", 0.1, 0.1, 0.2, 0.2)], CameraMotion::ZERO, 0)
        .created[0]
        .1;

    let shifted = fast("stop_sign", 0.12, 0.1, 0.2, 0.2);
    let report = tracker.associate(&[shifted], CameraMotion::ZERO, 100);
    assert_eq!(report.matched, vec![(0, id)]);
    assert!(report.created.is_empty());

    let track = tracker.store().get(id).unwrap();
    assert!(track.velocity.dx > 0.0);
    assert!(track.smoothed_box.x > 0.1 && track.smoothed_box.x < 0.12);
    assert_eq!(track.state, TrackState::Confirmed);
}

#[test]
fn test_track_coasts_then_expires() {
    let config = TrackerConfig::default();
    let max = config.max_missed_frames;
    let mut tracker = Tracker::new(config).unwrap();
    let id = tracker
        .update(&[fast("hazard", 0.4, 0.4, 0.2, 0.2)], CameraMotion::ZERO, 0)
        .snapshot
        .entries[0]
        .id;

    for tick in 1..=max {
        let pass = tracker.update(&[], CameraMotion::ZERO, u64::from(tick) * 10);
        let entry = pass.snapshot.get(id).expect("still visible while coasting");
        assert!(entry.is_predicted);
        assert!(pass.expired.is_empty());
    }

    let pass = tracker.update(&[], CameraMotion::ZERO, u64::from(max + 1) * 10);
    assert_eq!(pass.expired, vec![id]);
    assert!(tracker.store().get(id).is_none());
    assert!(pass.snapshot.is_empty());
}

#[test]
fn test_refined_label_replaces_fast_label_without_moving_box() {
    let mut tracker = tracker();
    let id = tracker
        .associate(&[fast("sign", 0.1, 0.1, 0.2, 0.2)], CameraMotion::ZERO, 0)
        .created[0]
        .1;
    let before = tracker.store().get(id).unwrap().smoothed_box;

    // Shift by a third of the width: IoU 0.5
    let shifted = Rect::new(0.1 + 0.2 / 3.0, 0.1, 0.2, 0.2);
    assert_approx_eq!(iou(&before, &shifted), 0.5, 1e-5);

    let report = tracker.fuse(&[Detection::refined("stop_sign", shifted, 0.85, ColorTag::Red)], 50);
    assert_eq!(report.fused, vec![(0, id)]);

    let track = tracker.store().get(id).unwrap();
    assert_eq!(track.label, "stop_sign");
    assert!(track.refined_label_locked());
    assert_eq!(track.smoothed_box, before);
}

#[test]
fn test_locked_label_survives_fast_matches() {
    let mut tracker = tracker();
    let id = tracker
        .associate(&[fast("sign", 0.1, 0.1, 0.2, 0.2)], CameraMotion::ZERO, 0)
        .created[0]
        .1;
    tracker.fuse(&[refined("stop_sign", 0.1, 0.1, 0.2, 0.2)], 10);

    for (tick, x) in [0.11f32, 0.12, 0.13].into_iter().enumerate() {
        let mut det = fast("yield_sign", x, 0.1, 0.2, 0.2);
        det.color = ColorTag::Yellow;
        det.confidence = 0.7;
        let report = tracker.associate(&[det], CameraMotion::ZERO, 20 + tick as u64);
        assert_eq!(report.matched, vec![(0, id)]);
    }

    let track = tracker.store().get(id).unwrap();
    assert_eq!(track.label, "stop_sign");
    assert_eq!(track.color, ColorTag::Green);
    assert_eq!(track.confidence, 0.7);
    assert_eq!(track.raw_box, Rect::new(0.13, 0.1, 0.2, 0.2));
    assert!(track.velocity.dx > 0.0);
}

#[test]
fn test_each_track_matched_at_most_once_and_every_detection_accounted() {
    let mut tracker = tracker();
    tracker.associate(
        &[
            fast("a", 0.1, 0.1, 0.2, 0.2),
            fast("b", 0.6, 0.6, 0.2, 0.2),
        ],
        CameraMotion::ZERO,
        0,
    );

    // Crowd of overlapping detections around both tracks.
    let mut batch = Vec::new();
    for i in 0..6 {
        let offset = i as f32 * 0.01;
        batch.push(fast("a", 0.1 + offset, 0.1, 0.2, 0.2));
        batch.push(fast("b", 0.6 - offset, 0.6, 0.2, 0.2));
    }
    let mut weak = fast("weak", 0.3, 0.3, 0.1, 0.1);
    weak.confidence = 0.1;
    batch.push(weak);

    let before = tracker.store().len();
    let report = tracker.associate(&batch, CameraMotion::ZERO, 10);

    let matched_ids: HashSet<_> = report.matched.iter().map(|(_, id)| *id).collect();
    assert_eq!(matched_ids.len(), report.matched.len());
    assert_eq!(report.matched.len(), 2);

    let mut seen: Vec<usize> = report
        .matched
        .iter()
        .chain(report.created.iter())
        .map(|(idx, _)| *idx)
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..12).collect::<Vec<_>>());
    assert_eq!(report.filtered, vec![12]);
    assert_eq!(tracker.store().len(), before + report.created.len());
}

#[test]
fn test_empty_batches_never_create_or_delete() {
    let mut tracker = tracker();
    tracker.associate(&[fast("car", 0.2, 0.2, 0.2, 0.2)], CameraMotion::ZERO, 0);
    tracker.associate(&[fast("car", 0.22, 0.2, 0.2, 0.2)], CameraMotion::ZERO, 1);
    let id = tracker.store().ids()[0];

    for tick in 1..=30u32 {
        let report = tracker.associate(&[], CameraMotion::ZERO, 1);
        assert!(report.created.is_empty() && report.matched.is_empty());
        let track = tracker.store().get(id).unwrap();
        assert_eq!(track.missed_frame_count, tick);
    }
    assert_eq!(tracker.store().len(), 1);
}

#[test]
fn test_prediction_bridges_a_gap() {
    let mut tracker = tracker();
    let id = tracker
        .associate(&[fast("car", 0.10, 0.4, 0.1, 0.1)], CameraMotion::ZERO, 0)
        .created[0]
        .1;
    for (t, x) in [0.13f32, 0.16, 0.19].into_iter().enumerate() {
        tracker.associate(&[fast("car", x, 0.4, 0.1, 0.1)], CameraMotion::ZERO, t as u64 + 1);
    }

    // Missed tick: the box is extrapolated forward.
    tracker.associate(&[], CameraMotion::ZERO, 5);
    let track = tracker.store().get(id).unwrap();
    assert!(track.predicted_box.x > track.smoothed_box.x);

    // Camera panning right pulls the prediction left.
    let panned = tracker.associate(&[], CameraMotion::new(0.2, 0.0), 6);
    assert!(panned.created.is_empty());
    let track = tracker.store().get(id).unwrap();
    assert!(track.predicted_box.x < track.smoothed_box.x);

    // Detection reappears near the smoothed box and resumes the track.
    let report = tracker.associate(&[fast("car", 0.2, 0.4, 0.1, 0.1)], CameraMotion::ZERO, 7);
    assert_eq!(report.matched, vec![(0, id)]);
    assert!(!tracker.store().get(id).unwrap().is_predicted());
}

#[test]
fn test_refined_detection_without_track_creates_locked_track() {
    let mut tracker = tracker();
    let report = tracker.fuse(&[refined("crosswalk", 0.1, 0.7, 0.3, 0.2)], 0);
    let id = report.created[0].1;
    assert!(tracker.store().get(id).unwrap().refined_label_locked());

    // The fast detector picks it up later without relabelling it.
    let report = tracker.associate(&[fast("road", 0.1, 0.7, 0.3, 0.2)], CameraMotion::ZERO, 10);
    assert_eq!(report.matched, vec![(0, id)]);
    assert_eq!(tracker.store().get(id).unwrap().label, "crosswalk");
}

#[test]
fn test_smoothing_bounds_hold_for_any_alpha() {
    let old = Rect::new(0.2, 0.3, 0.1, 0.4);
    let new = Rect::new(0.25, 0.1, 0.3, 0.35);
    for step in 0..=20 {
        let alpha = step as f32 / 20.0;
        let s = exponential_smooth(Some(&old), &new, alpha);
        assert!(s.x >= old.x.min(new.x) - 1e-6 && s.x <= old.x.max(new.x) + 1e-6);
        assert!(s.y >= old.y.min(new.y) - 1e-6 && s.y <= old.y.max(new.y) + 1e-6);
        assert!(s.width >= old.width.min(new.width) - 1e-6);
        assert!(s.height <= old.height.max(new.height) + 1e-6);
    }
}

#[test]
fn test_free_function_matches_engine() {
    let mut store = anchortrack::tracker::TrackStore::new();
    let config = TrackerConfig::default();
    let det = fast("a", 0.1, 0.1, 0.1, 0.1);
    let report = associate(&mut store, &config, &[det], CameraMotion::ZERO, 0);
    assert_eq!(report.created.len(), 1);
    assert_eq!(store.len(), 1);
}
