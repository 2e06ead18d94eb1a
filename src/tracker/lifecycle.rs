//! Track expiry: the only place tracks are deleted.
//!
//! A track is removed once it has gone unmatched for longer than
//! `max_tracking_age_ms` or for more than `max_missed_frames` ticks.
//! Removal is immediate; there is no fade-out state.

use tracing::debug;

use crate::tracker::config::TrackerConfig;
use crate::tracker::track::{Track, TrackId};
use crate::tracker::track_store::TrackStore;

pub fn is_expired(track: &Track, config: &TrackerConfig, now_ms: u64) -> bool {
    track.age_ms(now_ms) > config.max_tracking_age_ms
        || track.missed_frame_count > config.max_missed_frames
}

/// Delete every expired track and return the removed ids.
pub fn expire(store: &mut TrackStore, config: &TrackerConfig, now_ms: u64) -> Vec<TrackId> {
    let stale: Vec<TrackId> = store
        .all()
        .filter(|t| is_expired(t, config, now_ms))
        .map(|t| t.id)
        .collect();

    for id in &stale {
        if let Some(track) = store.delete(*id) {
            debug!(
                track = %id,
                label = %track.label,
                missed = track.missed_frame_count,
                age_ms = track.age_ms(now_ms),
                "track expired"
            );
        }
    }
    stale
}
