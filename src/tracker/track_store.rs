//! Authoritative collection of live tracks.

use std::collections::BTreeMap;
use std::collections::btree_map::{Values, ValuesMut};

use crate::tracker::detection::Detection;
use crate::tracker::track::{Track, TrackId};
use crate::tracker::track_state::TrackState;

/// Tracks keyed by [`TrackId`].
///
/// Ids are allocated by the store, starting at 1, and never reused.
/// Iteration runs in ascending id order; callers should not rely on that
/// beyond determinism within one run.
#[derive(Debug, Clone)]
pub struct TrackStore {
    tracks: BTreeMap<TrackId, Track>,
    next_id: u64,
}

impl Default for TrackStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackStore {
    pub fn new() -> Self {
        Self {
            tracks: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn next_track_id(&mut self) -> TrackId {
        let id = TrackId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Create a track from `detection` in `state` and return a reference to it.
    pub fn create(&mut self, detection: &Detection, state: TrackState, now_ms: u64) -> &Track {
        let id = self.next_track_id();
        self.tracks
            .entry(id)
            .or_insert_with(|| Track::new(id, detection, state, now_ms))
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        self.tracks.get_mut(&id)
    }

    pub fn all(&self) -> Values<'_, TrackId, Track> {
        self.tracks.values()
    }

    pub(crate) fn all_mut(&mut self) -> ValuesMut<'_, TrackId, Track> {
        self.tracks.values_mut()
    }

    pub fn ids(&self) -> Vec<TrackId> {
        self.tracks.keys().copied().collect()
    }

    pub fn delete(&mut self, id: TrackId) -> Option<Track> {
        self.tracks.remove(&id)
    }

    pub fn for_each<F: FnMut(&Track)>(&self, f: F) {
        self.tracks.values().for_each(f);
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
