//! Render-ready view of the track store.

use serde::{Deserialize, Serialize};

use crate::tracker::detection::ColorTag;
use crate::tracker::rect::Rect;
use crate::tracker::track::{Track, TrackId};
use crate::tracker::track_state::TrackState;
use crate::tracker::track_store::TrackStore;

/// One box for the renderer to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub id: TrackId,
    pub label: String,
    pub color: ColorTag,
    /// Predicted box while coasting, smoothed box otherwise
    #[serde(rename = "box")]
    pub bbox: Rect,
    pub confidence: f32,
    pub is_predicted: bool,
    pub state: TrackState,
}

impl From<&Track> for SnapshotEntry {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id,
            label: track.label.clone(),
            color: track.color,
            bbox: track.display_box(),
            confidence: track.confidence,
            is_predicted: track.is_predicted(),
            state: track.state,
        }
    }
}

/// Immutable copy of every visible track at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Clock time (ms) the snapshot was taken
    pub taken_at: u64,
    pub entries: Vec<SnapshotEntry>,
}

impl Snapshot {
    pub fn capture(store: &TrackStore, now_ms: u64) -> Self {
        Self {
            taken_at: now_ms,
            entries: store.all().map(SnapshotEntry::from).collect(),
        }
    }

    pub fn get(&self, id: TrackId) -> Option<&SnapshotEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
