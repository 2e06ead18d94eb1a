//! Label lifecycle of a track.

use serde::{Deserialize, Serialize};

/// Track state enumeration for the label lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrackState {
    /// Born from association, not yet re-observed
    #[default]
    Tentative,
    /// Re-observed by the fast detector at least once
    Confirmed,
    /// Label set by the refined detector; fast matches no longer relabel
    Locked,
}

impl TrackState {
    /// State after a fast-source match.
    pub fn on_fast_match(self) -> Self {
        match self {
            TrackState::Tentative => TrackState::Confirmed,
            other => other,
        }
    }

    /// State after a refined label has been fused in. Locking is one-way.
    pub fn on_fusion(self) -> Self {
        TrackState::Locked
    }

    pub fn is_locked(self) -> bool {
        self == TrackState::Locked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        let s = TrackState::Tentative;
        assert!(!s.is_locked());
        assert_eq!(s.on_fast_match(), TrackState::Confirmed);
        assert_eq!(s.on_fast_match().on_fast_match(), TrackState::Confirmed);
        assert_eq!(s.on_fusion(), TrackState::Locked);
        assert_eq!(TrackState::Locked.on_fast_match(), TrackState::Locked);
        assert!(TrackState::Confirmed.on_fusion().is_locked());
    }
}
