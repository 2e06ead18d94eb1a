//! Engine parameters and their validation.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for the [`Tracker`](crate::tracker::Tracker).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackerConfig {
    /// Fast detections below this confidence are ignored
    pub min_confidence: f32,
    /// IoU above which a detection may match a track
    pub tracking_threshold: f32,
    /// IoU above which a refined label is fused into a track
    pub fusion_threshold: f32,
    /// Smoothing factor for slow objects; raised with speed up to 0.6
    pub base_smoothing_factor: f32,
    /// Tracks unmatched for longer than this are removed
    pub max_tracking_age_ms: u64,
    /// Tracks unmatched for more ticks than this are removed
    pub max_missed_frames: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            tracking_threshold: 0.3,
            fusion_threshold: 0.3,
            base_smoothing_factor: 0.3,
            max_tracking_age_ms: 2_000,
            max_missed_frames: 10,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit_interval("minConfidence", self.min_confidence)?;
        unit_interval("trackingThreshold", self.tracking_threshold)?;
        unit_interval("fusionThreshold", self.fusion_threshold)?;
        unit_interval("baseSmoothingFactor", self.base_smoothing_factor)?;
        if self.max_tracking_age_ms == 0 {
            return Err(ConfigError::NotPositive {
                name: "maxTrackingAgeMs",
            });
        }
        Ok(())
    }
}

fn unit_interval(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(TrackerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let negative = TrackerConfig {
            tracking_threshold: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            negative.validate(),
            Err(ConfigError::OutOfRange {
                name: "trackingThreshold",
                ..
            })
        ));

        let alpha = TrackerConfig {
            base_smoothing_factor: 1.5,
            ..Default::default()
        };
        assert!(alpha.validate().is_err());

        let nan = TrackerConfig {
            fusion_threshold: f32::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());

        let no_age = TrackerConfig {
            max_tracking_age_ms: 0,
            ..Default::default()
        };
        assert!(matches!(no_age.validate(), Err(ConfigError::NotPositive { .. })));
    }

    #[test]
    fn test_camel_case_partial_json() {
        let cfg: TrackerConfig =
            serde_json::from_str(r#"{"minConfidence": 0.6, "maxMissedFrames": 4}"#).unwrap();
        assert_eq!(cfg.min_confidence, 0.6);
        assert_eq!(cfg.max_missed_frames, 4);
        assert_eq!(cfg.tracking_threshold, 0.3);
    }
}
