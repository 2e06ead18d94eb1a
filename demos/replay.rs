//! Scripted overlay session: a sign drifts across the view while the
//! camera pans, the fast detector drops out now and then, and a mock vision
//! service names the object.
//!
//! Run with `RUST_LOG=anchortrack=debug,replay=info cargo run --example replay`.

use std::error::Error;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anchortrack::integration::{
    Clock, FnDetector, JsonReplyDetector, LatestFrame, MonotonicClock, OrientationMotion,
};
use anchortrack::{
    ColorTag, Detection, DetectionBuilder, Frame, Orchestrator, OverlayConfig, OverlaySources,
    SourceKind,
};
use tracing::info;

const SESSION: Duration = Duration::from_secs(3);
const CAMERA_PERIOD: Duration = Duration::from_millis(33);

/// Horizontal position of the sign at `t_ms` into the session.
fn sign_x(t_ms: u64) -> f32 {
    0.1 + t_ms as f32 * 0.0001
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let clock = Arc::new(MonotonicClock::new());
    let frames = LatestFrame::new();
    let motion = Arc::new(OrientationMotion::new(60.0, 45.0));
    let sources = OverlaySources {
        frames: Arc::new(frames.clone()),
        motion: motion.clone(),
        clock: clock.clone(),
    };

    let mut calls = 0u32;
    let fast = FnDetector(move |frame: &Frame| -> Result<Vec<Detection>, String> {
        calls += 1;
        if calls % 6 == 0 {
            return Ok(Vec::new());
        }
        Ok(vec![
            DetectionBuilder::new()
                .label("sign")
                .tlwh(sign_x(frame.captured_at()), 0.3, 0.15, 0.15)
                .confidence(0.8)
                .color(ColorTag::Red)
                .source(SourceKind::Fast)
                .build(),
        ])
    });

    let refined = JsonReplyDetector::new(|frame: &Frame| -> Result<String, String> {
        thread::sleep(Duration::from_millis(400));
        let x = sign_x(frame.captured_at());
        Ok(format!(
            "```json\n{{\"detections\": [{{\"label\": \"stop_sign\", \"bbox\": [{x}, 0.3, 0.15, 0.15], \"color\": \"red\"}}]}}\n```"
        ))
    });

    let config = OverlayConfig {
        refined_interval_ms: 700,
        refined_timeout_ms: 1_000,
        ..Default::default()
    };
    let overlay = Orchestrator::spawn(config, fast, refined, sources)?;

    let started = Instant::now();
    let mut yaw = 0.0f32;
    while started.elapsed() < SESSION {
        frames.publish(Frame::new(vec![0u8; 64 * 48], 64, 48, clock.now_ms()));
        yaw += 0.05;
        motion.record(yaw, 0.0);

        while let Ok(snapshot) = overlay.snapshots().try_recv() {
            for entry in &snapshot.entries {
                info!(
                    at = snapshot.taken_at,
                    track = %entry.id,
                    label = %entry.label,
                    x = entry.bbox.x,
                    predicted = entry.is_predicted,
                    state = ?entry.state,
                    "overlay"
                );
            }
        }
        thread::sleep(CAMERA_PERIOD);
    }

    let last = overlay.latest_snapshot();
    println!("{}", serde_json::to_string_pretty(&last)?);
    overlay.stop();
    Ok(())
}
