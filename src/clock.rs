//! Frame timing for drivers that step a [`World`][crate::World] once per rendered frame.

use instant::{Duration, Instant};

// time snapping technique from Tyler Glaiel's blog post
// https://medium.com/@tglaiel/how-to-make-your-game-run-at-60fps-24c61210fe75
const NANOS_120FPS: u128 = 1_000_000_000 / 120;
const NANOS_60FPS: u128 = 1_000_000_000 / 60;
const NANOS_30FPS: u128 = 1_000_000_000 / 30;
const NANOS_20FPS: u128 = 1_000_000_000 / 20;
const NANOS_15FPS: u128 = 1_000_000_000 / 15;
const SNAP_TARGETS: [u128; 5] = [
    NANOS_120FPS,
    NANOS_60FPS,
    NANOS_30FPS,
    NANOS_20FPS,
    NANOS_15FPS,
];
const SNAP_THRESHOLD: u128 = 200_000;

/// Frames longer than this are cut short to prevent a spiral of death.
const MAX_FRAME_NANOS: u128 = 1_000_000_000 / 8;

/// Measures the time between frames.
///
/// Deltas that are very close to a common refresh period are snapped to it exactly,
/// so that a vsynced driver steps the simulation with a stable delta.
#[derive(Clone, Copy, Debug)]
pub struct Clock {
    prev: Instant,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    pub fn new() -> Self {
        Self {
            prev: Instant::now(),
        }
    }

    /// Seconds since the previous tick (or since creation), snapped and clamped.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = frame_delta(now - self.prev);
        self.prev = now;
        dt
    }
}

/// Convert a measured frame duration into a simulation delta in seconds.
pub fn frame_delta(elapsed: Duration) -> f32 {
    let mut nanos = elapsed.as_nanos();
    if let Some(&target) = SNAP_TARGETS.iter().find(|&&t| should_snap(nanos, t)) {
        nanos = target;
    }
    nanos = nanos.min(MAX_FRAME_NANOS);
    nanos as f32 / 1_000_000_000.0
}

fn should_snap(dt: u128, target: u128) -> bool {
    if dt < target {
        target - dt < SNAP_THRESHOLD
    } else {
        dt - target < SNAP_THRESHOLD
    }
}
