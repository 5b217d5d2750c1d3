#![forbid(unsafe_code)]

//! Frame-delta source for driving timelines from a render loop.

use std::time::Duration;

use web_time::Instant;

/// Measures the time elapsed between successive frames.
///
/// Uses `web_time::Instant` so the same code runs natively and on wasm.
#[derive(Debug, Clone, Copy)]
pub struct AnimationClock {
    last: Instant,
    max_delta: Duration,
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationClock {
    /// Frame deltas above this are clamped (tab switches, debugger pauses).
    pub const DEFAULT_MAX_DELTA: Duration = Duration::from_millis(100);

    /// Start a clock at the current instant.
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            max_delta: Self::DEFAULT_MAX_DELTA,
        }
    }

    /// Set the clamp applied to a single frame delta.
    pub fn max_delta(mut self, max: Duration) -> Self {
        self.max_delta = max;
        self
    }

    /// Time since the previous call (or construction), clamped to `max_delta`.
    pub fn delta(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last);
        self.last = now;
        elapsed.min(self.max_delta)
    }

    /// Restart measurement from now, discarding elapsed time.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }
}
