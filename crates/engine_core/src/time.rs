//! Frame timing for the simulation loop.

use std::time::Instant;

/// Largest step the simulation will integrate in one tick, in seconds.
pub const DEFAULT_MAX_FRAME_DELTA: f32 = 0.05;

/// Clamps a raw frame delta into `[0, max_delta]`. Non-finite or negative
/// deltas become zero.
pub fn clamp_frame_delta(raw: f32, max_delta: f32) -> f32 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0.0;
    }
    raw.min(max_delta)
}

/// Tracks per-frame deltas, clamped so a hitch never produces a huge step.
#[derive(Debug)]
pub struct FrameClock {
    /// Time of the last wall-clock update.
    last_frame: Instant,
    /// Unclamped duration of the last frame.
    raw_delta: f32,
    /// Clamped duration of the last frame.
    delta: f32,
    /// Total simulated time.
    elapsed: f64,
    frame_count: u64,
    max_delta: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_max_delta(DEFAULT_MAX_FRAME_DELTA)
    }

    pub fn with_max_delta(max_delta: f32) -> Self {
        Self {
            last_frame: Instant::now(),
            raw_delta: 0.0,
            delta: 0.0,
            elapsed: 0.0,
            frame_count: 0,
            max_delta,
        }
    }

    /// Advance using the wall clock. Returns the clamped delta.
    pub fn update(&mut self) -> f32 {
        let now = Instant::now();
        let raw = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.advance(raw)
    }

    /// Advance by an externally supplied delta. Returns the clamped delta.
    pub fn advance(&mut self, raw_delta: f32) -> f32 {
        self.raw_delta = raw_delta;
        self.delta = clamp_frame_delta(raw_delta, self.max_delta);
        self.elapsed += self.delta as f64;
        self.frame_count += 1;
        self.delta
    }

    pub fn delta_seconds(&self) -> f32 {
        self.delta
    }

    pub fn raw_delta_seconds(&self) -> f32 {
        self.raw_delta
    }

    /// Total simulated (clamped) time in seconds.
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed as f32
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn max_delta(&self) -> f32 {
        self.max_delta
    }

    /// Get the current FPS (from the last raw delta).
    pub fn fps(&self) -> f32 {
        if self.raw_delta > 0.0 {
            1.0 / self.raw_delta
        } else {
            0.0
        }
    }
}
