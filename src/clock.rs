//! Playback position sources.

use tokio::time::Instant;

/// Reports where the external player currently is.
pub trait PlaybackClock {
    /// Current position in seconds, or `None` while the player is not ready yet.
    fn current_time(&mut self) -> Option<f64>;
}

/// A stand-in player that advances at a fixed rate from a starting position.
///
/// Built on tokio's `Instant` so paused-time tests drive it deterministically.
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    origin: Instant,
    from: f64,
    rate: f64,
}

impl SimulatedClock {
    pub fn new(from: f64, rate: f64) -> Self {
        Self {
            origin: Instant::now(),
            from: from.max(0.0),
            rate,
        }
    }

    /// Jumps to `t`, forwards or backwards.
    pub fn seek(&mut self, t: f64) {
        self.origin = Instant::now();
        self.from = t.max(0.0);
    }
}

impl PlaybackClock for SimulatedClock {
    fn current_time(&mut self) -> Option<f64> {
        Some(self.from + self.origin.elapsed().as_secs_f64() * self.rate)
    }
}
