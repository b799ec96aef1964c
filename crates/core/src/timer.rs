//! Frame timing.

use std::time::Instant;

/// Tracks elapsed time between frames.
///
/// Call [`Timer::delta_secs`] once per frame to get the time since the
/// previous call.
pub struct Timer {
    /// Time of the previous `delta_secs` call.
    last: Instant,
    /// Time the timer was created.
    start: Instant,
}

impl Timer {
    /// Creates a new timer starting now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last: now,
            start: now,
        }
    }

    /// Returns the seconds elapsed since the previous call (or construction).
    pub fn delta_secs(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        delta
    }

    /// Returns the seconds elapsed since the timer was created.
    pub fn elapsed_secs(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_is_non_negative() {
        let mut timer = Timer::new();
        assert!(timer.delta_secs() >= 0.0);
        assert!(timer.delta_secs() >= 0.0);
    }

    #[test]
    fn test_elapsed_monotonic() {
        let timer = Timer::new();
        let a = timer.elapsed_secs();
        let b = timer.elapsed_secs();
        assert!(b >= a);
    }
}
