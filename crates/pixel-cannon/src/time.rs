//! Frame timing.
//!
//! [`Time`] is stepped once per redraw, before `update` runs.

use std::time::{Duration, Instant};

/// Frames averaged for [`Time::average_fps`].
const FPS_WINDOW: usize = 60;

#[derive(Debug, Clone)]
pub struct Time {
    startup: Instant,
    frame_start: Instant,
    delta: Duration,
    elapsed: Duration,
    frame_count: u64,
    /// Ring of recent frame durations.
    history: [Duration; FPS_WINDOW],
}

impl Time {
    pub(crate) fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            startup: now,
            frame_start: now,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
            history: [Duration::ZERO; FPS_WINDOW],
        }
    }

    pub(crate) fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    fn tick_at(&mut self, now: Instant) {
        self.delta = now.saturating_duration_since(self.frame_start);
        self.frame_start = now;
        self.elapsed = now.saturating_duration_since(self.startup);
        self.history[(self.frame_count as usize) % FPS_WINDOW] = self.delta;
        self.frame_count += 1;
    }

    /// Duration of the previous frame.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Time since the app started.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second over the last 60 frames (fewer right after startup).
    pub fn average_fps(&self) -> f32 {
        let frames = (self.frame_count as usize).min(FPS_WINDOW);
        let total: Duration = self.history[..frames].iter().sum();
        if total.is_zero() {
            0.0
        } else {
            frames as f32 / total.as_secs_f32()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_measures_delta_and_elapsed() {
        let start = Instant::now();
        let mut time = Time::starting_at(start);
        time.tick_at(start + Duration::from_millis(16));
        time.tick_at(start + Duration::from_millis(48));

        assert_eq!(time.delta(), Duration::from_millis(32));
        assert_eq!(time.elapsed(), Duration::from_millis(48));
        assert_eq!(time.frame_count(), 2);
    }

    #[test]
    fn average_fps_uses_recent_frames() {
        let start = Instant::now();
        let mut time = Time::starting_at(start);
        assert_eq!(time.average_fps(), 0.0);

        for i in 1..=100u64 {
            time.tick_at(start + Duration::from_millis(20 * i));
        }
        assert!((time.average_fps() - 50.0).abs() < 0.01);
    }
}
