//! Frame timing

use std::time::Instant;

/// Frame timer producing the elapsed-time input of each frame
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
    last_frame: Instant,
    delta_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer starting now
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            delta_time: 0.0,
            frame_count: 0,
        }
    }

    /// Advance to the next frame
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Seconds between the last two ticks
    pub const fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Seconds since the timer was created, as of the last tick
    pub fn total_time(&self) -> f32 {
        self.last_frame.duration_since(self.start).as_secs_f32()
    }

    /// Number of ticks so far
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Average ticks per second since creation
    pub fn average_fps(&self) -> f32 {
        let total = self.total_time();
        if total > 0.0 {
            self.frame_count as f32 / total
        } else {
            0.0
        }
    }
}
