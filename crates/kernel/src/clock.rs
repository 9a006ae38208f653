use fieldwarning_common::FrameTime;
use std::time::{Duration, Instant};

/// Wall-clock source of [`FrameTime`]s.
#[derive(Debug)]
pub struct FrameClock {
    started: Option<Instant>,
    last: Option<Instant>,
    next_index: u64,
    max_delta: Duration,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            started: None,
            last: None,
            next_index: 0,
            max_delta: Duration::from_millis(100),
        }
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deltas longer than this (debugger pauses, window drags) are clamped.
    pub fn with_max_delta(max_delta: Duration) -> Self {
        Self {
            max_delta,
            ..Self::default()
        }
    }

    /// Timing for the next frame, measured against `now`.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let started = *self.started.get_or_insert(now);
        let delta = self
            .last
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last))
            .min(self.max_delta);
        self.last = Some(now);
        let index = self.next_index;
        self.next_index += 1;
        FrameTime {
            index,
            delta,
            elapsed: now.saturating_duration_since(started),
        }
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }
}
