//! Frame clock.
//!
//! The animation driver only needs "seconds since the clock started". The
//! clock starts on its first read, so the very first frame observes an
//! elapsed time of zero no matter how long asset loading took.

use instant::Instant;

/// A monotonic source of elapsed seconds.
pub trait FrameClock {
    /// Seconds since the clock started. Never decreases between calls.
    fn elapsed(&mut self) -> f32;
}

/// Wall clock backed by [`instant::Instant`] (works on native and in the browser).
#[derive(Debug, Default)]
pub struct InstantClock {
    start: Option<Instant>,
}

impl InstantClock {
    pub fn new() -> Self {
        Self { start: None }
    }
}

impl FrameClock for InstantClock {
    fn elapsed(&mut self) -> f32 {
        match self.start {
            Some(start) => start.elapsed().as_secs_f32(),
            None => {
                self.start = Some(Instant::now());
                0.0
            }
        }
    }
}
