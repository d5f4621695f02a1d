//! Virtual time for the simulated business day.
//!
//! Every component converts between virtual and real durations through a
//! [`SimClock`]; nothing else divides by the speed factor.

use std::thread;
use std::time::{Duration, Instant};

/// Virtual seconds that pass per real second (11 virtual hours in 60s).
pub const DEFAULT_SPEED: u32 = 660;
/// Hour of day the restaurant opens, used when rendering virtual times.
pub const OPENING_HOUR: u64 = 11;

/// Fixed-speed mapping between real and virtual time, anchored at creation.
#[derive(Clone, Copy, Debug)]
pub struct SimClock {
    speed: u32,
    start: Instant,
}

impl SimClock {
    /// Start a clock running `speed` times faster than real time.
    pub fn new(speed: u32) -> Self {
        Self {
            speed: speed.max(1),
            start: Instant::now(),
        }
    }

    /// Virtual seconds per real second.
    pub fn speed(&self) -> u32 {
        self.speed
    }

    /// Real duration that covers `virtual_span`.
    pub fn to_real(&self, virtual_span: Duration) -> Duration {
        virtual_span / self.speed
    }

    /// Virtual duration covered by `real_span`, saturating.
    pub fn to_virtual(&self, real_span: Duration) -> Duration {
        real_span.saturating_mul(self.speed)
    }

    /// Virtual time since the clock started.
    pub fn virtual_elapsed(&self) -> Duration {
        self.to_virtual(self.start.elapsed())
    }

    /// Block the calling thread for a virtual span.
    pub fn sleep_virtual(&self, virtual_span: Duration) {
        let real = self.to_real(virtual_span);
        if !real.is_zero() {
            thread::sleep(real);
        }
    }
}

/// Render a virtual offset from opening as a `HH:MM` wall-clock time.
pub fn format_clock(virtual_at: Duration) -> String {
    let minutes = OPENING_HOUR * 60 + virtual_at.as_secs() / 60;
    format!("{:02}:{:02}", (minutes / 60) % 24, minutes % 60)
}
