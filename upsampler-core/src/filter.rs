//! Interval measurement with noise rejection and clamping

use crate::hal::{Duration, Instant};
use crate::types::{IntervalMeasurement, PulseEvent, UpsamplerConfig};

/// Turns captured edges into filtered intervals
#[derive(Debug)]
pub struct IntervalFilter {
    last_pulse: Instant,
    noise_floor: Duration,
    cap: Duration,
}

impl IntervalFilter {
    pub const fn new(noise_floor: Duration, cap: Duration) -> Self {
        Self {
            last_pulse: Instant::from_micros(0),
            noise_floor,
            cap,
        }
    }

    pub const fn from_config(config: &UpsamplerConfig) -> Self {
        Self::new(config.noise_floor, config.interval_cap)
    }

    /// Measure the interval ending at `event`.
    ///
    /// Returns `None` for an interval below the noise floor; the edge is then
    /// forgotten and the previous accepted edge stays the reference.
    pub fn accept(&mut self, event: PulseEvent) -> Option<IntervalMeasurement> {
        let raw = event.timestamp.duration_since(self.last_pulse);
        if raw < self.noise_floor {
            return None;
        }
        self.last_pulse = event.timestamp;

        Some(IntervalMeasurement {
            duration: raw.min(self.cap),
            raw,
        })
    }

    /// Timestamp of the last accepted edge
    pub fn last_pulse(&self) -> Instant {
        self.last_pulse
    }
}
