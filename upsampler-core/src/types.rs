//! Core data types for the pulse upsampler

use crate::hal::{Duration, Instant};

/// Timestamp of one qualifying input edge
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseEvent {
    pub timestamp: Instant,
}

impl PulseEvent {
    pub const fn at(timestamp: Instant) -> Self {
        Self { timestamp }
    }
}

/// Filtered period between two accepted edges
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IntervalMeasurement {
    /// Interval after clamping to the configured cap
    pub duration: Duration,
    /// Interval as measured
    pub raw: Duration,
}

impl IntervalMeasurement {
    /// Returns true if the raw interval exceeded the cap
    pub fn clamped(&self) -> bool {
        self.raw > self.duration
    }
}

/// Number of output pulses per input period, always within `[MIN, MAX]`
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UpsamplingFactor(u8);

impl UpsamplingFactor {
    pub const MIN: UpsamplingFactor = UpsamplingFactor(0);
    pub const MAX: UpsamplingFactor = UpsamplingFactor(9);

    /// Returns `None` when `value` is out of bounds
    pub const fn new(value: u8) -> Option<Self> {
        if value <= Self::MAX.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Clamp `value` into bounds
    pub const fn saturating(value: u8) -> Self {
        if value > Self::MAX.0 {
            Self::MAX
        } else {
            Self(value)
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// One step up, capped at `MAX`
    pub const fn increment(self) -> Self {
        Self::saturating(self.0.saturating_add(1))
    }

    /// One step down, floored at `MIN`
    pub const fn decrement(self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

/// Control button identification
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    /// Raises the factor
    Up,
    /// Lowers the factor
    Down,
}

impl Button {
    /// Factor after one accepted press of this button
    pub const fn apply(&self, factor: UpsamplingFactor) -> UpsamplingFactor {
        match self {
            Button::Up => factor.increment(),
            Button::Down => factor.decrement(),
        }
    }

    pub(crate) const fn index(&self) -> usize {
        match self {
            Button::Up => 0,
            Button::Down => 1,
        }
    }
}

/// Burst scheduler states
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BurstState {
    /// Waiting for the next captured edge
    Idle,
    /// Filtering a captured edge
    Measuring,
    /// Emitting the given pulse of the current burst (zero-based)
    Emitting { pulse: u8 },
}

impl BurstState {
    pub const fn is_idle(&self) -> bool {
        matches!(self, BurstState::Idle)
    }

    /// Index of the pulse currently on the output line, if any
    pub const fn current_pulse(&self) -> Option<u8> {
        match self {
            BurstState::Emitting { pulse } => Some(*pulse),
            BurstState::Idle | BurstState::Measuring => None,
        }
    }
}

/// Upsampler build-time configuration
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UpsamplerConfig {
    /// Width of each output pulse
    pub pulse_width: Duration,
    /// Minimum time between two accepted presses of the same button
    pub debounce: Duration,
    /// Intervals shorter than this are treated as noise
    pub noise_floor: Duration,
    /// Intervals longer than this are clamped to it
    pub interval_cap: Duration,
    /// Factor shown and used at power-on
    pub initial_factor: UpsamplingFactor,
    /// Emit one diagnostic line per burst
    pub diagnostics: bool,
}

impl Default for UpsamplerConfig {
    fn default() -> Self {
        Self::narrow_pulse()
    }
}

impl UpsamplerConfig {
    /// Create a new configuration with validation
    pub fn new(
        pulse_width_us: u32,
        debounce_ms: u32,
        noise_floor_us: u32,
        interval_cap_us: u32,
        initial_factor: u8,
        diagnostics: bool,
    ) -> Result<Self, &'static str> {
        if pulse_width_us == 0 {
            return Err("Pulse width must be at least 1us");
        }
        if noise_floor_us > interval_cap_us {
            return Err("Noise floor must not exceed the interval cap");
        }
        if pulse_width_us >= interval_cap_us {
            return Err("Pulse width must be shorter than the interval cap");
        }
        if debounce_ms > 1_000 {
            return Err("Debounce must be <= 1000ms");
        }
        let initial_factor =
            UpsamplingFactor::new(initial_factor).ok_or("Initial factor must be between 0 and 9")?;

        Ok(Self {
            pulse_width: Duration::from_micros(pulse_width_us),
            debounce: Duration::from_millis(debounce_ms),
            noise_floor: Duration::from_micros(noise_floor_us),
            interval_cap: Duration::from_micros(interval_cap_us),
            initial_factor,
            diagnostics,
        })
    }

    /// 100us output pulses
    pub const fn narrow_pulse() -> Self {
        Self {
            pulse_width: Duration::from_micros(100),
            debounce: Duration::from_millis(200),
            noise_floor: Duration::from_micros(1_000),
            interval_cap: Duration::from_millis(100),
            initial_factor: UpsamplingFactor(2),
            diagnostics: false,
        }
    }

    /// 1ms output pulses
    pub const fn wide_pulse() -> Self {
        Self {
            pulse_width: Duration::from_millis(1),
            ..Self::narrow_pulse()
        }
    }

    pub const fn with_diagnostics(self, diagnostics: bool) -> Self {
        Self {
            diagnostics,
            ..self
        }
    }
}
