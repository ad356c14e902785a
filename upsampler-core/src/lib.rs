#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! # Upsampler Core
//!
//! Pulse-rate multiplier core logic for embedded systems.
//! Measures the period of an incoming timing signal and emits N evenly
//! spaced pulses per period, with N set at runtime by two debounced buttons.

pub mod types;
pub mod hal;
pub mod display;
pub mod controller;
pub mod filter;
pub mod scheduler;
pub mod engine;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;


pub use types::*;
pub use display::*;
pub use controller::*;
pub use filter::*;
pub use scheduler::*;
pub use engine::*;
pub use hal::{Duration, HalError, Instant, MonotonicClock, PulseOutput};

/// Default configuration: 100us pulses, 200ms debounce, 1ms noise floor,
/// 100ms interval cap, factor 2 at power-on
pub fn default_config() -> UpsamplerConfig {
    UpsamplerConfig::narrow_pulse()
}
