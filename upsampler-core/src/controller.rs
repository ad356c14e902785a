//! Interrupt-side state: edge capture and debounced factor control

use core::cell::Cell;
use critical_section::Mutex;
use portable_atomic::{AtomicU32, AtomicU8, Ordering};
use crate::display::FactorDisplay;
use crate::hal::{Duration, Instant};
use crate::types::{Button, PulseEvent, UpsamplerConfig, UpsamplingFactor};

/// Single-slot handoff from the edge interrupt to the main loop.
///
/// A second edge before [`EdgeCapture::take`] overwrites the first.
pub struct EdgeCapture {
    pending: Mutex<Cell<Option<PulseEvent>>>,
}

impl EdgeCapture {
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(Cell::new(None)),
        }
    }

    /// Record an edge (called from the edge interrupt handler)
    pub fn record(&self, timestamp: Instant) {
        critical_section::with(|cs| {
            self.pending.borrow(cs).set(Some(PulseEvent::at(timestamp)));
        });
    }

    /// Snapshot and clear the pending edge in one critical section
    pub fn take(&self) -> Option<PulseEvent> {
        critical_section::with(|cs| self.pending.borrow(cs).take())
    }

    pub fn is_pending(&self) -> bool {
        critical_section::with(|cs| self.pending.borrow(cs).get().is_some())
    }
}

impl Default for EdgeCapture {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one button edge
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PressOutcome {
    /// Inside the debounce window; nothing changed
    Ignored,
    /// Accepted, but the factor was already at its bound
    Saturated(UpsamplingFactor),
    /// Accepted and the factor moved to the contained value
    Changed(UpsamplingFactor),
}

/// Shared upsampling factor plus per-button debounce state.
/// Safe for use in interrupt contexts
pub struct FactorControl {
    factor: AtomicU8,
    last_accepted: [AtomicU32; 2],
    debounce: Duration,
}

impl FactorControl {
    pub const fn new(initial: UpsamplingFactor, debounce: Duration) -> Self {
        Self {
            factor: AtomicU8::new(initial.get()),
            last_accepted: [AtomicU32::new(0), AtomicU32::new(0)],
            debounce,
        }
    }

    pub const fn from_config(config: &UpsamplerConfig) -> Self {
        Self::new(config.initial_factor, config.debounce)
    }

    /// Current factor
    pub fn factor(&self) -> UpsamplingFactor {
        UpsamplingFactor::saturating(self.factor.load(Ordering::Acquire))
    }

    /// Handle a falling edge on `button` (called from interrupt handler)
    pub fn press(&self, button: Button, now: Instant) -> PressOutcome {
        let last_accepted = &self.last_accepted[button.index()];
        let last = Instant::from_micros(last_accepted.load(Ordering::Relaxed));
        if now.duration_since(last) <= self.debounce {
            return PressOutcome::Ignored;
        }
        last_accepted.store(now.as_micros(), Ordering::Relaxed);

        let update = self.factor.fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
            let current = UpsamplingFactor::saturating(raw);
            let next = button.apply(current);
            (next != current).then_some(next.get())
        });

        match update {
            Ok(previous) => PressOutcome::Changed(button.apply(UpsamplingFactor::saturating(previous))),
            Err(raw) => PressOutcome::Saturated(UpsamplingFactor::saturating(raw)),
        }
    }

    /// Handle a press and refresh `display` if the factor moved
    pub fn handle_press<D>(&self, button: Button, now: Instant, display: &mut D) -> Result<PressOutcome, D::Error>
    where
        D: FactorDisplay,
    {
        let outcome = self.press(button, now);
        if let PressOutcome::Changed(factor) = outcome {
            display.show(factor.get())?;
        }
        Ok(outcome)
    }

    /// Time of the last accepted press of `button`
    pub fn last_accepted(&self, button: Button) -> Instant {
        Instant::from_micros(self.last_accepted[button.index()].load(Ordering::Relaxed))
    }

    /// Reset all state (for testing)
    #[cfg(feature = "test-utils")]
    pub fn reset(&self, factor: UpsamplingFactor) {
        self.factor.store(factor.get(), Ordering::Release);
        for slot in &self.last_accepted {
            slot.store(0, Ordering::Relaxed);
        }
    }
}
