//! Burst scheduling: N evenly spaced pulses per measured interval

use core::fmt::Write;
use heapless::String;
use crate::hal::{wait_until_elapsed, Duration, MonotonicClock, PulseOutput};
use crate::types::{BurstState, IntervalMeasurement, UpsamplingFactor};

/// Timing of one burst, computed before any pin is touched
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BurstPlan {
    pub measurement: IntervalMeasurement,
    pub factor: UpsamplingFactor,
    pub pulse_width: Duration,
    /// Quiet time between the end of one pulse and the start of the next
    pub per_pulse_delay: Duration,
}

impl BurstPlan {
    pub fn new(measurement: IntervalMeasurement, factor: UpsamplingFactor, pulse_width: Duration) -> Self {
        // A pulse wider than its sub-period leaves no gap at all
        let per_pulse_delay = match measurement.duration.checked_div(factor.get() as u32) {
            Some(sub_period) => sub_period.saturating_sub(pulse_width),
            None => Duration::ZERO,
        };

        Self {
            measurement,
            factor,
            pulse_width,
            per_pulse_delay,
        }
    }

    /// Interval the burst is spread over
    pub fn interval(&self) -> Duration {
        self.measurement.duration
    }

    pub fn pulses(&self) -> u8 {
        self.factor.get()
    }

    /// Gap waits in the burst; none follows the last pulse
    pub fn gaps(&self) -> u8 {
        self.factor.get().saturating_sub(1)
    }
}

/// Observer notified once per burst, during the first gap
pub trait DiagnosticSink {
    fn burst_started(&mut self, plan: &BurstPlan);
}

/// Discards all diagnostics
pub struct NoDiagnostics;

impl DiagnosticSink for NoDiagnostics {
    fn burst_started(&mut self, _plan: &BurstPlan) {}
}

/// Longest line is "Int:4294967295 Dly:4294967295\r\n"
pub const DIAGNOSTIC_LINE_LEN: usize = 32;

/// Render the diagnostic line for `plan`
pub fn diagnostic_line(plan: &BurstPlan) -> String<DIAGNOSTIC_LINE_LEN> {
    let mut line = String::new();
    // Cannot overflow: both fields are at most ten digits
    write!(
        line,
        "Int:{} Dly:{}\r\n",
        plan.interval().as_micros(),
        plan.per_pulse_delay.as_micros()
    )
    .ok();
    line
}

/// Writes one `Int:<us> Dly:<us>` line per burst to a text stream
pub struct LineDiagnostics<W> {
    writer: W,
}

impl<W: Write> LineDiagnostics<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> DiagnosticSink for LineDiagnostics<W> {
    fn burst_started(&mut self, plan: &BurstPlan) {
        // A failing diagnostic stream must not disturb the burst
        self.writer.write_str(&diagnostic_line(plan)).ok();
    }
}

/// Emits bursts on the output line and tracks the burst state
#[derive(Debug)]
pub struct BurstScheduler {
    state: BurstState,
    pulse_width: Duration,
    diagnostics: bool,
}

impl BurstScheduler {
    pub const fn new(pulse_width: Duration, diagnostics: bool) -> Self {
        Self {
            state: BurstState::Idle,
            pulse_width,
            diagnostics,
        }
    }

    /// Get current burst state
    pub fn current_state(&self) -> BurstState {
        self.state
    }

    pub fn pulse_width(&self) -> Duration {
        self.pulse_width
    }

    /// Enter `Measuring` for a freshly captured edge
    pub fn begin_measuring(&mut self) {
        self.state = BurstState::Measuring;
    }

    /// Drop back to `Idle` without emitting
    pub fn abort(&mut self) {
        self.state = BurstState::Idle;
    }

    pub fn plan(&self, measurement: IntervalMeasurement, factor: UpsamplingFactor) -> BurstPlan {
        BurstPlan::new(measurement, factor, self.pulse_width)
    }

    /// Emit every pulse of `plan`, returning the number emitted.
    ///
    /// Each gap is timed from the falling edge, before diagnostics run, so
    /// their cost comes out of the gap rather than the period. On an output
    /// error the line is driven low and the scheduler returns to `Idle`.
    pub fn emit<C, O, D>(
        &mut self,
        plan: &BurstPlan,
        clock: &C,
        output: &mut O,
        diagnostics: &mut D,
    ) -> Result<u8, O::Error>
    where
        C: MonotonicClock + ?Sized,
        O: PulseOutput,
        D: DiagnosticSink,
    {
        let pulses = plan.pulses();

        for pulse in 0..pulses {
            self.state = BurstState::Emitting { pulse };
            if let Err(e) = self.emit_pulse(clock, output) {
                output.set_state(false).ok();
                self.state = BurstState::Idle;
                return Err(e);
            }

            if pulse + 1 < pulses {
                let wait_start = clock.now();
                if pulse == 0 && self.diagnostics {
                    diagnostics.burst_started(plan);
                }
                wait_until_elapsed(clock, wait_start, plan.per_pulse_delay);
            }
        }

        self.state = BurstState::Idle;
        Ok(pulses)
    }

    fn emit_pulse<C, O>(&self, clock: &C, output: &mut O) -> Result<(), O::Error>
    where
        C: MonotonicClock + ?Sized,
        O: PulseOutput,
    {
        output.set_state(true)?;
        let start = clock.now();
        wait_until_elapsed(clock, start, self.pulse_width);
        output.set_state(false)
    }
}
