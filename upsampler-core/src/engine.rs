//! Main-loop driver chaining edge capture, interval filter and burst scheduler

use crate::controller::{EdgeCapture, FactorControl};
use crate::filter::IntervalFilter;
use crate::hal::{Duration, Instant, MonotonicClock, PulseOutput};
use crate::scheduler::{BurstPlan, BurstScheduler, DiagnosticSink};
use crate::types::{BurstState, IntervalMeasurement, PulseEvent, UpsamplerConfig, UpsamplingFactor};

/// Summary of one emitted burst
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BurstReport {
    pub interval: Duration,
    pub factor: UpsamplingFactor,
    pub per_pulse_delay: Duration,
    pub pulses: u8,
    pub clamped: bool,
}

impl BurstReport {
    fn new(plan: &BurstPlan, pulses: u8) -> Self {
        Self {
            interval: plan.interval(),
            factor: plan.factor,
            per_pulse_delay: plan.per_pulse_delay,
            pulses,
            clamped: plan.measurement.clamped(),
        }
    }
}

/// Main upsampler implementation
pub struct Upsampler {
    config: UpsamplerConfig,
    filter: IntervalFilter,
    scheduler: BurstScheduler,
}

impl Upsampler {
    /// Create new upsampler with given configuration
    pub fn new(config: UpsamplerConfig) -> Self {
        Self {
            config,
            filter: IntervalFilter::from_config(&config),
            scheduler: BurstScheduler::new(config.pulse_width, config.diagnostics),
        }
    }

    /// Get current burst state
    pub fn current_state(&self) -> BurstState {
        self.scheduler.current_state()
    }

    /// Get current configuration
    pub fn config(&self) -> &UpsamplerConfig {
        &self.config
    }

    /// Timestamp of the last accepted input edge
    pub fn last_pulse(&self) -> Instant {
        self.filter.last_pulse()
    }

    /// One main-loop iteration.
    ///
    /// Takes the pending edge, if any, filters it and emits the burst for the
    /// factor read right after filtering. Returns `None` when no edge was
    /// pending or the edge was rejected as noise.
    pub fn poll<C, O, D>(
        &mut self,
        capture: &EdgeCapture,
        control: &FactorControl,
        clock: &C,
        output: &mut O,
        diagnostics: &mut D,
    ) -> Result<Option<BurstReport>, O::Error>
    where
        C: MonotonicClock + ?Sized,
        O: PulseOutput,
        D: DiagnosticSink,
    {
        let Some(event) = capture.take() else {
            return Ok(None);
        };
        let Some(measurement) = self.measure(event) else {
            return Ok(None);
        };
        // Sampled once; presses during the burst apply to the next one
        let factor = control.factor();
        self.run_burst(measurement, factor, clock, output, diagnostics).map(Some)
    }

    /// Filter one captured edge, leaving the state `Idle` if it is rejected
    pub fn measure(&mut self, event: PulseEvent) -> Option<IntervalMeasurement> {
        self.scheduler.begin_measuring();
        let measurement = self.filter.accept(event);
        if measurement.is_none() {
            #[cfg(feature = "defmt")]
            defmt::debug!("Edge at {}us rejected as noise", event.timestamp.as_micros());
            self.scheduler.abort();
        }
        measurement
    }

    /// Emit the burst for an accepted interval
    pub fn run_burst<C, O, D>(
        &mut self,
        measurement: IntervalMeasurement,
        factor: UpsamplingFactor,
        clock: &C,
        output: &mut O,
        diagnostics: &mut D,
    ) -> Result<BurstReport, O::Error>
    where
        C: MonotonicClock + ?Sized,
        O: PulseOutput,
        D: DiagnosticSink,
    {
        let plan = self.scheduler.plan(measurement, factor);
        let pulses = self.scheduler.emit(&plan, clock, output, diagnostics)?;

        #[cfg(feature = "defmt")]
        defmt::trace!(
            "Burst: {}us / {} -> {} pulses, gap {}us",
            plan.interval().as_micros(),
            factor.get(),
            pulses,
            plan.per_pulse_delay.as_micros()
        );

        Ok(BurstReport::new(&plan, pulses))
    }

    /// Run the main loop forever
    pub fn run<C, O, D>(
        &mut self,
        capture: &EdgeCapture,
        control: &FactorControl,
        clock: &C,
        output: &mut O,
        diagnostics: &mut D,
    ) -> !
    where
        C: MonotonicClock + ?Sized,
        O: PulseOutput,
        D: DiagnosticSink,
    {
        loop {
            if let Err(_e) = self.poll(capture, control, clock, output, diagnostics) {
                #[cfg(feature = "defmt")]
                defmt::warn!("Burst aborted: output line write failed");
            }
        }
    }
}
