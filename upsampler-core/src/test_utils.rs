//! Test utilities for upsampler core functionality

pub mod virtual_time {
    //! Virtual microsecond clock for deterministic testing

    use core::cell::Cell;
    use crate::hal::{Duration, Instant, MonotonicClock};

    /// Simulated counter; time only moves when a busy-wait spins or a test
    /// advances it, so every recorded edge lands on an exact microsecond.
    #[derive(Debug, Default)]
    pub struct SimClock {
        now: Cell<u32>,
        spins: Cell<u64>,
    }

    impl SimClock {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn starting_at(start: Instant) -> Self {
            let clock = Self::new();
            clock.now.set(start.as_micros());
            clock
        }

        /// Advance virtual time by duration
        pub fn advance(&self, duration: Duration) {
            self.now.set(self.now.get().wrapping_add(duration.as_micros()));
        }

        /// Move to `target` unless the clock is already past it
        pub fn advance_to(&self, target: Instant) {
            let now = Instant::from_micros(self.now.get());
            let ahead = target.duration_since(now);
            // Anything "ahead" by more than half the counter range is behind us
            if ahead.as_micros() < u32::MAX / 2 {
                self.now.set(target.as_micros());
            }
        }

        /// Busy-wait iterations seen so far
        pub fn spins(&self) -> u64 {
            self.spins.get()
        }
    }

    impl MonotonicClock for SimClock {
        fn now(&self) -> Instant {
            Instant::from_micros(self.now.get())
        }

        fn pause(&self) {
            self.spins.set(self.spins.get() + 1);
            self.advance(Duration::from_micros(1));
        }
    }
}

pub mod output_capture {
    //! Output capture and analysis for testing

    use super::virtual_time::SimClock;
    use crate::hal::{Duration, HalError, Instant, MonotonicClock, PulseOutput};

    /// One complete output pulse
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RecordedPulse {
        pub start: Instant,
        pub width: Duration,
    }

    impl RecordedPulse {
        pub fn end(&self) -> Instant {
            self.start + self.width
        }
    }

    /// Pulse output that timestamps every level change against a [`SimClock`]
    pub struct RecordingOutput<'c> {
        clock: &'c SimClock,
        edges: Vec<(Instant, bool)>,
        high: bool,
        writes: usize,
        fail_on: Option<usize>,
        on_rise: Option<Box<dyn FnMut(usize) + 'c>>,
    }

    impl<'c> RecordingOutput<'c> {
        pub fn new(clock: &'c SimClock) -> Self {
            Self {
                clock,
                edges: Vec::new(),
                high: false,
                writes: 0,
                fail_on: None,
                on_rise: None,
            }
        }

        /// Make the `index`-th write (zero-based) fail
        pub fn fail_on_write(mut self, index: usize) -> Self {
            self.fail_on = Some(index);
            self
        }

        /// Run `hook` with the pulse index at every rising edge
        pub fn on_rise(mut self, hook: impl FnMut(usize) + 'c) -> Self {
            self.on_rise = Some(Box::new(hook));
            self
        }

        pub fn is_high(&self) -> bool {
            self.high
        }

        /// Every level change seen so far
        pub fn edges(&self) -> &[(Instant, bool)] {
            &self.edges
        }

        /// Complete pulses, in order
        pub fn pulses(&self) -> Vec<RecordedPulse> {
            let mut pulses = Vec::new();
            let mut rise = None;
            for &(time, high) in &self.edges {
                match (high, rise) {
                    (true, _) => rise = Some(time),
                    (false, Some(start)) => {
                        pulses.push(RecordedPulse { start, width: time.duration_since(start) });
                        rise = None;
                    }
                    (false, None) => {}
                }
            }
            pulses
        }

        /// Low time between consecutive pulses
        pub fn gaps(&self) -> Vec<Duration> {
            self.pulses()
                .windows(2)
                .map(|pair| pair[1].start.duration_since(pair[0].end()))
                .collect()
        }

        /// Forget everything recorded so far
        pub fn clear(&mut self) {
            self.edges.clear();
        }
    }

    impl PulseOutput for RecordingOutput<'_> {
        type Error = HalError;

        fn set_state(&mut self, high: bool) -> Result<(), Self::Error> {
            let index = self.writes;
            self.writes += 1;
            if self.fail_on == Some(index) {
                return Err(HalError::GpioError);
            }

            if high && !self.high {
                let pulse = self.edges.iter().filter(|(_, level)| *level).count();
                if let Some(hook) = self.on_rise.as_mut() {
                    hook(pulse);
                }
            }
            self.high = high;
            self.edges.push((self.clock.now(), high));
            Ok(())
        }
    }
}

pub mod observers {
    //! Recording display and diagnostics

    use super::virtual_time::SimClock;
    use crate::display::FactorDisplay;
    use crate::hal::{Duration, HalError};
    use crate::scheduler::{diagnostic_line, BurstPlan, DiagnosticSink};

    /// Display that remembers every value shown
    #[derive(Debug, Default)]
    pub struct RecordingDisplay {
        shown: Vec<u8>,
    }

    impl RecordingDisplay {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn shown(&self) -> &[u8] {
            &self.shown
        }
    }

    impl FactorDisplay for RecordingDisplay {
        type Error = HalError;

        fn show(&mut self, value: u8) -> Result<(), Self::Error> {
            if value <= 9 {
                self.shown.push(value);
            }
            Ok(())
        }
    }

    /// Diagnostic sink that records lines and burns `latency` of virtual time
    /// per line, like a blocking serial port would
    pub struct RecordingDiagnostics<'c> {
        clock: &'c SimClock,
        latency: Duration,
        lines: Vec<String>,
    }

    impl<'c> RecordingDiagnostics<'c> {
        pub fn new(clock: &'c SimClock, latency: Duration) -> Self {
            Self {
                clock,
                latency,
                lines: Vec::new(),
            }
        }

        pub fn lines(&self) -> &[String] {
            &self.lines
        }
    }

    impl DiagnosticSink for RecordingDiagnostics<'_> {
        fn burst_started(&mut self, plan: &BurstPlan) {
            self.lines.push(diagnostic_line(plan).as_str().to_owned());
            self.clock.advance(self.latency);
        }
    }
}

pub mod test_scenarios {
    //! Common signal scenarios driven through the full engine

    use super::output_capture::RecordingOutput;
    use super::virtual_time::SimClock;
    use crate::controller::{EdgeCapture, FactorControl};
    use crate::engine::{BurstReport, Upsampler};
    use crate::hal::{Duration, Instant};
    use crate::scheduler::DiagnosticSink;

    /// Edge times of a steady clock signal
    pub fn steady_edges(first: Instant, period: Duration, count: usize) -> Vec<Instant> {
        (0..count as u32).map(|i| first + period * i).collect()
    }

    /// Feed each edge through capture and one main-loop poll.
    ///
    /// The clock jumps to each edge time unless the previous burst is still
    /// running past it, in which case the edge is handled late, as it would
    /// be on hardware.
    pub fn drive_edges<D: DiagnosticSink>(
        upsampler: &mut Upsampler,
        control: &FactorControl,
        clock: &SimClock,
        output: &mut RecordingOutput<'_>,
        diagnostics: &mut D,
        edges: &[Instant],
    ) -> Vec<Option<BurstReport>> {
        let capture = EdgeCapture::new();
        edges
            .iter()
            .map(|&edge| {
                clock.advance_to(edge);
                capture.record(edge);
                upsampler
                    .poll(&capture, control, clock, output, diagnostics)
                    .ok()
                    .flatten()
            })
            .collect()
    }
}
