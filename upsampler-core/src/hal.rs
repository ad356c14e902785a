//! Hardware Abstraction Layer for the upsampler engine

pub use self::micros::{Duration, Instant};

mod micros {
    use core::ops::{Add, Div, Mul};

    /// Value of a free-running 32-bit microsecond counter.
    ///
    /// The counter wraps at 2^32 us, so instants are not ordered; compare them
    /// through [`Instant::duration_since`].
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Instant(u32);

    impl Instant {
        pub const fn from_micros(us: u32) -> Self {
            Self(us)
        }

        pub const fn as_micros(&self) -> u32 {
            self.0
        }

        /// Time elapsed since `earlier`, correct across one counter wrap
        pub const fn duration_since(&self, earlier: Instant) -> Duration {
            Duration(self.0.wrapping_sub(earlier.0))
        }

        pub const fn wrapping_add(&self, duration: Duration) -> Instant {
            Instant(self.0.wrapping_add(duration.0))
        }
    }

    impl Add<Duration> for Instant {
        type Output = Instant;

        fn add(self, rhs: Duration) -> Instant {
            self.wrapping_add(rhs)
        }
    }

    /// Microsecond duration
    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Duration(u32);

    impl Duration {
        pub const ZERO: Duration = Duration(0);

        pub const fn from_micros(us: u32) -> Self {
            Self(us)
        }

        pub const fn from_millis(ms: u32) -> Self {
            Self(ms.saturating_mul(1_000))
        }

        pub const fn as_micros(&self) -> u32 {
            self.0
        }

        pub const fn as_millis(&self) -> u32 {
            self.0 / 1_000
        }

        pub const fn is_zero(&self) -> bool {
            self.0 == 0
        }

        /// Subtraction that bottoms out at zero instead of wrapping
        pub const fn saturating_sub(self, rhs: Duration) -> Duration {
            Duration(self.0.saturating_sub(rhs.0))
        }

        pub const fn checked_sub(self, rhs: Duration) -> Option<Duration> {
            match self.0.checked_sub(rhs.0) {
                Some(us) => Some(Duration(us)),
                None => None,
            }
        }

        /// Division that yields `None` for a zero divisor
        pub const fn checked_div(self, rhs: u32) -> Option<Duration> {
            match self.0.checked_div(rhs) {
                Some(us) => Some(Duration(us)),
                None => None,
            }
        }
    }

    impl Add for Duration {
        type Output = Duration;

        fn add(self, rhs: Duration) -> Duration {
            Duration(self.0.saturating_add(rhs.0))
        }
    }

    impl Div<u32> for Duration {
        type Output = Duration;

        fn div(self, rhs: u32) -> Duration {
            Duration(self.0 / rhs)
        }
    }

    impl Mul<u32> for Duration {
        type Output = Duration;

        fn mul(self, rhs: u32) -> Duration {
            Duration(self.0.saturating_mul(rhs))
        }
    }
}

use embedded_hal::digital::OutputPin;

/// Error types for HAL operations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// GPIO operation failed
    GpioError,
}

#[cfg(feature = "std")]
impl core::fmt::Display for HalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HalError::GpioError => write!(f, "GPIO operation failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

/// Free-running microsecond counter
pub trait MonotonicClock {
    /// Current counter value
    fn now(&self) -> Instant;

    /// Called once per busy-wait iteration
    fn pause(&self) {
        core::hint::spin_loop();
    }
}

impl<C: MonotonicClock + ?Sized> MonotonicClock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn pause(&self) {
        (**self).pause()
    }
}

/// Spin until `duration` has elapsed since `start`.
///
/// A zero duration returns without reading the clock twice. The loop exits as
/// soon as the counter has advanced by `duration`, which bounds it for any
/// duration below the counter period.
pub fn wait_until_elapsed<C>(clock: &C, start: Instant, duration: Duration)
where
    C: MonotonicClock + ?Sized,
{
    while clock.now().duration_since(start) < duration {
        clock.pause();
    }
}

/// Trait for the pulse output line
pub trait PulseOutput {
    type Error: From<HalError>;

    /// Drive the line (true = high, false = low)
    fn set_state(&mut self, high: bool) -> Result<(), Self::Error>;
}

/// Pulse output over an embedded-hal compatible pin
pub struct EmbeddedHalPulseOutput<P> {
    pin: P,
    inverted: bool,
}

impl<P> EmbeddedHalPulseOutput<P>
where
    P: OutputPin,
{
    pub fn new(pin: P, inverted: bool) -> Self {
        Self { pin, inverted }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P> PulseOutput for EmbeddedHalPulseOutput<P>
where
    P: OutputPin,
{
    type Error = HalError;

    fn set_state(&mut self, high: bool) -> Result<(), Self::Error> {
        let level = high != self.inverted;
        if level {
            self.pin.set_high().map_err(|_| HalError::GpioError)
        } else {
            self.pin.set_low().map_err(|_| HalError::GpioError)
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! Mock pins for testing

    use core::cell::Cell;
    use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};

    /// Output pin that remembers its level and how often it was written
    #[derive(Debug, Default)]
    pub struct MockPin {
        high: Cell<bool>,
        writes: Cell<usize>,
        fail: bool,
    }

    impl MockPin {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pin whose every write fails
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn is_high(&self) -> bool {
            self.high.get()
        }

        pub fn writes(&self) -> usize {
            self.writes.get()
        }

        fn write(&mut self, high: bool) -> Result<(), ErrorKind> {
            if self.fail {
                return Err(ErrorKind::Other);
            }
            self.high.set(high);
            self.writes.set(self.writes.get() + 1);
            Ok(())
        }
    }

    impl ErrorType for MockPin {
        type Error = ErrorKind;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.write(false)
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.write(true)
        }
    }
}
