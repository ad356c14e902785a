//! CH32V003 register-level GPIO and EXTI support
//!
//! Provides the output pin type used for the pulse line and the display
//! segments, the per-variant pin maps, and the clock, pin and external
//! interrupt setup for both hardware variants.

use core::convert::Infallible;
use embedded_hal::digital::{ErrorType, OutputPin};
use upsampler_core::UpsamplerConfig;

/// CH32V003 memory map
const RCC_BASE: u32 = 0x4002_1000;
const AFIO_BASE: u32 = 0x4001_0000;
const EXTI_BASE: u32 = 0x4001_0400;
const GPIOC_BASE: u32 = 0x4001_1000;
const GPIOD_BASE: u32 = 0x4001_1400;
const PFIC_BASE: u32 = 0xE000_E000;

/// RCC register offsets
const RCC_APB2PCENR: u32 = 0x18;

/// GPIO register offsets
const GPIO_CFGLR: u32 = 0x00;  // Configuration Register Low
const GPIO_OUTDR: u32 = 0x0C;  // Output Data Register
const GPIO_BSHR: u32 = 0x10;   // Bit Set/Reset Register

/// AFIO register offsets
const AFIO_EXTICR: u32 = 0x08; // External interrupt configuration register

/// EXTI register offsets
const EXTI_INTENR: u32 = 0x00; // Interrupt enable register
const EXTI_RTENR: u32 = 0x08;  // Rising edge trigger enable
const EXTI_FTENR: u32 = 0x0C;  // Falling edge trigger enable
const EXTI_INTFR: u32 = 0x14;  // Interrupt flag register

/// PFIC interrupt enable register for IRQs 0-31
const PFIC_IENR1: u32 = 0x100;

/// Shared vector for EXTI lines 0-7
pub const EXTI7_0_IRQN: u32 = 20;

/// APB2 clock enable bits
const APB2_AFIO: u32 = 1 << 0;
const APB2_IOPC: u32 = 1 << 4;
const APB2_IOPD: u32 = 1 << 5;
const APB2_USART1: u32 = 1 << 14;

/// CFGLR nibbles (CNF[1:0] MODE[1:0])
const CFG_OUTPUT_PUSH_PULL: u32 = 0x3; // 50MHz push-pull
const CFG_AF_PUSH_PULL: u32 = 0xB;     // 50MHz alternate-function push-pull
const CFG_INPUT_PULL: u32 = 0x8;       // pull-up/down selected by OUTDR

#[inline(always)]
fn reg(base: u32, offset: u32) -> *mut u32 {
    (base + offset) as *mut u32
}

/// Read-modify-write of a peripheral register
///
/// # Safety
/// `addr` must be a valid MMIO register and the caller must not race another
/// writer of the same register.
#[inline(always)]
unsafe fn modify(addr: *mut u32, f: impl FnOnce(u32) -> u32) {
    let value = core::ptr::read_volatile(addr);
    core::ptr::write_volatile(addr, f(value));
}

/// GPIO port
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Port {
    C,
    D,
}

impl Port {
    const fn base(self) -> u32 {
        match self {
            Port::C => GPIOC_BASE,
            Port::D => GPIOD_BASE,
        }
    }

    /// AFIO_EXTICR source code for this port
    const fn exti_source(self) -> u32 {
        match self {
            Port::C => 0b10,
            Port::D => 0b11,
        }
    }
}

/// A physical pin; its number is also its EXTI line
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PinId {
    pub port: Port,
    pub pin: u8,
}

impl PinId {
    pub const fn new(port: Port, pin: u8) -> Self {
        Self { port, pin }
    }

    /// Bit mask for this pin in GPIO and EXTI registers
    pub const fn mask(self) -> u32 {
        1 << self.pin
    }

    fn configure(self, cfg: u32) {
        let shift = self.pin as u32 * 4;
        unsafe {
            modify(reg(self.port.base(), GPIO_CFGLR), |v| (v & !(0xF << shift)) | (cfg << shift));
        }
    }

    fn set_pull(self, up: bool) {
        unsafe {
            modify(reg(self.port.base(), GPIO_OUTDR), |v| {
                if up { v | self.mask() } else { v & !self.mask() }
            });
        }
    }
}

/// Push-pull output driven through BSHR
#[derive(Debug)]
pub struct Pin {
    id: PinId,
}

impl Pin {
    pub const fn new(id: PinId) -> Self {
        Self { id }
    }
}

impl ErrorType for Pin {
    type Error = Infallible;
}

impl OutputPin for Pin {
    fn set_high(&mut self) -> Result<(), Self::Error> {
        // BSHR low half sets, atomically
        unsafe {
            core::ptr::write_volatile(reg(self.id.port.base(), GPIO_BSHR), self.id.mask());
        }
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        // BSHR high half resets
        unsafe {
            core::ptr::write_volatile(reg(self.id.port.base(), GPIO_BSHR), self.id.mask() << 16);
        }
        Ok(())
    }
}

const fn c(pin: u8) -> PinId {
    PinId::new(Port::C, pin)
}

const fn d(pin: u8) -> PinId {
    PinId::new(Port::D, pin)
}

/// Wiring of one hardware variant
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PinMap {
    /// Timing signal, rising edge
    pub signal: PinId,
    /// Pulse output
    pub output: PinId,
    /// Increment button, falling edge
    pub up: PinId,
    /// Decrement button, falling edge
    pub down: PinId,
    /// Display lines in A..G order
    pub segments: [PinId; 7],
    /// USART1 TX
    pub tx: PinId,
}

/// Build-time hardware variant
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Variant {
    /// 100us pulses on PD3
    NarrowPulse,
    /// 1ms pulses on PD6, display mounted rotated 180 degrees
    WidePulse,
}

impl Variant {
    #[cfg(not(feature = "wide-pulse"))]
    pub const ACTIVE: Variant = Variant::NarrowPulse;
    #[cfg(feature = "wide-pulse")]
    pub const ACTIVE: Variant = Variant::WidePulse;

    pub const fn pins(self) -> PinMap {
        match self {
            Variant::NarrowPulse => PinMap {
                signal: d(2),
                output: d(3),
                up: d(4),
                down: c(0),
                segments: [c(1), c(2), c(3), c(4), c(5), c(6), c(7)],
                tx: d(5),
            },
            Variant::WidePulse => PinMap {
                signal: d(2),
                output: d(6),
                up: d(4),
                down: c(0),
                // Rotated: A<->D, B<->E, C<->F
                segments: [c(4), c(5), c(6), c(1), c(2), c(3), c(7)],
                tx: d(5),
            },
        }
    }

    pub const fn config(self) -> UpsamplerConfig {
        let config = match self {
            Variant::NarrowPulse => UpsamplerConfig::narrow_pulse(),
            Variant::WidePulse => UpsamplerConfig::wide_pulse(),
        };
        config.with_diagnostics(cfg!(feature = "diagnostics"))
    }
}

/// Segment driver pins for `map`
pub const fn segment_pins(map: &PinMap) -> [Pin; 7] {
    let s = &map.segments;
    [
        Pin::new(s[0]),
        Pin::new(s[1]),
        Pin::new(s[2]),
        Pin::new(s[3]),
        Pin::new(s[4]),
        Pin::new(s[5]),
        Pin::new(s[6]),
    ]
}

/// Enable GPIOC, GPIOD, AFIO and USART1 clocks
pub fn enable_peripheral_clocks() {
    unsafe {
        modify(reg(RCC_BASE, RCC_APB2PCENR), |v| {
            v | APB2_AFIO | APB2_IOPC | APB2_IOPD | APB2_USART1
        });
    }
}

/// Configure every pin of `map` and park all outputs
pub fn configure_pins(map: &PinMap) {
    // Signal idles low; buttons pull to VCC and short to ground
    map.signal.configure(CFG_INPUT_PULL);
    map.signal.set_pull(false);
    for button in [map.up, map.down] {
        button.configure(CFG_INPUT_PULL);
        button.set_pull(true);
    }

    let mut output = Pin::new(map.output);
    output.set_low().ok();
    map.output.configure(CFG_OUTPUT_PUSH_PULL);

    // Active-low segments start dark
    for segment in map.segments {
        Pin::new(segment).set_high().ok();
        segment.configure(CFG_OUTPUT_PUSH_PULL);
    }

    map.tx.configure(CFG_AF_PUSH_PULL);
}

/// Route the signal and button lines to EXTI and unmask the shared vector
pub fn configure_exti(map: &PinMap) {
    unsafe {
        for id in [map.signal, map.up, map.down] {
            let shift = id.pin as u32 * 2;
            modify(reg(AFIO_BASE, AFIO_EXTICR), |v| {
                (v & !(0b11 << shift)) | (id.port.exti_source() << shift)
            });
        }

        modify(reg(EXTI_BASE, EXTI_RTENR), |v| v | map.signal.mask());
        modify(reg(EXTI_BASE, EXTI_FTENR), |v| v | map.up.mask() | map.down.mask());

        // Drop anything latched while the lines were being configured
        core::ptr::write_volatile(reg(EXTI_BASE, EXTI_INTFR), 0xFF);
        modify(reg(EXTI_BASE, EXTI_INTENR), |v| {
            v | map.signal.mask() | map.up.mask() | map.down.mask()
        });
    }
    enable_irq(EXTI7_0_IRQN);
}

/// Unmask one interrupt in the PFIC
pub fn enable_irq(irqn: u32) {
    unsafe {
        core::ptr::write_volatile(reg(PFIC_BASE, PFIC_IENR1), 1 << irqn);
    }
}

/// Pending EXTI lines
pub fn exti_pending() -> u32 {
    unsafe { core::ptr::read_volatile(reg(EXTI_BASE, EXTI_INTFR)) }
}

/// Acknowledge the lines in `mask`
pub fn exti_clear(mask: u32) {
    unsafe {
        core::ptr::write_volatile(reg(EXTI_BASE, EXTI_INTFR), mask);
    }
}
