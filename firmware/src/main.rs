#![no_std]
#![no_main]

// Logging support
#[cfg(feature = "defmt")]
use defmt::{info, warn};
#[cfg(feature = "defmt")]
use defmt_rtt as _;
use panic_halt as _;

// Define simple logging macros when defmt is not available
#[cfg(not(feature = "defmt"))]
macro_rules! info {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "defmt"))]
macro_rules! warn {
    ($($arg:tt)*) => {};
}

use core::cell::RefCell;
use core::fmt::Write;
use critical_section::Mutex;
use riscv_rt::entry;
use upsampler_core::{
    hal::EmbeddedHalPulseOutput, Button, EdgeCapture, FactorControl, MonotonicClock, PulseOutput,
    SevenSegment, Upsampler, UpsamplerConfig,
};
use upsampler_firmware::board::{self, Pin, PinMap, Variant};
use upsampler_firmware::clock::{self, SysTickClock};
use upsampler_firmware::serial::Usart1Tx;

const VARIANT: Variant = Variant::ACTIVE;
const PINS: PinMap = VARIANT.pins();
const CONFIG: UpsamplerConfig = VARIANT.config();

/// Latest signal edge, written by EXTI and drained by the main loop
static CAPTURE: EdgeCapture = EdgeCapture::new();

/// Factor and button debounce state shared with the EXTI handler
static CONTROL: FactorControl = FactorControl::from_config(&CONFIG);

/// Display, refreshed from the EXTI handler on every accepted press
static DISPLAY: Mutex<RefCell<SevenSegment<Pin>>> =
    Mutex::new(RefCell::new(SevenSegment::new(board::segment_pins(&PINS))));

#[entry]
fn main() -> ! {
    board::enable_peripheral_clocks();
    board::configure_pins(&PINS);
    clock::init();
    let mut serial = Usart1Tx::init();

    let mut output = EmbeddedHalPulseOutput::new(Pin::new(PINS.output), false);
    output.set_state(false).ok();

    critical_section::with(|cs| {
        DISPLAY.borrow_ref_mut(cs).render(CONTROL.factor().get()).ok();
    });
    serial.write_str("System Ready.\r\n").ok();

    board::configure_exti(&PINS);
    unsafe { upsampler_firmware::enable_interrupts() };

    info!(
        "Upsampler ready: {}us pulses, factor {}, up at {}ms",
        CONFIG.pulse_width.as_micros(),
        CONTROL.factor().get(),
        clock::millis()
    );

    let mut upsampler = Upsampler::new(CONFIG);

    #[cfg(feature = "diagnostics")]
    let mut diagnostics = upsampler_core::LineDiagnostics::new(serial);
    #[cfg(not(feature = "diagnostics"))]
    let mut diagnostics = upsampler_core::NoDiagnostics;

    upsampler.run(&CAPTURE, &CONTROL, &SysTickClock, &mut output, &mut diagnostics)
}

// ========================================
// Interrupt Handlers
// ========================================

/// SysTick interrupt handler
#[no_mangle]
extern "C" fn SysTick() {
    clock::on_tick();
}

/// EXTI interrupt handler for the signal and both buttons
#[no_mangle]
extern "C" fn EXTI7_0_IRQHandler() {
    let pending = board::exti_pending();
    let now = SysTickClock.now();

    // Signal first so its timestamp is not delayed by a display refresh
    if pending & PINS.signal.mask() != 0 {
        CAPTURE.record(now);
    }

    for (button, line) in [(Button::Up, PINS.up), (Button::Down, PINS.down)] {
        if pending & line.mask() != 0 {
            critical_section::with(|cs| {
                let mut display = DISPLAY.borrow_ref_mut(cs);
                if CONTROL.handle_press(button, now, &mut *display).is_err() {
                    warn!("Display refresh failed");
                }
            });
        }
    }

    board::exti_clear(pending & (PINS.signal.mask() | PINS.up.mask() | PINS.down.mask()));
}

/// Dispatch for CH32V003 vectors beyond the standard RISC-V set
#[no_mangle]
extern "C" fn DefaultHandler() {
    let code = riscv::register::mcause::read().code() as u32;
    match code {
        clock::SYSTICK_IRQN => SysTick(),
        board::EXTI7_0_IRQN => EXTI7_0_IRQHandler(),
        _ => {}
    }
}
