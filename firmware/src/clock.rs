//! SysTick millisecond counter and the derived microsecond clock

use core::cell::Cell;
use critical_section::Mutex;
use upsampler_core::{Instant, MonotonicClock};

/// Core clock once `init` has cleared the AHB prescaler (HSI, /1)
pub const HCLK_HZ: u32 = 24_000_000;

/// RCC_CFGR0; HPRE resets to 0b0010 (/3, 8 MHz HCLK)
const RCC_CFGR0: *mut u32 = 0x4002_1004 as *mut u32;
const HPRE_MASK: u32 = 0xF << 4;

/// CFGR0 value with HPRE set to DIV1
const fn hpre_div1(cfgr0: u32) -> u32 {
    cfgr0 & !HPRE_MASK
}

// SysTick and USART1 divisors assume an undivided 24 MHz HCLK
const _: () = assert!(hpre_div1(0b0010 << 4) == 0);
const _: () = assert!(TICKS_PER_MILLI == 24_000);

const TICKS_PER_MICRO: u32 = HCLK_HZ / 1_000_000;
const TICKS_PER_MILLI: u32 = HCLK_HZ / 1_000;

/// SysTick registers
const STK_BASE: u32 = 0xE000_F000;
const STK_CTLR: u32 = 0x00;
const STK_SR: u32 = 0x04;
const STK_CNTL: u32 = 0x08;
const STK_CMPLR: u32 = 0x10;

/// STE | STIE | STCLK (HCLK) | STRE (reload on compare)
const STK_CTLR_RUN: u32 = 0xF;
const STK_SR_CNTIF: u32 = 1 << 0;

/// SysTick vector number
pub const SYSTICK_IRQN: u32 = 12;

static MILLIS: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

#[inline(always)]
fn stk(offset: u32) -> *mut u32 {
    (STK_BASE + offset) as *mut u32
}

/// Run HCLK at 24 MHz and start the 1 kHz tick
pub fn init() {
    critical_section::with(|cs| MILLIS.borrow(cs).set(0));
    unsafe {
        let cfgr0 = core::ptr::read_volatile(RCC_CFGR0);
        core::ptr::write_volatile(RCC_CFGR0, hpre_div1(cfgr0));

        core::ptr::write_volatile(stk(STK_CTLR), 0);
        core::ptr::write_volatile(stk(STK_CNTL), 0);
        core::ptr::write_volatile(stk(STK_CMPLR), TICKS_PER_MILLI - 1);
        core::ptr::write_volatile(stk(STK_SR), 0);
        core::ptr::write_volatile(stk(STK_CTLR), STK_CTLR_RUN);
    }
    crate::board::enable_irq(SYSTICK_IRQN);
}

/// Called from the SysTick handler
pub fn on_tick() {
    unsafe {
        core::ptr::write_volatile(stk(STK_SR), 0);
    }
    critical_section::with(|cs| {
        let millis = MILLIS.borrow(cs);
        millis.set(millis.get().wrapping_add(1));
    });
}

/// Milliseconds since `init`
pub fn millis() -> u32 {
    critical_section::with(|cs| MILLIS.borrow(cs).get())
}

/// Microseconds since `init`, wrapping with the 32-bit counter
pub fn micros() -> u32 {
    critical_section::with(|cs| {
        let mut ms = MILLIS.borrow(cs).get();
        let mut ticks = unsafe { core::ptr::read_volatile(stk(STK_CNTL)) };

        // Compare hit but the handler is held off by this critical section
        if unsafe { core::ptr::read_volatile(stk(STK_SR)) } & STK_SR_CNTIF != 0 {
            ticks = unsafe { core::ptr::read_volatile(stk(STK_CNTL)) };
            ms = ms.wrapping_add(1);
        }

        ms.wrapping_mul(1_000).wrapping_add(ticks / TICKS_PER_MICRO)
    })
}

/// [`MonotonicClock`] backed by SysTick
#[derive(Copy, Clone, Debug, Default)]
pub struct SysTickClock;

impl MonotonicClock for SysTickClock {
    fn now(&self) -> Instant {
        Instant::from_micros(micros())
    }
}
