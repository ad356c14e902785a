#![no_std]

//! CH32V003 board support for the pulse upsampler

pub mod board;
pub mod clock;
pub mod serial;

pub use upsampler_core::*;

// Critical section implementation for single-core RISC-V
struct RiscvCriticalSection;
critical_section::set_impl!(RiscvCriticalSection);

unsafe impl critical_section::Impl for RiscvCriticalSection {
    unsafe fn acquire() -> critical_section::RawRestoreState {
        let mstatus = riscv::register::mstatus::read();
        riscv::register::mstatus::clear_mie();
        mstatus.mie() as u8
    }

    unsafe fn release(was_enabled: critical_section::RawRestoreState) {
        if was_enabled != 0 {
            riscv::register::mstatus::set_mie();
        }
    }
}

/// Globally enable machine interrupts
///
/// # Safety
/// Every handler's shared state must be initialized first.
pub unsafe fn enable_interrupts() {
    riscv::interrupt::enable();
}
