//! Blocking USART1 transmitter for the diagnostic stream

use core::fmt;
use crate::clock::HCLK_HZ;

const USART1_BASE: u32 = 0x4001_3800;
const USART_STATR: u32 = 0x00;
const USART_DATAR: u32 = 0x04;
const USART_BRR: u32 = 0x08;
const USART_CTLR1: u32 = 0x0C;

const STATR_TXE: u32 = 1 << 7;
const CTLR1_TE: u32 = 1 << 3;
const CTLR1_UE: u32 = 1 << 13;

pub const BAUD_RATE: u32 = 115_200;

#[inline(always)]
fn usart(offset: u32) -> *mut u32 {
    (USART1_BASE + offset) as *mut u32
}

/// TX-only USART1 on PD5, 8N1
///
/// Pin and clock setup is done by [`crate::board`].
pub struct Usart1Tx {
    _private: (),
}

impl Usart1Tx {
    pub fn init() -> Self {
        unsafe {
            // 24MHz / 115200 = 208 (0xD0), 0.2% error
            core::ptr::write_volatile(usart(USART_BRR), HCLK_HZ / BAUD_RATE);
            core::ptr::write_volatile(usart(USART_CTLR1), CTLR1_UE | CTLR1_TE);
        }
        Self { _private: () }
    }

    pub fn write_byte(&mut self, byte: u8) {
        unsafe {
            while core::ptr::read_volatile(usart(USART_STATR)) & STATR_TXE == 0 {}
            core::ptr::write_volatile(usart(USART_DATAR), byte as u32);
        }
    }
}

impl fmt::Write for Usart1Tx {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            self.write_byte(byte);
        }
        Ok(())
    }
}
