//! Seven-segment display encoder

use embedded_hal::digital::OutputPin;
use crate::hal::HalError;

/// Segment lines per digit
pub const SEGMENTS: usize = 7;

/// Segment bits in A..G order (bit 6 = A, bit 0 = G), 0 = segment lit
const DIGITS: [u8; 10] = [
    0b0000001, 0b1001111, 0b0010010, 0b0000110, 0b1001100,
    0b0100100, 0b0100000, 0b0001111, 0b0000000, 0b0000100,
];

/// Closest seven-segment shapes for A..Z
const LETTERS: [u8; 26] = [
    0b0001000, // A
    0b1100000, // b
    0b0110001, // C
    0b1000010, // d
    0b0110000, // E
    0b0111000, // F
    0b0100001, // G
    0b1101000, // h
    0b1111001, // I
    0b1000011, // J; not the widely copied 0b1110011, which lights only D and E
    0b1001000, // K, same as H
    0b1110001, // L
    0b1010101, // M
    0b1101010, // n
    0b1100010, // o
    0b0011000, // P
    0b0001100, // q
    0b1111010, // r
    0b0100100, // S, same as 5
    0b1110000, // t
    0b1000001, // U
    0b1100011, // v
    0b1010101, // W
    0b1001000, // X, same as H
    0b1000100, // y
    0b0010010, // Z, same as 2
];

/// Seven line levels for one display glyph
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SegmentPattern(u8);

impl SegmentPattern {
    /// Every segment dark
    pub const BLANK: SegmentPattern = SegmentPattern(0b1111111);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b1111111)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Pattern for a decimal digit
    pub const fn digit(value: u8) -> Option<Self> {
        if value < 10 {
            Some(Self(DIGITS[value as usize]))
        } else {
            None
        }
    }

    /// Pattern for an ASCII letter, either case
    pub const fn letter(c: char) -> Option<Self> {
        if c.is_ascii_alphabetic() {
            let index = (c.to_ascii_uppercase() as u8 - b'A') as usize;
            Some(Self(LETTERS[index]))
        } else {
            None
        }
    }

    /// Line level for `segment` (0 = A .. 6 = G); low lights the segment.
    /// `None` past G.
    pub const fn level(self, segment: usize) -> Option<bool> {
        if segment < SEGMENTS {
            Some((self.0 >> (SEGMENTS - 1 - segment)) & 1 == 1)
        } else {
            None
        }
    }

    /// All seven line levels in A..G order
    pub fn levels(self) -> [bool; SEGMENTS] {
        core::array::from_fn(|segment| (self.0 >> (SEGMENTS - 1 - segment)) & 1 == 1)
    }
}

/// Anything able to show the current factor
pub trait FactorDisplay {
    type Error: From<HalError>;

    /// Show `value`; values outside 0..=9 are ignored
    fn show(&mut self, value: u8) -> Result<(), Self::Error>;
}

/// Single common-anode digit driven through seven output pins (A..G order)
pub struct SevenSegment<P> {
    pins: [P; 7],
    last: Option<SegmentPattern>,
}

impl<P> SevenSegment<P> {
    pub const fn new(pins: [P; 7]) -> Self {
        Self { pins, last: None }
    }

    /// Last pattern written to the pins
    pub fn last_rendered(&self) -> Option<SegmentPattern> {
        self.last
    }

    pub fn pins(&self) -> &[P; 7] {
        &self.pins
    }

    pub fn release(self) -> [P; 7] {
        self.pins
    }
}

impl<P: OutputPin> SevenSegment<P> {
    /// Show a digit; anything outside 0..=9 leaves the display untouched
    pub fn render(&mut self, value: u8) -> Result<(), HalError> {
        match SegmentPattern::digit(value) {
            Some(pattern) => self.write(pattern),
            None => Ok(()),
        }
    }

    /// Show a letter; non-letters leave the display untouched
    pub fn render_letter(&mut self, c: char) -> Result<(), HalError> {
        match SegmentPattern::letter(c) {
            Some(pattern) => self.write(pattern),
            None => Ok(()),
        }
    }

    pub fn blank(&mut self) -> Result<(), HalError> {
        self.write(SegmentPattern::BLANK)
    }

    /// Drive every segment line for `pattern`
    pub fn write(&mut self, pattern: SegmentPattern) -> Result<(), HalError> {
        for (pin, high) in self.pins.iter_mut().zip(pattern.levels()) {
            let result = if high {
                pin.set_high()
            } else {
                pin.set_low()
            };
            result.map_err(|_| HalError::GpioError)?;
        }
        self.last = Some(pattern);
        Ok(())
    }
}

impl<P: OutputPin> FactorDisplay for SevenSegment<P> {
    type Error = HalError;

    fn show(&mut self, value: u8) -> Result<(), Self::Error> {
        self.render(value)
    }
}
