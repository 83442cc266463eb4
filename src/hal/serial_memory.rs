//! Bit-banged serial memory reader (25-series SPI EEPROM / flash)
//!
//! Four GPIOs: CS, SCK, SI (to chip), SO (from chip). Mode 0, MSB first.
//! A read is a 32-bit header (READ opcode + 24-bit address) followed by
//! as many data bytes as are clocked; the chip auto-increments the address
//! while CS stays low.
//!
//! ```text
//! CS  ‾‾\________________________________ ... ______/‾‾
//! SI      [0x03][A23..A16][A15..A8][A7..A0]
//! SO                                       [D0][D1]...
//! ```

use core::fmt;

use embedded_hal::digital::{Error as DigitalError, ErrorKind, InputPin, OutputPin};

/// READ opcode.
pub const CMD_READ: u8 = 0x03;

/// Highest byte address reachable with a 24-bit header.
pub const MAX_ADDRESS: u32 = 0x00FF_FFFF;

/// Sequential byte source for playback.
pub trait SampleMemory {
    type Error;

    /// Select the chip and send the read header for `address`.
    fn begin_read(&mut self, address: u32) -> Result<(), Self::Error>;

    /// Clock in the next byte of the open read.
    fn read_byte(&mut self) -> Result<u8, Self::Error>;

    /// Deselect the chip.
    fn end_read(&mut self) -> Result<(), Self::Error>;
}

/// Which line failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryPin {
    ChipSelect,
    Clock,
    DataOut,
    DataIn,
}

/// Serial memory bus error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// GPIO access failed
    Pin { pin: MemoryPin, kind: ErrorKind },
    /// Address does not fit the 24-bit header
    AddressOutOfRange(u32),
    /// `read_byte` without `begin_read`
    NotSelected,
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pin { pin, kind } => write!(f, "memory pin {:?}: {:?}", pin, kind),
            Self::AddressOutOfRange(a) => write!(f, "address 0x{:X} out of range", a),
            Self::NotSelected => write!(f, "read without chip select"),
        }
    }
}

#[inline]
fn pin_err<E: DigitalError>(pin: MemoryPin, e: E) -> MemoryError {
    MemoryError::Pin { pin, kind: e.kind() }
}

/// 4-wire bit-banged serial memory.
pub struct SerialMemory<CS, SCK, SI, SO> {
    cs: CS,
    sck: SCK,
    si: SI,
    so: SO,
    selected: bool,
}

impl<CS, SCK, SI, SO> SerialMemory<CS, SCK, SI, SO>
where
    CS: OutputPin,
    SCK: OutputPin,
    SI: OutputPin,
    SO: InputPin,
{
    /// Create driver with the bus idle (CS high, SCK low).
    pub fn new(mut cs: CS, mut sck: SCK, si: SI, so: SO) -> Result<Self, MemoryError> {
        cs.set_high().map_err(|e| pin_err(MemoryPin::ChipSelect, e))?;
        sck.set_low().map_err(|e| pin_err(MemoryPin::Clock, e))?;
        Ok(Self { cs, sck, si, so, selected: false })
    }

    #[inline]
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Release the pins.
    pub fn release(self) -> (CS, SCK, SI, SO) {
        (self.cs, self.sck, self.si, self.so)
    }

    /// Shift one byte out on SI, MSB first. Chip samples on the rising edge.
    fn shift_out(&mut self, byte: u8) -> Result<(), MemoryError> {
        for bit in (0..8).rev() {
            if (byte >> bit) & 1 == 1 {
                self.si.set_high().map_err(|e| pin_err(MemoryPin::DataOut, e))?;
            } else {
                self.si.set_low().map_err(|e| pin_err(MemoryPin::DataOut, e))?;
            }
            self.sck.set_high().map_err(|e| pin_err(MemoryPin::Clock, e))?;
            self.sck.set_low().map_err(|e| pin_err(MemoryPin::Clock, e))?;
        }
        Ok(())
    }

    /// Shift one byte in from SO, MSB first. Chip drives after the falling edge.
    fn shift_in(&mut self) -> Result<u8, MemoryError> {
        let mut byte = 0u8;
        for _ in 0..8 {
            self.sck.set_high().map_err(|e| pin_err(MemoryPin::Clock, e))?;
            let bit = self.so.is_high().map_err(|e| pin_err(MemoryPin::DataIn, e))?;
            byte = (byte << 1) | bit as u8;
            self.sck.set_low().map_err(|e| pin_err(MemoryPin::Clock, e))?;
        }
        Ok(byte)
    }
}

impl<CS, SCK, SI, SO> SampleMemory for SerialMemory<CS, SCK, SI, SO>
where
    CS: OutputPin,
    SCK: OutputPin,
    SI: OutputPin,
    SO: InputPin,
{
    type Error = MemoryError;

    fn begin_read(&mut self, address: u32) -> Result<(), MemoryError> {
        if address > MAX_ADDRESS {
            return Err(MemoryError::AddressOutOfRange(address));
        }
        let header = (CMD_READ as u32) << 24 | address;

        // Mode 0 idles low; an aborted shift_in can leave SCK high
        self.sck.set_low().map_err(|e| pin_err(MemoryPin::Clock, e))?;
        self.cs.set_low().map_err(|e| pin_err(MemoryPin::ChipSelect, e))?;
        self.selected = true;
        for byte in header.to_be_bytes() {
            self.shift_out(byte)?;
        }
        Ok(())
    }

    #[inline]
    fn read_byte(&mut self) -> Result<u8, MemoryError> {
        if !self.selected {
            return Err(MemoryError::NotSelected);
        }
        self.shift_in()
    }

    fn end_read(&mut self) -> Result<(), MemoryError> {
        self.selected = false;
        self.cs.set_high().map_err(|e| pin_err(MemoryPin::ChipSelect, e))
    }
}
