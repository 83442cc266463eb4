//! MCP4901 8-bit DAC driver
//!
//! SPI write-only, one 16-bit frame per sample, framed by chip-select.
//! Reference: MCP4901/4911/4921 datasheet, write command register.
//!
//! ```text
//! bit 15   14   13   12   11 ............ 4   3..0
//!     A/B  BUF  GA   SHDN D7 ........... D0   x
//!     └─ config nibble ┘ └── sample ───────┘
//! ```

use core::fmt;

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

/// Channel A, unbuffered VREF, 1x gain, output active.
pub const DAC_CONFIG_NIBBLE: u8 = 0b0011;

/// Destination for 8-bit unsigned audio samples.
///
/// Both periodic generators write through this seam, one sample per tick.
pub trait SampleSink {
    type Error;

    fn write_sample(&mut self, sample: u8) -> Result<(), Self::Error>;
}

impl<T: SampleSink + ?Sized> SampleSink for &mut T {
    type Error = T::Error;

    #[inline]
    fn write_sample(&mut self, sample: u8) -> Result<(), Self::Error> {
        (**self).write_sample(sample)
    }
}

/// Two-byte command frame for one sample, high byte first.
#[inline]
pub fn dac_frame(sample: u8) -> [u8; 2] {
    [(DAC_CONFIG_NIBBLE << 4) | (sample >> 4), sample << 4]
}

/// DAC transaction failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DacError<S, P> {
    /// SPI bus error
    Spi(S),
    /// Chip-select pin error
    ChipSelect(P),
}

impl<S: fmt::Debug, P: fmt::Debug> fmt::Display for DacError<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spi(e) => write!(f, "DAC SPI error: {:?}", e),
            Self::ChipSelect(e) => write!(f, "DAC chip-select error: {:?}", e),
        }
    }
}

/// MCP4901 on a shared SPI bus with a dedicated chip-select line.
pub struct Mcp4901<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS> Mcp4901<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    /// Create driver. Chip-select is driven inactive (high).
    pub fn new(spi: SPI, mut cs: CS) -> Result<Self, DacError<SPI::Error, CS::Error>> {
        cs.set_high().map_err(DacError::ChipSelect)?;
        Ok(Self { spi, cs })
    }

    /// Release the bus and pin.
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }

    fn transfer(&mut self, frame: &[u8; 2]) -> Result<(), DacError<SPI::Error, CS::Error>> {
        self.cs.set_low().map_err(DacError::ChipSelect)?;
        let result = self
            .spi
            .write(frame)
            .and_then(|_| self.spi.flush())
            .map_err(DacError::Spi);
        // Always end the frame, even after a bus error
        self.cs.set_high().map_err(DacError::ChipSelect)?;
        result
    }
}

impl<SPI, CS> SampleSink for Mcp4901<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    type Error = DacError<SPI::Error, CS::Error>;

    #[inline]
    fn write_sample(&mut self, sample: u8) -> Result<(), Self::Error> {
        self.transfer(&dac_frame(sample))
    }
}
