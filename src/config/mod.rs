//! Module: config
//!
//! Purpose: Tone parameters for RTTY transmission.
//!
//! Architecture:
//! - `ToneParameters`: plain value, snapshotted once per send
//! - `ToneConfig`: lock-free store the command layer mutates
//! - Every successful change bumps `generation`
//! - Defaults are the 170 Hz shift, 45.45 baud amateur convention
//!
//! Safety: RT-safe. All access via atomics, no locks.

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::audio::dds::DDS_SAMPLE_RATE_HZ;

/// Default tone for bit value 1 (mark).
pub const DEFAULT_HIGH_HZ: u32 = 2125;

/// Default tone for bit value 0 (space).
pub const DEFAULT_LOW_HZ: u32 = 2295;

/// Default symbol rate.
pub const DEFAULT_BAUD: f32 = 45.45;

/// Lowest accepted symbol rate. Keeps the bit hold within `u32` microseconds.
pub const MIN_BAUD: f32 = 1.0;

/// Highest accepted symbol rate.
pub const MAX_BAUD: f32 = 1000.0;

/// Tone configuration for one transmission.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToneParameters {
    /// Frequency keyed by bit value 1 (mark), in Hz.
    pub high_hz: u32,
    /// Frequency keyed by bit value 0 (space), in Hz.
    pub low_hz: u32,
    /// Symbols per second.
    pub baud: f32,
}

impl ToneParameters {
    pub const DEFAULT: Self = Self {
        high_hz: DEFAULT_HIGH_HZ,
        low_hz: DEFAULT_LOW_HZ,
        baud: DEFAULT_BAUD,
    };

    /// Check both tones against the Nyquist limit of `sample_rate` and the
    /// baud rate against `[MIN_BAUD, MAX_BAUD]`.
    pub fn validate(&self, sample_rate: u32) -> Result<(), ToneError> {
        check_frequency(self.high_hz, sample_rate)?;
        check_frequency(self.low_hz, sample_rate)?;
        check_baud(self.baud)
    }

    /// Duration of one bit, in microseconds (`1000 / baud` ms).
    #[inline]
    pub fn bit_hold_us(&self) -> u32 {
        (1_000_000.0 / self.baud + 0.5) as u32
    }
}

impl Default for ToneParameters {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Rejected tone change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ToneError {
    /// Zero or at/above half the synthesizer sample rate.
    FrequencyOutOfRange { hz: u32, nyquist_hz: u32 },
    /// Not a finite value in `[MIN_BAUD, MAX_BAUD]`.
    BaudOutOfRange { baud: f32 },
}

impl fmt::Display for ToneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrequencyOutOfRange { hz, nyquist_hz } => {
                write!(f, "frequency {} Hz outside 1..{} Hz", hz, nyquist_hz)
            }
            Self::BaudOutOfRange { baud } => {
                write!(f, "baud {} outside {}..={}", baud, MIN_BAUD, MAX_BAUD)
            }
        }
    }
}

fn check_frequency(hz: u32, sample_rate: u32) -> Result<(), ToneError> {
    let nyquist_hz = sample_rate / 2;
    if hz == 0 || hz >= nyquist_hz {
        return Err(ToneError::FrequencyOutOfRange { hz, nyquist_hz });
    }
    Ok(())
}

fn check_baud(baud: f32) -> Result<(), ToneError> {
    if !baud.is_finite() || baud < MIN_BAUD || baud > MAX_BAUD {
        return Err(ToneError::BaudOutOfRange { baud });
    }
    Ok(())
}

/// Shared, lock-free tone configuration.
///
/// Written by the command layer, read once per transmission by the modem.
/// The baud rate is stored as raw `f32` bits.
pub struct ToneConfig {
    high_hz: AtomicU32,
    low_hz: AtomicU32,
    baud_bits: AtomicU32,
    generation: AtomicU32,
}

impl ToneConfig {
    /// Store holding the defaults.
    pub const fn new() -> Self {
        Self {
            high_hz: AtomicU32::new(DEFAULT_HIGH_HZ),
            low_hz: AtomicU32::new(DEFAULT_LOW_HZ),
            baud_bits: AtomicU32::new(DEFAULT_BAUD.to_bits()),
            generation: AtomicU32::new(0),
        }
    }

    /// Consistent-enough copy for one transmission.
    #[inline]
    pub fn snapshot(&self) -> ToneParameters {
        ToneParameters {
            high_hz: self.high_hz.load(Ordering::Acquire),
            low_hz: self.low_hz.load(Ordering::Acquire),
            baud: f32::from_bits(self.baud_bits.load(Ordering::Acquire)),
        }
    }

    pub fn set_high_hz(&self, hz: u32) -> Result<(), ToneError> {
        check_frequency(hz, DDS_SAMPLE_RATE_HZ)?;
        self.high_hz.store(hz, Ordering::Release);
        self.bump();
        Ok(())
    }

    pub fn set_low_hz(&self, hz: u32) -> Result<(), ToneError> {
        check_frequency(hz, DDS_SAMPLE_RATE_HZ)?;
        self.low_hz.store(hz, Ordering::Release);
        self.bump();
        Ok(())
    }

    pub fn set_baud(&self, baud: f32) -> Result<(), ToneError> {
        check_baud(baud)?;
        self.baud_bits.store(baud.to_bits(), Ordering::Release);
        self.bump();
        Ok(())
    }

    /// Replace all three values after validating them together.
    pub fn set(&self, tone: ToneParameters) -> Result<(), ToneError> {
        tone.validate(DDS_SAMPLE_RATE_HZ)?;
        self.high_hz.store(tone.high_hz, Ordering::Release);
        self.low_hz.store(tone.low_hz, Ordering::Release);
        self.baud_bits.store(tone.baud.to_bits(), Ordering::Release);
        self.bump();
        Ok(())
    }

    /// Restore defaults.
    pub fn reset(&self) {
        self.high_hz.store(DEFAULT_HIGH_HZ, Ordering::Release);
        self.low_hz.store(DEFAULT_LOW_HZ, Ordering::Release);
        self.baud_bits.store(DEFAULT_BAUD.to_bits(), Ordering::Release);
        self.bump();
    }

    /// Number of changes applied since boot.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation.load(Ordering::Acquire)
    }

    #[inline]
    fn bump(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ToneConfig::new();
        let tone = config.snapshot();
        assert_eq!(tone, ToneParameters::default());
        assert_eq!(tone.high_hz, 2125);
        assert_eq!(tone.low_hz, 2295);
        assert_eq!(tone.baud, 45.45);
        assert_eq!(config.generation(), 0);
    }

    #[test]
    fn test_bit_hold_at_default_baud() {
        // 1000 / 45.45 ms = 22.002 ms
        assert_eq!(ToneParameters::default().bit_hold_us(), 22_002);

        let fast = ToneParameters { baud: 50.0, ..ToneParameters::default() };
        assert_eq!(fast.bit_hold_us(), 20_000);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let config = ToneConfig::new();

        assert_eq!(
            config.set_high_hz(40_000),
            Err(ToneError::FrequencyOutOfRange { hz: 40_000, nyquist_hz: 40_000 })
        );
        assert!(config.set_low_hz(0).is_err());
        assert!(config.set_baud(0.0).is_err());
        assert!(config.set_baud(f32::NAN).is_err());
        assert!(config.set_baud(1500.0).is_err());

        // Nothing applied
        assert_eq!(config.snapshot(), ToneParameters::default());
        assert_eq!(config.generation(), 0);
    }

    #[test]
    fn test_baud_bounds() {
        let config = ToneConfig::new();

        assert_eq!(config.set_baud(0.0001), Err(ToneError::BaudOutOfRange { baud: 0.0001 }));
        assert!(config.set_baud(0.999).is_err());
        assert_eq!(config.generation(), 0);

        config.set_baud(MIN_BAUD).unwrap();
        assert_eq!(config.snapshot().bit_hold_us(), 1_000_000);

        config.set_baud(MAX_BAUD).unwrap();
        assert_eq!(config.snapshot().bit_hold_us(), 1_000);
        assert_eq!(config.generation(), 2);
    }

    #[test]
    fn test_set_and_reset() {
        let config = ToneConfig::new();

        config.set_high_hz(1275).unwrap();
        config.set_low_hz(1445).unwrap();
        config.set_baud(75.0).unwrap();

        let tone = config.snapshot();
        assert_eq!(tone.high_hz, 1275);
        assert_eq!(tone.low_hz, 1445);
        assert_eq!(tone.baud, 75.0);
        assert_eq!(config.generation(), 3);

        config.reset();
        assert_eq!(config.snapshot(), ToneParameters::default());
        assert_eq!(config.generation(), 4);
    }
}
