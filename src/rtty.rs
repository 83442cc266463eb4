//! RTTY keying loop.
//!
//! Walks a [`TransmissionPlan`] bit by bit: retune the synthesizer to the
//! mark or space increment, then hold for one bit time while the tick
//! callback keeps running. The hold is a blocking delay; it is the only
//! coupling between the bit-rate loop and the sample-rate callback.

use embedded_hal::delay::DelayNs;

use crate::audio::dds::{phase_increment, DdsControl};
use crate::bitstream::{TransmissionPlan, SYMBOL_BITS};
use crate::config::ToneParameters;

/// Increments and hold time for one transmission, fixed at start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keying {
    /// Increment for bit value 1.
    pub mark: u32,
    /// Increment for bit value 0.
    pub space: u32,
    /// One bit time, in microseconds.
    pub hold_us: u32,
}

impl Keying {
    pub fn new(tone: &ToneParameters, sample_rate: u32) -> Self {
        Self {
            mark: phase_increment(tone.high_hz, sample_rate),
            space: phase_increment(tone.low_hz, sample_rate),
            hold_us: tone.bit_hold_us(),
        }
    }

    #[inline]
    pub fn increment_for(&self, bit: u8) -> u32 {
        if bit != 0 {
            self.mark
        } else {
            self.space
        }
    }
}

/// What a finished transmission sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransmitReport {
    /// Framed symbols, preamble and shifts included.
    pub symbols: usize,
    pub bits: usize,
    /// Characters dropped because neither table has them.
    pub skipped: usize,
    pub hold_us: u32,
}

impl TransmitReport {
    /// Total key-down time, in microseconds.
    #[inline]
    pub fn duration_us(&self) -> u64 {
        self.bits as u64 * self.hold_us as u64
    }
}

/// Key the whole plan, then leave the synthesizer silent.
///
/// Blocks for `bits * hold_us`. There is no early abort.
pub fn transmit<I, D>(
    plan: &TransmissionPlan<I>,
    control: &DdsControl,
    delay: &mut D,
    keying: Keying,
) -> TransmitReport
where
    I: Iterator<Item = char> + Clone,
    D: DelayNs + ?Sized,
{
    let mut bits = 0usize;
    for bit in plan.bits() {
        control.set_increment(keying.increment_for(bit));
        delay.delay_us(keying.hold_us);
        bits += 1;
    }
    control.silence();

    TransmitReport {
        symbols: bits / SYMBOL_BITS,
        bits,
        skipped: plan.skipped(),
        hold_us: keying.hold_us,
    }
}
