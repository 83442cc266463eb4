//! Direct digital synthesis tone generator
//!
//! Fixed-rate phase accumulator indexing the sine LUT. The main sequence
//! retunes it by writing a new increment into [`DdsControl`]; the tick
//! callback owns the accumulator and the DAC.
//!
//! ```text
//! main sequence            DdsControl             tick @ 80 kHz
//! ─────────────            ──────────             ─────────────
//! set_increment() ───────▶ [increment] ─────────▶ phase += inc
//!                           single writer          LUT[phase >> 24] ──▶ DAC
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use super::lut::SINE_LUT;
use crate::fault::{FaultCode, FaultState};
use crate::hal::dac::SampleSink;

/// Tick rate of the synthesizer callback.
pub const DDS_SAMPLE_RATE_HZ: u32 = 80_000;

/// Increment that yields silence (phase frozen).
pub const SILENCE: u32 = 0;

/// Phase increment for `freq_hz` at `sample_rate`.
///
/// `round(freq * 2^32 / sample_rate)`, in integer arithmetic.
#[inline]
pub fn phase_increment(freq_hz: u32, sample_rate: u32) -> u32 {
    let rate = sample_rate as u64;
    ((((freq_hz as u64) << 32) + rate / 2) / rate) as u32
}

/// Frequency actually produced by `increment` at `sample_rate`.
#[inline]
pub fn output_frequency(increment: u32, sample_rate: u32) -> f64 {
    increment as f64 * sample_rate as f64 / 4_294_967_296.0
}

/// Smallest frequency step the accumulator can express, in Hz.
#[inline]
pub fn frequency_resolution(sample_rate: u32) -> f64 {
    sample_rate as f64 / 4_294_967_296.0
}

/// Control word shared between the main sequence and the tick callback.
///
/// Only the main sequence writes, only the callback reads.
pub struct DdsControl {
    increment: AtomicU32,
}

impl DdsControl {
    /// Start silent.
    pub const fn new() -> Self {
        Self {
            increment: AtomicU32::new(SILENCE),
        }
    }

    /// Retune. Takes effect on the next tick.
    #[inline]
    pub fn set_increment(&self, increment: u32) {
        self.increment.store(increment, Ordering::Release);
    }

    #[inline]
    pub fn increment(&self) -> u32 {
        self.increment.load(Ordering::Acquire)
    }

    #[inline]
    pub fn silence(&self) {
        self.set_increment(SILENCE);
    }

    #[inline]
    pub fn is_silent(&self) -> bool {
        self.increment() == SILENCE
    }
}

impl Default for DdsControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Tick-side state: the phase accumulator and the DAC it feeds.
///
/// Owned by the periodic callback. No floating point in [`Synthesizer::tick`].
pub struct Synthesizer<'a, S> {
    control: &'a DdsControl,
    fault: &'a FaultState,
    /// Phase accumulator (32-bit fixed point, top 8 bits = LUT index)
    phase: u32,
    dac: S,
}

impl<'a, S: SampleSink> Synthesizer<'a, S> {
    pub fn new(control: &'a DdsControl, fault: &'a FaultState, dac: S) -> Self {
        Self {
            control,
            fault,
            phase: 0,
            dac,
        }
    }

    /// One output sample. Call at [`DDS_SAMPLE_RATE_HZ`].
    ///
    /// Returns the sample written (or attempted) to the DAC.
    #[inline]
    pub fn tick(&mut self) -> u8 {
        // Wrapping add is the modulo-2^32 phase wheel
        self.phase = self.phase.wrapping_add(self.control.increment());
        let sample = SINE_LUT[(self.phase >> 24) as usize];

        if self.dac.write_sample(sample).is_err() {
            self.fault.set(FaultCode::DacBus, sample as u32);
        }
        sample
    }

    #[inline]
    pub fn phase(&self) -> u32 {
        self.phase
    }

    /// Reset phase (e.g., between transmissions).
    pub fn reset(&mut self) {
        self.phase = 0;
    }

    pub fn dac(&self) -> &S {
        &self.dac
    }

    pub fn dac_mut(&mut self) -> &mut S {
        &mut self.dac
    }
}
