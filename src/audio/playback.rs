//! Serial-memory sample streamer
//!
//! Plays raw unsigned 8-bit PCM from the start of the serial memory at a
//! fixed rate. Each tick outputs the buffered byte, then clocks in the next
//! one, so the DAC write always happens at the start of the tick.
//!
//! # End of stream
//!
//! There is no length or terminator. Erased memory reads as 0xFF, so a run
//! of [`DEFAULT_SENTINEL_THRESHOLD`] consecutive 0xFF bytes (~31 ms at
//! 8 kHz) ends playback.
//!
//! Known limitation: audio that legitimately holds full scale for that long
//! (clipping) ends playback early. The threshold trades this against the
//! tail of 0xFF that gets played before detection.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use crate::fault::{FaultCode, FaultState};
use crate::hal::dac::SampleSink;
use crate::hal::serial_memory::SampleMemory;

/// Tick rate of the playback callback.
pub const PLAYBACK_SAMPLE_RATE_HZ: u32 = 8_000;

/// Byte value of erased memory.
pub const SENTINEL_BYTE: u8 = 0xFF;

/// Consecutive sentinel bytes that end playback.
pub const DEFAULT_SENTINEL_THRESHOLD: u16 = 250;

/// Playback always starts at the base of the device.
pub const PLAYBACK_BASE_ADDRESS: u32 = 0;

/// Why playback stopped.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEnd {
    /// Sentinel run reached the threshold
    Sentinel = 1,
    /// Serial memory bus error
    MemoryFault = 2,
}

impl PlaybackEnd {
    #[inline]
    fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Sentinel),
            2 => Some(Self::MemoryFault),
            _ => None,
        }
    }
}

/// Handshake between the main sequence and the playback callback.
///
/// Main sequence arms and waits; the callback takes the arm request and
/// raises `finished` exactly once per armed run.
pub struct PlaybackControl {
    armed: AtomicBool,
    finished: AtomicBool,
    end: AtomicU8,
    samples: AtomicU32,
}

impl PlaybackControl {
    pub const fn new() -> Self {
        Self {
            armed: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            end: AtomicU8::new(0),
            samples: AtomicU32::new(0),
        }
    }

    /// Request a new run. Clears the previous outcome.
    pub fn arm(&self) {
        self.finished.store(false, Ordering::Release);
        self.end.store(0, Ordering::Relaxed);
        self.samples.store(0, Ordering::Relaxed);
        self.armed.store(true, Ordering::Release);
    }

    #[inline]
    fn take_arm(&self) -> bool {
        self.armed.swap(false, Ordering::AcqRel)
    }

    #[inline]
    fn count_sample(&self) {
        self.samples.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn finish(&self, end: PlaybackEnd) {
        self.end.store(end as u8, Ordering::Relaxed);
        self.finished.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Busy-wait until the callback signals completion.
    ///
    /// Never returns if the playback source is not ticking.
    pub fn wait(&self) {
        while !self.is_finished() {
            core::hint::spin_loop();
        }
    }

    /// Outcome of the last finished run.
    #[inline]
    pub fn end(&self) -> Option<PlaybackEnd> {
        PlaybackEnd::from_u8(self.end.load(Ordering::Acquire))
    }

    /// Samples written to the DAC in the current or last run.
    #[inline]
    pub fn samples(&self) -> u32 {
        self.samples.load(Ordering::Acquire)
    }
}

impl Default for PlaybackControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-run streamer state, only touched by the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackCursor {
    /// Byte to output on the next tick.
    pub current_sample: u8,
    /// Length of the current run of sentinel bytes.
    pub sentinel_run: u16,
    pub active: bool,
}

/// Result of one playback tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackTick {
    /// Not armed, nothing done.
    Idle,
    /// Sample output, more to come.
    Playing,
    /// This tick ended the run.
    Finished(PlaybackEnd),
}

/// Tick-side playback engine.
pub struct SampleStreamer<'a, M, S> {
    control: &'a PlaybackControl,
    fault: &'a FaultState,
    memory: M,
    dac: S,
    cursor: PlaybackCursor,
    threshold: u16,
    bytes_read: u32,
}

impl<'a, M, S> SampleStreamer<'a, M, S>
where
    M: SampleMemory,
    S: SampleSink,
{
    pub fn new(control: &'a PlaybackControl, fault: &'a FaultState, memory: M, dac: S) -> Self {
        Self::with_threshold(control, fault, memory, dac, DEFAULT_SENTINEL_THRESHOLD)
    }

    /// Custom sentinel threshold (clamped to at least 1).
    pub fn with_threshold(
        control: &'a PlaybackControl,
        fault: &'a FaultState,
        memory: M,
        dac: S,
        threshold: u16,
    ) -> Self {
        Self {
            control,
            fault,
            memory,
            dac,
            cursor: PlaybackCursor::default(),
            threshold: threshold.max(1),
            bytes_read: 0,
        }
    }

    /// One playback tick. Call at [`PLAYBACK_SAMPLE_RATE_HZ`].
    pub fn tick(&mut self) -> PlaybackTick {
        if !self.cursor.active {
            if !self.control.take_arm() {
                return PlaybackTick::Idle;
            }
            if let Some(end) = self.open() {
                return PlaybackTick::Finished(end);
            }
        }

        let sample = self.cursor.current_sample;
        if self.dac.write_sample(sample).is_err() {
            self.fault.set(FaultCode::DacBus, sample as u32);
        }
        self.control.count_sample();

        match self.fetch() {
            Some(end) => PlaybackTick::Finished(end),
            None => PlaybackTick::Playing,
        }
    }

    #[inline]
    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    #[inline]
    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    /// Bytes clocked in from memory during the current or last run.
    #[inline]
    pub fn bytes_read(&self) -> u32 {
        self.bytes_read
    }

    pub fn dac(&self) -> &S {
        &self.dac
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    /// Select the memory, send the read header and pre-buffer one byte.
    fn open(&mut self) -> Option<PlaybackEnd> {
        self.cursor = PlaybackCursor {
            active: true,
            ..PlaybackCursor::default()
        };
        self.bytes_read = 0;

        if self.memory.begin_read(PLAYBACK_BASE_ADDRESS).is_err() {
            return Some(self.stop(PlaybackEnd::MemoryFault));
        }
        self.fetch()
    }

    /// Clock in the next byte and apply the sentinel heuristic.
    fn fetch(&mut self) -> Option<PlaybackEnd> {
        let byte = match self.memory.read_byte() {
            Ok(byte) => byte,
            Err(_) => return Some(self.stop(PlaybackEnd::MemoryFault)),
        };
        self.bytes_read = self.bytes_read.wrapping_add(1);

        self.cursor.current_sample = byte;
        if byte == SENTINEL_BYTE {
            self.cursor.sentinel_run = self.cursor.sentinel_run.saturating_add(1);
        } else {
            self.cursor.sentinel_run = 0;
        }

        if self.cursor.sentinel_run >= self.threshold {
            return Some(self.stop(PlaybackEnd::Sentinel));
        }
        None
    }

    /// Release chip-select, go inert and signal the main sequence.
    fn stop(&mut self, end: PlaybackEnd) -> PlaybackEnd {
        if end == PlaybackEnd::MemoryFault {
            self.fault.set(FaultCode::MemoryBus, self.bytes_read);
        }
        if self.memory.end_read().is_err() && end != PlaybackEnd::MemoryFault {
            self.fault.set(FaultCode::MemoryBus, self.bytes_read);
        }
        self.cursor.active = false;
        self.cursor.sentinel_run = 0;
        self.control.finish(end);
        end
    }
}
