//! Audio subsystem: the two fixed-rate generators sharing one DAC
//!
//! Architecture:
//! - DDS synthesizer: LUT + phase accumulator @ 80 kHz, two-tone RTTY
//! - Sample streamer: raw 8-bit PCM from serial memory @ 8 kHz
//! - Both write through `hal::dac::SampleSink`; the arbiter keeps only one
//!   of their periodic sources enabled

pub mod dds;
pub mod lut;
pub mod playback;

pub use dds::{phase_increment, DdsControl, Synthesizer, DDS_SAMPLE_RATE_HZ};
pub use lut::{LUT_SIZE, MIDSCALE, SINE_LUT};
pub use playback::{
    PlaybackControl, PlaybackCursor, PlaybackEnd, PlaybackTick, SampleStreamer,
    DEFAULT_SENTINEL_THRESHOLD, PLAYBACK_SAMPLE_RATE_HZ, SENTINEL_BYTE,
};
