//! Core-facing facade for the command layer.
//!
//! The command layer parses and validates user input, then calls in with a
//! [`CoreRequest`]. Every request runs to completion on the caller's
//! context; send and playback block for their whole duration.
//!
//! # Ownership
//!
//! - `Modem` owns both periodic sources and the bit-hold delay
//! - Shared control blocks are borrowed, so they can live in `static`s that
//!   the tick callbacks also see
//! - The RTTY source is enabled at construction and stays on between
//!   sends (the synthesizer idles on a zero increment)

use embedded_hal::delay::DelayNs;

use crate::arbiter::{PlaybackReport, Transport, TransportArbiter, TransportError};
use crate::audio::dds::{DdsControl, DDS_SAMPLE_RATE_HZ};
use crate::audio::playback::{PlaybackControl, PlaybackEnd};
use crate::bitstream::TransmissionPlan;
use crate::config::{ToneConfig, ToneError, ToneParameters};
use crate::fault::{FaultSnapshot, FaultState};
use crate::hal::timer::PeriodicSource;
use crate::logging::LogStream;
use crate::rtty::{self, Keying, TransmitReport};
use crate::{rt_error, rt_info, rt_warn};

/// Already-parsed request from the command layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoreRequest<'m> {
    /// Transmit text with the current tone configuration.
    SendText(&'m str),
    SetHighFrequency(u32),
    SetLowFrequency(u32),
    SetBaud(f32),
    /// Restore the default tone configuration.
    ResetTone,
    /// Replay the stored clip from the serial memory.
    StartPlayback,
}

/// Result of a handled request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoreResponse {
    Transmitted(TransmitReport),
    Played(PlaybackReport),
    ToneUpdated(ToneParameters),
}

/// Request failure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModemError {
    Transport(TransportError),
    Tone(ToneError),
}

impl From<TransportError> for ModemError {
    fn from(e: TransportError) -> Self {
        ModemError::Transport(e)
    }
}

impl From<ToneError> for ModemError {
    fn from(e: ToneError) -> Self {
        ModemError::Tone(e)
    }
}

impl core::fmt::Display for ModemError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "{}", e),
            Self::Tone(e) => write!(f, "{}", e),
        }
    }
}

/// Snapshot for status queries.
#[derive(Debug, Clone, Copy)]
pub struct ModemStatus {
    pub owner: Transport,
    pub tone: ToneParameters,
    pub tone_generation: u32,
    pub fault: FaultSnapshot,
}

/// Shared state the facade borrows.
#[derive(Clone, Copy)]
pub struct ModemShared<'a> {
    pub tone: &'a ToneConfig,
    pub dds: &'a DdsControl,
    pub playback: &'a PlaybackControl,
    pub arbiter: &'a TransportArbiter,
    pub fault: &'a FaultState,
    pub log: &'a LogStream,
}

/// RTTY transmitter and clip player behind one blocking API.
pub struct Modem<'a, R, P, D> {
    shared: ModemShared<'a>,
    rtty_source: R,
    playback_source: P,
    delay: D,
    clock: fn() -> i64,
}

impl<'a, R, P, D> Modem<'a, R, P, D>
where
    R: PeriodicSource,
    P: PeriodicSource,
    D: DelayNs,
{
    /// Take ownership of the sources. The synthesizer is silenced, the
    /// playback source stopped and the RTTY source started.
    ///
    /// `clock` returns microseconds for log timestamps.
    pub fn new(
        shared: ModemShared<'a>,
        mut rtty_source: R,
        mut playback_source: P,
        delay: D,
        clock: fn() -> i64,
    ) -> Self {
        shared.dds.silence();
        playback_source.disable();
        rtty_source.enable();
        Self {
            shared,
            rtty_source,
            playback_source,
            delay,
            clock,
        }
    }

    /// Transmit `text` with an explicit tone, blocking until the last bit.
    ///
    /// ASCII letters are folded to upper case. Characters absent from both
    /// Baudot tables are dropped and counted in the report.
    pub fn send_message(
        &mut self,
        text: &str,
        tone: ToneParameters,
    ) -> Result<TransmitReport, ModemError> {
        let now = self.clock;
        let log = self.shared.log;

        tone.validate(DDS_SAMPLE_RATE_HZ)?;
        let _lease = self
            .shared
            .arbiter
            .try_acquire(Transport::Rtty)
            .inspect_err(|e| rt_warn!(log, now(), "TX refused: {}", e))?;

        let plan = TransmissionPlan::from_chars(text.chars().map(|c| c.to_ascii_uppercase()));
        let keying = Keying::new(&tone, DDS_SAMPLE_RATE_HZ);

        rt_info!(
            log,
            now(),
            "TX start: {} symbols, {}/{} Hz @ {} Bd",
            plan.symbol_count(),
            tone.high_hz,
            tone.low_hz,
            tone.baud
        );

        let report = rtty::transmit(&plan, self.shared.dds, &mut self.delay, keying);

        if report.skipped > 0 {
            rt_warn!(log, now(), "TX skipped {} unencodable chars", report.skipped);
        }
        rt_info!(log, now(), "TX done: {} bits", report.bits);
        self.report_fault();

        Ok(report)
    }

    /// Transmit with the current tone configuration snapshot.
    pub fn send_text(&mut self, text: &str) -> Result<TransmitReport, ModemError> {
        let tone = self.shared.tone.snapshot();
        self.send_message(text, tone)
    }

    /// Replay the stored clip, blocking until the end-of-stream heuristic
    /// fires (or the memory bus fails).
    pub fn start_playback(&mut self) -> Result<PlaybackReport, ModemError> {
        let now = self.clock;
        let log = self.shared.log;

        rt_info!(log, now(), "Playback start");
        let report = self
            .shared
            .arbiter
            .run_playback(
                &mut self.rtty_source,
                &mut self.playback_source,
                self.shared.playback,
            )
            .inspect_err(|e| rt_warn!(log, now(), "Playback refused: {}", e))?;

        match report.end {
            PlaybackEnd::Sentinel => {
                rt_info!(log, now(), "Playback done: {} samples", report.samples)
            }
            PlaybackEnd::MemoryFault => {
                rt_error!(log, now(), "Playback aborted after {} samples", report.samples)
            }
        }
        self.report_fault();

        Ok(report)
    }

    /// Dispatch one command-layer request.
    pub fn handle(&mut self, request: CoreRequest<'_>) -> Result<CoreResponse, ModemError> {
        let tone = self.shared.tone;
        match request {
            CoreRequest::SendText(text) => self.send_text(text).map(CoreResponse::Transmitted),
            CoreRequest::StartPlayback => self.start_playback().map(CoreResponse::Played),
            CoreRequest::SetHighFrequency(hz) => self.update_tone(|| tone.set_high_hz(hz)),
            CoreRequest::SetLowFrequency(hz) => self.update_tone(|| tone.set_low_hz(hz)),
            CoreRequest::SetBaud(baud) => self.update_tone(|| tone.set_baud(baud)),
            CoreRequest::ResetTone => self.update_tone(|| {
                tone.reset();
                Ok(())
            }),
        }
    }

    pub fn status(&self) -> ModemStatus {
        ModemStatus {
            owner: self.shared.arbiter.owner(),
            tone: self.shared.tone.snapshot(),
            tone_generation: self.shared.tone.generation(),
            fault: self.shared.fault.snapshot(),
        }
    }

    pub fn rtty_source(&self) -> &R {
        &self.rtty_source
    }

    pub fn playback_source(&self) -> &P {
        &self.playback_source
    }

    pub fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }

    fn update_tone(
        &mut self,
        apply: impl FnOnce() -> Result<(), ToneError>,
    ) -> Result<CoreResponse, ModemError> {
        let log = self.shared.log;
        if let Err(e) = apply() {
            rt_warn!(log, (self.clock)(), "Tone rejected: {}", e);
            return Err(e.into());
        }
        let tone = self.shared.tone.snapshot();
        rt_info!(
            log,
            (self.clock)(),
            "Tone: {}/{} Hz @ {} Bd",
            tone.high_hz,
            tone.low_hz,
            tone.baud
        );
        Ok(CoreResponse::ToneUpdated(tone))
    }

    /// Log and clear a fault latched by a tick callback.
    fn report_fault(&mut self) {
        if let Some(fault) = self.shared.fault.take() {
            rt_error!(
                self.shared.log,
                (self.clock)(),
                "FAULT {} data={} total={}",
                fault.code.as_str(),
                fault.data,
                fault.count
            );
        }
    }
}
