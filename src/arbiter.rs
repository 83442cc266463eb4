//! Transport arbiter
//!
//! Exactly one generator may own the DAC and a periodic source at a time.
//! Ownership is a single atomic byte claimed with compare-exchange, so a
//! second claim fails instead of racing.
//!
//! ```text
//!            try_acquire(Rtty)              lease dropped
//!   Idle ─────────────────────▶ RttyActive ───────────────▶ Idle
//!     │
//!     │ run_playback()
//!     ▼
//!   PlaybackActive: save RTTY enable ─▶ disable RTTY ─▶ arm ─▶ enable playback
//!                   ─▶ wait finished ─▶ disable playback ─▶ restore RTTY
//! ```

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

use crate::audio::playback::{PlaybackControl, PlaybackEnd};
use crate::hal::timer::PeriodicSource;

/// Current owner of the output path
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Nothing running
    Idle = 0,
    /// RTTY transmission in progress
    Rtty = 1,
    /// Sample playback in progress
    Playback = 2,
}

impl Transport {
    /// Convert from u8
    #[inline]
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Rtty,
            2 => Self::Playback,
            _ => Self::Idle,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Rtty => "rtty",
            Self::Playback => "playback",
        }
    }
}

impl From<Transport> for u8 {
    fn from(t: Transport) -> Self {
        t as u8
    }
}

/// Request refused by the arbiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Another generator owns the output
    Busy { owner: Transport },
    /// The periodic source for `transport` did not start
    SourceFailed { transport: Transport },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy { owner } => write!(f, "output busy ({})", owner.as_str()),
            Self::SourceFailed { transport } => {
                write!(f, "{} source failed to start", transport.as_str())
            }
        }
    }
}

/// Outcome of a completed playback run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackReport {
    /// Samples written to the DAC
    pub samples: u32,
    pub end: PlaybackEnd,
}

/// Thread-safe owner register for the shared output path
pub struct TransportArbiter {
    owner: AtomicU8,
}

impl TransportArbiter {
    /// Create arbiter (starts Idle)
    pub const fn new() -> Self {
        Self {
            owner: AtomicU8::new(Transport::Idle as u8),
        }
    }

    /// Current owner
    #[inline]
    pub fn owner(&self) -> Transport {
        Transport::from_u8(self.owner.load(Ordering::Acquire))
    }

    /// Claim the output for `transport`.
    ///
    /// Fails with [`TransportError::Busy`] unless the arbiter is Idle.
    /// Ownership returns to Idle when the lease is dropped.
    pub fn try_acquire(&self, transport: Transport) -> Result<TransportLease<'_>, TransportError> {
        debug_assert!(transport != Transport::Idle);
        self.owner
            .compare_exchange(
                Transport::Idle as u8,
                transport as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| TransportLease { arbiter: self, transport })
            .map_err(|owner| TransportError::Busy {
                owner: Transport::from_u8(owner),
            })
    }

    /// Hand the output to the playback source and block until it finishes.
    ///
    /// The RTTY source's enable state is saved before it is disabled and
    /// restored exactly afterwards, whether it was running or not.
    ///
    /// If the playback source does not report enabled after `enable()`,
    /// nothing would ever finish the run: the RTTY state is restored and
    /// [`TransportError::SourceFailed`] returned instead of waiting.
    pub fn run_playback<R, P>(
        &self,
        rtty: &mut R,
        playback: &mut P,
        control: &PlaybackControl,
    ) -> Result<PlaybackReport, TransportError>
    where
        R: PeriodicSource + ?Sized,
        P: PeriodicSource + ?Sized,
    {
        let _lease = self.try_acquire(Transport::Playback)?;

        let rtty_was_enabled = rtty.is_enabled();
        rtty.disable();

        control.arm();
        playback.enable();
        let started = playback.is_enabled();
        if started {
            control.wait();
        }
        playback.disable();

        if rtty_was_enabled {
            rtty.enable();
        }

        if !started {
            return Err(TransportError::SourceFailed {
                transport: Transport::Playback,
            });
        }

        Ok(PlaybackReport {
            samples: control.samples(),
            end: control.end().unwrap_or(PlaybackEnd::Sentinel),
        })
    }
}

impl Default for TransportArbiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Ownership token; releases the arbiter on drop
#[must_use = "ownership is released as soon as the lease is dropped"]
pub struct TransportLease<'a> {
    arbiter: &'a TransportArbiter,
    transport: Transport,
}

impl TransportLease<'_> {
    #[inline]
    pub fn transport(&self) -> Transport {
        self.transport
    }
}

impl Drop for TransportLease<'_> {
    fn drop(&mut self) {
        self.arbiter
            .owner
            .store(Transport::Idle as u8, Ordering::Release);
    }
}
