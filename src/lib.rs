//! # RustRttyDds
//!
//! RTTY (Baudot AFSK) transmitter with a serial-memory audio player.
//!
//! ## Architecture
//!
//! ```text
//! Modem ──▶ TransmissionPlan ──▶ DdsControl.increment ──▶ Synthesizer tick ──┐
//!   │                                                      (80 kHz source)    ├──▶ DAC
//!   └────▶ TransportArbiter ──▶ PlaybackControl ──▶ SampleStreamer tick ─────┘
//!                                                  (8 kHz source)
//! ```
//!
//! - The main sequence only writes control words (increment, arm flag)
//! - Periodic callbacks own the DAC bus and their own state
//! - Only one periodic source is ever enabled, enforced by [`TransportArbiter`]

#![cfg_attr(not(test), no_std)]

pub mod arbiter;
pub mod audio;
pub mod baudot;
pub mod bitstream;
pub mod config;
pub mod fault;
pub mod hal;
pub mod log_globals;
pub mod logging;
pub mod modem;
pub mod rtty;
pub mod uart_logger;

pub use arbiter::{Transport, TransportArbiter, TransportError};
pub use audio::{DdsControl, PlaybackControl, SampleStreamer, Synthesizer};
pub use baudot::ShiftState;
pub use bitstream::{Symbol, TransmissionPlan};
pub use config::{ToneConfig, ToneParameters};
pub use fault::{FaultCode, FaultState};
pub use log_globals::LOG_STREAM;
pub use modem::{CoreRequest, CoreResponse, Modem, ModemError, ModemShared, ModemStatus};
