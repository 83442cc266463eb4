//! Global log stream instance.
//!
//! Producers: the main sequence (modem facade) and firmware glue.
//! Consumer: the UART drain task.

use crate::logging::LogStream;

/// System log stream.
///
/// Tick callbacks do not log; they latch faults in `FaultState` and the
/// main sequence reports them here after each operation.
pub static LOG_STREAM: LogStream = LogStream::new();
