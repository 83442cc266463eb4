//! Hardware Abstraction Layer for RustRttyDds.
//!
//! Drivers are written against embedded-hal traits so they run on the
//! ESP-IDF HAL and on host test doubles alike.
//! Business logic stays in core modules, HAL is just I/O.

pub mod dac;
pub mod serial_memory;
pub mod timer;

pub use dac::{dac_frame, DacError, Mcp4901, SampleSink, DAC_CONFIG_NIBBLE};
pub use serial_memory::{MemoryError, MemoryPin, SampleMemory, SerialMemory, CMD_READ};
pub use timer::PeriodicSource;
