//! UART log output.
//!
//! Drains [`LOG_STREAM`](crate::LOG_STREAM) to a TX-only UART.
//! Requires external USB-UART adapter (CH340, CP2102, etc).
//!
//! # Hardware Setup
//!
//! ```text
//! ESP32 GPIO (TX) ──────▶ USB-UART RX
//!                          └─▶ PC Serial Monitor
//! ```
//!
//! Line format: `[timestamp_us] LEVEL: message\n`

use core::fmt::Write;

use crate::logging::{BufWriter, LogEntry};

#[cfg(target_os = "espidf")]
pub use esp::{init_uart_logger, uart_logger_task};

/// UART configuration for logging.
pub struct UartLoggerConfig {
    pub baud_rate: u32,
    pub tx_pin: u8,
}

impl Default for UartLoggerConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115200,
            tx_pin: 6,
        }
    }
}

/// Format log entry into `buf`, returns bytes written.
pub fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    let mut writer = BufWriter { buf, pos: 0 };
    let _ = writeln!(
        writer,
        "[{:10}] {}: {}",
        entry.timestamp_us,
        entry.level.as_str(),
        entry.message()
    );
    writer.pos
}

/// Format the periodic dropped-messages notice, returns bytes written.
pub fn format_dropped(dropped: u32, buf: &mut [u8]) -> usize {
    let mut writer = BufWriter { buf, pos: 0 };
    let _ = writeln!(writer, "[WARN] log dropped: {}", dropped);
    writer.pos
}

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_svc::hal::gpio;
    use esp_idf_svc::hal::peripheral::Peripheral;
    use esp_idf_svc::hal::uart::{self, UartTxDriver};

    use super::{format_dropped, format_log_entry, UartLoggerConfig};
    use crate::LOG_STREAM;

    /// Report interval for dropped messages.
    const DROPPED_REPORT_US: i64 = 10_000_000;

    /// Initialize UART1 TX-only for logging output.
    pub fn init_uart_logger<'d>(
        uart: impl Peripheral<P = uart::UART1> + 'd,
        tx_pin: impl Peripheral<P = impl gpio::OutputPin> + 'd,
        config: &UartLoggerConfig,
    ) -> Result<UartTxDriver<'d>, esp_idf_svc::sys::EspError> {
        let uart_config = uart::config::Config::default()
            .baudrate(esp_idf_svc::hal::units::Hertz(config.baud_rate));

        UartTxDriver::new(
            uart,
            tx_pin,
            Option::<gpio::AnyIOPin>::None, // CTS
            Option::<gpio::AnyIOPin>::None, // RTS
            &uart_config,
        )
    }

    /// UART log consumer loop. Run it on its own task.
    pub fn uart_logger_task(uart: &mut UartTxDriver<'_>) -> ! {
        let mut format_buf = [0u8; 160];
        let mut last_dropped_report = 0i64;

        loop {
            let mut work_done = false;

            while let Some(entry) = LOG_STREAM.drain() {
                let len = format_log_entry(&entry, &mut format_buf);
                let _ = uart.write(&format_buf[..len]);
                work_done = true;
            }

            let now = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
            if now - last_dropped_report > DROPPED_REPORT_US {
                let dropped = LOG_STREAM.dropped();
                if dropped > 0 {
                    let len = format_dropped(dropped, &mut format_buf);
                    let _ = uart.write(&format_buf[..len]);
                    LOG_STREAM.reset_dropped();
                }
                last_dropped_report = now;
            }

            if !work_done {
                esp_idf_svc::hal::delay::FreeRtos::delay_ms(10);
            }
        }
    }
}
