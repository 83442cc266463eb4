//! RustRttyDds - firmware entry point
//!
//! 1. Build the DAC, serial memory and both timers
//! 2. Subscribe the 80 kHz synthesizer tick and the 8 kHz playback tick
//! 3. Spawn the UART log drain
//! 4. Beacon loop: send text, replay the stored clip, sleep

#[cfg(not(target_os = "espidf"))]
fn main() {
    println!(
        "{}: firmware for ESP-IDF targets, build with --target <xtensa|riscv>-esp-espidf",
        env!("VERSION_STRING")
    );
}

#[cfg(target_os = "espidf")]
fn main() -> Result<(), esp_idf_svc::sys::EspError> {
    firmware::run()
}

#[cfg(target_os = "espidf")]
mod firmware {
    use core::cell::UnsafeCell;

    use esp_idf_svc::hal::delay::{Ets, FreeRtos};
    use esp_idf_svc::hal::gpio::{
        AnyInputPin, AnyOutputPin, Input, InputPin as _, Output, OutputPin as _, PinDriver,
    };
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::spi::{self, SpiBusDriver, SpiDriver, SpiDriverConfig};
    use esp_idf_svc::hal::timer::{self, TimerDriver};
    use esp_idf_svc::hal::units::Hertz;
    use esp_idf_svc::sys::{EspError, ESP_FAIL};

    use rust_rtty_dds::audio::dds::DDS_SAMPLE_RATE_HZ;
    use rust_rtty_dds::audio::playback::PLAYBACK_SAMPLE_RATE_HZ;
    use rust_rtty_dds::hal::dac::{Mcp4901, SampleSink};
    use rust_rtty_dds::hal::serial_memory::SerialMemory;
    use rust_rtty_dds::hal::timer::TimerSource;
    use rust_rtty_dds::uart_logger::{init_uart_logger, uart_logger_task, UartLoggerConfig};
    use rust_rtty_dds::{
        rt_debug, rt_info, CoreRequest, DdsControl, FaultState, Modem, ModemShared,
        PlaybackControl, SampleStreamer, Synthesizer, ToneConfig, TransportArbiter, LOG_STREAM,
    };

    const BEACON_TEXT: &str = "RYRYRY DE RTTY DDS BEACON 73";
    const BEACON_INTERVAL_MS: u32 = 30_000;
    const DAC_SPI_HZ: u32 = 8_000_000;

    // Wrapper to make UnsafeCell Sync for the shared DAC.
    // SAFETY: the transport arbiter keeps at most one tick source enabled,
    // so the two callbacks never touch the DAC concurrently.
    #[repr(transparent)]
    struct SyncCell<T>(UnsafeCell<T>);
    unsafe impl<T> Sync for SyncCell<T> {}

    impl<T> SyncCell<T> {
        const fn new(value: T) -> Self {
            Self(UnsafeCell::new(value))
        }
    }

    type DacDriver = Mcp4901<
        SpiBusDriver<'static, SpiDriver<'static>>,
        PinDriver<'static, AnyOutputPin, Output>,
    >;
    type MemoryDriver = SerialMemory<
        PinDriver<'static, AnyOutputPin, Output>,
        PinDriver<'static, AnyOutputPin, Output>,
        PinDriver<'static, AnyOutputPin, Output>,
        PinDriver<'static, AnyInputPin, Input>,
    >;

    static DAC: SyncCell<Option<DacDriver>> = SyncCell::new(None);

    static TONE_CONFIG: ToneConfig = ToneConfig::new();
    static DDS_CONTROL: DdsControl = DdsControl::new();
    static PLAYBACK_CONTROL: PlaybackControl = PlaybackControl::new();
    static ARBITER: TransportArbiter = TransportArbiter::new();
    static FAULT_STATE: FaultState = FaultState::new();

    /// Handle each tick callback writes through.
    struct SharedDac;

    impl SampleSink for SharedDac {
        type Error = <DacDriver as SampleSink>::Error;

        #[inline]
        fn write_sample(&mut self, sample: u8) -> Result<(), Self::Error> {
            // SAFETY: see SyncCell. DAC is installed before any timer starts.
            match unsafe { (*DAC.0.get()).as_mut() } {
                Some(dac) => dac.write_sample(sample),
                None => Ok(()),
            }
        }
    }

    /// Driver errors without an ESP-IDF code.
    fn fail<E>(_: E) -> EspError {
        EspError::from_infallible::<ESP_FAIL>()
    }

    fn timestamp_us() -> i64 {
        unsafe { esp_idf_svc::sys::esp_timer_get_time() }
    }

    pub fn run() -> Result<(), EspError> {
        esp_idf_svc::sys::link_patches();

        let peripherals = Peripherals::take()?;
        let pins = peripherals.pins;

        // DAC: write-only SPI, dedicated chip-select
        let spi_driver = SpiDriver::new(
            peripherals.spi2,
            pins.gpio12,
            pins.gpio11,
            Option::<AnyInputPin>::None,
            &SpiDriverConfig::new(),
        )?;
        let spi_bus = SpiBusDriver::new(
            spi_driver,
            &spi::config::Config::new().baudrate(Hertz(DAC_SPI_HZ)),
        )?;
        let dac_cs = PinDriver::output(pins.gpio10.downgrade_output())?;
        let dac = Mcp4901::new(spi_bus, dac_cs).map_err(fail)?;
        // SAFETY: no timer is running yet
        unsafe { *DAC.0.get() = Some(dac) };

        // Serial memory: bit-banged on plain GPIOs
        let memory: MemoryDriver = SerialMemory::new(
            PinDriver::output(pins.gpio4.downgrade_output())?,
            PinDriver::output(pins.gpio5.downgrade_output())?,
            PinDriver::output(pins.gpio15.downgrade_output())?,
            PinDriver::input(pins.gpio16.downgrade_input())?,
        )
        .map_err(fail)?;

        let timer_config = timer::config::Config::new().auto_reload(true);

        let mut synthesizer = Synthesizer::new(&DDS_CONTROL, &FAULT_STATE, SharedDac);
        let mut dds_timer = TimerDriver::new(peripherals.timer00, &timer_config)?;
        unsafe {
            dds_timer.subscribe(move || {
                synthesizer.tick();
            })?;
        }
        let dds_source = TimerSource::new(dds_timer, DDS_SAMPLE_RATE_HZ, &FAULT_STATE)?;

        let mut streamer = SampleStreamer::new(&PLAYBACK_CONTROL, &FAULT_STATE, memory, SharedDac);
        let mut playback_timer = TimerDriver::new(peripherals.timer01, &timer_config)?;
        unsafe {
            playback_timer.subscribe(move || {
                streamer.tick();
            })?;
        }
        let playback_source =
            TimerSource::new(playback_timer, PLAYBACK_SAMPLE_RATE_HZ, &FAULT_STATE)?;

        let log_config = UartLoggerConfig::default();
        let mut uart = init_uart_logger(peripherals.uart1, pins.gpio6, &log_config)?;
        std::thread::Builder::new()
            .name("uart-log".into())
            .stack_size(4096)
            .spawn(move || uart_logger_task(&mut uart))
            .map_err(fail)?;

        let shared = ModemShared {
            tone: &TONE_CONFIG,
            dds: &DDS_CONTROL,
            playback: &PLAYBACK_CONTROL,
            arbiter: &ARBITER,
            fault: &FAULT_STATE,
            log: &LOG_STREAM,
        };
        let mut modem = Modem::new(shared, dds_source, playback_source, Ets, timestamp_us);

        rt_info!(LOG_STREAM, timestamp_us(), "{} ({})", env!("VERSION_STRING"), env!("GIT_HASH"));

        loop {
            // Outcomes are logged by the modem
            let _ = modem.handle(CoreRequest::SendText(BEACON_TEXT));
            let _ = modem.handle(CoreRequest::StartPlayback);

            let status = modem.status();
            rt_debug!(
                LOG_STREAM,
                timestamp_us(),
                "owner={} tone gen={}",
                status.owner.as_str(),
                status.tone_generation
            );

            FreeRtos::delay_ms(BEACON_INTERVAL_MS);
        }
    }
}
