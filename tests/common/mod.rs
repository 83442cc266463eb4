//! Hardware fakes shared by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};

use rust_rtty_dds::audio::dds::DDS_SAMPLE_RATE_HZ;
use rust_rtty_dds::audio::playback::{PlaybackTick, SampleStreamer};
use rust_rtty_dds::baudot::{self, ShiftState, FIGS, LTRS};
use rust_rtty_dds::bitstream::{Symbol, SYMBOL_BITS};
use rust_rtty_dds::hal::dac::SampleSink;
use rust_rtty_dds::hal::serial_memory::SampleMemory;
use rust_rtty_dds::hal::timer::PeriodicSource;
use rust_rtty_dds::{DdsControl, Synthesizer};

// ============================================================================
// DAC
// ============================================================================

/// Records every sample; clones share the record.
#[derive(Clone, Default)]
pub struct RecordingDac {
    samples: Arc<Mutex<Vec<u8>>>,
}

impl RecordingDac {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> Vec<u8> {
        self.samples.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.samples.lock().unwrap().len()
    }
}

impl SampleSink for RecordingDac {
    type Error = Infallible;

    fn write_sample(&mut self, sample: u8) -> Result<(), Infallible> {
        self.samples.lock().unwrap().push(sample);
        Ok(())
    }
}

/// DAC whose bus is always down.
pub struct BrokenDac;

impl SampleSink for BrokenDac {
    type Error = ();

    fn write_sample(&mut self, _sample: u8) -> Result<(), ()> {
        Err(())
    }
}

// ============================================================================
// Periodic sources
// ============================================================================

/// Periodic source that only tracks its enable flag.
///
/// Clones share the flag so a test "ISR" thread can watch it while the
/// modem or arbiter owns the source.
#[derive(Clone, Default)]
pub struct FakeTimer {
    enabled: Arc<AtomicBool>,
    transitions: Arc<AtomicU32>,
    stuck: bool,
}

impl FakeTimer {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
            transitions: Arc::new(AtomicU32::new(0)),
            stuck: false,
        }
    }

    /// Disabled source whose `enable` has no effect, like a timer driver
    /// that rejected the start.
    pub fn stuck() -> Self {
        Self {
            stuck: true,
            ..Self::new(false)
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Number of enable/disable calls.
    pub fn transitions(&self) -> u32 {
        self.transitions.load(Ordering::SeqCst)
    }
}

impl PeriodicSource for FakeTimer {
    fn enable(&mut self) {
        self.transitions.fetch_add(1, Ordering::SeqCst);
        if !self.stuck {
            self.enabled.store(true, Ordering::SeqCst);
        }
    }

    fn disable(&mut self) {
        self.transitions.fetch_add(1, Ordering::SeqCst);
        self.enabled.store(false, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.enabled()
    }
}

/// What the playback "ISR" thread saw.
#[derive(Debug, Default)]
pub struct IsrReport {
    /// Ticks that did work (not idle).
    pub ticks: u32,
    /// Active ticks that ran while the RTTY source was also enabled.
    pub overlapping: u32,
}

/// Play the role of the playback timer interrupt: tick the streamer while
/// `playback` is enabled, until `stop` is raised.
pub fn playback_isr<M, S>(
    streamer: &mut SampleStreamer<'_, M, S>,
    playback: &FakeTimer,
    rtty: &FakeTimer,
    stop: &AtomicBool,
) -> IsrReport
where
    M: SampleMemory,
    S: SampleSink,
{
    let mut report = IsrReport::default();
    while !stop.load(Ordering::SeqCst) {
        if playback.enabled() {
            let rtty_on = rtty.enabled();
            if streamer.tick() != PlaybackTick::Idle {
                report.ticks += 1;
                if rtty_on {
                    report.overlapping += 1;
                }
            }
        } else {
            std::thread::yield_now();
        }
    }
    report
}

// ============================================================================
// Delay
// ============================================================================

/// Delay that runs the synthesizer for the held time and records the
/// increment that was active during each hold.
pub struct TickingDelay<'a, S> {
    synth: Synthesizer<'a, S>,
    control: &'a DdsControl,
    holds: Vec<(u32, u32)>,
}

impl<'a, S: SampleSink> TickingDelay<'a, S> {
    pub fn new(synth: Synthesizer<'a, S>, control: &'a DdsControl) -> Self {
        Self {
            synth,
            control,
            holds: Vec::new(),
        }
    }

    /// `(increment, hold_us)` per delay call.
    pub fn holds(&self) -> &[(u32, u32)] {
        &self.holds
    }

    pub fn synth(&self) -> &Synthesizer<'a, S> {
        &self.synth
    }

    pub fn clear(&mut self) {
        self.holds.clear();
    }
}

impl<S: SampleSink> DelayNs for TickingDelay<'_, S> {
    fn delay_ns(&mut self, ns: u32) {
        self.delay_us(ns / 1000);
    }

    fn delay_us(&mut self, us: u32) {
        self.holds.push((self.control.increment(), us));
        let ticks = us as u64 * DDS_SAMPLE_RATE_HZ as u64 / 1_000_000;
        for _ in 0..ticks {
            self.synth.tick();
        }
    }
}

/// Delay that only records hold times.
#[derive(Default)]
pub struct RecordingDelay {
    pub holds: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.holds.push(ns / 1000);
    }

    fn delay_us(&mut self, us: u32) {
        self.holds.push(us);
    }
}

// ============================================================================
// Memory
// ============================================================================

/// In-memory sample source. Reads past the end return erased bytes.
pub struct VecMemory {
    data: Vec<u8>,
    pos: usize,
    open: bool,
    /// Fail the read of this byte index.
    pub fail_at: Option<usize>,
    pub reads: usize,
    pub sessions: u32,
}

impl VecMemory {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            pos: 0,
            open: false,
            fail_at: None,
            reads: 0,
            sessions: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct BusDown;

impl SampleMemory for VecMemory {
    type Error = BusDown;

    fn begin_read(&mut self, address: u32) -> Result<(), BusDown> {
        self.pos = address as usize;
        self.open = true;
        self.sessions += 1;
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, BusDown> {
        if !self.open || self.fail_at == Some(self.pos) {
            return Err(BusDown);
        }
        let byte = self.data.get(self.pos).copied().unwrap_or(0xFF);
        self.pos += 1;
        self.reads += 1;
        Ok(byte)
    }

    fn end_read(&mut self) -> Result<(), BusDown> {
        self.open = false;
        Ok(())
    }
}

/// Clip of `data` followed by erased memory.
pub fn clip(data: &[u8], erased: usize) -> Vec<u8> {
    let mut v = data.to_vec();
    v.extend(std::iter::repeat(0xFF).take(erased));
    v
}

// ============================================================================
// Simulated 25-series memory chip on fake GPIOs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinFault;

impl digital::Error for PinFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Chip model: samples SI on rising SCK, shifts SO after falling SCK.
#[derive(Default)]
pub struct ChipState {
    pub contents: Vec<u8>,
    cs_low: bool,
    sck_high: bool,
    si: bool,
    header: u32,
    header_bits: u32,
    address: usize,
    bit: u32,
    primed: bool,
    /// Headers received, one per select.
    pub headers: Vec<u32>,
    /// Clock edges seen while deselected.
    pub stray_edges: u32,
    pub selects: u32,
    /// Make the SO pin fail.
    pub so_broken: bool,
}

impl ChipState {
    fn select(&mut self, low: bool) {
        if low && !self.cs_low {
            self.selects += 1;
            self.header = 0;
            self.header_bits = 0;
            self.bit = 0;
            self.primed = false;
        }
        self.cs_low = low;
    }

    fn clock(&mut self, high: bool) {
        let rising = high && !self.sck_high;
        let falling = !high && self.sck_high;
        self.sck_high = high;

        if !self.cs_low {
            if rising {
                self.stray_edges += 1;
            }
            return;
        }

        if rising && self.header_bits < 32 {
            self.header = (self.header << 1) | self.si as u32;
            self.header_bits += 1;
            if self.header_bits == 32 {
                self.headers.push(self.header);
                self.address = (self.header & 0x00FF_FFFF) as usize;
            }
        } else if falling && self.header_bits == 32 {
            if self.primed {
                self.bit += 1;
                if self.bit == 8 {
                    self.bit = 0;
                    self.address += 1;
                }
            } else {
                self.primed = true;
            }
        }
    }

    fn data_out(&self) -> bool {
        let byte = self.contents.get(self.address).copied().unwrap_or(0xFF);
        (byte >> (7 - self.bit)) & 1 == 1
    }
}

pub type Chip = Rc<RefCell<ChipState>>;

pub fn chip(contents: Vec<u8>) -> Chip {
    Rc::new(RefCell::new(ChipState {
        contents,
        ..ChipState::default()
    }))
}

#[derive(Clone, Copy)]
pub enum Line {
    Cs,
    Sck,
    Si,
}

pub struct ChipOutput {
    chip: Chip,
    line: Line,
}

impl ChipOutput {
    pub fn new(chip: &Chip, line: Line) -> Self {
        Self {
            chip: Rc::clone(chip),
            line,
        }
    }

    fn drive(&mut self, high: bool) {
        let mut chip = self.chip.borrow_mut();
        match self.line {
            Line::Cs => chip.select(!high),
            Line::Sck => chip.clock(high),
            Line::Si => chip.si = high,
        }
    }
}

impl ErrorType for ChipOutput {
    type Error = Infallible;
}

impl OutputPin for ChipOutput {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.drive(true);
        Ok(())
    }
}

pub struct ChipInput {
    chip: Chip,
}

impl ChipInput {
    pub fn new(chip: &Chip) -> Self {
        Self { chip: Rc::clone(chip) }
    }
}

impl ErrorType for ChipInput {
    type Error = PinFault;
}

impl InputPin for ChipInput {
    fn is_high(&mut self) -> Result<bool, PinFault> {
        let chip = self.chip.borrow();
        if chip.so_broken {
            return Err(PinFault);
        }
        Ok(chip.data_out())
    }

    fn is_low(&mut self) -> Result<bool, PinFault> {
        self.is_high().map(|h| !h)
    }
}

// ============================================================================
// Receiver side
// ============================================================================

/// Decode framed bits back to text, tracking LTRS/FIGS like a teleprinter.
///
/// Starts in Letters; CR and LF are kept as characters.
pub fn decode_bits(bits: &[u8]) -> String {
    let mut shift = ShiftState::Letters;
    let mut out = String::new();
    for frame in bits.chunks(SYMBOL_BITS) {
        let symbol = Symbol::from_bits(frame).expect("bad framing");
        match symbol.code() {
            LTRS => shift = ShiftState::Letters,
            FIGS => shift = ShiftState::Figures,
            code => {
                if let Some(c) = baudot::decode(code, shift) {
                    out.push(c);
                }
            }
        }
    }
    out
}
