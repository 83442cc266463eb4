//! Sample streamer tests

mod common;

use common::{clip, BrokenDac, RecordingDac, VecMemory};
use rust_rtty_dds::audio::playback::{
    PlaybackControl, PlaybackEnd, PlaybackTick, SampleStreamer, DEFAULT_SENTINEL_THRESHOLD,
    SENTINEL_BYTE,
};
use rust_rtty_dds::fault::{FaultCode, FaultState};

/// Tick until the run ends, with an upper bound so a broken heuristic
/// fails instead of hanging.
fn run_to_end<M, S>(streamer: &mut SampleStreamer<'_, M, S>) -> (PlaybackEnd, u32)
where
    M: rust_rtty_dds::hal::serial_memory::SampleMemory,
    S: rust_rtty_dds::hal::dac::SampleSink,
{
    for ticks in 1..=100_000 {
        if let PlaybackTick::Finished(end) = streamer.tick() {
            return (end, ticks);
        }
    }
    panic!("playback never ended");
}

#[test]
fn test_idle_until_armed() {
    let control = PlaybackControl::new();
    let fault = FaultState::new();
    let dac = RecordingDac::new();
    let mut streamer = SampleStreamer::new(&control, &fault, VecMemory::new(vec![1, 2, 3]), dac.clone());

    for _ in 0..10 {
        assert_eq!(streamer.tick(), PlaybackTick::Idle);
    }
    assert_eq!(dac.len(), 0);
    assert_eq!(streamer.memory().sessions, 0);
}

#[test]
fn test_plays_clip_then_stops_on_sentinel_run() {
    let control = PlaybackControl::new();
    let fault = FaultState::new();
    let dac = RecordingDac::new();
    let memory = VecMemory::new(clip(&[10, 20, 30], 1000));
    let mut streamer = SampleStreamer::new(&control, &fault, memory, dac.clone());

    control.arm();
    let (end, _) = run_to_end(&mut streamer);

    assert_eq!(end, PlaybackEnd::Sentinel);
    assert!(control.is_finished());
    assert_eq!(control.end(), Some(PlaybackEnd::Sentinel));

    // Stopped on the 250th erased byte, which is never output
    let threshold = DEFAULT_SENTINEL_THRESHOLD as usize;
    assert_eq!(streamer.bytes_read() as usize, 3 + threshold);
    let samples = dac.samples();
    assert_eq!(samples.len(), 3 + threshold - 1);
    assert_eq!(&samples[..3], &[10, 20, 30]);
    assert!(samples[3..].iter().all(|&s| s == SENTINEL_BYTE));
    assert_eq!(control.samples() as usize, samples.len());

    assert!(!streamer.memory().is_open());
    assert!(!streamer.cursor().active);
    assert!(!fault.is_active());
}

#[test]
fn test_short_sentinel_runs_do_not_end_playback() {
    let control = PlaybackControl::new();
    let fault = FaultState::new();
    let dac = RecordingDac::new();

    // Full-scale stretch just below the threshold, then more audio
    let mut data = vec![0x80; 4];
    data.extend(std::iter::repeat(0xFF).take(DEFAULT_SENTINEL_THRESHOLD as usize - 1));
    data.extend([0x10, 0x20]);
    let memory = VecMemory::new(clip(&data, 300));
    let mut streamer = SampleStreamer::new(&control, &fault, memory, dac.clone());

    control.arm();
    let (end, _) = run_to_end(&mut streamer);

    assert_eq!(end, PlaybackEnd::Sentinel);
    let samples = dac.samples();
    assert!(samples.contains(&0x10));
    assert!(samples.contains(&0x20));
    assert_eq!(samples.len(), data.len() + DEFAULT_SENTINEL_THRESHOLD as usize - 1);
}

#[test]
fn test_erased_memory_plays_nothing_audible() {
    let control = PlaybackControl::new();
    let fault = FaultState::new();
    let dac = RecordingDac::new();
    let mut streamer = SampleStreamer::new(&control, &fault, VecMemory::new(Vec::new()), dac.clone());

    control.arm();
    let (end, ticks) = run_to_end(&mut streamer);

    assert_eq!(end, PlaybackEnd::Sentinel);
    assert_eq!(ticks as usize, DEFAULT_SENTINEL_THRESHOLD as usize - 1);
    assert_eq!(streamer.bytes_read(), DEFAULT_SENTINEL_THRESHOLD as u32);
}

#[test]
fn test_custom_threshold() {
    let control = PlaybackControl::new();
    let fault = FaultState::new();
    let dac = RecordingDac::new();
    let memory = VecMemory::new(clip(&[1, 0xFF, 0xFF, 2], 10));
    let mut streamer = SampleStreamer::with_threshold(&control, &fault, memory, dac.clone(), 3);

    control.arm();
    run_to_end(&mut streamer);

    assert_eq!(streamer.threshold(), 3);
    assert_eq!(dac.samples(), vec![1, 0xFF, 0xFF, 2, 0xFF, 0xFF]);
}

#[test]
fn test_zero_threshold_is_clamped() {
    let control = PlaybackControl::new();
    let fault = FaultState::new();
    let streamer = SampleStreamer::with_threshold(
        &control,
        &fault,
        VecMemory::new(Vec::new()),
        RecordingDac::new(),
        0,
    );
    assert_eq!(streamer.threshold(), 1);
}

#[test]
fn test_memory_error_ends_playback() {
    let control = PlaybackControl::new();
    let fault = FaultState::new();
    let dac = RecordingDac::new();
    let mut memory = VecMemory::new(vec![5; 100]);
    memory.fail_at = Some(40);
    let mut streamer = SampleStreamer::new(&control, &fault, memory, dac.clone());

    control.arm();
    let (end, _) = run_to_end(&mut streamer);

    assert_eq!(end, PlaybackEnd::MemoryFault);
    assert_eq!(control.end(), Some(PlaybackEnd::MemoryFault));
    assert_eq!(dac.len(), 40);
    assert_eq!(fault.code(), FaultCode::MemoryBus);
    assert_eq!(fault.data(), 40);
    assert!(!streamer.memory().is_open());
}

#[test]
fn test_dac_error_is_latched_but_playback_continues() {
    let control = PlaybackControl::new();
    let fault = FaultState::new();
    let memory = VecMemory::new(clip(&[1, 2], 5));
    let mut streamer = SampleStreamer::with_threshold(&control, &fault, memory, BrokenDac, 5);

    control.arm();
    let (end, ticks) = run_to_end(&mut streamer);

    assert_eq!(end, PlaybackEnd::Sentinel);
    assert_eq!(ticks, 6);
    assert_eq!(fault.code(), FaultCode::DacBus);
    assert_eq!(fault.count(), 6);
}

#[test]
fn test_rearm_restarts_from_base_address() {
    let control = PlaybackControl::new();
    let fault = FaultState::new();
    let dac = RecordingDac::new();
    let memory = VecMemory::new(clip(&[7, 8], 10));
    let mut streamer = SampleStreamer::with_threshold(&control, &fault, memory, dac.clone(), 2);

    control.arm();
    run_to_end(&mut streamer);
    let first = dac.samples();

    // Inert until armed again
    assert_eq!(streamer.tick(), PlaybackTick::Idle);

    control.arm();
    assert!(!control.is_finished());
    assert_eq!(control.samples(), 0);
    run_to_end(&mut streamer);

    assert_eq!(streamer.memory().sessions, 2);
    let all = dac.samples();
    assert_eq!(&all[first.len()..], &first[..]);
}
