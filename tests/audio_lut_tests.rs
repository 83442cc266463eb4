//! Sine lookup table tests

use rust_rtty_dds::audio::lut::{LUT_SIZE, MIDSCALE, SINE_LUT};

#[test]
fn test_lut_size() {
    assert_eq!(SINE_LUT.len(), LUT_SIZE);
    assert_eq!(LUT_SIZE, 256);
}

#[test]
fn test_lut_cardinal_points() {
    // 0° and 180° sit on midscale
    assert_eq!(SINE_LUT[0], MIDSCALE);
    assert_eq!(SINE_LUT[128], MIDSCALE);

    // Peak at 90°, trough at 270°
    assert_eq!(SINE_LUT[64], 255);
    assert_eq!(SINE_LUT[192], 1);
}

#[test]
fn test_lut_never_hits_rails() {
    // 0 is never produced, so the table stays symmetric around 128
    assert!(SINE_LUT.iter().all(|&s| s >= 1));
    assert_eq!(SINE_LUT.iter().max().copied(), Some(255));
    assert_eq!(SINE_LUT.iter().min().copied(), Some(1));
}

#[test]
fn test_lut_half_wave_symmetry() {
    for i in 0..128 {
        let sum = SINE_LUT[i] as i32 + SINE_LUT[i + 128] as i32;
        assert!((sum - 256).abs() <= 1, "LUT[{}] + LUT[{}] = {}", i, i + 128, sum);
    }
}

#[test]
fn test_lut_first_quadrant_rises() {
    for i in 0..64 {
        assert!(SINE_LUT[i] <= SINE_LUT[i + 1], "not monotonic at {}", i);
    }
    for i in 64..192 {
        assert!(SINE_LUT[i] >= SINE_LUT[i + 1], "not monotonic at {}", i);
    }
}
