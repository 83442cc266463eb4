//! Sine wave lookup table for the DDS synthesizer
//!
//! 256-entry table covering one full cycle.
//! Values are unsigned 8-bit DAC codes centred on 128.

/// Number of entries in the sine LUT
pub const LUT_SIZE: usize = 256;

/// DAC code for zero amplitude
pub const MIDSCALE: u8 = 128;

/// Pre-computed sine wave lookup table
///
/// 256 samples covering 0 to 2π
/// Amplitude: 128 ± 127 (codes 1 to 255)
/// Index 0 = 0°, 64 = 90°, 128 = 180°, 192 = 270°
pub static SINE_LUT: [u8; LUT_SIZE] = {
    let mut table = [0u8; LUT_SIZE];
    let mut i = 0;
    while i < LUT_SIZE {
        // 128 + round(sin(2π * i / 256) * 127)
        let angle = (i as f64) * core::f64::consts::PI * 2.0 / (LUT_SIZE as f64);
        let scaled = const_sin(angle) * 127.0;
        let rounded = if scaled >= 0.0 {
            (scaled + 0.5) as i32
        } else {
            (scaled - 0.5) as i32
        };
        table[i] = (MIDSCALE as i32 + rounded) as u8;
        i += 1;
    }
    table
};

/// Const-compatible sine approximation using Taylor series
const fn const_sin(x: f64) -> f64 {
    // Fold into [-π/2, π/2] where the series converges fast
    let pi = core::f64::consts::PI;
    let mut x = x;
    while x > pi {
        x -= 2.0 * pi;
    }
    while x < -pi {
        x += 2.0 * pi;
    }
    if x > pi / 2.0 {
        x = pi - x;
    } else if x < -pi / 2.0 {
        x = -pi - x;
    }

    let x2 = x * x;
    let x3 = x2 * x;
    let x5 = x3 * x2;
    let x7 = x5 * x2;
    let x9 = x7 * x2;

    x - x3 / 6.0 + x5 / 120.0 - x7 / 5040.0 + x9 / 362880.0
}
