//! Level conversions and small DSP helpers.
//!
//! All functions are allocation-free and `no_std`.

use libm::{expf, logf, sqrtf};

/// Convert decibels to linear gain.
///
/// ```rust
/// use citrus_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels. Inputs are floored at 1e-10 (-200 dB).
///
/// ```rust
/// use citrus_core::linear_to_db;
///
/// assert!(linear_to_db(1.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) + 6.02).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Replace denormal-range values with zero.
#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Root mean square of a buffer. Empty buffers read as silence.
pub fn rms(buffer: &[f32]) -> f32 {
    if buffer.is_empty() {
        return 0.0;
    }
    let sum: f32 = buffer.iter().map(|x| x * x).sum();
    sqrtf(sum / buffer.len() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_round_trip() {
        for db in [-40.0, -12.0, 0.0, 6.0, 20.0] {
            assert!((linear_to_db(db_to_linear(db)) - db).abs() < 1e-3);
        }
    }

    #[test]
    fn silence_floor() {
        assert!((linear_to_db(0.0) + 200.0).abs() < 0.01);
    }

    #[test]
    fn rms_of_square_wave() {
        let buffer = [0.5, -0.5, 0.5, -0.5];
        assert!((rms(&buffer) - 0.5).abs() < 1e-6);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn denormals_flush() {
        assert_eq!(flush_denormal(1e-30), 0.0);
        assert_eq!(flush_denormal(0.25), 0.25);
    }
}
