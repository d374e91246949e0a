//! Asymmetric tube-style transfer curve.
//!
//! The table maps input amplitude in `[-1, 1]` to output in `[-1, 1]`:
//!
//! ```text
//! x = 2i/N - 1
//! y = (2/π)·atan(1.5·k·x)   for x < -0.5
//! y = (2/π)·atan(0.8·k·x)   otherwise
//! ```
//!
//! Negative excursions past the breakpoint are squashed harder than positive
//! ones, which adds even harmonics the way a single-ended triode does.
//!
//! A curve is immutable once built. The engine publishes a new one through an
//! atomic pointer swap whenever the drive control moves, so the audio path
//! always reads a complete table.

use std::f32::consts::FRAC_2_PI;

/// Number of table entries.
pub const CURVE_SAMPLES: usize = 44100;

/// Input level below which the harder negative slope applies.
pub const BREAKPOINT: f32 = -0.5;

/// Immutable waveshaper lookup table.
#[derive(Debug, Clone, PartialEq)]
pub struct DistortionCurve {
    k: f32,
    table: Box<[f32]>,
}

impl DistortionCurve {
    /// Build the table for shape factor `k`.
    ///
    /// `k` should be positive; the drive mapping keeps it in `[20, ~1601]`.
    pub fn new(k: f32) -> Self {
        let n = CURVE_SAMPLES as f32;
        let table = (0..CURVE_SAMPLES)
            .map(|i| transfer(k, 2.0 * i as f32 / n - 1.0))
            .collect();
        Self { k, table }
    }

    /// Shape factor this table was built with.
    pub fn k(&self) -> f32 {
        self.k
    }

    /// Raw table.
    pub fn table(&self) -> &[f32] {
        &self.table
    }

    /// Apply the curve to one sample.
    ///
    /// The input is mapped onto the table as `(x + 1) * (N - 1) / 2` and
    /// linearly interpolated; inputs outside `[-1, 1]` (and NaN) hold the end
    /// values.
    #[inline]
    pub fn shape(&self, x: f32) -> f32 {
        let last = self.table.len() - 1;
        let pos = (x + 1.0) * 0.5 * last as f32;
        if !(pos > 0.0) {
            return self.table[0];
        }
        if pos >= last as f32 {
            return self.table[last];
        }
        let idx = pos as usize;
        let frac = pos - idx as f32;
        let a = self.table[idx];
        let b = self.table[idx + 1];
        a + (b - a) * frac
    }
}

/// The closed-form transfer function the table samples.
#[inline]
pub fn transfer(k: f32, x: f32) -> f32 {
    let slope = if x < BREAKPOINT { 1.5 } else { 0.8 };
    FRAC_2_PI * (slope * k * x).atan()
}
