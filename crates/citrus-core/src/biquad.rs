//! Biquad (bi-quadratic) filter structure.
//!
//! Provides a generic second-order IIR filter and the coefficient designs the
//! amp needs: low-pass, high-pass, peaking EQ, low shelf and high shelf.
//!
//! Coefficient calculation uses the RBJ Audio EQ Cookbook formulas. Low-pass
//! and high-pass resonance is given in dB, as the height of the peak at the
//! corner, and converted to the cookbook's linear Q as `10^(dB/20)`. Peaking
//! filters take linear Q directly; shelves use slope S = 1.

use core::f32::consts::PI;
use crate::math::db_to_linear;
use libm::{cosf, powf, sinf, sqrtf};

/// Unnormalized `(b0, b1, b2, a0, a1, a2)` coefficient tuple.
pub type Coefficients = (f32, f32, f32, f32, f32, f32);

/// Generic biquad filter coefficients and state.
///
/// Implements the Direct Form I biquad structure:
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
///                - a1*y[n-1] - a2*y[n-2]
/// ```
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    /// Input delay line: x[n-1], x[n-2]
    x1: f32,
    x2: f32,

    /// Output delay line: y[n-1], y[n-2]
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Creates a new biquad with passthrough coefficients.
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Creates a biquad already configured for `shape` at `sample_rate`.
    pub fn with_shape(shape: FilterShape, sample_rate: f32) -> Self {
        let mut biquad = Self::new();
        biquad.set_shape(shape, sample_rate);
        biquad
    }

    /// Sets the biquad coefficients, normalizing by `a0`.
    pub fn set_coefficients(&mut self, b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) {
        let a0_inv = 1.0 / a0;
        self.b0 = b0 * a0_inv;
        self.b1 = b1 * a0_inv;
        self.b2 = b2 * a0_inv;
        self.a1 = a1 * a0_inv;
        self.a2 = a2 * a0_inv;
    }

    /// Redesigns the coefficients for `shape`. Filter history is kept, so
    /// calling this between blocks does not click.
    pub fn set_shape(&mut self, shape: FilterShape, sample_rate: f32) {
        let (b0, b1, b2, a0, a1, a2) = shape.coefficients(sample_rate);
        self.set_coefficients(b0, b1, b2, a0, a1, a2);
    }

    /// Processes a single sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// Processes a buffer in place.
    pub fn process_block(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Clears the filter state (delay lines) without changing coefficients.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

/// A declarative filter description.
///
/// Frequencies are in Hz. Gains are in dB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterShape {
    /// Resonant low-pass.
    Lowpass {
        /// Cutoff frequency
        frequency: f32,
        /// Gain at the cutoff in dB (0 dB is Q 1, -3 dB is Butterworth)
        resonance_db: f32,
    },
    /// Resonant high-pass.
    Highpass {
        /// Cutoff frequency
        frequency: f32,
        /// Gain at the cutoff in dB (0 dB is Q 1, -3 dB is Butterworth)
        resonance_db: f32,
    },
    /// Bell boost or cut around a center frequency.
    Peaking {
        /// Center frequency
        frequency: f32,
        /// Bandwidth control
        q: f32,
        /// Boost (positive) or cut (negative)
        gain_db: f32,
    },
    /// Shelf affecting everything below the corner frequency.
    LowShelf {
        /// Corner frequency
        frequency: f32,
        /// Shelf gain
        gain_db: f32,
    },
    /// Shelf affecting everything above the corner frequency.
    HighShelf {
        /// Corner frequency
        frequency: f32,
        /// Shelf gain
        gain_db: f32,
    },
}

impl FilterShape {
    /// Computes the unnormalized coefficients at `sample_rate`.
    pub fn coefficients(self, sample_rate: f32) -> Coefficients {
        match self {
            Self::Lowpass {
                frequency,
                resonance_db,
            } => lowpass_coefficients(frequency, db_to_linear(resonance_db), sample_rate),
            Self::Highpass {
                frequency,
                resonance_db,
            } => highpass_coefficients(frequency, db_to_linear(resonance_db), sample_rate),
            Self::Peaking {
                frequency,
                q,
                gain_db,
            } => peaking_eq_coefficients(frequency, q, gain_db, sample_rate),
            Self::LowShelf { frequency, gain_db } => {
                low_shelf_coefficients(frequency, gain_db, sample_rate)
            }
            Self::HighShelf { frequency, gain_db } => {
                high_shelf_coefficients(frequency, gain_db, sample_rate)
            }
        }
    }
}

/// Angular frequency, with the corner kept just below Nyquist so low sample
/// rates cannot fold a design past it.
#[inline]
fn omega(frequency: f32, sample_rate: f32) -> f32 {
    let frequency = frequency.clamp(1.0, sample_rate * 0.499);
    2.0 * PI * frequency / sample_rate
}

/// Calculates low-pass filter coefficients using the RBJ cookbook formula.
///
/// # Arguments
///
/// * `frequency` - Cutoff frequency in Hz
/// * `q` - Q factor (0.707 for Butterworth response)
/// * `sample_rate` - Sample rate in Hz
pub fn lowpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> Coefficients {
    let w = omega(frequency, sample_rate);
    let cos_w = cosf(w);
    let alpha = sinf(w) / (2.0 * q);

    let b1 = 1.0 - cos_w;
    (b1 / 2.0, b1, b1 / 2.0, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha)
}

/// Calculates high-pass filter coefficients using the RBJ cookbook formula.
pub fn highpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> Coefficients {
    let w = omega(frequency, sample_rate);
    let cos_w = cosf(w);
    let alpha = sinf(w) / (2.0 * q);

    let b0 = (1.0 + cos_w) / 2.0;
    (b0, -(1.0 + cos_w), b0, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha)
}

/// Calculates peaking EQ filter coefficients using the RBJ cookbook formula.
///
/// # Arguments
///
/// * `frequency` - Center frequency in Hz
/// * `q` - Q factor (bandwidth = frequency / Q)
/// * `gain_db` - Gain in decibels (positive = boost, negative = cut)
/// * `sample_rate` - Sample rate in Hz
pub fn peaking_eq_coefficients(
    frequency: f32,
    q: f32,
    gain_db: f32,
    sample_rate: f32,
) -> Coefficients {
    let a = powf(10.0, gain_db / 40.0);
    let w = omega(frequency, sample_rate);
    let cos_w = cosf(w);
    let alpha = sinf(w) / (2.0 * q);

    (
        1.0 + alpha * a,
        -2.0 * cos_w,
        1.0 - alpha * a,
        1.0 + alpha / a,
        -2.0 * cos_w,
        1.0 - alpha / a,
    )
}

/// Shelf alpha for slope S = 1: `sin(w)/2 * sqrt(2)`.
#[inline]
fn shelf_alpha(w: f32) -> f32 {
    sinf(w) / 2.0 * sqrtf(2.0)
}

/// Calculates low-shelf coefficients (RBJ cookbook, S = 1).
pub fn low_shelf_coefficients(frequency: f32, gain_db: f32, sample_rate: f32) -> Coefficients {
    let a = powf(10.0, gain_db / 40.0);
    let w = omega(frequency, sample_rate);
    let cos_w = cosf(w);
    let two_sqrt_a_alpha = 2.0 * sqrtf(a) * shelf_alpha(w);

    (
        a * ((a + 1.0) - (a - 1.0) * cos_w + two_sqrt_a_alpha),
        2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w),
        a * ((a + 1.0) - (a - 1.0) * cos_w - two_sqrt_a_alpha),
        (a + 1.0) + (a - 1.0) * cos_w + two_sqrt_a_alpha,
        -2.0 * ((a - 1.0) + (a + 1.0) * cos_w),
        (a + 1.0) + (a - 1.0) * cos_w - two_sqrt_a_alpha,
    )
}

/// Calculates high-shelf coefficients (RBJ cookbook, S = 1).
pub fn high_shelf_coefficients(frequency: f32, gain_db: f32, sample_rate: f32) -> Coefficients {
    let a = powf(10.0, gain_db / 40.0);
    let w = omega(frequency, sample_rate);
    let cos_w = cosf(w);
    let two_sqrt_a_alpha = 2.0 * sqrtf(a) * shelf_alpha(w);

    (
        a * ((a + 1.0) + (a - 1.0) * cos_w + two_sqrt_a_alpha),
        -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w),
        a * ((a + 1.0) + (a - 1.0) * cos_w - two_sqrt_a_alpha),
        (a + 1.0) - (a - 1.0) * cos_w + two_sqrt_a_alpha,
        2.0 * ((a - 1.0) - (a + 1.0) * cos_w),
        (a + 1.0) - (a - 1.0) * cos_w - two_sqrt_a_alpha,
    )
}
