//! Oversampling around a memoryless nonlinearity.
//!
//! A waveshaper generates harmonics far above the input bandwidth. At the base
//! sample rate those harmonics fold back below Nyquist as inharmonic aliasing.
//! [`Oversampler`] runs the shaper at [`OVERSAMPLE_FACTOR`] times the base rate:
//!
//! ```text
//! x[n] → linear interpolation (4 points) → shaper → FIR lowpass → keep last point → y[n]
//! ```
//!
//! The anti-aliasing filter is a 16-tap linear-phase windowed-sinc FIR
//! (Kaiser window) whose cutoff sits at the base-rate Nyquist. Its group
//! delay is 7 oversampled samples, reported as [`Oversampler::latency_samples`]
//! in base-rate samples (rounded down).
//!
//! The shaper is passed per call as a closure, so the caller can swap the
//! transfer function between blocks without touching the filter state.

/// Oversampling factor.
pub const OVERSAMPLE_FACTOR: usize = 4;

const FILTER_TAPS: usize = 16;

/// Anti-aliasing FIR for 4×: cutoff 0.2 × oversampled Nyquist, unity DC gain.
#[allow(clippy::excessive_precision)]
#[rustfmt::skip]
static COEFFS_4X: [f32; FILTER_TAPS] = [
    0.0018645282, 0.0068257641, 0.0172712655, 0.0342604001,
    0.0571166576, 0.0830896230, 0.1078345458, 0.1260221675,
    0.1332946246, 0.1260221675, 0.1078345458, 0.0830896230,
    0.0571166576, 0.0342604001, 0.0172712655, 0.0068257641,
];

/// Interpolate, shape, filter and decimate.
#[derive(Debug, Clone)]
pub struct Oversampler {
    /// Previous base-rate input, the interpolation start point
    prev_input: f32,
    /// Circular FIR history at the oversampled rate
    history: [f32; FILTER_TAPS],
    /// Index of the most recent entry in `history`
    head: usize,
}

impl Oversampler {
    /// Create an oversampler with cleared state.
    pub fn new() -> Self {
        Self {
            prev_input: 0.0,
            history: [0.0; FILTER_TAPS],
            head: 0,
        }
    }

    /// Run one base-rate sample through `shaper` at the oversampled rate.
    #[inline]
    pub fn process(&mut self, input: f32, mut shaper: impl FnMut(f32) -> f32) -> f32 {
        let step = 1.0 / OVERSAMPLE_FACTOR as f32;
        for i in 0..OVERSAMPLE_FACTOR {
            let t = (i as f32 + 1.0) * step;
            let upsampled = self.prev_input + t * (input - self.prev_input);
            self.head = (self.head + 1) % FILTER_TAPS;
            self.history[self.head] = shaper(upsampled);
        }
        self.prev_input = input;

        // FIR evaluated only at the decimation point.
        let mut acc = 0.0;
        let mut idx = self.head;
        for &c in &COEFFS_4X {
            acc += c * self.history[idx];
            idx = if idx == 0 { FILTER_TAPS - 1 } else { idx - 1 };
        }
        acc
    }

    /// Run a buffer in place through `shaper`.
    pub fn process_block(&mut self, buffer: &mut [f32], mut shaper: impl FnMut(f32) -> f32) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample, &mut shaper);
        }
    }

    /// Clear interpolation and filter history.
    pub fn reset(&mut self) {
        self.prev_input = 0.0;
        self.history = [0.0; FILTER_TAPS];
        self.head = 0;
    }

    /// Group delay in base-rate samples.
    pub const fn latency_samples(&self) -> usize {
        (FILTER_TAPS - 1) / 2 / OVERSAMPLE_FACTOR
    }
}

impl Default for Oversampler {
    fn default() -> Self {
        Self::new()
    }
}
