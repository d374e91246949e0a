//! Parameter smoothing for click-free control changes.
//!
//! Amp controls (gain, tone, blend) are written by the control thread at
//! arbitrary moments. Applying a new value instantly produces audible zipper
//! noise, so every stage parameter has a *target* and a *current* value, and
//! the current value glides toward the target with a one-pole exponential
//! response.
//!
//! The signal chain reads each parameter once per processed block, so the
//! glide advances a whole block at a time:
//! `current += (target - current) * (1 - exp(-block_secs / tau))`.
//!
//! ## Usage
//!
//! ```rust
//! use citrus_core::SmoothedParam;
//!
//! let mut gain = SmoothedParam::with_time_constant(1.0, 48000.0, 0.1);
//! gain.set_target(0.5);
//!
//! // Once per 256-frame block
//! let (start, end) = gain.advance_block(256);
//! assert!(start > end && end > 0.5);
//! ```

use libm::expf;

/// A parameter with built-in exponential smoothing.
///
/// The time constant `tau` is the time needed to cover ~63% of the distance
/// to the target. A time constant of zero disables smoothing.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    /// Current smoothed value
    current: f32,
    /// Target value we're smoothing towards
    target: f32,
    /// Sample rate in Hz
    sample_rate: f32,
    /// Time constant in seconds
    time_constant: f32,
}

impl SmoothedParam {
    /// Create a parameter that settles with the given time constant in seconds.
    pub fn with_time_constant(initial: f32, sample_rate: f32, time_constant: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            sample_rate,
            time_constant,
        }
    }

    /// Set the target value (the parameter glides toward it).
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Set target and immediately snap to it.
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    /// Advance by a block of `frames` samples in a single step.
    ///
    /// Returns `(start, end)`: the value before and after the step, so callers
    /// can ramp linearly across the block instead of jumping at its boundary.
    /// Within 1e-6 of the target the value lands on it exactly.
    #[inline]
    pub fn advance_block(&mut self, frames: usize) -> (f32, f32) {
        let start = self.current;
        if self.time_constant <= 0.0 || self.sample_rate <= 0.0 {
            self.current = self.target;
        } else {
            let block_secs = frames as f32 / self.sample_rate;
            let step = 1.0 - expf(-block_secs / self.time_constant);
            self.current += (self.target - self.current) * step;
        }
        if (self.current - self.target).abs() < 1e-6 {
            self.current = self.target;
        }
        (start, self.current)
    }

    /// Current smoothed value.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }
}
