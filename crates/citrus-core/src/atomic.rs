//! Lock-free parameter cell shared between the control and audio threads.

use core::sync::atomic::{AtomicU32, Ordering};

/// A thread-safe atomic parameter using bit-cast f32.
///
/// The control thread writes, the audio thread reads. No locks, no allocations.
/// Every write is clamped to `[min, max]`, so out-of-domain values never reach
/// the signal path.
#[derive(Debug)]
pub struct AtomicParam {
    value: AtomicU32,
    min: f32,
    max: f32,
    default: f32,
}

impl AtomicParam {
    /// Create a new atomic parameter with default and range.
    pub fn new(default: f32, min: f32, max: f32) -> Self {
        let default = default.clamp(min, max);
        Self {
            value: AtomicU32::new(default.to_bits()),
            min,
            max,
            default,
        }
    }

    /// Store a value, clamped to the parameter range. NaN stores the default.
    #[inline]
    pub fn set(&self, v: f32) {
        let clamped = if v.is_nan() {
            self.default
        } else {
            v.clamp(self.min, self.max)
        };
        self.value.store(clamped.to_bits(), Ordering::Release);
    }

    /// Load the current value.
    #[inline]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.value.load(Ordering::Acquire))
    }
}
