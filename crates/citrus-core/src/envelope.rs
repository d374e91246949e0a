//! Envelope follower for tracking signal amplitude.
//!
//! Drives the compressor's gain computer.

use libm::expf;

/// Peak envelope follower with separate attack and release.
///
/// # Example
///
/// ```rust
/// use citrus_core::EnvelopeFollower;
///
/// let mut env = EnvelopeFollower::with_times(48000.0, 20.0, 200.0);
/// let level = env.process(0.5);
/// assert!(level > 0.0 && level < 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    envelope: f32,
    attack_coeff: f32,
    release_coeff: f32,
}

impl EnvelopeFollower {
    /// Create with attack and release times in milliseconds.
    ///
    /// Attack is floored at 0.1 ms and release at 1 ms.
    pub fn with_times(sample_rate: f32, attack_ms: f32, release_ms: f32) -> Self {
        Self {
            envelope: 0.0,
            attack_coeff: time_to_coeff(attack_ms.max(0.1), sample_rate),
            release_coeff: time_to_coeff(release_ms.max(1.0), sample_rate),
        }
    }

    /// Process a sample and return the envelope level (always positive).
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let input_abs = input.abs();
        let coeff = if input_abs > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope = coeff * self.envelope + (1.0 - coeff) * input_abs;
        self.envelope
    }

    /// Current envelope level without processing.
    #[inline]
    pub fn level(&self) -> f32 {
        self.envelope
    }

    /// Reset the envelope to zero.
    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }
}

/// One-pole coefficient reaching ~63% in `ms` milliseconds.
#[inline]
fn time_to_coeff(ms: f32, sample_rate: f32) -> f32 {
    let samples = ms * sample_rate / 1000.0;
    if samples <= 0.0 { 0.0 } else { expf(-1.0 / samples) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attack_rises_toward_input() {
        let mut env = EnvelopeFollower::with_times(48000.0, 20.0, 200.0);
        for _ in 0..960 {
            env.process(1.0);
        }
        // one attack time constant
        assert!((env.level() - 0.632).abs() < 0.02, "got {}", env.level());
    }

    #[test]
    fn release_is_slower_than_attack() {
        let mut env = EnvelopeFollower::with_times(48000.0, 1.0, 200.0);
        for _ in 0..4800 {
            env.process(1.0);
        }
        for _ in 0..480 {
            env.process(0.0);
        }
        assert!(env.level() > 0.9);
        env.reset();
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn times_are_floored() {
        let floored = EnvelopeFollower::with_times(44100.0, 0.0, 0.0);
        let explicit = EnvelopeFollower::with_times(44100.0, 0.1, 1.0);
        assert_eq!(floored.attack_coeff, explicit.attack_coeff);
        assert_eq!(floored.release_coeff, explicit.release_coeff);
        assert!(floored.attack_coeff > 0.0);
    }
}
