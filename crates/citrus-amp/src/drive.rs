//! Preamp and drive.
//!
//! ```text
//! in → preamp gain → tighten HPF (80 Hz, 0.7 dB) → 4× oversampled curve → out
//! ```
//!
//! The tighten filter strips low end before the shaper so palm mutes stay
//! articulate. The curve is read through the shared atomic pointer once per
//! block; a drive change mid-block is picked up on the next one.

use crate::controls::SharedState;
use crate::stage::{Stage, StageKind, apply_gain_ramp};
use citrus_core::{Biquad, FilterShape, Oversampler, SmoothedParam};

/// Time constant of preamp gain changes, in seconds.
pub const PREAMP_TIME_CONSTANT: f32 = 0.1;
/// High-pass ahead of the shaper.
pub const TIGHTEN_FILTER: FilterShape = FilterShape::Highpass {
    frequency: 80.0,
    resonance_db: 0.7,
};

/// Preamp gain, tighten filter and waveshaper.
pub struct DriveStage {
    preamp: SmoothedParam,
    tighten: Biquad,
    oversampler: Oversampler,
}

impl DriveStage {
    /// Create the stage starting at the current preamp target.
    pub fn new(shared: &SharedState, sample_rate: f32) -> Self {
        Self {
            preamp: SmoothedParam::with_time_constant(
                shared.targets.preamp.get(),
                sample_rate,
                PREAMP_TIME_CONSTANT,
            ),
            tighten: Biquad::with_shape(TIGHTEN_FILTER, sample_rate),
            oversampler: Oversampler::new(),
        }
    }

    /// Current smoothed preamp gain.
    pub fn preamp_gain(&self) -> f32 {
        self.preamp.get()
    }
}

impl Stage for DriveStage {
    fn kind(&self) -> StageKind {
        StageKind::Drive
    }

    fn process(&mut self, shared: &SharedState, buffer: &mut [f32]) {
        self.preamp.set_target(shared.targets.preamp.get());
        let (start, end) = self.preamp.advance_block(buffer.len());
        apply_gain_ramp(buffer, start, end);

        self.tighten.process_block(buffer);

        let curve = shared.curve.load();
        self.oversampler.process_block(buffer, |x| curve.shape(x));
    }

    fn reset(&mut self, shared: &SharedState) {
        self.preamp.set_immediate(shared.targets.preamp.get());
        self.tighten.clear();
        self.oversampler.reset();
    }

    fn latency_samples(&self) -> usize {
        self.oversampler.latency_samples()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::ControlValues;
    use crate::curve::DistortionCurve;
    use citrus_core::rms;

    fn sine(len: usize, freq: f32, amp: f32) -> Vec<f32> {
        (0..len)
            .map(|i| amp * (std::f32::consts::TAU * freq * i as f32 / 48000.0).sin())
            .collect()
    }

    #[test]
    fn output_is_bounded() {
        let shared = SharedState::new(&ControlValues {
            gain: 10.0,
            drive: 10.0,
            ..ControlValues::default()
        });
        let mut stage = DriveStage::new(&shared, 48000.0);
        let mut buffer = sine(4800, 220.0, 1.0);
        stage.process(&shared, &mut buffer);
        assert!(buffer.iter().all(|s| s.is_finite() && s.abs() <= 1.1));
    }

    #[test]
    fn tighten_filter_removes_dc() {
        let shared = SharedState::new(&ControlValues::default());
        let mut offset = DriveStage::new(&shared, 48000.0);
        let mut silent = DriveStage::new(&shared, 48000.0);
        let mut a = vec![0.3; 48000];
        let mut b = vec![0.0; 48000];
        offset.process(&shared, &mut a);
        silent.process(&shared, &mut b);
        let diff = (a[47999] - b[47999]).abs();
        assert!(diff < 1e-3, "residual offset {diff}");
    }

    #[test]
    fn picks_up_published_curve() {
        let shared = SharedState::new(&ControlValues::default());
        let mut soft = DriveStage::new(&shared, 48000.0);
        let mut hard = DriveStage::new(&shared, 48000.0);

        let mut a = sine(2048, 440.0, 0.005);
        soft.process(&shared, &mut a);
        shared.publish_curve(DistortionCurve::new(1601.14));
        let mut b = sine(2048, 440.0, 0.005);
        hard.process(&shared, &mut b);

        assert!(rms(&b[512..]) > rms(&a[512..]));
    }

    #[test]
    fn reports_oversampler_latency() {
        let shared = SharedState::new(&ControlValues::default());
        let stage = DriveStage::new(&shared, 48000.0);
        assert_eq!(stage.latency_samples(), 1);
        assert_eq!(stage.preamp_gain(), 2.0);
    }
}
