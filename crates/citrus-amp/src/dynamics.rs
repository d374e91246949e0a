//! Parallel optical-style compressor.
//!
//! ```text
//!        ┌── envelope → gain computer → × makeup ──┐ × wet
//! in ────┤                                         ├──(+)── out
//!        └─────────────────────────────────────────┘ × dry
//! ```
//!
//! Knee, ratio, attack and release are fixed. The amount dial moves threshold
//! and makeup together; the blend dial sets the wet share and the dry share is
//! always its complement. With the stage switched off the wet gain is zero
//! and the block passes through unchanged.

use crate::controls::SharedState;
use crate::stage::{Stage, StageKind, ramp};
use citrus_core::{EnvelopeFollower, SmoothedParam, db_to_linear, flush_denormal, linear_to_db};

/// Soft knee width in dB.
pub const KNEE_DB: f32 = 20.0;
/// Compression ratio above the knee.
pub const RATIO: f32 = 6.0;
/// Envelope attack in milliseconds.
pub const ATTACK_MS: f32 = 20.0;
/// Envelope release in milliseconds.
pub const RELEASE_MS: f32 = 200.0;
/// Time constant of threshold and makeup changes, in seconds.
pub const LEVEL_TIME_CONSTANT: f32 = 0.1;
/// Time constant of wet/dry changes, in seconds.
pub const BLEND_TIME_CONSTANT: f32 = 0.05;

/// Static gain curve: reduction in dB (zero or negative) for a level in dB.
///
/// Quadratic across the knee, so the slope moves smoothly from 1 to `1/ratio`.
#[inline]
pub fn gain_reduction_db(level_db: f32, threshold_db: f32) -> f32 {
    let overshoot = level_db - threshold_db;
    let half_knee = KNEE_DB * 0.5;
    let slope = 1.0 / RATIO - 1.0;
    if overshoot <= -half_knee {
        0.0
    } else if overshoot >= half_knee {
        slope * overshoot
    } else {
        let x = overshoot + half_knee;
        slope * x * x / (2.0 * KNEE_DB)
    }
}

/// Parallel compressor stage.
pub struct DynamicsStage {
    envelope: EnvelopeFollower,
    threshold_db: SmoothedParam,
    makeup: SmoothedParam,
    wet: SmoothedParam,
}

impl DynamicsStage {
    /// Create the stage starting at the current targets.
    pub fn new(shared: &SharedState, sample_rate: f32) -> Self {
        let t = &shared.targets;
        Self {
            envelope: EnvelopeFollower::with_times(sample_rate, ATTACK_MS, RELEASE_MS),
            threshold_db: SmoothedParam::with_time_constant(
                t.threshold_db.get(),
                sample_rate,
                LEVEL_TIME_CONSTANT,
            ),
            makeup: SmoothedParam::with_time_constant(
                t.makeup.get(),
                sample_rate,
                LEVEL_TIME_CONSTANT,
            ),
            wet: SmoothedParam::with_time_constant(t.wet.get(), sample_rate, BLEND_TIME_CONSTANT),
        }
    }

    /// Current smoothed `(wet, dry)` gains.
    pub fn blend(&self) -> (f32, f32) {
        let wet = self.wet.get();
        (wet, 1.0 - wet)
    }

    /// Current detector level.
    pub fn envelope(&self) -> f32 {
        self.envelope.level()
    }
}

impl Stage for DynamicsStage {
    fn kind(&self) -> StageKind {
        StageKind::Dynamics
    }

    fn process(&mut self, shared: &SharedState, buffer: &mut [f32]) {
        let t = &shared.targets;
        let frames = buffer.len();
        self.threshold_db.set_target(t.threshold_db.get());
        self.makeup.set_target(t.makeup.get());
        self.wet.set_target(t.wet.get());

        let (th0, th1) = self.threshold_db.advance_block(frames);
        let (mk0, mk1) = self.makeup.advance_block(frames);
        let (w0, w1) = self.wet.advance_block(frames);

        // Fully dry and staying dry: the detector still runs so it is warm
        // when the stage comes back on.
        if w0 == 0.0 && w1 == 0.0 {
            for &sample in buffer.iter() {
                self.envelope.process(sample);
            }
            return;
        }

        let levels = ramp(th0, th1, frames).zip(ramp(mk0, mk1, frames));
        for (sample, ((threshold, makeup), wet)) in buffer
            .iter_mut()
            .zip(levels.zip(ramp(w0, w1, frames)))
        {
            let x = *sample;
            let level_db = linear_to_db(self.envelope.process(x));
            let gain = db_to_linear(gain_reduction_db(level_db, threshold));
            *sample = flush_denormal(wet * x * gain * makeup + (1.0 - wet) * x);
        }
    }

    fn reset(&mut self, shared: &SharedState) {
        let t = &shared.targets;
        self.envelope.reset();
        self.threshold_db.set_immediate(t.threshold_db.get());
        self.makeup.set_immediate(t.makeup.get());
        self.wet.set_immediate(t.wet.get());
    }
}
