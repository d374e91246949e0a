//! Plain gain stages: input pad and master volume.

use crate::controls::{ControlTargets, SharedState};
use crate::stage::{Stage, StageKind, apply_gain_ramp};
use citrus_core::{AtomicParam, SmoothedParam};

/// Time constant of pad and master changes, in seconds.
pub const GAIN_TIME_CONSTANT: f32 = 0.1;

type Selector = fn(&ControlTargets) -> &AtomicParam;

/// A smoothed gain driven by one target.
pub struct GainStage {
    kind: StageKind,
    select: Selector,
    gain: SmoothedParam,
}

impl GainStage {
    /// Input pad.
    pub fn pad(shared: &SharedState, sample_rate: f32) -> Self {
        Self::new(StageKind::Pad, |t| &t.pad, shared, sample_rate)
    }

    /// Master volume.
    pub fn master(shared: &SharedState, sample_rate: f32) -> Self {
        Self::new(StageKind::Master, |t| &t.master, shared, sample_rate)
    }

    fn new(kind: StageKind, select: Selector, shared: &SharedState, sample_rate: f32) -> Self {
        let initial = select(&shared.targets).get();
        Self {
            kind,
            select,
            gain: SmoothedParam::with_time_constant(initial, sample_rate, GAIN_TIME_CONSTANT),
        }
    }

    /// Current smoothed gain.
    pub fn gain(&self) -> f32 {
        self.gain.get()
    }
}

impl Stage for GainStage {
    fn kind(&self) -> StageKind {
        self.kind
    }

    fn process(&mut self, shared: &SharedState, buffer: &mut [f32]) {
        self.gain.set_target((self.select)(&shared.targets).get());
        let (start, end) = self.gain.advance_block(buffer.len());
        apply_gain_ramp(buffer, start, end);
    }

    fn reset(&mut self, shared: &SharedState) {
        self.gain.set_immediate((self.select)(&shared.targets).get());
    }
}
