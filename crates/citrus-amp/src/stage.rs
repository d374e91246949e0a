//! The processing stages between the router and the output.
//!
//! ```text
//! router → pad → dynamics → drive → tone stack → master → cabinet
//!                    │                                       │
//!             compressor meter                          output meter
//! ```
//!
//! Every stage works in place on a mono block. Stages load their targets from
//! [`SharedState`] once per block and glide toward them, so a control change
//! never lands as a step inside a block.

use crate::controls::SharedState;
use std::fmt;

/// A mono block processor in the amp path.
pub trait Stage: Send {
    /// Which slot of the signal path this stage fills.
    fn kind(&self) -> StageKind;

    /// Process `buffer` in place.
    fn process(&mut self, shared: &SharedState, buffer: &mut [f32]);

    /// Clear filter and envelope state. Smoothed values jump to their targets.
    fn reset(&mut self, shared: &SharedState);

    /// Delay this stage adds, in samples.
    fn latency_samples(&self) -> usize {
        0
    }
}

/// Slot in the fixed signal path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Input pad.
    Pad,
    /// Parallel compressor.
    Dynamics,
    /// Preamp gain, tighten filter and oversampled waveshaper.
    Drive,
    /// Bass, mid and treble filters.
    ToneStack,
    /// Master volume.
    Master,
    /// Cabinet convolution.
    Cabinet,
}

impl StageKind {
    /// Short name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pad => "pad",
            Self::Dynamics => "dynamics",
            Self::Drive => "drive",
            Self::ToneStack => "tone",
            Self::Master => "master",
            Self::Cabinet => "cabinet",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stage order after the router.
pub const SIGNAL_PATH: [StageKind; 6] = [
    StageKind::Pad,
    StageKind::Dynamics,
    StageKind::Drive,
    StageKind::ToneStack,
    StageKind::Master,
    StageKind::Cabinet,
];

/// Linear ramp over `frames` samples ending exactly at `end`.
#[inline]
pub fn ramp(start: f32, end: f32, frames: usize) -> impl Iterator<Item = f32> {
    let step = if frames == 0 {
        0.0
    } else {
        (end - start) / frames as f32
    };
    (1..=frames).map(move |i| {
        if i == frames {
            end
        } else {
            start + step * i as f32
        }
    })
}

/// Multiply `buffer` by a gain ramping from `start` to `end`.
#[inline]
pub fn apply_gain_ramp(buffer: &mut [f32], start: f32, end: f32) {
    if start == end {
        for sample in buffer.iter_mut() {
            *sample *= end;
        }
        return;
    }
    let frames = buffer.len();
    for (sample, gain) in buffer.iter_mut().zip(ramp(start, end, frames)) {
        *sample *= gain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_ends_on_target() {
        let values: Vec<f32> = ramp(0.0, 1.0, 4).collect();
        assert_eq!(values, vec![0.25, 0.5, 0.75, 1.0]);
        assert_eq!(ramp(0.0, 1.0, 0).count(), 0);
    }

    #[test]
    fn flat_ramp_is_plain_gain() {
        let mut buffer = [1.0, -2.0, 0.5];
        apply_gain_ramp(&mut buffer, 0.5, 0.5);
        assert_eq!(buffer, [0.5, -1.0, 0.25]);
    }

    #[test]
    fn path_order() {
        let names: Vec<&str> = SIGNAL_PATH.iter().map(|k| k.name()).collect();
        assert_eq!(
            names,
            ["pad", "dynamics", "drive", "tone", "master", "cabinet"]
        );
    }
}
