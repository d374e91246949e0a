//! Input channel routing.
//!
//! The interface delivers two physical channels. The router gains each one
//! independently and sums them into the mono amp path.

use crate::controls::SharedState;
use crate::stage::ramp;
use citrus_core::SmoothedParam;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Time constant of routing gain changes, in seconds.
pub const ROUTING_TIME_CONSTANT: f32 = 0.02;

/// Which input channel(s) feed the amp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelRoutingMode {
    /// Channel 1 only.
    #[default]
    Ch1,
    /// Channel 2 only.
    Ch2,
    /// Both channels at half gain.
    Mix,
}

impl ChannelRoutingMode {
    /// Target `(ch1, ch2)` gains.
    pub const fn gains(self) -> (f32, f32) {
        match self {
            Self::Ch1 => (1.0, 0.0),
            Self::Ch2 => (0.0, 1.0),
            Self::Mix => (0.5, 0.5),
        }
    }
}

impl fmt::Display for ChannelRoutingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ch1 => "ch1",
            Self::Ch2 => "ch2",
            Self::Mix => "mix",
        })
    }
}

impl FromStr for ChannelRoutingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ch1" | "1" => Ok(Self::Ch1),
            "ch2" | "2" => Ok(Self::Ch2),
            "mix" => Ok(Self::Mix),
            other => Err(format!("unknown input channel '{other}' (expected ch1, ch2 or mix)")),
        }
    }
}

/// Stereo-to-mono channel router with smoothed per-channel gains.
#[derive(Debug, Clone)]
pub struct ChannelRouter {
    ch1: SmoothedParam,
    ch2: SmoothedParam,
}

impl ChannelRouter {
    /// Create a router starting at the current targets.
    pub fn new(shared: &SharedState, sample_rate: f32) -> Self {
        let targets = &shared.targets;
        Self {
            ch1: SmoothedParam::with_time_constant(
                targets.ch1_gain.get(),
                sample_rate,
                ROUTING_TIME_CONSTANT,
            ),
            ch2: SmoothedParam::with_time_constant(
                targets.ch2_gain.get(),
                sample_rate,
                ROUTING_TIME_CONSTANT,
            ),
        }
    }

    /// Current smoothed `(ch1, ch2)` gains.
    pub fn gains(&self) -> (f32, f32) {
        (self.ch1.get(), self.ch2.get())
    }

    /// Mix stereo-interleaved `input` into mono `output`.
    ///
    /// `input` must hold `2 * output.len()` samples.
    pub fn process(&mut self, shared: &SharedState, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), output.len() * 2);
        let frames = output.len();
        self.ch1.set_target(shared.targets.ch1_gain.get());
        self.ch2.set_target(shared.targets.ch2_gain.get());
        let (a0, a1) = self.ch1.advance_block(frames);
        let (b0, b1) = self.ch2.advance_block(frames);

        for ((out, frame), (g1, g2)) in output
            .iter_mut()
            .zip(input.chunks_exact(2))
            .zip(ramp(a0, a1, frames).zip(ramp(b0, b1, frames)))
        {
            *out = frame[0] * g1 + frame[1] * g2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::ControlValues;

    fn shared(mode: ChannelRoutingMode) -> SharedState {
        SharedState::new(&ControlValues {
            input_channel: mode,
            ..ControlValues::default()
        })
    }

    #[test]
    fn mode_gains() {
        assert_eq!(ChannelRoutingMode::Ch1.gains(), (1.0, 0.0));
        assert_eq!(ChannelRoutingMode::Ch2.gains(), (0.0, 1.0));
        assert_eq!(ChannelRoutingMode::Mix.gains(), (0.5, 0.5));
    }

    #[test]
    fn parse_and_display() {
        for mode in [
            ChannelRoutingMode::Ch1,
            ChannelRoutingMode::Ch2,
            ChannelRoutingMode::Mix,
        ] {
            assert_eq!(mode.to_string().parse::<ChannelRoutingMode>(), Ok(mode));
        }
        assert!("ch3".parse::<ChannelRoutingMode>().is_err());
    }

    #[test]
    fn ch1_selects_left() {
        let state = shared(ChannelRoutingMode::Ch1);
        let mut router = ChannelRouter::new(&state, 48000.0);
        let input = [0.5, -0.9, 0.25, -0.9];
        let mut output = [0.0; 2];
        router.process(&state, &input, &mut output);
        assert_eq!(output, [0.5, 0.25]);
    }

    #[test]
    fn switching_glides() {
        let state = shared(ChannelRoutingMode::Ch1);
        let mut router = ChannelRouter::new(&state, 48000.0);
        state.targets.ch1_gain.set(0.0);
        state.targets.ch2_gain.set(1.0);

        let input = vec![1.0; 256];
        let mut output = vec![0.0; 128];
        router.process(&state, &input, &mut output);
        let (g1, g2) = router.gains();
        assert!(g1 > 0.0 && g1 < 1.0);
        assert!(g2 > 0.0 && g2 < 1.0);
        assert!(output.iter().all(|s| (0.0..=1.0 + 1e-6).contains(s)));

        for _ in 0..200 {
            router.process(&state, &input, &mut output);
        }
        assert_eq!(router.gains(), (0.0, 1.0));
    }
}
