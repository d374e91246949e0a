//! Control values and the state shared with the audio path.
//!
//! Two layers:
//!
//! - [`ControlValues`] is what the front panel shows: dial positions and
//!   switches. Only the engine (control thread) touches it.
//! - [`ControlTargets`] holds the mapped, engine-native *targets* in atomic
//!   cells. The control thread stores into them; the audio path loads each
//!   one once per block and glides toward it.
//!
//! [`SharedState`] bundles the targets with the published distortion curve.

use crate::curve::DistortionCurve;
use crate::mapper;
use crate::router::ChannelRoutingMode;
use arc_swap::ArcSwap;
use citrus_core::AtomicParam;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Front-panel state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlValues {
    /// Preamp gain dial.
    pub gain: f32,
    /// Drive (curve shape) dial.
    pub drive: f32,
    /// Bass dial.
    pub bass: f32,
    /// Mid dial.
    pub mid: f32,
    /// Treble dial.
    pub treble: f32,
    /// Master volume dial.
    pub volume: f32,
    /// Input pad switch: `true` for passive pickups.
    pub pad_passive: bool,
    /// Compressor switch.
    pub compressor_on: bool,
    /// Compressor amount dial (threshold and makeup).
    pub compressor_amount: f32,
    /// Compressor blend dial.
    pub compressor_blend: f32,
    /// Input channel selector.
    pub input_channel: ChannelRoutingMode,
}

impl Default for ControlValues {
    fn default() -> Self {
        Self {
            gain: 1.0,
            drive: 6.0,
            bass: 5.0,
            mid: 5.0,
            treble: 5.0,
            volume: 0.0,
            pad_passive: true,
            compressor_on: false,
            compressor_amount: 5.0,
            compressor_blend: 10.0,
            input_channel: ChannelRoutingMode::Ch1,
        }
    }
}

impl ControlValues {
    /// Copy with every dial clamped to `[0, 10]`.
    pub fn clamped(&self) -> Self {
        Self {
            gain: mapper::clamp_control(self.gain),
            drive: mapper::clamp_control(self.drive),
            bass: mapper::clamp_control(self.bass),
            mid: mapper::clamp_control(self.mid),
            treble: mapper::clamp_control(self.treble),
            volume: mapper::clamp_control(self.volume),
            compressor_amount: mapper::clamp_control(self.compressor_amount),
            compressor_blend: mapper::clamp_control(self.compressor_blend),
            ..self.clone()
        }
    }

    /// The export snapshot of these values.
    pub fn snapshot(&self) -> ControlSnapshot {
        ControlSnapshot {
            gain: self.gain,
            drive: self.drive,
            bass: self.bass,
            mid: self.mid,
            treble: self.treble,
            compressor_blend: self.compressor_blend,
            compressor_amount: self.compressor_amount,
        }
    }
}

/// The control subset handed to external exporters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlSnapshot {
    /// Preamp gain dial.
    pub gain: f32,
    /// Drive dial.
    pub drive: f32,
    /// Bass dial.
    pub bass: f32,
    /// Mid dial.
    pub mid: f32,
    /// Treble dial.
    pub treble: f32,
    /// Compressor blend dial.
    pub compressor_blend: f32,
    /// Compressor amount dial.
    pub compressor_amount: f32,
}

/// Engine-native parameter targets.
#[derive(Debug)]
pub struct ControlTargets {
    /// Channel 1 router gain.
    pub ch1_gain: AtomicParam,
    /// Channel 2 router gain.
    pub ch2_gain: AtomicParam,
    /// Input pad gain.
    pub pad: AtomicParam,
    /// Compressor threshold in dB.
    pub threshold_db: AtomicParam,
    /// Compressor makeup gain.
    pub makeup: AtomicParam,
    /// Compressed path gain. The dry path takes `1 - wet`.
    pub wet: AtomicParam,
    /// Preamp gain ahead of the shaper.
    pub preamp: AtomicParam,
    /// Low shelf gain in dB.
    pub bass_db: AtomicParam,
    /// Mid peak gain in dB.
    pub mid_db: AtomicParam,
    /// High shelf gain in dB.
    pub treble_db: AtomicParam,
    /// Master gain.
    pub master: AtomicParam,
}

impl ControlTargets {
    /// Targets for `values`.
    pub fn new(values: &ControlValues) -> Self {
        let targets = Self {
            ch1_gain: AtomicParam::new(1.0, 0.0, 1.0),
            ch2_gain: AtomicParam::new(0.0, 0.0, 1.0),
            pad: AtomicParam::new(1.0, mapper::ACTIVE_PAD_GAIN, 1.0),
            threshold_db: AtomicParam::new(-25.0, -40.0, -10.0),
            makeup: AtomicParam::new(2.0, 1.0, 3.0),
            wet: AtomicParam::new(0.0, 0.0, 1.0),
            preamp: AtomicParam::new(2.0, 1.0, 11.0),
            bass_db: AtomicParam::new(0.0, -20.0, 20.0),
            mid_db: AtomicParam::new(0.0, -20.0, 20.0),
            treble_db: AtomicParam::new(0.0, -20.0, 20.0),
            master: AtomicParam::new(0.0, 0.0, 1.0),
        };
        targets.apply(values);
        targets
    }

    /// Wet and dry gains from a single load of the wet target.
    pub fn blend(&self) -> mapper::BlendGains {
        let wet = self.wet.get();
        mapper::BlendGains {
            wet,
            dry: 1.0 - wet,
        }
    }

    /// Map `values` and store every target.
    pub fn apply(&self, values: &ControlValues) {
        let (ch1, ch2) = values.input_channel.gains();
        self.ch1_gain.set(ch1);
        self.ch2_gain.set(ch2);
        self.pad.set(mapper::pad_gain(values.pad_passive));
        self.threshold_db
            .set(mapper::compressor_threshold_db(values.compressor_amount));
        self.makeup
            .set(mapper::compressor_makeup(values.compressor_amount));
        let mix = mapper::compressor_mix(values.compressor_on, values.compressor_blend);
        self.wet.set(mix.wet);
        self.preamp.set(mapper::preamp_gain(values.gain));
        self.bass_db.set(mapper::tone_gain_db(values.bass));
        self.mid_db.set(mapper::tone_gain_db(values.mid));
        self.treble_db.set(mapper::tone_gain_db(values.treble));
        self.master.set(mapper::master_gain(values.volume));
    }
}

/// Everything the audio path reads from the control thread.
#[derive(Debug)]
pub struct SharedState {
    /// Parameter targets.
    pub targets: ControlTargets,
    /// The published distortion curve. Replaced whole, never edited.
    pub curve: ArcSwap<DistortionCurve>,
}

impl SharedState {
    /// Build targets and the initial curve for `values`.
    ///
    /// The initial curve follows the drive dial (k ≈ 460.9 at the default
    /// drive of 6) rather than a fixed starting shape, so the first block
    /// already sounds like the displayed setting.
    pub fn new(values: &ControlValues) -> Self {
        let k = mapper::drive_shape(values.drive);
        tracing::debug!(k, "distortion curve built");
        Self {
            targets: ControlTargets::new(values),
            curve: ArcSwap::from_pointee(DistortionCurve::new(k)),
        }
    }

    /// Publish a new curve and return the one it replaced.
    pub fn publish_curve(&self, curve: DistortionCurve) -> Arc<DistortionCurve> {
        self.curve.swap(Arc::new(curve))
    }

    /// Shape factor of the currently published curve.
    pub fn curve_k(&self) -> f32 {
        self.curve.load().k()
    }
}
