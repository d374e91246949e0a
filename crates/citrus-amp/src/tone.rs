//! Three-band tone stack: bass shelf, mid peak, treble shelf, in that order.

use crate::controls::{ControlTargets, SharedState};
use crate::stage::{Stage, StageKind};
use citrus_core::{AtomicParam, Biquad, FilterShape, SmoothedParam};

/// Time constant of tone gain changes, in seconds.
pub const TONE_TIME_CONSTANT: f32 = 0.1;
/// Bass low-shelf corner.
pub const BASS_FREQUENCY: f32 = 100.0;
/// Mid peak center.
pub const MID_FREQUENCY: f32 = 400.0;
/// Mid peak Q.
pub const MID_Q: f32 = 1.0;
/// Treble high-shelf corner.
pub const TREBLE_FREQUENCY: f32 = 2500.0;

/// One of the three bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    /// Low shelf at 100 Hz.
    Bass,
    /// Peak at 400 Hz.
    Mid,
    /// High shelf at 2.5 kHz.
    Treble,
}

impl Band {
    /// Filter shape at `gain_db`.
    pub fn shape(self, gain_db: f32) -> FilterShape {
        match self {
            Self::Bass => FilterShape::LowShelf {
                frequency: BASS_FREQUENCY,
                gain_db,
            },
            Self::Mid => FilterShape::Peaking {
                frequency: MID_FREQUENCY,
                q: MID_Q,
                gain_db,
            },
            Self::Treble => FilterShape::HighShelf {
                frequency: TREBLE_FREQUENCY,
                gain_db,
            },
        }
    }

    fn target(self, targets: &ControlTargets) -> &AtomicParam {
        match self {
            Self::Bass => &targets.bass_db,
            Self::Mid => &targets.mid_db,
            Self::Treble => &targets.treble_db,
        }
    }
}

struct BandFilter {
    band: Band,
    gain_db: SmoothedParam,
    designed_db: f32,
    filter: Biquad,
}

impl BandFilter {
    fn new(band: Band, initial_db: f32, sample_rate: f32) -> Self {
        Self {
            band,
            gain_db: SmoothedParam::with_time_constant(initial_db, sample_rate, TONE_TIME_CONSTANT),
            designed_db: initial_db,
            filter: Biquad::with_shape(band.shape(initial_db), sample_rate),
        }
    }

    fn process(&mut self, shared: &SharedState, sample_rate: f32, buffer: &mut [f32]) {
        self.gain_db.set_target(self.band.target(&shared.targets).get());
        let (_, gain_db) = self.gain_db.advance_block(buffer.len());
        // Redesign only when the gain moved; filter history is kept.
        if gain_db != self.designed_db {
            self.filter.set_shape(self.band.shape(gain_db), sample_rate);
            self.designed_db = gain_db;
        }
        self.filter.process_block(buffer);
    }

    fn reset(&mut self, shared: &SharedState, sample_rate: f32) {
        let gain_db = self.band.target(&shared.targets).get();
        self.gain_db.set_immediate(gain_db);
        self.designed_db = gain_db;
        self.filter.set_shape(self.band.shape(gain_db), sample_rate);
        self.filter.clear();
    }
}

/// Bass, mid and treble in series.
pub struct ToneStack {
    sample_rate: f32,
    bands: [BandFilter; 3],
}

impl ToneStack {
    /// Create the stack with filters designed at the current targets.
    pub fn new(shared: &SharedState, sample_rate: f32) -> Self {
        let t = &shared.targets;
        Self {
            sample_rate,
            bands: [
                BandFilter::new(Band::Bass, t.bass_db.get(), sample_rate),
                BandFilter::new(Band::Mid, t.mid_db.get(), sample_rate),
                BandFilter::new(Band::Treble, t.treble_db.get(), sample_rate),
            ],
        }
    }

    /// Current smoothed gain of `band` in dB.
    pub fn gain_db(&self, band: Band) -> f32 {
        self.bands
            .iter()
            .find(|b| b.band == band)
            .map_or(0.0, |b| b.gain_db.get())
    }
}

impl Stage for ToneStack {
    fn kind(&self) -> StageKind {
        StageKind::ToneStack
    }

    fn process(&mut self, shared: &SharedState, buffer: &mut [f32]) {
        for band in &mut self.bands {
            band.process(shared, self.sample_rate, buffer);
        }
    }

    fn reset(&mut self, shared: &SharedState) {
        for band in &mut self.bands {
            band.reset(shared, self.sample_rate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::ControlValues;
    use citrus_core::rms;

    fn sine(len: usize, freq: f32) -> Vec<f32> {
        (0..len)
            .map(|i| 0.5 * (std::f32::consts::TAU * freq * i as f32 / 48000.0).sin())
            .collect()
    }

    #[test]
    fn flat_at_center_settings() {
        let shared = SharedState::new(&ControlValues::default());
        let mut tone = ToneStack::new(&shared, 48000.0);
        for freq in [60.0, 400.0, 5000.0] {
            tone.reset(&shared);
            let input = sine(9600, freq);
            let mut buffer = input.clone();
            tone.process(&shared, &mut buffer);
            let ratio = rms(&buffer[4800..]) / rms(&input[4800..]);
            assert!((ratio - 1.0).abs() < 1e-3, "{freq} Hz ratio {ratio}");
        }
    }

    #[test]
    fn bass_boost_lifts_lows_only() {
        let shared = SharedState::new(&ControlValues {
            bass: 10.0,
            ..ControlValues::default()
        });
        let mut tone = ToneStack::new(&shared, 48000.0);

        let mut low = sine(9600, 40.0);
        tone.process(&shared, &mut low);
        tone.reset(&shared);
        let mut high = sine(9600, 8000.0);
        tone.process(&shared, &mut high);

        assert!(rms(&low[4800..]) > 0.5 * std::f32::consts::FRAC_1_SQRT_2 * 5.0);
        let high_ratio = rms(&high[4800..]) / (0.5 * std::f32::consts::FRAC_1_SQRT_2);
        assert!((high_ratio - 1.0).abs() < 0.05, "{high_ratio}");
    }

    #[test]
    fn gains_glide_toward_targets() {
        let shared = SharedState::new(&ControlValues::default());
        let mut tone = ToneStack::new(&shared, 48000.0);
        shared.targets.treble_db.set(-20.0);
        tone.process(&shared, &mut [0.0; 256]);
        let treble = tone.gain_db(Band::Treble);
        assert!(treble < 0.0 && treble > -20.0);
        assert_eq!(tone.gain_db(Band::Bass), 0.0);
    }
}
