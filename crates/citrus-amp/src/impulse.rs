//! Synthetic loudspeaker-cabinet impulse response.
//!
//! Rendered once per engine start by pushing a short click through a fixed
//! filter chain that sketches a closed-back bass-heavy cabinet:
//!
//! | Stage | Filter | Models |
//! |-------|--------|--------|
//! | 1 | highpass 55 Hz, 1.5 dB resonance | speaker free-air resonance |
//! | 2 | peaking 110 Hz, +4 dB, Q 1.0 | box resonance |
//! | 3 | peaking 450 Hz, −4 dB, Q 0.8 | multi-speaker mid scoop |
//! | 4 | lowpass 4 kHz, 0.5 dB resonance | cone rolloff |
//! | 5 | high shelf 8 kHz, −20 dB | removes air the cabinet cannot reproduce |

use crate::error::SynthesisError;
use citrus_core::{Biquad, FilterShape};

/// Length of the rendered response in seconds.
pub const IMPULSE_SECONDS: f32 = 0.2;

/// Lowest sample rate the synthesizers accept.
pub const MIN_SAMPLE_RATE: f32 = 8000.0;

/// Highest sample rate the synthesizers accept.
pub const MAX_SAMPLE_RATE: f32 = 384_000.0;

/// The cabinet filter chain, in render order.
pub const CABINET_FILTERS: [FilterShape; 5] = [
    FilterShape::Highpass {
        frequency: 55.0,
        resonance_db: 1.5,
    },
    FilterShape::Peaking {
        frequency: 110.0,
        q: 1.0,
        gain_db: 4.0,
    },
    FilterShape::Peaking {
        frequency: 450.0,
        q: 0.8,
        gain_db: -4.0,
    },
    FilterShape::Lowpass {
        frequency: 4000.0,
        resonance_db: 0.5,
    },
    FilterShape::HighShelf {
        frequency: 8000.0,
        gain_db: -20.0,
    },
];

/// Level calibration for equal-power normalization (-58 dB at 44.1 kHz).
const NORMALIZATION_CALIBRATION: f32 = 0.001_258_925_4;
const NORMALIZATION_REFERENCE_RATE: f32 = 44100.0;
const NORMALIZATION_MIN_POWER: f32 = 0.000_125;

/// Rendered cabinet response. Constant for the lifetime of an engine.
#[derive(Debug, Clone, PartialEq)]
pub struct CabinetImpulseResponse {
    samples: Box<[f32]>,
    sample_rate: f32,
}

impl CabinetImpulseResponse {
    /// Render the response at `sample_rate`.
    ///
    /// The excitation is `[1.0, 0.5, 0, 0, ...]` over 200 ms.
    pub fn synthesize(sample_rate: f32) -> Result<Self, SynthesisError> {
        if !sample_rate.is_finite() || !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate)
        {
            return Err(SynthesisError::InvalidSampleRate(sample_rate));
        }

        let len = (IMPULSE_SECONDS * sample_rate).round() as usize;
        let mut samples = vec![0.0f32; len];
        samples[0] = 1.0;
        samples[1] = 0.5;

        for shape in CABINET_FILTERS {
            Biquad::with_shape(shape, sample_rate).process_block(&mut samples);
        }

        if samples.iter().any(|s| !s.is_finite()) {
            return Err(SynthesisError::NonFiniteOutput {
                stage: "cabinet impulse",
            });
        }

        tracing::debug!(sample_rate, len, "cabinet impulse synthesized");
        Ok(Self {
            samples: samples.into_boxed_slice(),
            sample_rate,
        })
    }

    /// Rendered samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a synthesized response.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample rate the response was rendered at.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Equal-power normalization gain applied by the convolver.
    ///
    /// Scales the response so its RMS power lands on a fixed calibration
    /// level, independent of how much the filter chain attenuated it.
    pub fn normalization_scale(&self) -> f32 {
        let energy: f32 = self.samples.iter().map(|s| s * s).sum();
        let mut power = (energy / self.samples.len() as f32).sqrt();
        if !power.is_finite() || power < NORMALIZATION_MIN_POWER {
            power = NORMALIZATION_MIN_POWER;
        }
        NORMALIZATION_CALIBRATION * (NORMALIZATION_REFERENCE_RATE / self.sample_rate) / power
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_is_200ms() {
        let ir = CabinetImpulseResponse::synthesize(48000.0).unwrap();
        assert_eq!(ir.len(), 9600);
        let ir = CabinetImpulseResponse::synthesize(44100.0).unwrap();
        assert_eq!(ir.len(), 8820);
        assert_eq!(ir.sample_rate(), 44100.0);
    }

    #[test]
    fn response_has_no_dc() {
        let ir = CabinetImpulseResponse::synthesize(48000.0).unwrap();
        let dc: f32 = ir.samples().iter().sum();
        assert!(dc.abs() < 0.05, "DC sum {dc}");
    }

    #[test]
    fn response_decays() {
        let ir = CabinetImpulseResponse::synthesize(48000.0).unwrap();
        let head = ir.samples()[..480].iter().map(|s| s.abs()).fold(0.0, f32::max);
        let tail = ir.samples()[9000..].iter().map(|s| s.abs()).fold(0.0, f32::max);
        assert!(head > 0.1);
        assert!(tail < head * 1e-2, "tail {tail} head {head}");
    }

    /// Magnitude of a complex polynomial `c0 + c1 z^-1 + c2 z^-2` on the unit circle.
    fn poly_gain(c: [f32; 3], w: f64) -> f64 {
        let re = c[0] as f64 + c[1] as f64 * w.cos() + c[2] as f64 * (2.0 * w).cos();
        let im = c[1] as f64 * w.sin() + c[2] as f64 * (2.0 * w).sin();
        re.hypot(im)
    }

    fn shape_gain(shape: FilterShape, frequency: f64, sample_rate: f32) -> f64 {
        let (b0, b1, b2, a0, a1, a2) = shape.coefficients(sample_rate);
        let w = 2.0 * std::f64::consts::PI * frequency / sample_rate as f64;
        poly_gain([b0, b1, b2], w) / poly_gain([a0, a1, a2], w)
    }

    fn response_gain(samples: &[f32], frequency: f64, sample_rate: f32) -> f64 {
        let w = 2.0 * std::f64::consts::PI * frequency / sample_rate as f64;
        let (re, im) = samples
            .iter()
            .enumerate()
            .fold((0.0f64, 0.0f64), |(re, im), (n, &s)| {
                let phase = w * n as f64;
                (re + s as f64 * phase.cos(), im - s as f64 * phase.sin())
            });
        re.hypot(im)
    }

    #[test]
    fn corner_gains_follow_resonance() {
        let sr = 48000.0;
        let ir = CabinetImpulseResponse::synthesize(sr).unwrap();
        // (stage index, corner, expected gain of that stage at its corner)
        for (index, frequency, expected) in [(0usize, 55.0, 1.1885), (3, 4000.0, 1.0593)] {
            let others: f64 = CABINET_FILTERS
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, &shape)| shape_gain(shape, frequency, sr))
                .product();
            let click = poly_gain([1.0, 0.5, 0.0], 2.0 * std::f64::consts::PI * frequency / 48000.0);
            let corner = response_gain(ir.samples(), frequency, sr) / (others * click);
            assert!(
                (corner - expected).abs() < 0.02,
                "{frequency} Hz corner gain {corner}, expected {expected}"
            );
        }
    }

    #[test]
    fn lowpass_corner_is_not_overdamped() {
        let sr = 48000.0;
        let gain = shape_gain(CABINET_FILTERS[3], 4000.0, sr);
        assert!(gain > 1.0, "4 kHz cone rolloff gain {gain}");
        let tighten = shape_gain(crate::drive::TIGHTEN_FILTER, 80.0, sr);
        assert!((tighten - 1.0839).abs() < 0.01, "tighten corner gain {tighten}");
    }

    #[test]
    fn rejects_unusable_rates() {
        for sr in [0.0, -48000.0, f32::NAN, f32::INFINITY, 1000.0] {
            assert!(matches!(
                CabinetImpulseResponse::synthesize(sr),
                Err(SynthesisError::InvalidSampleRate(_))
            ));
        }
    }

    #[test]
    fn normalization_is_finite_and_attenuating() {
        let ir = CabinetImpulseResponse::synthesize(48000.0).unwrap();
        let scale = ir.normalization_scale();
        assert!(scale.is_finite() && scale > 0.0 && scale < 1.0, "scale {scale}");
    }
}
