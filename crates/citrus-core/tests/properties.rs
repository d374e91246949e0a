//! Property tests for the DSP primitives.

use citrus_core::{AtomicParam, Biquad, FilterShape, Oversampler, SmoothedParam, rms};
use proptest::prelude::*;

fn any_shape() -> impl Strategy<Value = FilterShape> {
    let freq = 40.0f32..20000.0;
    let q = 0.3f32..2.0;
    let resonance = -10.0f32..6.0;
    let gain = -24.0f32..24.0;
    prop_oneof![
        (freq.clone(), resonance.clone()).prop_map(|(frequency, resonance_db)| {
            FilterShape::Lowpass {
                frequency,
                resonance_db,
            }
        }),
        (freq.clone(), resonance).prop_map(|(frequency, resonance_db)| FilterShape::Highpass {
            frequency,
            resonance_db
        }),
        (freq.clone(), q, gain.clone()).prop_map(|(frequency, q, gain_db)| FilterShape::Peaking {
            frequency,
            q,
            gain_db
        }),
        (freq.clone(), gain.clone())
            .prop_map(|(frequency, gain_db)| FilterShape::LowShelf { frequency, gain_db }),
        (freq, gain).prop_map(|(frequency, gain_db)| FilterShape::HighShelf { frequency, gain_db }),
    ]
}

proptest! {
    #[test]
    fn designs_are_stable(shape in any_shape(), sample_rate in prop::sample::select(vec![22050.0f32, 44100.0, 48000.0, 96000.0])) {
        let mut biquad = Biquad::with_shape(shape, sample_rate);
        let mut out = biquad.process(1.0);
        for _ in 0..(2 * sample_rate as usize) {
            out = biquad.process(0.0);
            prop_assert!(out.is_finite());
        }
        prop_assert!(out.abs() < 1e-3, "impulse tail did not decay: {}", out);
    }

    #[test]
    fn smoothing_moves_monotonically_toward_target(
        start in -10.0f32..10.0,
        target in -10.0f32..10.0,
        tau in 0.001f32..0.5,
        frames in 16usize..4096,
    ) {
        let mut param = SmoothedParam::with_time_constant(start, 48000.0, tau);
        param.set_target(target);
        let mut distance = (target - start).abs();
        for _ in 0..50 {
            let (_, end) = param.advance_block(frames);
            let next = (target - end).abs();
            prop_assert!(next <= distance + 1e-6);
            distance = next;
        }
    }

    #[test]
    fn atomic_param_always_in_range(value in prop::num::f32::ANY) {
        let param = AtomicParam::new(5.0, 0.0, 10.0);
        param.set(value);
        let v = param.get();
        prop_assert!((0.0..=10.0).contains(&v));
    }

    #[test]
    fn oversampled_identity_is_bounded(input in prop::collection::vec(-1.0f32..1.0, 1..512)) {
        let mut os = Oversampler::new();
        let mut buffer = input.clone();
        os.process_block(&mut buffer, |x| x);
        prop_assert!(rms(&buffer) <= rms(&input) * 1.5 + 1e-6);
    }
}
