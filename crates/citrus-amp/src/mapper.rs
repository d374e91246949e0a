//! Control value mapping.
//!
//! Front-panel controls are normalized numbers on a 0–10 dial (or switches).
//! These pure functions turn them into the units the stages run on. Every
//! function clamps its input to the dial range first; out-of-range values are
//! never rejected.

/// Lowest dial position.
pub const CONTROL_MIN: f32 = 0.0;
/// Highest dial position.
pub const CONTROL_MAX: f32 = 10.0;
/// Dial position at which a tone band is flat.
pub const TONE_FLAT: f32 = 5.0;

/// Linear gain of the input pad when the source is active-level.
pub const ACTIVE_PAD_GAIN: f32 = 0.25;

/// Clamp a dial value into `[0, 10]`. NaN reads as the bottom of the dial.
#[inline]
pub fn clamp_control(value: f32) -> f32 {
    if value.is_nan() {
        CONTROL_MIN
    } else {
        value.clamp(CONTROL_MIN, CONTROL_MAX)
    }
}

/// Preamp gain: `1 + v`, in `[1, 11]`.
#[inline]
pub fn preamp_gain(gain: f32) -> f32 {
    1.0 + clamp_control(gain)
}

/// Tone band gain in dB: `(v - 5) * 4`, in `[-20, 20]`.
#[inline]
pub fn tone_gain_db(value: f32) -> f32 {
    (clamp_control(value) - TONE_FLAT) * 4.0
}

/// Master volume: `v / 10`, in `[0, 1]`.
#[inline]
pub fn master_gain(volume: f32) -> f32 {
    clamp_control(volume) / 10.0
}

/// Input pad: unity for passive pickups, `0.25` for active (hot) sources.
#[inline]
pub fn pad_gain(passive: bool) -> f32 {
    if passive { 1.0 } else { ACTIVE_PAD_GAIN }
}

/// Distortion curve shape factor: `k = 20 + v^2.5 * 5`.
///
/// ```
/// use citrus_amp::mapper::drive_shape;
///
/// assert_eq!(drive_shape(0.0), 20.0);
/// assert!((drive_shape(10.0) - 1601.14).abs() < 0.01);
/// ```
#[inline]
pub fn drive_shape(drive: f32) -> f32 {
    20.0 + clamp_control(drive).powf(2.5) * 5.0
}

/// Compressor threshold: `-10 - 3a` dB, in `[-40, -10]`.
#[inline]
pub fn compressor_threshold_db(amount: f32) -> f32 {
    -10.0 - clamp_control(amount) * 3.0
}

/// Compressor makeup gain: `1 + 0.2a`, in `[1, 3]`.
#[inline]
pub fn compressor_makeup(amount: f32) -> f32 {
    1.0 + clamp_control(amount) * 0.2
}

/// Wet and dry gains of a parallel path. `wet + dry == 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendGains {
    /// Processed path gain.
    pub wet: f32,
    /// Unprocessed path gain.
    pub dry: f32,
}

/// Compressor blend: `wet = b / 10`, `dry = 1 - wet`.
#[inline]
pub fn compressor_blend(blend: f32) -> BlendGains {
    let wet = clamp_control(blend) / 10.0;
    BlendGains {
        wet,
        dry: 1.0 - wet,
    }
}

/// Blend targets taking the compressor switch into account: switched off,
/// the whole signal takes the dry path.
#[inline]
pub fn compressor_mix(enabled: bool, blend: f32) -> BlendGains {
    if enabled {
        compressor_blend(blend)
    } else {
        BlendGains { wet: 0.0, dry: 1.0 }
    }
}
