//! Error types for the amp engine.
//!
//! Out-of-range control values are never errors: every setter clamps.
//! An output device that cannot be selected is not an error either; the
//! engine logs a warning and keeps the default output.

use thiserror::Error;

/// Failure to build one of the synthesized artifacts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthesisError {
    /// There is no usable processing context at this sample rate.
    #[error("cannot synthesize at sample rate {0} Hz")]
    InvalidSampleRate(f32),

    /// Rendering produced NaN or infinite samples.
    #[error("{stage} produced non-finite samples")]
    NonFiniteOutput {
        /// Which artifact failed.
        stage: &'static str,
    },
}

/// Errors surfaced to the control surface.
///
/// A failed operation leaves the engine in its previous, consistent state.
#[derive(Debug, Error)]
pub enum AmpError {
    /// Capture could not be opened on the requested device.
    #[error("failed to acquire input '{device}': {source}")]
    InputAcquisition {
        /// Requested device id, or `default`.
        device: String,
        /// Backend error.
        #[source]
        source: citrus_io::Error,
    },

    /// Playback could not be opened on the requested device.
    #[error("failed to open output '{device}': {source}")]
    OutputStream {
        /// Requested device id, or `default`.
        device: String,
        /// Backend error.
        #[source]
        source: citrus_io::Error,
    },

    /// Devices could not be listed.
    #[error("failed to enumerate audio devices: {0}")]
    DeviceEnumeration(#[source] citrus_io::Error),

    /// The curve or cabinet response could not be built. Fatal to activation only.
    #[error("synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    /// The engine configuration is unusable.
    #[error("invalid engine configuration: {0}")]
    Config(#[from] citrus_config::ConfigError),
}

/// Display name for an optional device id.
pub(crate) fn device_label(id: Option<&str>) -> String {
    id.unwrap_or("default").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn input_error_names_device_and_keeps_source() {
        let err = AmpError::InputAcquisition {
            device: device_label(Some("usb-1")),
            source: citrus_io::Error::DeviceNotFound("usb-1".into()),
        };
        assert!(err.to_string().contains("usb-1"));
        assert!(err.source().is_some());
    }

    #[test]
    fn synthesis_converts() {
        let err: AmpError = SynthesisError::InvalidSampleRate(0.0).into();
        assert!(matches!(err, AmpError::Synthesis(_)));
        assert_eq!(device_label(None), "default");
    }
}
