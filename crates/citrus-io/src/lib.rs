//! Audio I/O layer for the citrus amp engine.
//!
//! This crate provides:
//!
//! - **Device access**: the [`AudioBackend`] trait and its cpal implementation
//!   [`CpalBackend`], with device enumeration as (id, label) pairs
//! - **WAV file I/O**: [`read_wav_stereo`] and [`write_wav`] for offline rendering
//!
//! The amp engine only ever talks to `dyn AudioBackend`, so tests can drive it
//! with a scripted in-memory backend and no hardware.

pub mod backend;
pub mod cpal_backend;
mod device;
mod wav;

pub use backend::{
    AudioBackend, ErrorCallback, InputCallback, OutputCallback, StreamConfig, StreamHandle,
};
pub use cpal_backend::CpalBackend;
pub use device::{AudioDevice, DeviceKind};
pub use wav::{WavSpec, read_wav_stereo, write_wav};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested sample format is not supported.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
