//! Pluggable audio backend abstraction.
//!
//! [`AudioBackend`] decouples the amp engine from any specific platform audio
//! API. [`CpalBackend`](crate::CpalBackend) is the desktop implementation;
//! tests substitute a scripted backend that pumps buffers by hand.
//!
//! ## Design
//!
//! Callbacks are boxed closures rather than generic parameters, which keeps the
//! trait object-safe (`Box<dyn AudioBackend>`). Streams come back as a
//! type-erased [`StreamHandle`] that stops the stream when dropped, so tearing
//! down a route is just dropping its handle.
//!
//! ## Channel layout
//!
//! Input callbacks always receive **2-channel interleaved** frames
//! (`[L0, R0, L1, R1, ...]`). A backend whose device captures a single
//! channel duplicates it; wider devices deliver their first two channels.
//! Output callbacks receive `channels`-wide interleaved buffers to fill.

use crate::{AudioDevice, Result};

/// Configuration for building an audio stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Requested sample rate in Hz.
    pub sample_rate: u32,
    /// Preferred buffer size in frames.
    pub buffer_size: u32,
    /// Number of output channels. Input streams are always delivered as stereo.
    pub channels: u16,
    /// Device id (uses the system default if `None`).
    pub device_id: Option<String>,
}

impl StreamConfig {
    /// Copy of this config targeting another device.
    pub fn with_device(&self, device_id: Option<&str>) -> Self {
        Self {
            device_id: device_id.map(str::to_owned),
            ..self.clone()
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 256,
            channels: 2,
            device_id: None,
        }
    }
}

/// Type-erased audio stream handle.
///
/// The stream is active while this handle exists; dropping it stops
/// playback or capture.
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Wrap a backend-specific stream object, kept alive until drop.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// Output callback: fill an interleaved buffer of `frames * channels` samples.
///
/// Runs on the real-time audio thread. Implementations must not allocate,
/// lock, or perform I/O.
pub type OutputCallback = Box<dyn FnMut(&mut [f32]) + Send>;

/// Input callback: receives captured stereo-interleaved samples.
pub type InputCallback = Box<dyn FnMut(&[f32]) + Send>;

/// Error callback: receives a human-readable message from the backend's
/// error thread.
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Device enumeration and stream construction.
pub trait AudioBackend: Send {
    /// Human-readable name of this backend (e.g. "cpal", "scripted").
    fn name(&self) -> &str;

    /// List all input and output devices.
    fn list_devices(&self) -> Result<Vec<AudioDevice>>;

    /// Build a capture stream on `config.device_id` (or the default input).
    ///
    /// Capture is raw: no echo cancellation, noise suppression or automatic
    /// gain is applied.
    fn build_input_stream(
        &self,
        config: &StreamConfig,
        callback: InputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// Build a playback stream on `config.device_id` (or the default output).
    fn build_output_stream(
        &self,
        config: &StreamConfig,
        callback: OutputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// Whether playback can be routed to a chosen device. When `false`,
    /// `device_id` is ignored for output streams and the default sink is used.
    fn supports_output_selection(&self) -> bool {
        true
    }

    /// The sample rate the backend will actually run `config` at.
    ///
    /// Default implementation returns the requested rate unchanged.
    fn actual_sample_rate(&self, config: &StreamConfig) -> u32 {
        config.sample_rate
    }
}
