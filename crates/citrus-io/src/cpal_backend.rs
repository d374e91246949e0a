//! cpal-based audio backend.
//!
//! [`CpalBackend`] wraps [cpal](https://crates.io/crates/cpal) for
//! cross-platform capture and playback (ALSA, CoreAudio, WASAPI).
//!
//! Devices are identified by their cpal name, which doubles as the label.
//!
//! ```rust,ignore
//! use citrus_io::{AudioBackend, CpalBackend, StreamConfig};
//!
//! let backend = CpalBackend::new();
//! let stream = backend.build_output_stream(
//!     &StreamConfig::default(),
//!     Box::new(|buffer: &mut [f32]| buffer.fill(0.0)),
//!     Box::new(|err| eprintln!("audio error: {err}")),
//! )?;
//! // Plays until `stream` is dropped.
//! ```

use crate::backend::{
    AudioBackend, ErrorCallback, InputCallback, OutputCallback, StreamConfig, StreamHandle,
};
use crate::{AudioDevice, DeviceKind, Error, Result};
use cpal::Host;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

/// Frames converted per pass when widening capture to stereo.
const CONVERT_FRAMES: usize = 512;

/// Device name via `description()` (cpal 0.17+).
fn device_name(device: &cpal::Device) -> Option<String> {
    device.description().ok().map(|d| d.name().to_string())
}

/// cpal-based audio backend holding the platform's default host.
pub struct CpalBackend {
    host: Host,
}

impl CpalBackend {
    /// Create a backend on the platform's default audio host.
    pub fn new() -> Self {
        let host = cpal::default_host();
        tracing::info!(host = host.id().name(), "cpal backend initialized");
        Self { host }
    }

    fn find_device(&self, kind: DeviceKind, id: Option<&str>) -> Result<cpal::Device> {
        let Some(id) = id else {
            let default = match kind {
                DeviceKind::Input => self.host.default_input_device(),
                DeviceKind::Output => self.host.default_output_device(),
            };
            return default.ok_or(Error::NoDevice);
        };

        let devices: Vec<cpal::Device> = match kind {
            DeviceKind::Input => self
                .host
                .input_devices()
                .map_err(|e| Error::Stream(e.to_string()))?
                .collect(),
            DeviceKind::Output => self
                .host
                .output_devices()
                .map_err(|e| Error::Stream(e.to_string()))?
                .collect(),
        };

        devices
            .into_iter()
            .find(|device| device_name(device).as_deref() == Some(id))
            .ok_or_else(|| Error::DeviceNotFound(id.to_string()))
    }

    fn push_devices(
        &self,
        kind: DeviceKind,
        devices: impl Iterator<Item = cpal::Device>,
        out: &mut Vec<AudioDevice>,
    ) {
        for device in devices {
            if let Some(name) = device_name(&device) {
                out.push(AudioDevice::new(name.clone(), name, kind));
            }
        }
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn list_devices(&self) -> Result<Vec<AudioDevice>> {
        let mut devices = Vec::new();
        let inputs = self
            .host
            .input_devices()
            .map_err(|e| Error::Stream(e.to_string()))?;
        self.push_devices(DeviceKind::Input, inputs, &mut devices);
        let outputs = self
            .host
            .output_devices()
            .map_err(|e| Error::Stream(e.to_string()))?;
        self.push_devices(DeviceKind::Output, outputs, &mut devices);
        Ok(devices)
    }

    fn build_input_stream(
        &self,
        config: &StreamConfig,
        mut callback: InputCallback,
        mut error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let device = self.find_device(DeviceKind::Input, config.device_id.as_deref())?;
        let device_channels = device
            .default_input_config()
            .map(|c| c.channels())
            .unwrap_or(2)
            .max(1);

        let stream_config = cpal::StreamConfig {
            channels: device_channels,
            sample_rate: config.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size),
        };

        let stream = if device_channels == 2 {
            device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| callback(data),
                move |err| error_callback(&err.to_string()),
                None,
            )
        } else {
            let channels = usize::from(device_channels);
            let mut stereo = [0.0f32; CONVERT_FRAMES * 2];
            device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    for chunk in data.chunks(CONVERT_FRAMES * channels) {
                        let written = fold_to_stereo(chunk, channels, &mut stereo);
                        callback(&stereo[..written]);
                    }
                },
                move |err| error_callback(&err.to_string()),
                None,
            )
        }
        .map_err(|e| Error::Stream(e.to_string()))?;

        stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(
            device = config.device_id.as_deref().unwrap_or("default"),
            channels = device_channels,
            sample_rate = config.sample_rate,
            "input stream started"
        );

        Ok(StreamHandle::new(stream))
    }

    fn build_output_stream(
        &self,
        config: &StreamConfig,
        mut callback: OutputCallback,
        mut error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let device = self.find_device(DeviceKind::Output, config.device_id.as_deref())?;

        let stream_config = cpal::StreamConfig {
            channels: config.channels,
            sample_rate: config.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size),
        };

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| callback(data),
                move |err| error_callback(&err.to_string()),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(
            device = config.device_id.as_deref().unwrap_or("default"),
            channels = config.channels,
            sample_rate = config.sample_rate,
            "output stream started"
        );

        Ok(StreamHandle::new(stream))
    }

    fn actual_sample_rate(&self, config: &StreamConfig) -> u32 {
        let Ok(device) = self.find_device(DeviceKind::Output, config.device_id.as_deref()) else {
            return config.sample_rate;
        };
        let supported = device.supported_output_configs().is_ok_and(|mut ranges| {
            ranges.any(|range| {
                range.min_sample_rate() <= config.sample_rate
                    && config.sample_rate <= range.max_sample_rate()
            })
        });
        if supported {
            config.sample_rate
        } else {
            device
                .default_output_config()
                .map(|c| c.sample_rate())
                .unwrap_or(config.sample_rate)
        }
    }
}

/// Convert `channels`-wide interleaved frames to stereo.
///
/// Mono is duplicated to both sides; wider layouts keep their first two
/// channels. Returns the number of samples written to `stereo`.
fn fold_to_stereo(data: &[f32], channels: usize, stereo: &mut [f32]) -> usize {
    let mut written = 0;
    for (frame, out) in data.chunks_exact(channels).zip(stereo.chunks_exact_mut(2)) {
        out[0] = frame[0];
        out[1] = if channels > 1 { frame[1] } else { frame[0] };
        written += 2;
    }
    written
}
