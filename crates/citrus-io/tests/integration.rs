//! Integration tests for citrus-io through its public API.

use citrus_io::{
    AudioBackend, AudioDevice, DeviceKind, Error, InputCallback, OutputCallback, StreamConfig,
    StreamHandle, WavSpec, read_wav_stereo, write_wav,
};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Loopback backend: whatever is "captured" is handed straight to the output
/// callback the next time `pump` runs.
#[derive(Default)]
struct Loopback {
    input: Arc<Mutex<Option<InputCallback>>>,
    output: Arc<Mutex<Option<OutputCallback>>>,
}

impl Loopback {
    fn pump(&self, captured: &[f32], out: &mut [f32]) {
        if let Some(cb) = self.input.lock().unwrap().as_mut() {
            cb(captured);
        }
        if let Some(cb) = self.output.lock().unwrap().as_mut() {
            cb(out);
        }
    }
}

impl AudioBackend for Loopback {
    fn name(&self) -> &str {
        "loopback"
    }

    fn list_devices(&self) -> citrus_io::Result<Vec<AudioDevice>> {
        Ok(vec![
            AudioDevice::new("in-0", "Loop In", DeviceKind::Input),
            AudioDevice::new("out-0", "Loop Out", DeviceKind::Output),
        ])
    }

    fn build_input_stream(
        &self,
        config: &StreamConfig,
        callback: InputCallback,
        _error_callback: citrus_io::ErrorCallback,
    ) -> citrus_io::Result<StreamHandle> {
        match config.device_id.as_deref() {
            None | Some("in-0") => {
                *self.input.lock().unwrap() = Some(callback);
                Ok(StreamHandle::new(()))
            }
            Some(other) => Err(Error::DeviceNotFound(other.to_string())),
        }
    }

    fn build_output_stream(
        &self,
        _config: &StreamConfig,
        callback: OutputCallback,
        _error_callback: citrus_io::ErrorCallback,
    ) -> citrus_io::Result<StreamHandle> {
        *self.output.lock().unwrap() = Some(callback);
        Ok(StreamHandle::new(()))
    }
}

#[test]
fn boxed_backend_routes_input_to_output() {
    let backend = Loopback::default();
    let shared = Arc::new(Mutex::new(Vec::<f32>::new()));

    let sink = Arc::clone(&shared);
    let boxed: Box<dyn AudioBackend> = Box::new(backend);
    let _input = boxed
        .build_input_stream(
            &StreamConfig::default(),
            Box::new(move |data| sink.lock().unwrap().extend_from_slice(data)),
            Box::new(|_| {}),
        )
        .unwrap();

    let source = Arc::clone(&shared);
    let _output = boxed
        .build_output_stream(
            &StreamConfig::default(),
            Box::new(move |out| {
                let captured = source.lock().unwrap();
                for (o, i) in out.iter_mut().zip(captured.iter()) {
                    *o = *i;
                }
            }),
            Box::new(|_| {}),
        )
        .unwrap();

    assert_eq!(boxed.name(), "loopback");
    assert!(boxed.supports_output_selection());
    assert_eq!(boxed.actual_sample_rate(&StreamConfig::default()), 48000);
}

#[test]
fn loopback_pump_moves_samples() {
    let backend = Loopback::default();
    let captured = Arc::new(Mutex::new(Vec::<f32>::new()));
    let sink = Arc::clone(&captured);
    let _input = backend
        .build_input_stream(
            &StreamConfig::default(),
            Box::new(move |data| sink.lock().unwrap().extend_from_slice(data)),
            Box::new(|_| {}),
        )
        .unwrap();

    let mut out = [0.0; 4];
    backend.pump(&[0.5, -0.5, 0.25, -0.25], &mut out);
    assert_eq!(*captured.lock().unwrap(), vec![0.5, -0.5, 0.25, -0.25]);
}

#[test]
fn unknown_input_device_is_reported() {
    let backend = Loopback::default();
    let config = StreamConfig::default().with_device(Some("in-9"));
    let err = backend
        .build_input_stream(&config, Box::new(|_| {}), Box::new(|_| {}))
        .unwrap_err();
    assert!(matches!(err, Error::DeviceNotFound(ref id) if id == "in-9"));
    assert!(err.to_string().contains("in-9"));
}

#[test]
fn render_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("render.wav");
    let samples: Vec<f32> = (0..480).map(|i| (i as f32 * 0.05).sin() * 0.5).collect();

    write_wav(&path, &samples, WavSpec::default()).unwrap();
    let (stereo, spec) = read_wav_stereo(&path).unwrap();

    assert_eq!(spec, WavSpec::default());
    let left: Vec<f32> = stereo.chunks_exact(2).map(|f| f[0]).collect();
    assert_eq!(left, samples);
}
