//! The amp engine controller.
//!
//! [`AmpEngine`] is the control-thread side of the amp. It owns the front
//! panel values, the device streams and the published [`SharedState`]; the
//! audio thread owns the [`SignalChain`](crate::SignalChain) inside the output
//! stream's callback.
//!
//! # Lifecycle
//!
//! ```text
//!   new ──activate──▶ running ◀──toggle_standby──▶ suspended
//!    ▲                   │                              │
//!    └──────────── shutdown ◀───────────────────────────┘
//! ```
//!
//! Activation synthesizes the cabinet response at the device's actual rate,
//! opens the input (a failure leaves the amp running silently), builds the
//! chain inside a new output stream and refreshes the device lists. A second
//! activation is a no-op apart from resuming a suspended engine.
//!
//! # Device changes
//!
//! Changing the input builds the new capture stream first and only then drops
//! the old one, so a failed acquisition leaves the previous routing playing.
//! Changing the output rebuilds the chain at the new device's rate.

use crate::chain::{ChainSettings, SignalChain};
use crate::controls::{ControlSnapshot, ControlValues, SharedState};
use crate::curve::DistortionCurve;
use crate::error::{AmpError, device_label};
use crate::impulse::CabinetImpulseResponse;
use crate::mapper;
use crate::output::MeterReading;
use crate::processor::{
    AudioProcessor, INPUT_PREFILL_FRAMES, INPUT_QUEUE_FRAMES, METER_QUEUE, drain_input,
    input_forwarder, reset_input_queue,
};
use crate::router::ChannelRoutingMode;
use citrus_config::EngineConfig;
use citrus_io::{AudioBackend, AudioDevice, ErrorCallback, StreamConfig, StreamHandle};
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Capacity of each subscriber's event queue.
pub const EVENT_QUEUE: usize = 64;

/// Output channel count requested from the backend.
const OUTPUT_CHANNELS: u16 = 2;

/// State change notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The graph was built at this sample rate.
    Activated {
        /// Actual device sample rate.
        sample_rate: u32,
    },
    /// Block processing started or stopped.
    RunningChanged(bool),
    /// The graph was torn down.
    ShutDown,
    /// A front-panel value changed.
    ControlsChanged,
    /// A new input device is routed into the amp.
    InputDeviceChanged(Option<String>),
    /// Playback moved to another device.
    OutputDeviceChanged(Option<String>),
    /// Device lists were re-enumerated.
    DevicesRefreshed,
    /// A device could not be acquired.
    DeviceError(String),
    /// New meter levels.
    Meters(MeterReading),
}

struct Graph {
    sample_rate: u32,
    impulse: CabinetImpulseResponse,
    /// Playback stream; dropping it stops the audio thread.
    _output: StreamHandle,
    input: Option<StreamHandle>,
}

/// Engine controller. One instance per amp; any number may coexist.
pub struct AmpEngine {
    config: EngineConfig,
    backend: Box<dyn AudioBackend>,
    values: ControlValues,
    shared: Arc<SharedState>,
    retired_curves: Vec<Arc<DistortionCurve>>,
    graph: Option<Graph>,
    running: Arc<AtomicBool>,
    stream_errors: Arc<AtomicU32>,
    input_tx: Sender<[f32; 2]>,
    input_rx: Receiver<[f32; 2]>,
    meter_tx: Sender<MeterReading>,
    meter_rx: Receiver<MeterReading>,
    levels: MeterReading,
    current_input_id: Option<String>,
    current_output_id: Option<String>,
    inputs: Vec<AudioDevice>,
    outputs: Vec<AudioDevice>,
    subscribers: Vec<Sender<EngineEvent>>,
}

impl AmpEngine {
    /// Create an idle engine. Nothing is opened until [`activate`](Self::activate).
    pub fn new(config: EngineConfig, backend: Box<dyn AudioBackend>) -> Result<Self, AmpError> {
        config.validate()?;
        let values = ControlValues::default();
        let shared = Arc::new(SharedState::new(&values));
        let (input_tx, input_rx) = bounded(INPUT_QUEUE_FRAMES);
        let (meter_tx, meter_rx) = bounded(METER_QUEUE);

        tracing::debug!(backend = backend.name(), "amp engine created");
        Ok(Self {
            current_input_id: config.input_device.clone(),
            current_output_id: config.output_device.clone(),
            config,
            backend,
            values,
            shared,
            retired_curves: Vec::new(),
            graph: None,
            running: Arc::new(AtomicBool::new(false)),
            stream_errors: Arc::new(AtomicU32::new(0)),
            input_tx,
            input_rx,
            meter_tx,
            meter_rx,
            levels: MeterReading::SILENT,
            inputs: Vec::new(),
            outputs: Vec::new(),
            subscribers: Vec::new(),
        })
    }

    // --- lifecycle ---

    /// Build the graph and start processing.
    ///
    /// On an active engine this only resumes a suspended one; nothing is
    /// rebuilt and no parameter moves.
    pub fn activate(&mut self) -> Result<(), AmpError> {
        if self.graph.is_some() {
            self.set_running(true);
            return Ok(());
        }

        let output_id = self.routable_output_id();
        let sample_rate = self.backend.actual_sample_rate(
            &self.stream_config(self.config.sample_rate, output_id.as_deref()),
        );
        let impulse = CabinetImpulseResponse::synthesize(sample_rate as f32)?;

        reset_input_queue(&self.input_tx, &self.input_rx, INPUT_PREFILL_FRAMES);
        let input_id = self.current_input_id.clone();
        let input = match self.open_input(sample_rate, input_id.as_deref()) {
            Ok(handle) => Some(handle),
            Err(err) => {
                tracing::error!(error = %err, "input unavailable, amp will run silent");
                self.emit(EngineEvent::DeviceError(err.to_string()));
                None
            }
        };

        let output = self
            .open_output(sample_rate, &impulse, output_id.as_deref())
            .map_err(|source| AmpError::OutputStream {
                device: device_label(output_id.as_deref()),
                source,
            })?;

        self.graph = Some(Graph {
            sample_rate,
            impulse,
            _output: output,
            input,
        });
        self.set_running(true);
        self.emit(EngineEvent::Activated { sample_rate });

        if let Err(err) = self.refresh_devices() {
            tracing::warn!(error = %err, "device list unavailable");
        }
        tracing::info!(
            sample_rate,
            backend = self.backend.name(),
            input = %device_label(self.current_input_id.as_deref()),
            output = %device_label(output_id.as_deref()),
            "amp engine activated"
        );
        Ok(())
    }

    /// The power switch.
    ///
    /// Switching on an engine that was never activated activates it. Otherwise
    /// processing is resumed or suspended with every parameter kept.
    pub fn toggle_standby(&mut self, on: bool) -> Result<(), AmpError> {
        if self.graph.is_none() {
            return if on { self.activate() } else { Ok(()) };
        }
        self.set_running(on);
        Ok(())
    }

    /// Stop processing and release all streams.
    pub fn shutdown(&mut self) {
        if self.graph.is_none() {
            return;
        }
        self.set_running(false);
        self.graph = None;
        drain_input(&self.input_rx);
        self.collect_retired_curves();
        self.emit(EngineEvent::ShutDown);
        tracing::info!("amp engine shut down");
    }

    fn set_running(&mut self, running: bool) {
        let was = self.running.swap(running, Ordering::SeqCst);
        if !running {
            self.levels = MeterReading::SILENT;
        }
        if was != running {
            tracing::debug!(running, "processing state changed");
            self.emit(EngineEvent::RunningChanged(running));
        }
    }

    // --- controls ---

    /// Preamp gain dial, `[0, 10]`.
    pub fn set_gain(&mut self, value: f32) {
        self.values.gain = mapper::clamp_control(value);
        self.controls_changed();
    }

    /// Drive dial, `[0, 10]`. Rebuilds and publishes the distortion curve.
    pub fn set_drive(&mut self, value: f32) {
        self.values.drive = mapper::clamp_control(value);
        let k = mapper::drive_shape(self.values.drive);
        if k != self.shared.curve_k() {
            let previous = self.shared.publish_curve(DistortionCurve::new(k));
            self.retired_curves.push(previous);
            tracing::debug!(k, "distortion curve regenerated");
        }
        self.collect_retired_curves();
        self.controls_changed();
    }

    /// Bass dial, `[0, 10]`.
    pub fn set_bass(&mut self, value: f32) {
        self.values.bass = mapper::clamp_control(value);
        self.controls_changed();
    }

    /// Mid dial, `[0, 10]`.
    pub fn set_mid(&mut self, value: f32) {
        self.values.mid = mapper::clamp_control(value);
        self.controls_changed();
    }

    /// Treble dial, `[0, 10]`.
    pub fn set_treble(&mut self, value: f32) {
        self.values.treble = mapper::clamp_control(value);
        self.controls_changed();
    }

    /// Master volume dial, `[0, 10]`.
    pub fn set_volume(&mut self, value: f32) {
        self.values.volume = mapper::clamp_control(value);
        self.controls_changed();
    }

    /// Input pad: `true` for passive pickups (unity), `false` for active (-12 dB).
    pub fn set_pad(&mut self, passive: bool) {
        self.values.pad_passive = passive;
        self.controls_changed();
    }

    /// Compressor switch. Switching back on restores the last blend.
    pub fn toggle_compressor(&mut self, on: bool) {
        self.values.compressor_on = on;
        self.controls_changed();
    }

    /// Compressor amount dial, `[0, 10]`.
    pub fn set_compressor_amount(&mut self, value: f32) {
        self.values.compressor_amount = mapper::clamp_control(value);
        self.controls_changed();
    }

    /// Compressor blend dial, `[0, 10]`.
    pub fn set_compressor_blend(&mut self, value: f32) {
        self.values.compressor_blend = mapper::clamp_control(value);
        self.controls_changed();
    }

    /// Input channel selector.
    pub fn set_input_channel(&mut self, mode: ChannelRoutingMode) {
        self.values.input_channel = mode;
        self.controls_changed();
    }

    /// Set every control at once.
    pub fn apply_controls(&mut self, values: &ControlValues) {
        let values = values.clamped();
        let drive = values.drive;
        self.values = values;
        self.set_drive(drive);
    }

    fn controls_changed(&mut self) {
        self.shared.targets.apply(&self.values);
        self.emit(EngineEvent::ControlsChanged);
    }

    /// Drop replaced curves the audio thread no longer holds.
    fn collect_retired_curves(&mut self) {
        self.retired_curves.retain(|curve| Arc::strong_count(curve) > 1);
    }

    // --- devices ---

    /// Route a different capture device into the amp.
    ///
    /// Before activation the id is only remembered. On failure the previous
    /// input keeps playing and `current_input_id` is unchanged.
    pub fn change_input_device(&mut self, id: Option<&str>) -> Result<(), AmpError> {
        let Some(sample_rate) = self.sample_rate() else {
            self.current_input_id = id.map(str::to_owned);
            self.emit(EngineEvent::InputDeviceChanged(self.current_input_id.clone()));
            return Ok(());
        };

        match self.open_input(sample_rate, id) {
            Ok(handle) => {
                if let Some(graph) = self.graph.as_mut() {
                    // Old capture stream stops here.
                    graph.input = Some(handle);
                }
                self.current_input_id = id.map(str::to_owned);
                tracing::info!(device = %device_label(id), "input device acquired");
                self.emit(EngineEvent::InputDeviceChanged(self.current_input_id.clone()));
                Ok(())
            }
            Err(source) => {
                let device = device_label(id);
                tracing::error!(device = %device, error = %source, "input acquisition failed");
                self.emit(EngineEvent::DeviceError(format!("{device}: {source}")));
                Err(AmpError::InputAcquisition { device, source })
            }
        }
    }

    /// Move playback to another device.
    ///
    /// Backends that cannot route output keep the default sink and the call
    /// still succeeds.
    pub fn change_output_device(&mut self, id: Option<&str>) -> Result<(), AmpError> {
        if !self.backend.supports_output_selection() {
            tracing::warn!(
                backend = self.backend.name(),
                device = %device_label(id),
                "output selection unsupported, keeping default output"
            );
            return Ok(());
        }
        let Some(current_rate) = self.sample_rate() else {
            self.current_output_id = id.map(str::to_owned);
            self.emit(EngineEvent::OutputDeviceChanged(self.current_output_id.clone()));
            return Ok(());
        };

        let sample_rate = self
            .backend
            .actual_sample_rate(&self.stream_config(current_rate, id));
        let resynthesized = if sample_rate == current_rate {
            None
        } else {
            Some(CabinetImpulseResponse::synthesize(sample_rate as f32)?)
        };

        let built = match (&resynthesized, self.graph.as_ref()) {
            (Some(impulse), _) => self.open_output(sample_rate, impulse, id),
            (None, Some(graph)) => self.open_output(sample_rate, &graph.impulse, id),
            (None, None) => return Ok(()),
        };
        let output = built.map_err(|source| {
            let device = device_label(id);
            tracing::error!(device = %device, error = %source, "output stream failed");
            AmpError::OutputStream { device, source }
        })?;

        if let Some(graph) = self.graph.as_mut() {
            graph._output = output;
            if let Some(impulse) = resynthesized {
                graph.impulse = impulse;
                graph.sample_rate = sample_rate;
            }
        }
        self.current_output_id = id.map(str::to_owned);
        tracing::info!(device = %device_label(id), sample_rate, "output device changed");
        self.emit(EngineEvent::OutputDeviceChanged(self.current_output_id.clone()));

        if sample_rate != current_rate {
            self.reopen_input();
        }
        Ok(())
    }

    /// Re-enumerate devices.
    pub fn refresh_devices(&mut self) -> Result<(), AmpError> {
        let devices = self
            .backend
            .list_devices()
            .map_err(AmpError::DeviceEnumeration)?;
        let (inputs, outputs): (Vec<_>, Vec<_>) =
            devices.into_iter().partition(AudioDevice::is_input);
        tracing::debug!(
            inputs = inputs.len(),
            outputs = outputs.len(),
            "device lists refreshed"
        );
        self.inputs = inputs;
        self.outputs = outputs;
        self.emit(EngineEvent::DevicesRefreshed);
        Ok(())
    }

    fn reopen_input(&mut self) {
        let Some(sample_rate) = self.sample_rate() else {
            return;
        };
        if let Some(graph) = self.graph.as_mut() {
            graph.input = None;
        }
        reset_input_queue(&self.input_tx, &self.input_rx, INPUT_PREFILL_FRAMES);
        let id = self.current_input_id.clone();
        match self.open_input(sample_rate, id.as_deref()) {
            Ok(handle) => {
                if let Some(graph) = self.graph.as_mut() {
                    graph.input = Some(handle);
                }
            }
            Err(err) => {
                tracing::error!(
                    device = %device_label(id.as_deref()),
                    error = %err,
                    "input reopen failed"
                );
                self.emit(EngineEvent::DeviceError(err.to_string()));
            }
        }
    }

    fn routable_output_id(&self) -> Option<String> {
        if self.backend.supports_output_selection() {
            self.current_output_id.clone()
        } else {
            None
        }
    }

    fn stream_config(&self, sample_rate: u32, device_id: Option<&str>) -> StreamConfig {
        StreamConfig {
            sample_rate,
            buffer_size: self.config.buffer_size,
            channels: OUTPUT_CHANNELS,
            device_id: device_id.map(str::to_owned),
        }
    }

    fn open_input(&self, sample_rate: u32, id: Option<&str>) -> citrus_io::Result<StreamHandle> {
        let config = self.stream_config(sample_rate, id);
        let callback = input_forwarder(self.input_tx.clone(), Arc::clone(&self.running));
        self.backend
            .build_input_stream(&config, callback, self.error_callback("input"))
    }

    fn open_output(
        &self,
        sample_rate: u32,
        impulse: &CabinetImpulseResponse,
        id: Option<&str>,
    ) -> citrus_io::Result<StreamHandle> {
        let settings = ChainSettings::from(&self.config);
        let chain = SignalChain::new(
            Arc::clone(&self.shared),
            sample_rate as f32,
            impulse,
            settings,
        );
        let mut processor = AudioProcessor::new(
            chain,
            self.input_rx.clone(),
            Arc::clone(&self.running),
            (self.meter_tx.clone(), self.meter_rx.clone()),
            OUTPUT_CHANNELS as usize,
            settings.max_block_frames,
        );
        let config = self.stream_config(sample_rate, id);
        self.backend.build_output_stream(
            &config,
            Box::new(move |data: &mut [f32]| processor.process_buffer(data)),
            self.error_callback("output"),
        )
    }

    fn error_callback(&self, stream: &'static str) -> ErrorCallback {
        let errors = Arc::clone(&self.stream_errors);
        Box::new(move |message: &str| {
            errors.fetch_add(1, Ordering::Relaxed);
            tracing::error!(stream, message, "audio stream error");
        })
    }

    // --- observation ---

    /// Drain meter readings and return the latest levels.
    ///
    /// Reads zero while the engine is suspended. Call once per display frame.
    pub fn poll_meters(&mut self) -> MeterReading {
        let latest = self.meter_rx.try_iter().last();
        let levels = if self.is_running() {
            latest.unwrap_or(self.levels)
        } else {
            MeterReading::SILENT
        };
        if levels != self.levels {
            self.levels = levels;
            self.emit(EngineEvent::Meters(levels));
        }
        self.collect_retired_curves();
        self.levels
    }

    /// Receive [`EngineEvent`]s from now on.
    ///
    /// Events are dropped for a subscriber whose queue is full; dropping the
    /// receiver unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<EngineEvent> {
        let (tx, rx) = bounded(EVENT_QUEUE);
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: EngineEvent) {
        self.subscribers.retain(|tx| {
            !matches!(
                tx.try_send(event.clone()),
                Err(TrySendError::Disconnected(_))
            )
        });
    }

    /// Whether the graph has been built.
    pub fn is_initialized(&self) -> bool {
        self.graph.is_some()
    }

    /// Whether blocks are being processed.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Post-cabinet level from the last poll, `[0, 1]`.
    pub fn input_level(&self) -> f32 {
        self.levels.output
    }

    /// Post-compressor level from the last poll, `[0, 1]`.
    pub fn compressor_level(&self) -> f32 {
        self.levels.compressor
    }

    /// Compressor switch position.
    pub fn is_compressor_on(&self) -> bool {
        self.values.compressor_on
    }

    /// Routed input id, `None` for the system default.
    pub fn current_input_id(&self) -> Option<&str> {
        self.current_input_id.as_deref()
    }

    /// Playback device id, `None` for the system default.
    pub fn current_output_id(&self) -> Option<&str> {
        self.current_output_id.as_deref()
    }

    /// Input channel selector position.
    pub fn active_input_channel(&self) -> ChannelRoutingMode {
        self.values.input_channel
    }

    /// Capture devices from the last refresh.
    pub fn available_inputs(&self) -> &[AudioDevice] {
        &self.inputs
    }

    /// Playback devices from the last refresh.
    pub fn available_outputs(&self) -> &[AudioDevice] {
        &self.outputs
    }

    /// Front-panel values.
    pub fn controls(&self) -> &ControlValues {
        &self.values
    }

    /// The export snapshot.
    pub fn snapshot(&self) -> ControlSnapshot {
        self.values.snapshot()
    }

    /// Targets and curve shared with the audio thread.
    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    /// Actual device sample rate, once activated.
    pub fn sample_rate(&self) -> Option<u32> {
        self.graph.as_ref().map(|g| g.sample_rate)
    }

    /// Whether a capture stream is feeding the amp.
    pub fn has_input(&self) -> bool {
        self.graph.as_ref().is_some_and(|g| g.input.is_some())
    }

    /// Errors reported by the backend since creation.
    pub fn stream_errors(&self) -> u32 {
        self.stream_errors.load(Ordering::Relaxed)
    }

    /// The configuration the engine was created with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Drop for AmpEngine {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
