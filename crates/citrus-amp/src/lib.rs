//! Citrus Amp - real-time guitar amplifier signal chain
//!
//! Models an amplifier's analog path as a fixed chain of processing stages:
//!
//! ```text
//! input L/R → router → pad → compressor ─┬→ preamp/drive → tone stack → master → cabinet → out
//!                                         └→ compressor meter                         └→ output meter
//! ```
//!
//! # Layers
//!
//! - [`mapper`] - Pure functions from 0–10 dial values to engine units
//! - [`DistortionCurve`] and [`CabinetImpulseResponse`] - The two synthesized artifacts
//! - [`Stage`] implementations - [`GainStage`], [`DynamicsStage`], [`DriveStage`],
//!   [`ToneStack`], [`CabinetStage`], fronted by the [`ChannelRouter`]
//! - [`SignalChain`] - The audio path; allocation-free once built
//! - [`AmpEngine`] - The controller: lifecycle, controls, devices, meters, events
//!
//! # Threading
//!
//! The control thread writes *targets* into lock-free cells
//! ([`ControlTargets`]) and publishes whole curves through an atomic pointer
//! swap ([`SharedState::curve`]). The audio thread loads each target once per
//! block and glides toward it with exponential smoothing, so no control
//! change is ever heard as a step.
//!
//! # Example
//!
//! ```rust,no_run
//! use citrus_amp::{AmpEngine, ChannelRoutingMode};
//! use citrus_config::EngineConfig;
//! use citrus_io::CpalBackend;
//!
//! let mut amp = AmpEngine::new(EngineConfig::default(), Box::new(CpalBackend::new()))?;
//! amp.activate()?;
//! amp.set_volume(4.0);
//! amp.set_drive(7.5);
//! amp.set_input_channel(ChannelRoutingMode::Mix);
//! let levels = amp.poll_meters();
//! println!("output {:.2}", levels.output);
//! # Ok::<(), citrus_amp::AmpError>(())
//! ```

pub mod cabinet;
pub mod chain;
pub mod controls;
pub mod curve;
pub mod drive;
pub mod dynamics;
pub mod engine;
mod error;
pub mod gain;
pub mod impulse;
pub mod mapper;
pub mod output;
pub mod processor;
pub mod router;
pub mod stage;
pub mod tone;

pub use cabinet::{CABINET_MAKEUP, CabinetStage, PartitionedConvolver};
pub use chain::{ChainSettings, SignalChain};
pub use controls::{ControlSnapshot, ControlTargets, ControlValues, SharedState};
pub use curve::{CURVE_SAMPLES, DistortionCurve};
pub use drive::DriveStage;
pub use dynamics::DynamicsStage;
pub use engine::{AmpEngine, EngineEvent};
pub use error::{AmpError, SynthesisError};
pub use gain::GainStage;
pub use impulse::CabinetImpulseResponse;
pub use output::{METER_WINDOW, MeterReading, MeterTap, meter_display_percent};
pub use processor::AudioProcessor;
pub use router::{ChannelRouter, ChannelRoutingMode};
pub use stage::{SIGNAL_PATH, Stage, StageKind};
pub use tone::{Band, ToneStack};
