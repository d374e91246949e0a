//! The fixed amp signal path.
//!
//! A [`SignalChain`] is built once per engine start from the declarative
//! [`SIGNAL_PATH`] and never rewired. It owns every per-stage state and two
//! meter taps; the only things it shares with the control thread are the
//! atomic targets and the published curve in [`SharedState`].
//!
//! # Real-time contract
//!
//! [`SignalChain::process_block`] does not allocate, lock or log. Scratch
//! buffers are sized from [`ChainSettings::max_block_frames`]; longer
//! callbacks are processed in chunks of that size.

use crate::cabinet::CabinetStage;
use crate::controls::SharedState;
use crate::drive::DriveStage;
use crate::dynamics::DynamicsStage;
use crate::gain::GainStage;
use crate::impulse::CabinetImpulseResponse;
use crate::output::{MeterReading, MeterTap};
use crate::router::ChannelRouter;
use crate::stage::{SIGNAL_PATH, Stage, StageKind};
use crate::tone::ToneStack;
use citrus_config::EngineConfig;
use std::sync::Arc;

/// Sizing for a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainSettings {
    /// Largest block processed in one pass.
    pub max_block_frames: usize,
    /// Cabinet convolution partition length.
    pub partition: usize,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for ChainSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_block_frames: config.max_block_frames.max(1),
            partition: config.convolution_partition,
        }
    }
}

/// Router plus the six stages, with metering.
pub struct SignalChain {
    shared: Arc<SharedState>,
    sample_rate: f32,
    router: ChannelRouter,
    stages: Vec<Box<dyn Stage>>,
    compressor_meter: MeterTap,
    output_meter: MeterTap,
    scratch: Vec<f32>,
    partitions: usize,
}

impl SignalChain {
    /// Build the chain at `sample_rate` around a synthesized cabinet response.
    ///
    /// Every smoothed value starts at its current target.
    pub fn new(
        shared: Arc<SharedState>,
        sample_rate: f32,
        impulse: &CabinetImpulseResponse,
        settings: ChainSettings,
    ) -> Self {
        let mut partitions = 0;
        let mut stages: Vec<Box<dyn Stage>> = Vec::with_capacity(SIGNAL_PATH.len());
        for kind in SIGNAL_PATH {
            let stage: Box<dyn Stage> = match kind {
                StageKind::Pad => Box::new(GainStage::pad(&shared, sample_rate)),
                StageKind::Dynamics => Box::new(DynamicsStage::new(&shared, sample_rate)),
                StageKind::Drive => Box::new(DriveStage::new(&shared, sample_rate)),
                StageKind::ToneStack => Box::new(ToneStack::new(&shared, sample_rate)),
                StageKind::Master => Box::new(GainStage::master(&shared, sample_rate)),
                StageKind::Cabinet => {
                    let cabinet = CabinetStage::new(impulse, settings.partition);
                    partitions = cabinet.partitions();
                    Box::new(cabinet)
                }
            };
            stages.push(stage);
        }

        tracing::info!(
            sample_rate,
            ir_len = impulse.len(),
            partition = settings.partition,
            partitions,
            "signal chain built"
        );

        Self {
            router: ChannelRouter::new(&shared, sample_rate),
            shared,
            sample_rate,
            stages,
            compressor_meter: MeterTap::new(),
            output_meter: MeterTap::new(),
            scratch: vec![0.0; settings.max_block_frames.max(1)],
            partitions,
        }
    }

    /// Process stereo-interleaved `input` into mono `output`.
    ///
    /// `input` must hold two samples per output frame; missing input reads
    /// as silence.
    pub fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        let max = self.scratch.len();
        let mut start = 0;
        while start < output.len() {
            let frames = (output.len() - start).min(max);
            let block = &mut self.scratch[..frames];

            let in_start = (start * 2).min(input.len());
            let in_end = ((start + frames) * 2).min(input.len());
            let stereo = &input[in_start..in_end];
            if stereo.len() == frames * 2 {
                self.router.process(&self.shared, stereo, block);
            } else {
                block.fill(0.0);
                let frames_in = stereo.len() / 2;
                self.router.process(
                    &self.shared,
                    &stereo[..frames_in * 2],
                    &mut block[..frames_in],
                );
            }

            for stage in &mut self.stages {
                stage.process(&self.shared, block);
                match stage.kind() {
                    StageKind::Dynamics => self.compressor_meter.observe(block),
                    StageKind::Cabinet => self.output_meter.observe(block),
                    _ => {}
                }
            }

            output[start..start + frames].copy_from_slice(block);
            start += frames;
        }
    }

    /// Current meter levels.
    pub fn meters(&self) -> MeterReading {
        MeterReading {
            output: self.output_meter.level(),
            compressor: self.compressor_meter.level(),
        }
    }

    /// Total delay through the chain in samples.
    pub fn latency_samples(&self) -> usize {
        self.stages.iter().map(|s| s.latency_samples()).sum()
    }

    /// Clear all signal history. Smoothed values jump to their targets.
    pub fn reset(&mut self) {
        self.router = ChannelRouter::new(&self.shared, self.sample_rate);
        for stage in &mut self.stages {
            stage.reset(&self.shared);
        }
        self.compressor_meter.reset();
        self.output_meter.reset();
    }

    /// Stage names in processing order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.kind().name()).collect()
    }

    /// Sample rate the chain was built for.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Cabinet convolution partitions.
    pub fn partitions(&self) -> usize {
        self.partitions
    }

    /// State shared with the control thread.
    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }
}
