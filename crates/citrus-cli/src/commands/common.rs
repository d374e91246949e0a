//! Shared CLI arguments used across multiple commands.

use citrus_amp::{ChannelRoutingMode, ControlValues};
use citrus_config::EngineConfig;
use clap::Args;
use std::path::PathBuf;

/// Front-panel dials, all on the 0-10 scale.
#[derive(Args, Debug, Clone)]
pub struct ControlArgs {
    /// Preamp gain
    #[arg(long, default_value_t = 1.0)]
    pub gain: f32,

    /// Drive (distortion amount)
    #[arg(long, default_value_t = 6.0)]
    pub drive: f32,

    /// Bass (5 is flat)
    #[arg(long, default_value_t = 5.0)]
    pub bass: f32,

    /// Mid (5 is flat)
    #[arg(long, default_value_t = 5.0)]
    pub mid: f32,

    /// Treble (5 is flat)
    #[arg(long, default_value_t = 5.0)]
    pub treble: f32,

    /// Master volume
    #[arg(long, default_value_t = 5.0)]
    pub volume: f32,

    /// Engage the -12 dB pad for active pickups
    #[arg(long)]
    pub active: bool,

    /// Switch the compressor on
    #[arg(long)]
    pub compressor: bool,

    /// Compressor amount
    #[arg(long, default_value_t = 5.0)]
    pub compressor_amount: f32,

    /// Compressor blend (0 dry, 10 fully compressed)
    #[arg(long, default_value_t = 10.0)]
    pub compressor_blend: f32,

    /// Input channel: ch1, ch2 or mix
    #[arg(long, default_value_t = ChannelRoutingMode::Ch1)]
    pub channel: ChannelRoutingMode,
}

impl ControlArgs {
    /// The dial positions, clamped into range.
    pub fn values(&self) -> ControlValues {
        ControlValues {
            gain: self.gain,
            drive: self.drive,
            bass: self.bass,
            mid: self.mid,
            treble: self.treble,
            volume: self.volume,
            pad_passive: !self.active,
            compressor_on: self.compressor,
            compressor_amount: self.compressor_amount,
            compressor_blend: self.compressor_blend,
            input_channel: self.channel,
        }
        .clamped()
    }
}

/// Engine configuration source and overrides.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Engine config file (TOML). Defaults to the user config file if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Requested sample rate
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Requested buffer size in frames
    #[arg(long)]
    pub buffer_size: Option<u32>,

    /// Cabinet convolution partition length
    #[arg(long)]
    pub partition: Option<usize>,
}

impl ConfigArgs {
    /// Load the config file and apply flag overrides.
    pub fn load(&self) -> anyhow::Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::load_or_default()?,
        };
        if let Some(rate) = self.sample_rate {
            config.sample_rate = rate;
        }
        if let Some(size) = self.buffer_size {
            config.buffer_size = size;
        }
        if let Some(partition) = self.partition {
            config.convolution_partition = partition;
        }
        config.validate()?;
        Ok(config)
    }
}
