//! Offline rendering through the amp signal path.

use super::common::ControlArgs;
use citrus_amp::{CabinetImpulseResponse, ChainSettings, SharedState, SignalChain};
use citrus_core::{linear_to_db, rms};
use citrus_io::{WavSpec, read_wav_stereo, write_wav};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct RenderArgs {
    /// Input WAV file (mono files feed both channels)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file (mono)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    #[command(flatten)]
    controls: ControlArgs,

    /// Processing block size
    #[arg(long, default_value = "1024")]
    block_size: usize,

    /// Cabinet convolution partition length
    #[arg(long, default_value = "128")]
    partition: usize,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,

    /// Do not append the cabinet tail
    #[arg(long)]
    no_tail: bool,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    if ![16, 24, 32].contains(&args.bit_depth) {
        anyhow::bail!("Unsupported bit depth {} (use 16, 24 or 32)", args.bit_depth);
    }
    if !args.partition.is_power_of_two() {
        anyhow::bail!("Partition length {} is not a power of two", args.partition);
    }

    println!("Reading {}...", args.input.display());
    let (stereo, spec) = read_wav_stereo(&args.input)?;
    let frames = stereo.len() / 2;
    let sample_rate = spec.sample_rate as f32;
    println!(
        "  {} frames, {} Hz, {:.2}s",
        frames,
        spec.sample_rate,
        frames as f32 / sample_rate
    );

    let values = args.controls.values();
    let impulse = CabinetImpulseResponse::synthesize(sample_rate)?;
    let shared = Arc::new(SharedState::new(&values));
    let mut chain = SignalChain::new(
        shared,
        sample_rate,
        &impulse,
        ChainSettings {
            max_block_frames: args.block_size.max(16),
            partition: args.partition,
        },
    );

    let tail = if args.no_tail {
        0
    } else {
        impulse.len() + chain.latency_samples()
    };
    let mut output = vec![0.0; frames + tail];
    chain.process_block(&stereo, &mut output);

    let peak = output.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak > 1.0 {
        tracing::warn!(peak, "render clips, lower --volume");
    }

    let input_left: Vec<f32> = stereo.chunks_exact(2).map(|f| f[0]).collect();
    println!("\nStats:");
    println!("  Input:  RMS {:.1} dB", linear_to_db(rms(&input_left)));
    println!(
        "  Output: RMS {:.1} dB, Peak {:.1} dB",
        linear_to_db(rms(&output)),
        linear_to_db(peak)
    );

    write_wav(
        &args.output,
        &output,
        WavSpec {
            channels: 1,
            sample_rate: spec.sample_rate,
            bits_per_sample: args.bit_depth,
        },
    )?;
    println!("Wrote {}", args.output.display());
    Ok(())
}
