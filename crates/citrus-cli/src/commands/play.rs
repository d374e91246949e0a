//! Live amp command.

use super::common::{ConfigArgs, ControlArgs};
use citrus_amp::{AmpEngine, EngineEvent, MeterReading, meter_display_percent};
use citrus_io::CpalBackend;
use clap::Args;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Meter refresh interval, roughly one display frame.
const FRAME: Duration = Duration::from_millis(33);

/// Characters in each meter bar.
const BAR_WIDTH: usize = 20;

#[derive(Args)]
pub struct PlayArgs {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(flatten)]
    controls: ControlArgs,

    /// Input device id (see `citrus devices`)
    #[arg(long)]
    input: Option<String>,

    /// Output device id (see `citrus devices`)
    #[arg(long)]
    output: Option<String>,

    /// Stop after this many seconds
    #[arg(long)]
    seconds: Option<f32>,

    /// Do not draw meters
    #[arg(long)]
    quiet: bool,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let mut config = args.config.load()?;
    if args.input.is_some() {
        config.input_device = args.input;
    }
    if args.output.is_some() {
        config.output_device = args.output;
    }

    let mut amp = AmpEngine::new(config, Box::new(CpalBackend::new()))?;
    amp.apply_controls(&args.controls.values());
    let events = amp.subscribe();
    amp.activate()?;

    println!("Citrus amp running");
    println!("  Input:  {}", amp.current_input_id().unwrap_or("default"));
    println!("  Output: {}", amp.current_output_id().unwrap_or("default"));
    if let Some(rate) = amp.sample_rate() {
        println!("  Sample rate: {rate} Hz");
    }
    if !amp.has_input() {
        println!("  (no input stream, the amp is silent)");
    }
    println!("\nPress Ctrl+C to stop...\n");

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let limit = args
        .seconds
        .filter(|s| s.is_finite() && *s > 0.0)
        .map(Duration::from_secs_f32);
    let started = Instant::now();
    let mut stdout = std::io::stdout();

    while running.load(Ordering::SeqCst) {
        if limit.is_some_and(|limit| started.elapsed() >= limit) {
            break;
        }

        let levels = amp.poll_meters();
        for event in events.try_iter() {
            if let EngineEvent::DeviceError(message) = event {
                eprintln!("\ndevice error: {message}");
            }
        }
        if !args.quiet {
            write!(stdout, "\r{}", meter_line(levels))?;
            stdout.flush()?;
        }
        std::thread::sleep(FRAME);
    }

    amp.shutdown();
    let errors = amp.stream_errors();
    if errors > 0 {
        tracing::warn!(errors, "audio stream reported errors");
    }
    println!("\nDone!");
    Ok(())
}

fn meter_line(levels: MeterReading) -> String {
    format!(
        "OUT [{}] {:>3.0}%  COMP [{}] {:>3.0}%",
        bar(meter_display_percent(levels.output)),
        meter_display_percent(levels.output),
        bar(meter_display_percent(levels.compressor)),
        meter_display_percent(levels.compressor),
    )
}

fn bar(percent: f32) -> String {
    let filled = ((percent / 100.0) * BAR_WIDTH as f32).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}
