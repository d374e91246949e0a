//! Audio device listing command.

use citrus_io::{AudioBackend, AudioDevice, CpalBackend};
use clap::Args;

#[derive(Args)]
pub struct DevicesArgs {
    /// Print the lists as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    let backend = CpalBackend::new();
    let devices = backend.list_devices()?;
    let (inputs, outputs): (Vec<_>, Vec<_>) =
        devices.into_iter().partition(AudioDevice::is_input);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&to_json(&inputs, &outputs))?);
        return Ok(());
    }

    if inputs.is_empty() && outputs.is_empty() {
        println!("No audio devices found.");
        return Ok(());
    }

    println!("Audio Devices ({})", backend.name());
    println!("==================\n");
    print_section("Input Devices:", &inputs);
    print_section("Output Devices:", &outputs);
    println!("Total: {} input(s), {} output(s)", inputs.len(), outputs.len());
    println!();
    println!("Pass an id to `citrus play --input <ID> --output <ID>`.");
    if !backend.supports_output_selection() {
        println!("Note: this backend always plays through the default output.");
    }
    Ok(())
}

fn print_section(title: &str, devices: &[AudioDevice]) {
    if devices.is_empty() {
        return;
    }
    println!("{title}");
    for device in devices {
        println!("  {:<32} {}", device.id, device.label);
    }
    println!();
}

fn to_json(inputs: &[AudioDevice], outputs: &[AudioDevice]) -> serde_json::Value {
    let list = |devices: &[AudioDevice]| -> Vec<serde_json::Value> {
        devices
            .iter()
            .map(|d| serde_json::json!({ "id": d.id, "label": d.label }))
            .collect()
    };
    serde_json::json!({
        "inputs": list(inputs),
        "outputs": list(outputs),
    })
}
