//! Device glue for the audio thread.
//!
//! The input stream pushes stereo frames into a bounded channel; the output
//! stream owns an [`AudioProcessor`] that pulls them, runs the
//! [`SignalChain`] and writes the mono result to every output channel.
//! Meter readings travel back to the control thread over a second bounded
//! channel that always holds the newest readings. Both directions use
//! `try_send`/`try_recv`, so neither thread ever waits on the other.

use crate::chain::SignalChain;
use crate::output::MeterReading;
use citrus_io::InputCallback;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Capacity of the input frame channel.
pub const INPUT_QUEUE_FRAMES: usize = 8192;
/// Silence queued ahead of the first input callback.
pub const INPUT_PREFILL_FRAMES: usize = 1024;
/// Capacity of the meter channel.
pub const METER_QUEUE: usize = 4;

/// Everything the output callback needs.
pub struct AudioProcessor {
    chain: SignalChain,
    input_rx: Receiver<[f32; 2]>,
    running: Arc<AtomicBool>,
    meter_tx: Sender<MeterReading>,
    meter_rx: Receiver<MeterReading>,
    out_channels: usize,
    stereo: Vec<f32>,
    mono: Vec<f32>,
}

impl AudioProcessor {
    /// Wrap `chain` for an output stream `out_channels` wide.
    ///
    /// `meter_rx` is a second handle on the meter channel, used to evict the
    /// oldest reading when the control thread falls behind.
    pub fn new(
        chain: SignalChain,
        input_rx: Receiver<[f32; 2]>,
        running: Arc<AtomicBool>,
        (meter_tx, meter_rx): (Sender<MeterReading>, Receiver<MeterReading>),
        out_channels: usize,
        max_block_frames: usize,
    ) -> Self {
        let frames = max_block_frames.max(1);
        Self {
            chain,
            input_rx,
            running,
            meter_tx,
            meter_rx,
            out_channels: out_channels.max(1),
            stereo: vec![0.0; frames * 2],
            mono: vec![0.0; frames],
        }
    }

    /// Fill one interleaved output buffer.
    ///
    /// While suspended the buffer is silenced and no input is consumed.
    pub fn process_buffer(&mut self, data: &mut [f32]) {
        if !self.running.load(Ordering::Relaxed) {
            data.fill(0.0);
            return;
        }

        let channels = self.out_channels;
        let max = self.mono.len();
        for out in data.chunks_mut(max * channels) {
            let frames = out.len() / channels;
            let stereo = &mut self.stereo[..frames * 2];
            for frame in stereo.chunks_exact_mut(2) {
                let [l, r] = self.input_rx.try_recv().unwrap_or([0.0; 2]);
                frame[0] = if l.is_finite() { l } else { 0.0 };
                frame[1] = if r.is_finite() { r } else { 0.0 };
            }

            let mono = &mut self.mono[..frames];
            self.chain.process_block(stereo, mono);

            for (frame, &sample) in out.chunks_exact_mut(channels).zip(mono.iter()) {
                frame.fill(sample);
            }
            // Trailing partial frame, if the host hands us one.
            let written = frames * channels;
            out[written..].fill(0.0);
        }

        self.publish_meters();
    }

    fn publish_meters(&mut self) {
        if let Err(TrySendError::Full(reading)) = self.meter_tx.try_send(self.chain.meters()) {
            let _ = self.meter_rx.try_recv();
            let _ = self.meter_tx.try_send(reading);
        }
    }

    /// The chain this processor runs.
    pub fn chain(&self) -> &SignalChain {
        &self.chain
    }
}

/// Input callback that forwards captured stereo frames to `tx`.
///
/// Frames are dropped when the queue is full or the engine is suspended.
pub fn input_forwarder(tx: Sender<[f32; 2]>, running: Arc<AtomicBool>) -> InputCallback {
    Box::new(move |data: &[f32]| {
        if !running.load(Ordering::Relaxed) {
            return;
        }
        for frame in data.chunks_exact(2) {
            let _ = tx.try_send([frame[0], frame[1]]);
        }
    })
}

/// Drop every queued input frame.
pub fn drain_input(rx: &Receiver<[f32; 2]>) {
    while rx.try_recv().is_ok() {}
}

/// Replace whatever is queued with `frames` of silence so the first output
/// callbacks have input and the input delay is the same on every start.
pub fn reset_input_queue(tx: &Sender<[f32; 2]>, rx: &Receiver<[f32; 2]>, frames: usize) {
    drain_input(rx);
    for _ in 0..frames {
        if tx.try_send([0.0; 2]).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainSettings;
    use crate::controls::{ControlValues, SharedState};
    use crate::impulse::CabinetImpulseResponse;
    use crossbeam_channel::bounded;

    struct Rig {
        processor: AudioProcessor,
        input_tx: Sender<[f32; 2]>,
        meter_rx: Receiver<MeterReading>,
        running: Arc<AtomicBool>,
    }

    fn rig(values: &ControlValues, out_channels: usize) -> Rig {
        let shared = Arc::new(SharedState::new(values));
        let ir = CabinetImpulseResponse::synthesize(48000.0).unwrap();
        let chain = SignalChain::new(shared, 48000.0, &ir, ChainSettings::default());
        let (input_tx, input_rx) = bounded(INPUT_QUEUE_FRAMES);
        let (meter_tx, meter_rx) = bounded(METER_QUEUE);
        let running = Arc::new(AtomicBool::new(true));
        let processor = AudioProcessor::new(
            chain,
            input_rx,
            Arc::clone(&running),
            (meter_tx, meter_rx.clone()),
            out_channels,
            64,
        );
        Rig {
            processor,
            input_tx,
            meter_rx,
            running,
        }
    }

    #[test]
    fn suspended_writes_silence() {
        let mut rig = rig(
            &ControlValues {
                volume: 10.0,
                ..ControlValues::default()
            },
            2,
        );
        rig.running.store(false, Ordering::Relaxed);
        rig.input_tx.send([0.5, 0.5]).unwrap();
        let mut data = vec![1.0; 256];
        rig.processor.process_buffer(&mut data);
        assert!(data.iter().all(|&s| s == 0.0));
        assert_eq!(rig.input_tx.len(), 1);
        assert!(rig.meter_rx.try_recv().is_err());
    }

    #[test]
    fn mono_result_fills_every_channel() {
        let mut rig = rig(
            &ControlValues {
                volume: 10.0,
                gain: 8.0,
                ..ControlValues::default()
            },
            3,
        );
        for i in 0..2048 {
            let s = (i as f32 * 0.05).sin() * 0.5;
            rig.input_tx.send([s, 0.0]).unwrap();
        }
        let mut data = vec![0.0; 3 * 1024];
        rig.processor.process_buffer(&mut data);
        for frame in data.chunks_exact(3) {
            assert_eq!(frame[0], frame[1]);
            assert_eq!(frame[1], frame[2]);
        }
        assert!(data.iter().any(|&s| s != 0.0));
        let meters = rig.meter_rx.try_recv().unwrap();
        assert!(meters.output > 0.0);
    }

    #[test]
    fn starved_input_and_nan_read_as_silence() {
        let mut rig = rig(
            &ControlValues {
                volume: 10.0,
                ..ControlValues::default()
            },
            2,
        );
        rig.input_tx.send([f32::NAN, f32::INFINITY]).unwrap();
        let mut data = vec![0.0; 512];
        rig.processor.process_buffer(&mut data);
        assert!(data.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn meter_queue_keeps_newest_readings() {
        let mut rig = rig(
            &ControlValues {
                volume: 10.0,
                ..ControlValues::default()
            },
            2,
        );
        let mut data = vec![0.0; 512];
        for _ in 0..METER_QUEUE {
            rig.processor.process_buffer(&mut data);
        }
        assert_eq!(rig.meter_rx.len(), METER_QUEUE);

        for i in 0..4096 {
            let s = (i as f32 * 0.05).sin() * 0.5;
            rig.input_tx.send([s, s]).unwrap();
        }
        let mut data = vec![0.0; 2 * 4096];
        rig.processor.process_buffer(&mut data);
        assert_eq!(rig.meter_rx.len(), METER_QUEUE);
        let latest = rig.meter_rx.try_iter().last().unwrap();
        assert!(latest.output > 0.0);
    }

    #[test]
    fn forwarder_respects_running_flag() {
        let (tx, rx) = bounded(16);
        let running = Arc::new(AtomicBool::new(false));
        let mut callback = input_forwarder(tx, Arc::clone(&running));
        callback(&[0.1, 0.2, 0.3, 0.4]);
        assert!(rx.is_empty());
        running.store(true, Ordering::Relaxed);
        callback(&[0.1, 0.2, 0.3, 0.4]);
        assert_eq!(rx.try_recv().unwrap(), [0.1, 0.2]);
        assert_eq!(rx.try_recv().unwrap(), [0.3, 0.4]);
    }

    #[test]
    fn prefill_stops_at_capacity() {
        let (tx, rx) = bounded(8);
        reset_input_queue(&tx, &rx, 100);
        assert_eq!(rx.len(), 8);
    }

    #[test]
    fn reset_replaces_stale_frames() {
        let (tx, rx) = bounded(64);
        for _ in 0..20 {
            tx.try_send([0.7, 0.7]).unwrap();
        }
        reset_input_queue(&tx, &rx, 16);
        assert_eq!(rx.len(), 16);
        assert!(rx.try_iter().all(|frame| frame == [0.0; 2]));

        tx.try_send([0.7, 0.7]).unwrap();
        drain_input(&rx);
        assert!(rx.is_empty());
    }
}
