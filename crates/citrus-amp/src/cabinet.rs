//! Cabinet simulation: partitioned FFT convolution plus fixed makeup.
//!
//! Uniformly partitioned overlap-save. With partition length `B` the impulse
//! response is cut into `P = ceil(L / B)` blocks, each zero-padded to `2B`
//! and transformed once up front. Every `B` input samples:
//!
//! ```text
//! [prev B | new B] ── FFT ──▶ push onto frequency-domain delay line
//! Σ_p  FDL[p] · H[p]  ── IFFT ──▶ keep the last B samples
//! ```
//!
//! Latency is one partition. All buffers are sized at construction; the
//! audio path never allocates.

use crate::controls::SharedState;
use crate::impulse::CabinetImpulseResponse;
use crate::stage::{Stage, StageKind};
use citrus_core::flush_denormal;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Fixed gain after convolution.
pub const CABINET_MAKEUP: f32 = 2.0;

const ZERO: Complex<f32> = Complex { re: 0.0, im: 0.0 };

/// Uniformly partitioned overlap-save convolver.
pub struct PartitionedConvolver {
    partition: usize,
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    /// Spectra of the impulse response partitions.
    kernel: Vec<Box<[Complex<f32>]>>,
    /// Spectra of past input frames, newest at `head`.
    history: Vec<Box<[Complex<f32>]>>,
    head: usize,
    /// Previous and current input partition, time domain.
    frame: Box<[f32]>,
    /// Output of the last completed partition.
    output: Box<[f32]>,
    /// Samples written into the current partition.
    fill: usize,
    spectrum: Box<[Complex<f32>]>,
    accum: Box<[Complex<f32>]>,
    scratch: Box<[Complex<f32>]>,
}

impl PartitionedConvolver {
    /// Prepare a convolver for `impulse` scaled by `gain`.
    ///
    /// `partition` is the block length `B`; it is raised to at least 1.
    pub fn new(impulse: &[f32], gain: f32, partition: usize) -> Self {
        let partition = partition.max(1);
        let size = partition * 2;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let ifft = planner.plan_fft_inverse(size);
        let scratch_len = fft
            .get_inplace_scratch_len()
            .max(ifft.get_inplace_scratch_len());
        let mut scratch = vec![ZERO; scratch_len].into_boxed_slice();

        let partitions = impulse.len().div_ceil(partition).max(1);
        let kernel = (0..partitions)
            .map(|p| {
                let mut block = vec![ZERO; size].into_boxed_slice();
                let start = p * partition;
                let end = (start + partition).min(impulse.len());
                for (bin, &sample) in block.iter_mut().zip(&impulse[start..end]) {
                    bin.re = sample * gain;
                }
                fft.process_with_scratch(&mut block, &mut scratch);
                block
            })
            .collect();

        Self {
            partition,
            fft,
            ifft,
            kernel,
            history: (0..partitions)
                .map(|_| vec![ZERO; size].into_boxed_slice())
                .collect(),
            head: 0,
            frame: vec![0.0; size].into_boxed_slice(),
            output: vec![0.0; partition].into_boxed_slice(),
            fill: 0,
            spectrum: vec![ZERO; size].into_boxed_slice(),
            accum: vec![ZERO; size].into_boxed_slice(),
            scratch,
        }
    }

    /// Partition length `B`.
    pub fn partition(&self) -> usize {
        self.partition
    }

    /// Number of impulse response partitions `P`.
    pub fn partitions(&self) -> usize {
        self.kernel.len()
    }

    /// Delay in samples.
    pub fn latency_samples(&self) -> usize {
        self.partition
    }

    /// Convolve `buffer` in place.
    pub fn process(&mut self, buffer: &mut [f32]) {
        let b = self.partition;
        let mut offset = 0;
        while offset < buffer.len() {
            let take = (b - self.fill).min(buffer.len() - offset);
            let chunk = &mut buffer[offset..offset + take];
            let slot = self.fill;
            self.frame[b + slot..b + slot + take].copy_from_slice(chunk);
            chunk.copy_from_slice(&self.output[slot..slot + take]);
            self.fill += take;
            offset += take;
            if self.fill == b {
                self.convolve_partition();
                self.fill = 0;
            }
        }
    }

    fn convolve_partition(&mut self) {
        let b = self.partition;
        let partitions = self.kernel.len();

        for (bin, &sample) in self.spectrum.iter_mut().zip(self.frame.iter()) {
            *bin = Complex::new(sample, 0.0);
        }
        self.fft.process_with_scratch(&mut self.spectrum, &mut self.scratch);

        self.head = (self.head + partitions - 1) % partitions;
        self.history[self.head].copy_from_slice(&self.spectrum);

        self.accum.fill(ZERO);
        for (p, kernel) in self.kernel.iter().enumerate() {
            let past = &self.history[(self.head + p) % partitions];
            for ((acc, x), h) in self.accum.iter_mut().zip(past.iter()).zip(kernel.iter()) {
                *acc += x * h;
            }
        }

        self.ifft.process_with_scratch(&mut self.accum, &mut self.scratch);
        let norm = 1.0 / (2 * b) as f32;
        for (out, bin) in self.output.iter_mut().zip(&self.accum[b..]) {
            *out = flush_denormal(bin.re * norm);
        }

        self.frame.copy_within(b.., 0);
    }

    /// Clear all signal history.
    pub fn reset(&mut self) {
        for spectrum in &mut self.history {
            spectrum.fill(ZERO);
        }
        self.frame.fill(0.0);
        self.output.fill(0.0);
        self.fill = 0;
        self.head = 0;
    }
}

/// Convolution with the synthesized cabinet response, then fixed makeup.
pub struct CabinetStage {
    convolver: PartitionedConvolver,
}

impl CabinetStage {
    /// Build the stage for `impulse`, normalized the way a convolution
    /// reverb normalizes its response, with `partition`-sample blocks.
    pub fn new(impulse: &CabinetImpulseResponse, partition: usize) -> Self {
        let gain = impulse.normalization_scale() * CABINET_MAKEUP;
        Self {
            convolver: PartitionedConvolver::new(impulse.samples(), gain, partition),
        }
    }

    /// Number of impulse response partitions.
    pub fn partitions(&self) -> usize {
        self.convolver.partitions()
    }
}

impl Stage for CabinetStage {
    fn kind(&self) -> StageKind {
        StageKind::Cabinet
    }

    fn process(&mut self, _shared: &SharedState, buffer: &mut [f32]) {
        self.convolver.process(buffer);
    }

    fn reset(&mut self, _shared: &SharedState) {
        self.convolver.reset();
    }

    fn latency_samples(&self) -> usize {
        self.convolver.latency_samples()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct(signal: &[f32], impulse: &[f32]) -> Vec<f32> {
        let mut out = vec![0.0; signal.len()];
        for (n, y) in out.iter_mut().enumerate() {
            for (k, h) in impulse.iter().enumerate().take(n + 1) {
                *y += h * signal[n - k];
            }
        }
        out
    }

    #[test]
    fn matches_direct_convolution() {
        let impulse: Vec<f32> = (0..100)
            .map(|i| 0.9f32.powi(i) * if i % 2 == 0 { 1.0 } else { -0.5 })
            .collect();
        let signal: Vec<f32> = (0..700)
            .map(|i| ((i * 7919) % 13) as f32 / 13.0 - 0.5)
            .collect();
        let expected = direct(&signal, &impulse);

        let mut conv = PartitionedConvolver::new(&impulse, 1.0, 32);
        assert_eq!(conv.partitions(), 4);
        let mut out = signal.clone();
        // Uneven chunks exercise partial partitions.
        let mut pos = 0;
        for len in [5, 64, 1, 100, 30].iter().cycle() {
            if pos >= out.len() {
                break;
            }
            let end = (pos + len).min(out.len());
            conv.process(&mut out[pos..end]);
            pos = end;
        }

        let latency = conv.latency_samples();
        for n in 0..signal.len() - latency {
            assert!(
                (out[n + latency] - expected[n]).abs() < 1e-4,
                "sample {n}: {} vs {}",
                out[n + latency],
                expected[n]
            );
        }
        assert!(out[..latency].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn gain_scales_output() {
        let mut conv = PartitionedConvolver::new(&[1.0], 0.5, 16);
        let mut buffer = vec![1.0; 48];
        conv.process(&mut buffer);
        assert!((buffer[40] - 0.5).abs() < 1e-5);
    }

    #[test]
    fn reset_clears_tail() {
        let mut conv = PartitionedConvolver::new(&[1.0, 0.5, 0.25], 1.0, 8);
        conv.process(&mut [1.0; 32]);
        conv.reset();
        let mut buffer = [0.0; 32];
        conv.process(&mut buffer);
        assert!(buffer.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn cabinet_stage_reports_partitioning() {
        let ir = CabinetImpulseResponse::synthesize(48000.0).unwrap();
        let stage = CabinetStage::new(&ir, 128);
        assert_eq!(stage.partitions(), 75);
        assert_eq!(stage.latency_samples(), 128);
        assert_eq!(stage.kind(), StageKind::Cabinet);
    }
}
