//! WAV file reading and writing for offline rendering.

use crate::Result;
use hound::{SampleFormat, WavReader, WavWriter};
use std::path::Path;

/// WAV file specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample (16, 24 or 32). 32 bits means IEEE float.
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 32,
        }
    }
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// Read a WAV file as stereo-interleaved f32 (`[L0, R0, L1, R1, ...]`).
///
/// Mono files are duplicated into both channels. Files with more than two
/// channels keep the first two. The returned spec describes the file on disk.
pub fn read_wav_stereo<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, WavSpec)> {
    let reader = WavReader::open(path)?;
    let hound_spec = reader.spec();
    let spec = WavSpec::from(hound_spec);
    let channels = spec.channels.max(1) as usize;

    let samples: Vec<f32> = match hound_spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    let stereo = match channels {
        2 => samples,
        1 => samples.iter().flat_map(|&s| [s, s]).collect(),
        _ => samples
            .chunks_exact(channels)
            .flat_map(|frame| [frame[0], frame[1]])
            .collect(),
    };

    Ok((stereo, spec))
}

/// Write mono samples to a WAV file. `spec.channels` is forced to 1.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], spec: WavSpec) -> Result<()> {
    let spec = WavSpec { channels: 1, ..spec };
    let mut writer = WavWriter::create(path, hound::WavSpec::from(spec))?;

    if spec.bits_per_sample == 32 {
        for &sample in samples {
            writer.write_sample(sample)?;
        }
    } else {
        let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
        for &sample in samples {
            let int_sample = (sample * max_val).clamp(-max_val, max_val - 1.0) as i32;
            writer.write_sample(int_sample)?;
        }
    }

    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn write_raw(path: &Path, channels: u16, frames: &[f32]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in frames {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn mono_file_is_duplicated() {
        let file = NamedTempFile::new().unwrap();
        write_raw(file.path(), 1, &[0.1, 0.2, 0.3]);

        let (stereo, spec) = read_wav_stereo(file.path()).unwrap();
        assert_eq!(spec.channels, 1);
        assert_eq!(stereo, vec![0.1, 0.1, 0.2, 0.2, 0.3, 0.3]);
    }

    #[test]
    fn wide_file_keeps_first_two_channels() {
        let file = NamedTempFile::new().unwrap();
        write_raw(file.path(), 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let (stereo, _) = read_wav_stereo(file.path()).unwrap();
        assert_eq!(stereo, vec![1.0, 2.0, 4.0, 5.0]);
    }

    #[test]
    fn sixteen_bit_mono_output() {
        let samples: Vec<f32> = (0..1000).map(|i| (i as f32 / 1000.0).sin() * 0.9).collect();
        let file = NamedTempFile::new().unwrap();
        write_wav(
            file.path(),
            &samples,
            WavSpec {
                channels: 2,
                sample_rate: 44100,
                bits_per_sample: 16,
            },
        )
        .unwrap();

        let (loaded, spec) = read_wav_stereo(file.path()).unwrap();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(loaded.len(), samples.len() * 2);
        for (a, frame) in samples.iter().zip(loaded.chunks_exact(2)) {
            assert!((a - frame[0]).abs() < 0.001);
        }
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_wav_stereo("/nonexistent/citrus.wav").is_err());
    }
}
