//! Engine configuration file.

use crate::{ConfigError, paths};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Hardware-facing engine settings.
///
/// Every field has a default, so a partial (or empty) TOML file is valid:
///
/// ```toml
/// sample_rate = 44100
/// input_device = "USB Audio Interface"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Requested device sample rate in Hz. The backend may choose another
    /// rate; the actual one drives curve and impulse-response synthesis.
    pub sample_rate: u32,
    /// Requested frames per device callback.
    pub buffer_size: u32,
    /// Capacity of the audio path's scratch buffers. Longer callbacks are
    /// processed in chunks of this size.
    pub max_block_frames: usize,
    /// Cabinet convolution partition length (power of two).
    pub convolution_partition: usize,
    /// Preferred input device id; `None` selects the system default.
    pub input_device: Option<String>,
    /// Preferred output device id; `None` selects the system default.
    pub output_device: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 256,
            max_block_frames: 1024,
            convolution_partition: 128,
            input_device: None,
            output_device: None,
        }
    }
}

impl EngineConfig {
    /// Supported sample rate range in Hz.
    pub const SAMPLE_RATE_RANGE: std::ops::RangeInclusive<u32> = 8000..=192_000;

    /// Supported convolution partition range.
    pub const PARTITION_RANGE: std::ops::RangeInclusive<usize> = 32..=2048;

    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load `<config dir>/citrus/engine.toml`, or defaults if it does not exist.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let path = paths::engine_config_path();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save to a TOML file, creating the parent directory if needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Check that the engine can run with these settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !Self::SAMPLE_RATE_RANGE.contains(&self.sample_rate) {
            return Err(ConfigError::invalid(
                "sample_rate",
                format!(
                    "{} Hz is outside {}..={} Hz",
                    self.sample_rate,
                    Self::SAMPLE_RATE_RANGE.start(),
                    Self::SAMPLE_RATE_RANGE.end()
                ),
            ));
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::invalid(
                "buffer_size",
                "must be greater than zero",
            ));
        }
        if self.max_block_frames < 16 {
            return Err(ConfigError::invalid(
                "max_block_frames",
                format!("{} is below the minimum of 16", self.max_block_frames),
            ));
        }
        let partition = self.convolution_partition;
        if !partition.is_power_of_two() || !Self::PARTITION_RANGE.contains(&partition) {
            return Err(ConfigError::invalid(
                "convolution_partition",
                format!("{partition} must be a power of two in 32..=2048"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.convolution_partition, 128);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        assert_eq!(EngineConfig::from_toml("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn partial_toml_overrides_fields() {
        let config = EngineConfig::from_toml(
            r#"
            sample_rate = 44100
            input_device = "USB Audio"
            "#,
        )
        .unwrap();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.input_device.as_deref(), Some("USB Audio"));
        assert_eq!(config.buffer_size, 256);
    }

    #[test]
    fn rejects_bad_values() {
        let cases = [
            (
                EngineConfig {
                    sample_rate: 4000,
                    ..EngineConfig::default()
                },
                "sample_rate",
            ),
            (
                EngineConfig {
                    buffer_size: 0,
                    ..EngineConfig::default()
                },
                "buffer_size",
            ),
            (
                EngineConfig {
                    max_block_frames: 8,
                    ..EngineConfig::default()
                },
                "max_block_frames",
            ),
            (
                EngineConfig {
                    convolution_partition: 100,
                    ..EngineConfig::default()
                },
                "convolution_partition",
            ),
            (
                EngineConfig {
                    convolution_partition: 4096,
                    ..EngineConfig::default()
                },
                "convolution_partition",
            ),
        ];
        for (config, expected) in cases {
            match config.validate() {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected invalid {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let err = EngineConfig::from_toml("sample_rate = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }
}
