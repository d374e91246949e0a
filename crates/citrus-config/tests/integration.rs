//! File round trips for the engine configuration.

use citrus_config::{ConfigError, EngineConfig};
use tempfile::TempDir;

#[test]
fn save_then_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("engine.toml");

    let config = EngineConfig {
        sample_rate: 96000,
        buffer_size: 64,
        output_device: Some("Studio Monitors".to_string()),
        ..EngineConfig::default()
    };
    config.save(&path).unwrap();

    let loaded = EngineConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn saved_file_is_readable_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.toml");
    EngineConfig::default().save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("sample_rate = 48000"));
    assert!(text.contains("convolution_partition = 128"));
}

#[test]
fn missing_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    let err = EngineConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn invalid_file_is_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.toml");
    std::fs::write(&path, "convolution_partition = 96\n").unwrap();
    let err = EngineConfig::load(&path).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid {
            field: "convolution_partition",
            ..
        }
    ));
}
