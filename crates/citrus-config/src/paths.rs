//! Platform-specific configuration paths.
//!
//! - Linux: `~/.config/citrus/`
//! - macOS: `~/Library/Application Support/citrus/`
//! - Windows: `%APPDATA%\citrus\`

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "citrus";

/// Engine configuration file name.
const ENGINE_FILE: &str = "engine.toml";

/// Returns the user-specific configuration directory.
///
/// Falls back to the current directory if the platform config directory
/// cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the engine configuration file.
pub fn engine_config_path() -> PathBuf {
    user_config_dir().join(ENGINE_FILE)
}
