//! Engine configuration for the citrus amp.
//!
//! [`EngineConfig`] describes how the engine talks to hardware: requested
//! sample rate and buffer size, preferred devices, and the sizing of the
//! audio path's preallocated buffers. Control values (gain, tone, ...) are
//! deliberately absent; they live in the engine.
//!
//! # Example
//!
//! ```rust,no_run
//! use citrus_config::EngineConfig;
//!
//! let mut config = EngineConfig::load_or_default()?;
//! config.buffer_size = 128;
//! config.validate()?;
//! config.save(citrus_config::paths::engine_config_path())?;
//! # Ok::<(), citrus_config::ConfigError>(())
//! ```

mod engine;
mod error;

/// Platform-specific configuration paths.
pub mod paths;

pub use engine::EngineConfig;
pub use error::ConfigError;
