//! Citrus Core - DSP primitives for the amp signal chain
//!
//! This crate provides the building blocks the amp engine is assembled from,
//! designed for real-time audio processing with zero allocation in the audio path.
//!
//! ## Parameter Smoothing
//!
//! Click-free control changes:
//!
//! - [`SmoothedParam`] - Exponential smoothing, per sample or per block
//! - [`AtomicParam`] - Lock-free f32 cell the control thread writes targets into
//!
//! ## Filters
//!
//! - [`Biquad`] - Second-order IIR filter with RBJ cookbook coefficients
//! - [`FilterShape`] - Declarative filter description used by tone stack and cabinet synthesis
//!
//! ## Dynamics & Anti-Aliasing
//!
//! - [`EnvelopeFollower`] - Amplitude envelope detection
//! - [`Oversampler`] - Upsample, shape, filter and decimate around a nonlinearity
//!
//! ## Utilities
//!
//! - Math functions: [`db_to_linear`], [`linear_to_db`], [`flush_denormal`], [`rms`]
//!
//! # no_std Support
//!
//! Disable the default `std` feature to use the crate on embedded targets:
//!
//! ```toml
//! [dependencies]
//! citrus-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod atomic;
pub mod biquad;
pub mod envelope;
pub mod math;
pub mod oversample;
pub mod param;

pub use atomic::AtomicParam;
pub use biquad::{
    Biquad, FilterShape, high_shelf_coefficients, highpass_coefficients, low_shelf_coefficients,
    lowpass_coefficients, peaking_eq_coefficients,
};
pub use envelope::EnvelopeFollower;
pub use math::{db_to_linear, flush_denormal, linear_to_db, rms};
pub use oversample::{OVERSAMPLE_FACTOR, Oversampler};
pub use param::SmoothedParam;
