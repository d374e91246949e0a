//! Level metering.
//!
//! Two taps read copies of the signal: one after the compressor blend, one
//! after the cabinet. Each keeps the most recent [`METER_WINDOW`] samples and
//! reports their RMS, clamped to `[0, 1]`.

use citrus_core::rms;

/// Samples in the RMS window.
pub const METER_WINDOW: usize = 256;

/// Sliding-window RMS meter.
#[derive(Debug, Clone)]
pub struct MeterTap {
    window: [f32; METER_WINDOW],
    pos: usize,
}

impl MeterTap {
    /// Create a meter reading silence.
    pub fn new() -> Self {
        Self {
            window: [0.0; METER_WINDOW],
            pos: 0,
        }
    }

    /// Copy `buffer` into the window. The buffer is not touched.
    pub fn observe(&mut self, buffer: &[f32]) {
        let tail = if buffer.len() > METER_WINDOW {
            &buffer[buffer.len() - METER_WINDOW..]
        } else {
            buffer
        };
        for &sample in tail {
            self.window[self.pos] = sample;
            self.pos = (self.pos + 1) % METER_WINDOW;
        }
    }

    /// RMS over the window, in `[0, 1]`.
    pub fn level(&self) -> f32 {
        let level = rms(&self.window);
        if level.is_finite() {
            level.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Forget everything observed.
    pub fn reset(&mut self) {
        self.window = [0.0; METER_WINDOW];
        self.pos = 0;
    }
}

impl Default for MeterTap {
    fn default() -> Self {
        Self::new()
    }
}

/// One reading of both meters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeterReading {
    /// Post-cabinet level.
    pub output: f32,
    /// Post-compressor-blend level.
    pub compressor: f32,
}

impl MeterReading {
    /// Both meters at zero.
    pub const SILENT: Self = Self {
        output: 0.0,
        compressor: 0.0,
    };
}

/// Meter bar length in percent for a level in `[0, 1]`.
pub fn meter_display_percent(level: f32) -> f32 {
    (level * 200.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_meter_reads_zero() {
        assert_eq!(MeterTap::new().level(), 0.0);
    }

    #[test]
    fn full_scale_square_reads_one() {
        let mut meter = MeterTap::new();
        let square: Vec<f32> = (0..512).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        meter.observe(&square);
        assert!((meter.level() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn window_slides() {
        let mut meter = MeterTap::new();
        meter.observe(&[0.5; 256]);
        assert!((meter.level() - 0.5).abs() < 1e-6);
        meter.observe(&[0.0; 128]);
        let half = (0.25f32 * 0.5).sqrt();
        assert!((meter.level() - half).abs() < 1e-5);
        meter.observe(&[0.0; 128]);
        assert_eq!(meter.level(), 0.0);
    }

    #[test]
    fn clamps_hot_signal() {
        let mut meter = MeterTap::new();
        meter.observe(&[4.0; 300]);
        assert_eq!(meter.level(), 1.0);
        meter.reset();
        assert_eq!(meter.level(), 0.0);
    }

    #[test]
    fn display_scaling() {
        assert_eq!(meter_display_percent(0.0), 0.0);
        assert_eq!(meter_display_percent(0.25), 50.0);
        assert_eq!(meter_display_percent(0.9), 100.0);
    }
}
