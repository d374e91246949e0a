//! Audio device descriptors.

use std::fmt;

/// Direction of an audio device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// Capture device (guitar / line input).
    Input,
    /// Playback device.
    Output,
}

/// A selectable audio device.
///
/// `id` is the stable key passed back to the backend when building a stream;
/// `label` is what a user sees. A device that can both capture and play
/// appears twice, once per [`DeviceKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    /// Backend-specific identifier.
    pub id: String,
    /// Human-readable name.
    pub label: String,
    /// Input or output.
    pub kind: DeviceKind,
}

impl AudioDevice {
    /// Create a device descriptor.
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
        }
    }

    /// Whether this is a capture device.
    pub fn is_input(&self) -> bool {
        self.kind == DeviceKind::Input
    }

    /// Whether this is a playback device.
    pub fn is_output(&self) -> bool {
        self.kind == DeviceKind::Output
    }
}

impl fmt::Display for AudioDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.id == self.label {
            write!(f, "{}", self.label)
        } else {
            write!(f, "{} ({})", self.label, self.id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_hides_redundant_id() {
        let same = AudioDevice::new("USB Interface", "USB Interface", DeviceKind::Input);
        assert_eq!(same.to_string(), "USB Interface");
        let different = AudioDevice::new("hw:1,0", "USB Interface", DeviceKind::Output);
        assert_eq!(different.to_string(), "USB Interface (hw:1,0)");
        assert!(different.is_output() && !different.is_input());
    }
}
