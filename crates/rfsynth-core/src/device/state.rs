//! Device lifecycle states

use core::fmt;

/// Lifecycle of a [`SynthDevice`](super::SynthDevice)
///
/// ```text
/// Uninitialized -> Bound -> Configured -> Verified -> Active
///        \___________\__________\____________\_________\__-> Removed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceState {
    /// Created, no bus attached
    Uninitialized,
    /// Bus attached, chip not touched yet
    Bound,
    /// Reset done and interface mode set
    Configured,
    /// Readback check passed
    Verified,
    /// Frequency programmed, ready for use
    Active,
    /// Bus released; terminal
    Removed,
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Bound => "bound",
            Self::Configured => "configured",
            Self::Verified => "verified",
            Self::Active => "active",
            Self::Removed => "removed",
        };
        f.write_str(name)
    }
}
