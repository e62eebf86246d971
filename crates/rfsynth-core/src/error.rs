//! Error types for rfsynth-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

use crate::device::DeviceState;

/// Reason a bus transfer failed
///
/// Transports report this; the codec wraps it into [`Error::Transport`]
/// together with the register address that was being accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFault {
    /// Underlying I/O operation failed
    Io,
    /// Transfer did not complete in time
    Timeout,
    /// Transmit and receive buffers differ in length
    LengthMismatch,
    /// Transport has been released or the device disappeared
    Disconnected,
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Bus transfer failed
    Transport {
        /// Register being accessed
        addr: u16,
        /// What the transport reported
        fault: TransportFault,
    },
    /// Transport reported an error while being released
    ReleaseFailed {
        /// What the transport reported
        fault: TransportFault,
    },
    /// Register address is outside the chip's register map
    InvalidAddress {
        /// Requested address
        addr: u16,
        /// Highest valid address
        max: u16,
    },
    /// A configuration value is outside the range the chip accepts
    ConfigOutOfRange {
        /// Name of the offending parameter
        parameter: &'static str,
        /// Requested value
        value: u64,
        /// Smallest accepted value
        min: u64,
        /// Largest accepted value
        max: u64,
    },
    /// No divider combination can produce the requested frequency
    FrequencyOutOfRange {
        /// Requested output frequency
        freq_hz: u64,
    },
    /// Frequency needs a fractional N on an integer-only chip
    UnsupportedFractionalRatio {
        /// Requested output frequency
        freq_hz: u64,
    },
    /// The chip family has no such setting
    Unsupported {
        /// Name of the setting
        parameter: &'static str,
    },
    /// Verification readback did not match
    DeviceNotResponding {
        /// Register that was checked
        addr: u16,
        /// Value written or expected
        expected: u8,
        /// Value read back
        actual: u8,
    },
    /// Operation is not legal in the device's current lifecycle state
    InvalidState {
        /// State the device was in
        state: DeviceState,
        /// Operation that was attempted
        operation: &'static str,
    },
}

impl fmt::Display for TransportFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => write!(f, "I/O error"),
            Self::Timeout => write!(f, "timed out"),
            Self::LengthMismatch => write!(f, "tx/rx length mismatch"),
            Self::Disconnected => write!(f, "transport disconnected"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { addr, fault } => {
                write!(f, "bus transfer failed at register 0x{:04X}: {}", addr, fault)
            }
            Self::ReleaseFailed { fault } => write!(f, "failed to release bus: {}", fault),
            Self::InvalidAddress { addr, max } => write!(
                f,
                "register address 0x{:04X} out of range (max 0x{:04X})",
                addr, max
            ),
            Self::ConfigOutOfRange {
                parameter,
                value,
                min,
                max,
            } => write!(
                f,
                "{} = {} out of range ({}..={})",
                parameter, value, min, max
            ),
            Self::FrequencyOutOfRange { freq_hz } => {
                write!(f, "frequency {} Hz cannot be synthesized", freq_hz)
            }
            Self::UnsupportedFractionalRatio { freq_hz } => write!(
                f,
                "frequency {} Hz needs a fractional N divider, chip is integer-N only",
                freq_hz
            ),
            Self::Unsupported { parameter } => {
                write!(f, "{} is not supported by this chip", parameter)
            }
            Self::DeviceNotResponding {
                addr,
                expected,
                actual,
            } => write!(
                f,
                "device not responding: register 0x{:04X} read 0x{:02X}, expected 0x{:02X}",
                addr, actual, expected
            ),
            Self::InvalidState { state, operation } => {
                write!(f, "cannot {} while device is {}", operation, state)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TransportFault {}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
