//! Errors raised while opening a spidev transport
//!
//! Transfer failures are not here; they surface as
//! [`TransportFault`](rfsynth_core::error::TransportFault) through the
//! `BusTransport` impl.

use thiserror::Error;

/// Failure to open or set up a spidev device
#[derive(Debug, Error)]
pub enum LinuxSpiError {
    /// No `dev=` or `bus=` given
    #[error("No device specified. Use dev=/dev/spidevX.Y or bus=X,cs=Y")]
    NoDevice,

    /// The device node could not be opened
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The controller rejected one of the bus settings
    #[error("{path}: controller rejected {setting} = {value}: {source}")]
    Setup {
        path: String,
        setting: &'static str,
        value: u32,
        #[source]
        source: nix::Error,
    },
}

/// Result type for Linux SPI operations
pub type Result<T> = std::result::Result<T, LinuxSpiError>;
