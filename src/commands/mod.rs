//! CLI command implementations
//!
//! Commands that talk to a chip bring it up through
//! [`rfsynth_core::device::open`], run, and remove the device again so the
//! transport is released on every exit path. Register commands can skip the
//! bring-up and talk to the bus directly (`--skip-init`).

mod list;
pub mod probe;
pub mod register;
pub mod tune;

pub use list::{format_freq, list_chips, list_transports};

use crate::transports::BoxedTransport;
use rfsynth_core::chip::ChipProfile;
use rfsynth_core::device::{self, SynthConfig, SynthDevice};

/// Device type used by the CLI
pub type Device = SynthDevice<BoxedTransport>;

/// Bring the chip up, run `f`, then remove the device
///
/// A failure to remove is returned when `f` succeeded and logged when `f`
/// already failed.
pub fn with_device<F>(
    bus: BoxedTransport,
    profile: &'static ChipProfile,
    config: SynthConfig,
    f: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(&mut Device) -> Result<(), Box<dyn std::error::Error>>,
{
    let mut dev = device::open(bus, profile, config)?;
    let result = f(&mut dev);
    let removed = dev.remove();
    finish(result, removed, profile)
}

/// Combine a command result with the result of releasing its bus
pub(crate) fn finish(
    result: Result<(), Box<dyn std::error::Error>>,
    released: rfsynth_core::Result<()>,
    profile: &'static ChipProfile,
) -> Result<(), Box<dyn std::error::Error>> {
    match (result, released) {
        (Ok(()), released) => Ok(released?),
        (Err(e), Err(release)) => {
            log::error!("{}: {}", profile.name, release);
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
    }
}
