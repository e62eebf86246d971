//! Register access commands
//!
//! These run either on a fully initialized device or, with `--skip-init`,
//! straight on the transport through a [`RegisterCodec`].

use super::Device;
use crate::transports::BoxedTransport;
use rfsynth_core::bus::BusTransport;
use rfsynth_core::chip::ChipProfile;
use rfsynth_core::codec::RegisterCodec;
use rfsynth_core::Result;

/// Something registers can be accessed through
pub enum RegisterTarget<'a> {
    /// Initialized device
    Device(&'a mut Device),
    /// Bare transport; the chip has not been reset or programmed
    Raw {
        bus: &'a mut BoxedTransport,
        codec: RegisterCodec,
    },
}

impl RegisterTarget<'_> {
    fn read(&mut self, addr: u16) -> Result<u8> {
        match self {
            Self::Device(dev) => dev.read_register(addr),
            Self::Raw { bus, codec } => codec.read(&mut **bus, addr),
        }
    }

    fn write(&mut self, addr: u16, value: u8) -> Result<()> {
        match self {
            Self::Device(dev) => dev.write_register(addr, value),
            Self::Raw { bus, codec } => codec.write(&mut **bus, addr, value),
        }
    }

    fn update_bits(&mut self, addr: u16, mask: u8, value: u8) -> Result<u8> {
        match self {
            Self::Device(dev) => dev.update_register_bits(addr, mask, value),
            Self::Raw { bus, codec } => codec.update_bits(&mut **bus, addr, mask, value),
        }
    }
}

/// Run `f` on the bare transport, then release it
///
/// No reset, programming or readback check happens first.
pub fn with_raw_bus<F>(
    mut bus: BoxedTransport,
    profile: &'static ChipProfile,
    f: F,
) -> std::result::Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(RegisterTarget<'_>) -> std::result::Result<(), Box<dyn std::error::Error>>,
{
    log::debug!("Skipping {} initialization", profile.name);
    let codec = RegisterCodec::for_profile(profile);
    let result = f(RegisterTarget::Raw {
        bus: &mut bus,
        codec,
    });
    let released = bus
        .release()
        .map_err(|fault| rfsynth_core::Error::ReleaseFailed { fault });
    super::finish(result, released, profile)
}

/// Read one register and print it
pub fn run_read(
    mut target: RegisterTarget<'_>,
    addr: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let value = target.read(addr)?;
    println!("0x{:04X}: 0x{:02X} ({:08b})", addr, value, value);
    Ok(())
}

/// Write one register
pub fn run_write(
    mut target: RegisterTarget<'_>,
    addr: u16,
    value: u8,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    target.write(addr, value)?;
    println!("0x{:04X} <- 0x{:02X}", addr, value);
    Ok(())
}

/// Read-modify-write the masked bits of a register
pub fn run_update_bits(
    mut target: RegisterTarget<'_>,
    addr: u16,
    mask: u8,
    value: u8,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let new = target.update_bits(addr, mask, value)?;
    println!("0x{:04X} <- 0x{:02X} (mask 0x{:02X})", addr, new, mask);
    Ok(())
}
