//! Probe command implementation

use super::{format_freq, Device};
use rfsynth_core::bus::BusTransport;

/// Report on a chip that has just been brought up
pub fn run_probe(dev: &mut Device) -> Result<(), Box<dyn std::error::Error>> {
    let profile = dev.profile();

    println!("Found synthesizer:");
    println!("  Chip:        {} ({})", profile.name, profile.description);
    if let Some(bus) = dev.transport() {
        let b = bus.binding();
        println!(
            "  Bus:         {} cs {} ({} kHz, mode {})",
            b.bus,
            b.chip_select,
            b.speed_hz / 1000,
            b.mode.as_u8()
        );
    }

    if let Some(id) = profile.identity {
        let vendor = u16::from_le_bytes([
            dev.read_register(id.vendor_addr)?,
            dev.read_register(id.vendor_addr + 1)?,
        ]);
        let chip_type = dev.read_register(id.chip_type_addr)?;
        let product = u16::from_le_bytes([
            dev.read_register(id.product_addr)?,
            dev.read_register(id.product_addr + 1)?,
        ]);
        println!("  Vendor ID:   0x{:04X}", vendor);
        println!("  Chip type:   0x{:02X}", chip_type);
        println!("  Product ID:  0x{:04X}", product);
    }

    let freq = dev.get_output_frequency()?;
    let status = dev.read_status()?;
    println!("  State:       {}", status.state);
    println!("  Output:      {}", format_freq(freq));
    println!(
        "  Lock detect: {}",
        if status.locked { "locked" } else { "unlocked" }
    );

    Ok(())
}
