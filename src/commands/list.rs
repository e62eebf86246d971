//! List commands implementation

use crate::transports;
use rfsynth_core::chip::PROFILES;

/// List all available transports
pub fn list_transports() {
    let transports = transports::available_transports();
    if transports.is_empty() {
        println!("No transports available (recompile with transport features enabled)");
        return;
    }

    println!("Available transports:");
    println!();
    for t in &transports {
        println!("  {:10} - {}", t.name, t.description);
        if !t.aliases.is_empty() {
            println!("  {:10}   aliases: {}", "", t.aliases.join(", "));
        }
    }
}

/// List all supported chips
pub fn list_chips() {
    println!("Supported synthesizers:");
    println!();
    println!(
        "{:<10} {:>14} {:>14} {:>8}  {}",
        "Name", "RF min", "RF max", "Mode", "Description"
    );
    println!("{}", "-".repeat(78));

    for chip in PROFILES {
        let mode = if chip.is_fractional() { "frac-N" } else { "int-N" };
        println!(
            "{:<10} {:>14} {:>14} {:>8}  {}",
            chip.name,
            format_freq(chip.limits.rf_min_hz),
            format_freq(chip.limits.rf_max_hz),
            mode,
            chip.description
        );
        if !chip.aliases.is_empty() {
            println!("{:<10} aliases: {}", "", chip.aliases.join(", "));
        }
    }
}

/// Format a frequency in the largest unit that fits
pub fn format_freq(hz: u64) -> String {
    if hz >= 1_000_000_000 {
        format!("{:.4} GHz", hz as f64 / 1e9)
    } else if hz >= 1_000_000 {
        format!("{:.3} MHz", hz as f64 / 1e6)
    } else if hz >= 1_000 {
        format!("{:.3} kHz", hz as f64 / 1e3)
    } else {
        format!("{} Hz", hz)
    }
}
