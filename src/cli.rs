//! CLI argument parsing

use crate::transports;
use clap::{Parser, Subcommand};
use rfsynth_core::device::parse_frequency;
use std::path::PathBuf;

/// Parse a string as a hex or decimal u16
fn parse_hex_u16(s: &str) -> Result<u16, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u16>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a string as a hex or decimal u8
fn parse_hex_u8(s: &str) -> Result<u8, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u8>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Generate dynamic help text for the transport argument
fn transport_help() -> String {
    format!(
        "Transport to use, e.g. linux_spi:bus=0,cs=1 [available: {}]",
        transports::transport_names_short()
    )
}

#[derive(Parser)]
#[command(name = "rfsynth")]
#[command(author, version, about = "SPI frequency synthesizer control", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Synthesizer configuration file (TOML format)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Transport to use
    #[arg(short, long, global = true, default_value = "dummy", help = transport_help())]
    pub transport: String,

    /// Chip family (adf4377, adf4382, adf4368); overrides the config file
    #[arg(short, long, global = true)]
    pub chip: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options for commands that only touch registers
#[derive(clap::Args, Debug, Clone, Copy, Default)]
pub struct RegisterArgs {
    /// Skip reset, programming and the readback check; access registers raw
    #[arg(long)]
    pub skip_init: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bring the chip up and report what was found
    Probe,

    /// Read a register
    ReadReg {
        /// Register address (hex, e.g., 0x0A)
        #[arg(value_parser = parse_hex_u16)]
        addr: u16,

        #[command(flatten)]
        args: RegisterArgs,
    },

    /// Write a register
    WriteReg {
        /// Register address (hex, e.g., 0x0A)
        #[arg(value_parser = parse_hex_u16)]
        addr: u16,

        /// Value to write (hex or decimal)
        #[arg(value_parser = parse_hex_u8)]
        value: u8,

        #[command(flatten)]
        args: RegisterArgs,
    },

    /// Read-modify-write the bits of a register selected by a mask
    UpdateBits {
        /// Register address (hex, e.g., 0x0A)
        #[arg(value_parser = parse_hex_u16)]
        addr: u16,

        /// Bits to change
        #[arg(value_parser = parse_hex_u8)]
        mask: u8,

        /// New value for the masked bits
        #[arg(value_parser = parse_hex_u8)]
        value: u8,

        #[command(flatten)]
        args: RegisterArgs,
    },

    /// Change runtime settings
    Set(SetArgs),

    /// Read the output frequency back from the divider registers
    GetFreq,

    /// Show lock status and programmed settings
    Status,

    /// List supported chips
    ListChips,

    /// List available transports
    ListTransports,
}

/// Settings accepted by `set`; applied in the order listed
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SetArgs {
    /// Output frequency (e.g., 10GHz, 2.4 GHz, 5000000000)
    #[arg(long, value_parser = parse_frequency)]
    pub freq: Option<u64>,

    /// Charge pump current code
    #[arg(long = "cp-i")]
    pub cp_current: Option<u8>,

    /// Bleed current word
    #[arg(long)]
    pub bleed: Option<u16>,

    /// Output phase adjust word
    #[arg(long)]
    pub phase: Option<u8>,

    /// MUXOUT function (high_z, lock_detect, low, div_rclk_2, div_nclk_2, high)
    #[arg(long)]
    pub muxout: Option<String>,

    /// Lock detect count
    #[arg(long)]
    pub ld_count: Option<u8>,
}

impl SetArgs {
    /// Whether any setting was given
    pub fn is_empty(&self) -> bool {
        self.freq.is_none()
            && self.cp_current.is_none()
            && self.bleed.is_none()
            && self.phase.is_none()
            && self.muxout.is_none()
            && self.ld_count.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_hex_parsers() {
        assert_eq!(parse_hex_u16("0x0A"), Ok(0x0A));
        assert_eq!(parse_hex_u16("99"), Ok(99));
        assert!(parse_hex_u16("0xFFFFF").is_err());
        assert_eq!(parse_hex_u8("0X5a"), Ok(0x5A));
        assert!(parse_hex_u8("256").is_err());
    }

    #[test]
    fn test_parse_set() {
        let cli = Cli::try_parse_from([
            "rfsynth", "-c", "adf4382", "set", "--freq", "12 GHz", "--cp-i", "7", "--muxout",
            "high",
        ])
        .unwrap();
        assert_eq!(cli.chip.as_deref(), Some("adf4382"));
        assert_eq!(cli.transport, "dummy");
        match cli.command {
            Commands::Set(args) => {
                assert_eq!(args.freq, Some(12_000_000_000));
                assert_eq!(args.cp_current, Some(7));
                assert_eq!(args.muxout.as_deref(), Some("high"));
                assert!(!args.is_empty());
            }
            _ => panic!("expected set"),
        }
    }

    #[test]
    fn test_parse_register_commands() {
        let cli = Cli::try_parse_from([
            "rfsynth",
            "-t",
            "linux_spi:bus=0,cs=1",
            "update-bits",
            "0x2E",
            "0xF0",
            "0x80",
            "--skip-init",
        ])
        .unwrap();
        assert_eq!(cli.transport, "linux_spi:bus=0,cs=1");
        match cli.command {
            Commands::UpdateBits {
                addr,
                mask,
                value,
                args,
            } => {
                assert_eq!((addr, mask, value), (0x2E, 0xF0, 0x80));
                assert!(args.skip_init);
            }
            _ => panic!("expected update-bits"),
        }
    }
}
