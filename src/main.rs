//! rfsynth - SPI frequency synthesizer control
//!
//! Brings up ADF4377, ADF4382 and ADF4368 synthesizers over SPI, programs
//! their output frequency and tuning settings, and reads them back.
//!
//! # Architecture
//!
//! The command line picks a chip profile and a bus transport (`dummy` for
//! the in-memory emulator, `linux_spi` for spidev). Each command opens a
//! [`SynthDevice`](rfsynth_core::device::SynthDevice) on the transport,
//! does its work and removes the device again.

mod cli;
mod commands;
mod transports;

use clap::Parser;
use cli::{Cli, Commands};
use commands::register::{self, RegisterTarget};
use rfsynth_core::chip::{find_profile, ChipProfile, PROFILES};
use rfsynth_core::device::SynthConfig;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    // Commands that never touch a chip
    match cli.command {
        Commands::ListChips => {
            commands::list_chips();
            return Ok(());
        }
        Commands::ListTransports => {
            commands::list_transports();
            return Ok(());
        }
        _ => {}
    }

    let (profile, config) = load_config(cli.config.as_deref(), cli.chip.as_deref())?;
    let bus = transports::open_transport(&cli.transport, profile)?;

    match cli.command {
        Commands::Probe => commands::with_device(bus, profile, config, commands::probe::run_probe),
        Commands::ReadReg { addr, args } => {
            if args.skip_init {
                register::with_raw_bus(bus, profile, |t| register::run_read(t, addr))
            } else {
                commands::with_device(bus, profile, config, |dev| {
                    register::run_read(RegisterTarget::Device(dev), addr)
                })
            }
        }
        Commands::WriteReg { addr, value, args } => {
            if args.skip_init {
                register::with_raw_bus(bus, profile, |t| register::run_write(t, addr, value))
            } else {
                commands::with_device(bus, profile, config, |dev| {
                    register::run_write(RegisterTarget::Device(dev), addr, value)
                })
            }
        }
        Commands::UpdateBits {
            addr,
            mask,
            value,
            args,
        } => {
            if args.skip_init {
                register::with_raw_bus(bus, profile, |t| {
                    register::run_update_bits(t, addr, mask, value)
                })
            } else {
                commands::with_device(bus, profile, config, |dev| {
                    register::run_update_bits(RegisterTarget::Device(dev), addr, mask, value)
                })
            }
        }
        Commands::Set(args) => commands::with_device(bus, profile, config, |dev| {
            commands::tune::run_set(dev, &args)
        }),
        Commands::GetFreq => {
            commands::with_device(bus, profile, config, commands::tune::run_get_freq)
        }
        Commands::Status => commands::with_device(bus, profile, config, commands::tune::run_status),
        Commands::ListChips | Commands::ListTransports => Ok(()),
    }
}

/// Resolve the chip profile and configuration from `--config` and `--chip`
///
/// `--chip` fills in for a file without a `chip` key and must agree with it
/// otherwise. Without a config file the family defaults are used.
fn load_config(
    path: Option<&Path>,
    chip: Option<&str>,
) -> Result<(&'static ChipProfile, SynthConfig), Box<dyn std::error::Error>> {
    let chip_profile = match chip {
        Some(name) => Some(find_profile(name).ok_or_else(|| {
            let names: Vec<&str> = PROFILES.iter().map(|p| p.name).collect();
            format!("Unknown chip: {} (supported: {})", name, names.join(", "))
        })?),
        None => None,
    };

    match path {
        Some(path) => {
            let (file_profile, config) = SynthConfig::from_toml_file(path, chip_profile)?;
            log::info!("Loaded configuration from {}", path.display());
            match chip_profile {
                Some(profile) if profile.family != file_profile.family => Err(format!(
                    "--chip {} conflicts with chip {} in {}",
                    profile.name,
                    file_profile.name,
                    path.display()
                )
                .into()),
                _ => Ok((file_profile, config)),
            }
        }
        None => {
            let profile = chip_profile.ok_or("No chip specified. Use --chip or --config")?;
            Ok((profile, SynthConfig::for_profile(profile)))
        }
    }
}
