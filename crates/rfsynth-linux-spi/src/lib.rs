//! rfsynth-linux-spi - Linux spidev transport
//!
//! This crate connects a synthesizer on a Linux SPI controller through the
//! `/dev/spidevX.Y` device interface.
//!
//! # Overview
//!
//! The Linux SPI driver exposes SPI controllers through character devices
//! at `/dev/spidevX.Y` where X is the bus number and Y is the chip select.
//!
//! # Example
//!
//! ```no_run
//! use rfsynth_core::chip::ADF4382;
//! use rfsynth_core::device::{self, SynthConfig};
//! use rfsynth_linux_spi::{LinuxSpi, LinuxSpiConfig};
//!
//! // Open with default settings (1.5 MHz, mode 0)
//! let spi = LinuxSpi::open(&LinuxSpiConfig::for_bus(0, 0))?;
//!
//! let mut synth = device::open(spi, &ADF4382, SynthConfig::for_profile(&ADF4382))?;
//! synth.set_output_frequency(12_000_000_000)?;
//! synth.remove()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with rfsynth CLI
//!
//! ```bash
//! # Probe a chip on bus 0, chip select 1
//! rfsynth -t linux_spi:bus=0,cs=1 -c adf4382 probe
//!
//! # Specify SPI speed in kHz
//! rfsynth -t linux_spi:dev=/dev/spidev0.0,spispeed=1000 -c adf4377 status
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with spidev support enabled (`CONFIG_SPI_SPIDEV`)
//! - Read/write access to `/dev/spidevX.Y` device

pub mod device;
pub mod error;

// Re-exports
pub use device::{parse_options, LinuxSpi, LinuxSpiConfig};
pub use error::{LinuxSpiError, Result};
