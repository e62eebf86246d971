//! rfsynth-core - Core library for SPI frequency synthesizer control
//!
//! This crate drives ADF4377, ADF4382 and ADF4368 class PLL/VCO
//! synthesizers over a 3-byte register protocol. It is designed to be
//! `no_std` compatible so the same code can run on a microcontroller or
//! on a Linux host with spidev.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`), TOML
//!   configuration files and `std::error::Error` impls
//! - `alloc` - Enable boxed transports
//!
//! # Example
//!
//! ```ignore
//! use rfsynth_core::chip::ADF4382;
//! use rfsynth_core::device::{self, SynthConfig};
//!
//! fn bring_up<T: rfsynth_core::bus::BusTransport>(bus: T) -> rfsynth_core::Result<()> {
//!     let config = SynthConfig::for_profile(&ADF4382);
//!     let mut dev = device::open(bus, &ADF4382, config)?;
//!     dev.set_output_frequency(12_000_000_000)?;
//!     println!("RF out: {} Hz", dev.get_output_frequency()?);
//!     dev.remove()
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod bus;
pub mod chip;
pub mod codec;
pub mod device;
pub mod error;
pub mod freq;

#[cfg(test)]
mod testing;

pub use error::{Error, Result, TransportFault};
