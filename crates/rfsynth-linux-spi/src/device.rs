//! Linux SPI device implementation
//!
//! This module provides the `LinuxSpi` struct that implements the
//! `BusTransport` trait using Linux's spidev interface.

use crate::error::{LinuxSpiError, Result};

use rfsynth_core::bus::{BitOrder, BusBinding, BusTransport, SpiMode, DEFAULT_SPEED_HZ};
use rfsynth_core::error::TransportFault;

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;

/// Linux spidev ioctl constants
mod ioctl {
    use nix::ioctl_write_ptr;

    // SPI ioctl magic number
    pub const SPI_IOC_MAGIC: u8 = b'k';

    // SPI ioctl type numbers
    const SPI_IOC_TYPE_MODE: u8 = 1;
    const SPI_IOC_TYPE_LSB_FIRST: u8 = 2;
    const SPI_IOC_TYPE_BITS_PER_WORD: u8 = 3;
    const SPI_IOC_TYPE_MAX_SPEED_HZ: u8 = 4;

    ioctl_write_ptr!(spi_ioc_wr_mode, SPI_IOC_MAGIC, SPI_IOC_TYPE_MODE, u8);
    ioctl_write_ptr!(
        spi_ioc_wr_lsb_first,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_LSB_FIRST,
        u8
    );
    ioctl_write_ptr!(
        spi_ioc_wr_bits_per_word,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_BITS_PER_WORD,
        u8
    );
    ioctl_write_ptr!(
        spi_ioc_wr_max_speed_hz,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_MAX_SPEED_HZ,
        u32
    );

    // SPI_IOC_MESSAGE(n) = _IOW(SPI_IOC_MAGIC, 0, char[n * sizeof(struct spi_ioc_transfer)])

    /// Size of struct spi_ioc_transfer
    pub const SPI_IOC_TRANSFER_SIZE: usize = 32;

    /// Calculate ioctl number for SPI_IOC_MESSAGE(n)
    pub fn spi_ioc_message(n: u8) -> libc::c_ulong {
        let size = (n as usize) * SPI_IOC_TRANSFER_SIZE;
        // _IOC(dir, type, nr, size) = ((dir)<<30)|((size)<<16)|((type)<<8)|(nr), _IOC_WRITE = 1
        ((1u32 << 30) | ((size as u32) << 16) | ((SPI_IOC_MAGIC as u32) << 8)) as libc::c_ulong
    }
}

/// SPI transfer structure for ioctl
/// This must match the kernel's struct spi_ioc_transfer layout
#[repr(C)]
#[derive(Debug, Default, Clone)]
struct SpiIocTransfer {
    tx_buf: u64,          // __u64 tx_buf
    rx_buf: u64,          // __u64 rx_buf
    len: u32,             // __u32 len
    speed_hz: u32,        // __u32 speed_hz
    delay_usecs: u16,     // __u16 delay_usecs
    bits_per_word: u8,    // __u8 bits_per_word
    cs_change: u8,        // __u8 cs_change
    tx_nbits: u8,         // __u8 tx_nbits
    rx_nbits: u8,         // __u8 rx_nbits
    word_delay_usecs: u8, // __u8 word_delay_usecs
    _pad: u8,             // padding
}

/// Configuration for opening a Linux SPI device
#[derive(Debug, Clone, Default)]
pub struct LinuxSpiConfig {
    /// Device path (e.g., "/dev/spidev0.0")
    pub device: String,
    /// Bus number, chip select, clock, mode and bit order
    pub binding: BusBinding,
}

impl LinuxSpiConfig {
    /// Create a new configuration with the given device path
    ///
    /// Bus and chip select numbers are taken from a `spidevX.Y` file name
    /// when present.
    pub fn new(device: impl Into<String>) -> Self {
        let device = device.into();
        let (bus, cs) = parse_spidev_path(&device).unwrap_or((0, 0));
        Self {
            device,
            binding: BusBinding::new(bus, cs),
        }
    }

    /// Configuration for `/dev/spidev<bus>.<chip_select>`
    pub fn for_bus(bus: u8, chip_select: u8) -> Self {
        Self {
            device: format!("/dev/spidev{}.{}", bus, chip_select),
            binding: BusBinding::new(bus, chip_select),
        }
    }

    /// Set the SPI clock speed in Hz
    pub fn with_speed(mut self, speed_hz: u32) -> Self {
        self.binding.speed_hz = speed_hz;
        self
    }

    /// Set the SPI mode
    pub fn with_mode(mut self, mode: SpiMode) -> Self {
        self.binding.mode = mode;
        self
    }

    /// Set the bit order
    pub fn with_bit_order(mut self, bit_order: BitOrder) -> Self {
        self.binding.bit_order = bit_order;
        self
    }
}

/// Bus and chip select from a `/dev/spidevX.Y` path
fn parse_spidev_path(path: &str) -> Option<(u8, u8)> {
    let name = path.rsplit('/').next()?;
    let (bus, cs) = name.strip_prefix("spidev")?.split_once('.')?;
    Some((bus.parse().ok()?, cs.parse().ok()?))
}

/// Map an OS error from the transfer ioctl onto a transport fault
fn fault_from_io(err: &std::io::Error) -> TransportFault {
    match err.raw_os_error() {
        Some(libc::ETIMEDOUT) => TransportFault::Timeout,
        Some(libc::ENODEV) | Some(libc::ENXIO) | Some(libc::ESHUTDOWN) => {
            TransportFault::Disconnected
        }
        _ => TransportFault::Io,
    }
}

/// Synthesizer bus transport using the spidev interface
///
/// Each register access is one full-duplex `SPI_IOC_MESSAGE(1)` so chip
/// select stays asserted for the whole frame.
pub struct LinuxSpi {
    /// File handle for spidev device, dropped on release
    file: Option<File>,
    /// Parameters the device was opened with
    binding: BusBinding,
    /// Device path, kept for log messages
    device: String,
}

impl LinuxSpi {
    /// Open a Linux SPI device with the given configuration
    pub fn open(config: &LinuxSpiConfig) -> Result<Self> {
        if config.device.is_empty() {
            return Err(LinuxSpiError::NoDevice);
        }

        log::debug!("linux_spi: Opening device {}", config.device);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.device)
            .map_err(|e| LinuxSpiError::OpenFailed {
                path: config.device.clone(),
                source: e,
            })?;

        let fd = file.as_raw_fd();
        let binding = config.binding;

        let setup = |setting: &'static str, value: u32| {
            let path = config.device.clone();
            move |source: nix::Error| LinuxSpiError::Setup {
                path,
                setting,
                value,
                source,
            }
        };

        let mode = binding.mode.as_u8();
        unsafe {
            ioctl::spi_ioc_wr_mode(fd, &mode).map_err(setup("mode", u32::from(mode)))?;
        }

        let lsb_first = u8::from(binding.bit_order == BitOrder::LsbFirst);
        unsafe {
            ioctl::spi_ioc_wr_lsb_first(fd, &lsb_first)
                .map_err(setup("lsb_first", u32::from(lsb_first)))?;
        }

        // Register frames are byte streams
        let bits: u8 = 8;
        unsafe {
            ioctl::spi_ioc_wr_bits_per_word(fd, &bits)
                .map_err(setup("bits_per_word", u32::from(bits)))?;
        }

        let speed = binding.speed_hz;
        unsafe {
            ioctl::spi_ioc_wr_max_speed_hz(fd, &speed).map_err(setup("max_speed_hz", speed))?;
        }

        log::info!(
            "linux_spi: Opened {} (mode={}, speed={} kHz{})",
            config.device,
            mode,
            speed / 1000,
            if lsb_first != 0 { ", lsb-first" } else { "" }
        );

        Ok(Self {
            file: Some(file),
            binding,
            device: config.device.clone(),
        })
    }
}

impl BusTransport for LinuxSpi {
    fn binding(&self) -> &BusBinding {
        &self.binding
    }

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> core::result::Result<(), TransportFault> {
        let Some(file) = self.file.as_ref() else {
            return Err(TransportFault::Disconnected);
        };
        if tx.len() != rx.len() || tx.is_empty() {
            return Err(TransportFault::LengthMismatch);
        }

        let transfer = SpiIocTransfer {
            tx_buf: tx.as_ptr() as u64,
            rx_buf: rx.as_mut_ptr() as u64,
            len: tx.len() as u32,
            speed_hz: self.binding.speed_hz,
            bits_per_word: 8,
            ..Default::default()
        };

        let ioctl_num = ioctl::spi_ioc_message(1);
        let ret = unsafe { libc::ioctl(file.as_raw_fd(), ioctl_num, &transfer as *const SpiIocTransfer) };

        if ret < 0 {
            let err = std::io::Error::last_os_error();
            log::debug!("linux_spi: Transfer on {} failed: {}", self.device, err);
            return Err(fault_from_io(&err));
        }
        if ret as usize != tx.len() {
            log::debug!(
                "linux_spi: Short transfer on {}: {} of {} bytes",
                self.device,
                ret,
                tx.len()
            );
            return Err(TransportFault::LengthMismatch);
        }

        Ok(())
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(std::time::Duration::from_micros(us as u64));
    }

    fn release(&mut self) -> core::result::Result<(), TransportFault> {
        if self.file.take().is_some() {
            log::debug!("linux_spi: Closed {}", self.device);
        }
        Ok(())
    }
}

/// Parse transport options from a list of key-value pairs
///
/// Recognized keys: `dev`, `bus`, `cs`, `spispeed` (kHz), `mode` (0-3)
/// and `lsb` (`0`/`1`).
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<LinuxSpiConfig, String> {
    let mut device = None;
    let mut bus = None;
    let mut cs = None;
    let mut speed_hz = DEFAULT_SPEED_HZ;
    let mut mode = SpiMode::Mode0;
    let mut bit_order = BitOrder::MsbFirst;

    for (key, value) in options {
        match *key {
            "dev" => {
                device = Some(value.to_string());
            }
            "bus" => {
                bus = Some(
                    value
                        .parse::<u8>()
                        .map_err(|_| format!("Invalid bus value: {}", value))?,
                );
            }
            "cs" => {
                cs = Some(
                    value
                        .parse::<u8>()
                        .map_err(|_| format!("Invalid cs value: {}", value))?,
                );
            }
            "spispeed" => {
                // Parse speed in kHz
                let speed_khz: u32 = value
                    .parse()
                    .map_err(|_| format!("Invalid spispeed value: {}", value))?;
                speed_hz = speed_khz
                    .checked_mul(1000)
                    .filter(|&hz| hz > 0)
                    .ok_or_else(|| format!("Invalid spispeed value: {}", value))?;
            }
            "mode" => {
                mode = value
                    .parse::<u8>()
                    .ok()
                    .and_then(SpiMode::from_u8)
                    .ok_or_else(|| format!("Invalid SPI mode: {} (must be 0-3)", value))?;
            }
            "lsb" => {
                bit_order = match *value {
                    "1" | "true" | "yes" => BitOrder::LsbFirst,
                    "0" | "false" | "no" => BitOrder::MsbFirst,
                    _ => return Err(format!("Invalid lsb value: {}", value)),
                };
            }
            _ => {
                log::warn!("linux_spi: Unknown option: {}={}", key, value);
            }
        }
    }

    let config = match (device, bus, cs) {
        (Some(device), None, None) => LinuxSpiConfig::new(device),
        (None, Some(bus), cs) => LinuxSpiConfig::for_bus(bus, cs.unwrap_or(0)),
        (Some(_), _, _) => return Err("Use either dev= or bus=/cs=, not both".to_string()),
        (None, None, _) => {
            return Err("No device specified. Use dev=/dev/spidevX.Y or bus=X,cs=Y".to_string())
        }
    };

    Ok(config
        .with_speed(speed_hz)
        .with_mode(mode)
        .with_bit_order(bit_order))
}
