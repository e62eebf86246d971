//! Bus transport abstraction
//!
//! A synthesizer hangs off one chip select of a SPI controller. The core
//! only needs a single synchronous full-duplex transfer primitive from
//! the controller; everything else (framing, addressing) lives in
//! [`crate::codec`].

mod frame;

pub use frame::{FrameLayout, RegisterFrame, FRAME_LEN};

use crate::error::TransportFault;

/// SPI clock mode (CPOL/CPHA)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpiMode {
    /// CPOL=0, CPHA=0
    #[default]
    Mode0,
    /// CPOL=0, CPHA=1
    Mode1,
    /// CPOL=1, CPHA=0
    Mode2,
    /// CPOL=1, CPHA=1
    Mode3,
}

impl SpiMode {
    /// Build from the numeric mode (0-3)
    pub fn from_u8(mode: u8) -> Option<Self> {
        match mode {
            0 => Some(Self::Mode0),
            1 => Some(Self::Mode1),
            2 => Some(Self::Mode2),
            3 => Some(Self::Mode3),
            _ => None,
        }
    }

    /// Numeric mode as used by spidev
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Mode0 => 0,
            Self::Mode1 => 1,
            Self::Mode2 => 2,
            Self::Mode3 => 3,
        }
    }
}

/// Bit order on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BitOrder {
    /// Most significant bit first
    #[default]
    MsbFirst,
    /// Least significant bit first
    LsbFirst,
}

/// Default SPI clock for all supported synthesizers (1.5 MHz)
pub const DEFAULT_SPEED_HZ: u32 = 1_500_000;

/// Where a chip lives on the bus and how to clock it
///
/// Fixed once the transport is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusBinding {
    /// Bus (controller) index
    pub bus: u8,
    /// Chip select index on that bus
    pub chip_select: u8,
    /// Clock rate in Hz
    pub speed_hz: u32,
    /// Clock polarity/phase
    pub mode: SpiMode,
    /// Bit order
    pub bit_order: BitOrder,
}

impl BusBinding {
    /// Binding with default clocking (1.5 MHz, mode 0, MSB first)
    pub const fn new(bus: u8, chip_select: u8) -> Self {
        Self {
            bus,
            chip_select,
            speed_hz: DEFAULT_SPEED_HZ,
            mode: SpiMode::Mode0,
            bit_order: BitOrder::MsbFirst,
        }
    }

    /// Set the clock rate in Hz
    pub fn with_speed(mut self, speed_hz: u32) -> Self {
        self.speed_hz = speed_hz;
        self
    }

    /// Set the clock mode
    pub fn with_mode(mut self, mode: SpiMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the bit order
    pub fn with_bit_order(mut self, bit_order: BitOrder) -> Self {
        self.bit_order = bit_order;
        self
    }
}

impl Default for BusBinding {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

/// Synchronous full-duplex bus transport
///
/// Implementations clock `tx` out while clocking the same number of bytes
/// into `rx`, with chip select asserted for the whole transfer. No retry,
/// no timeout policy: failures are reported as-is.
pub trait BusTransport {
    /// Bus parameters this transport was opened with
    fn binding(&self) -> &BusBinding;

    /// Perform one transfer; `tx` and `rx` have equal length
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), TransportFault>;

    /// Delay for the specified number of microseconds
    fn delay_us(&mut self, us: u32);

    /// Give the bus back to the system
    ///
    /// Called exactly once when the owning device is removed.
    fn release(&mut self) -> Result<(), TransportFault> {
        Ok(())
    }
}

impl<T: BusTransport + ?Sized> BusTransport for &mut T {
    fn binding(&self) -> &BusBinding {
        (**self).binding()
    }

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), TransportFault> {
        (**self).transfer(tx, rx)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }

    fn release(&mut self) -> Result<(), TransportFault> {
        (**self).release()
    }
}

/// Blanket implementation for boxed transports
///
/// Lets the CLI pick a transport at runtime and hand a
/// `Box<dyn BusTransport + Send>` to the device.
#[cfg(feature = "alloc")]
impl BusTransport for alloc::boxed::Box<dyn BusTransport + Send> {
    fn binding(&self) -> &BusBinding {
        (**self).binding()
    }

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), TransportFault> {
        (**self).transfer(tx, rx)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }

    fn release(&mut self) -> Result<(), TransportFault> {
        (**self).release()
    }
}
