//! Register codec
//!
//! Turns register reads and writes into 3-byte bus transfers. One codec
//! instance serves every chip family; the frame layout and the size of the
//! register map come from the [`ChipProfile`](crate::chip::ChipProfile).
//!
//! Addresses are checked before anything touches the bus, so a bad
//! address never produces bus traffic.

use crate::bus::{BusTransport, FrameLayout, RegisterFrame, FRAME_LEN};
use crate::chip::ChipProfile;
use crate::error::{Error, Result};

/// Register read/write over a [`BusTransport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterCodec {
    layout: FrameLayout,
    max_register: u16,
}

impl RegisterCodec {
    /// Create a codec for a frame layout and register map size
    ///
    /// `max_register` is clamped to what the frame can address.
    pub fn new(layout: FrameLayout, max_register: u16) -> Self {
        Self {
            layout,
            max_register: max_register.min(layout.max_address()),
        }
    }

    /// Codec matching a chip profile
    pub fn for_profile(profile: &ChipProfile) -> Self {
        Self::new(profile.frame, profile.max_register)
    }

    /// Highest valid register address
    pub fn max_register(&self) -> u16 {
        self.max_register
    }

    /// Fail with [`Error::InvalidAddress`] if `addr` is outside the map
    pub fn check_address(&self, addr: u16) -> Result<()> {
        if addr > self.max_register {
            return Err(Error::InvalidAddress {
                addr,
                max: self.max_register,
            });
        }
        Ok(())
    }

    fn exchange<T: BusTransport + ?Sized>(
        &self,
        bus: &mut T,
        frame: RegisterFrame,
    ) -> Result<[u8; FRAME_LEN]> {
        let tx = self.layout.encode(&frame);
        let mut rx = [0u8; FRAME_LEN];
        bus.transfer(&tx, &mut rx).map_err(|fault| Error::Transport {
            addr: frame.addr,
            fault,
        })?;
        Ok(rx)
    }

    /// Read one register
    pub fn read<T: BusTransport + ?Sized>(&self, bus: &mut T, addr: u16) -> Result<u8> {
        self.check_address(addr)?;
        let rx = self.exchange(bus, RegisterFrame::read(addr))?;
        log::trace!("reg 0x{:04X} -> 0x{:02X}", addr, rx[2]);
        Ok(rx[2])
    }

    /// Write one register
    pub fn write<T: BusTransport + ?Sized>(&self, bus: &mut T, addr: u16, value: u8) -> Result<()> {
        self.check_address(addr)?;
        log::trace!("reg 0x{:04X} <- 0x{:02X}", addr, value);
        self.exchange(bus, RegisterFrame::write(addr, value))?;
        Ok(())
    }

    /// Read-modify-write the bits selected by `mask`
    ///
    /// Writes `(old & !mask) | (value & mask)` and returns it. This is two
    /// separate bus transactions; anything else touching the register in
    /// between is lost. Callers sharing a chip must serialize externally.
    pub fn update_bits<T: BusTransport + ?Sized>(
        &self,
        bus: &mut T,
        addr: u16,
        mask: u8,
        value: u8,
    ) -> Result<u8> {
        let old = self.read(bus, addr)?;
        let new = (old & !mask) | (value & mask);
        self.write(bus, addr, new)?;
        Ok(new)
    }
}
