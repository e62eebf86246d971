//! Register field descriptors and the shared interface register

use bitflags::bitflags;

/// Interface configuration register (present at the same address on all
/// supported families)
pub const REG_INTERFACE_CONFIG: u16 = 0x00;

bitflags! {
    /// Interface configuration bits in register 0x00
    ///
    /// Every control bit has a mirrored copy in the low nibble so the
    /// register reads the same whichever bit order the chip assumes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InterfaceConfig: u8 {
        /// Soft reset, mirrored
        const SOFT_RESET_R        = 1 << 0;
        /// LSB first, mirrored
        const LSB_FIRST_R         = 1 << 1;
        /// Address ascension, mirrored
        const ADDRESS_ASCENSION_R = 1 << 2;
        /// SDO active, mirrored
        const SDO_ACTIVE_R        = 1 << 3;
        /// SDO pin drives read data (4-wire mode)
        const SDO_ACTIVE          = 1 << 4;
        /// Multi-byte access ascends instead of descending
        const ADDRESS_ASCENSION   = 1 << 5;
        /// Data is shifted LSB first
        const LSB_FIRST           = 1 << 6;
        /// Soft reset, self-clearing
        const SOFT_RESET          = 1 << 7;

        /// Soft reset command (0x81)
        const RESET = Self::SOFT_RESET.bits() | Self::SOFT_RESET_R.bits();
        /// 4-wire SPI (0x18)
        const FOUR_WIRE = Self::SDO_ACTIVE.bits() | Self::SDO_ACTIVE_R.bits();
        /// LSB-first shifting (0x42)
        const LSB = Self::LSB_FIRST.bits() | Self::LSB_FIRST_R.bits();
    }
}

/// A bit field inside one 8-bit register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Register address
    pub addr: u16,
    /// Position of the least significant bit
    pub shift: u8,
    /// Width in bits (1-8)
    pub width: u8,
}

impl Field {
    /// Describe a field
    pub const fn new(addr: u16, shift: u8, width: u8) -> Self {
        Self { addr, shift, width }
    }

    /// Single-bit field
    pub const fn bit(addr: u16, bit: u8) -> Self {
        Self::new(addr, bit, 1)
    }

    /// Largest value the field can hold
    pub const fn max_value(&self) -> u8 {
        ((1u16 << self.width) - 1) as u8
    }

    /// Register mask covering the field
    pub const fn mask(&self) -> u8 {
        self.max_value() << self.shift
    }

    /// Position `value` inside the register
    pub const fn encode(&self, value: u8) -> u8 {
        (value << self.shift) & self.mask()
    }

    /// Pull the field out of a register value
    pub const fn extract(&self, reg: u8) -> u8 {
        (reg & self.mask()) >> self.shift
    }
}

/// A value spread little-endian over consecutive registers
///
/// The least significant byte lives at `addr`. The topmost register may
/// only be partially used; its other bits belong to unrelated fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WideField {
    /// Address of the least significant byte
    pub addr: u16,
    /// Width in bits (1-32)
    pub width: u8,
}

impl WideField {
    /// Describe a multi-register field
    pub const fn new(addr: u16, width: u8) -> Self {
        Self { addr, width }
    }

    /// Number of registers spanned
    pub const fn len(&self) -> usize {
        (self.width as usize).div_ceil(8)
    }

    /// Largest value the field can hold
    pub const fn max_value(&self) -> u32 {
        if self.width >= 32 {
            u32::MAX
        } else {
            (1u32 << self.width) - 1
        }
    }

    /// Mask of the field bits in the `index`th register
    pub const fn byte_mask(&self, index: usize) -> u8 {
        let used = self.width as usize - index * 8;
        if used >= 8 {
            0xFF
        } else {
            ((1u16 << used) - 1) as u8
        }
    }

    /// `(addr, mask, value)` for each register, lowest address first
    pub fn split(&self, value: u32) -> impl Iterator<Item = (u16, u8, u8)> + '_ {
        (0..self.len()).map(move |i| {
            let mask = self.byte_mask(i);
            (self.addr + i as u16, mask, (value >> (8 * i)) as u8 & mask)
        })
    }

    /// Rebuild the value from register contents, lowest address first
    pub fn assemble(&self, regs: &[u8]) -> u32 {
        regs.iter()
            .take(self.len())
            .enumerate()
            .fold(0u32, |acc, (i, &reg)| {
                acc | (((reg & self.byte_mask(i)) as u32) << (8 * i))
            })
    }
}
