//! 3-byte register command frame
//!
//! ```text
//!  byte0                      byte1           byte2
//! +---+-----------------+   +-------------+   +--------+
//! |R/W| addr[14:8]      |   | addr[7:0]   |   | data   |
//! +---+-----------------+   +-------------+   +--------+
//! ```
//!
//! On a read the chip shifts the register value out during byte2.
//!
//! Other families can move the flag and split the address differently:
//! the low `addr_lo_bits` address bits go in byte1, the rest sit in byte0
//! under `addr_hi_mask`, aligned to the mask's lowest bit.

/// Length of one register frame in bytes
pub const FRAME_LEN: usize = 3;

/// Bit layout of the command frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    /// Bit in byte0 that marks a read
    pub read_flag: u8,
    /// Contiguous bits in byte0 that carry the high address bits
    pub addr_hi_mask: u8,
    /// Number of low address bits carried in byte1 (at most 8)
    pub addr_lo_bits: u8,
}

impl FrameLayout {
    /// Read flag in bit 7, 15-bit address
    pub const STANDARD: Self = Self {
        read_flag: 0x80,
        addr_hi_mask: 0x7F,
        addr_lo_bits: 8,
    };

    const fn hi_shift(&self) -> u32 {
        self.addr_hi_mask.trailing_zeros()
    }

    const fn lo_mask(&self) -> u16 {
        (1u16 << self.addr_lo_bits as u32) - 1
    }

    /// Whether the fields fit in their bytes without overlapping
    pub const fn is_valid(&self) -> bool {
        let hi = self.addr_hi_mask >> (self.hi_shift() % 8);
        self.addr_lo_bits >= 1
            && self.addr_lo_bits <= 8
            && self.read_flag.count_ones() == 1
            && self.read_flag & self.addr_hi_mask == 0
            && hi & hi.wrapping_add(1) == 0
    }

    /// Highest address the frame can carry
    pub const fn max_address(&self) -> u16 {
        let hi = (self.addr_hi_mask as u16) >> self.hi_shift();
        (hi << self.addr_lo_bits as u32) | self.lo_mask()
    }

    /// Encode a frame into wire bytes
    ///
    /// Address bits above [`max_address`](Self::max_address) are dropped;
    /// the codec rejects such addresses before encoding.
    pub fn encode(&self, frame: &RegisterFrame) -> [u8; FRAME_LEN] {
        let hi = frame.addr >> self.addr_lo_bits;
        let mut byte0 = ((hi << self.hi_shift()) as u8) & self.addr_hi_mask;
        if frame.read {
            byte0 |= self.read_flag;
        }
        let byte1 = (frame.addr & self.lo_mask()) as u8;
        let data = if frame.read { 0 } else { frame.data };
        [byte0, byte1, data]
    }

    /// Decode wire bytes as seen by the chip
    pub fn decode(&self, bytes: &[u8; FRAME_LEN]) -> RegisterFrame {
        let hi = ((bytes[0] & self.addr_hi_mask) as u16) >> self.hi_shift();
        RegisterFrame {
            read: bytes[0] & self.read_flag != 0,
            addr: (hi << self.addr_lo_bits) | (bytes[1] as u16 & self.lo_mask()),
            data: bytes[2],
        }
    }
}

/// One decoded register command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterFrame {
    /// Read (true) or write (false)
    pub read: bool,
    /// Register address
    pub addr: u16,
    /// Data byte; ignored by the chip on reads
    pub data: u8,
}

impl RegisterFrame {
    /// Read request for `addr`
    pub const fn read(addr: u16) -> Self {
        Self {
            read: true,
            addr,
            data: 0,
        }
    }

    /// Write request of `data` to `addr`
    pub const fn write(addr: u16, data: u8) -> Self {
        Self {
            read: false,
            addr,
            data,
        }
    }
}
