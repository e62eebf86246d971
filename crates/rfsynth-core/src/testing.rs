//! Array-backed register file used by the unit tests

use crate::bus::{BusBinding, BusTransport, FrameLayout, RegisterFrame, FRAME_LEN};
use crate::chip::{ChipProfile, Identity, InterfaceConfig, REG_INTERFACE_CONFIG};
use crate::error::TransportFault;

pub(crate) struct MockBus {
    pub binding: BusBinding,
    layout: FrameLayout,
    pub identity: Option<Identity>,
    pub regs: [u8; 0x80],
    pub transfers: usize,
    pub last_tx: [u8; FRAME_LEN],
    pub writes: heapless::Vec<RegisterFrame, 128>,
    /// Answer every transfer with zeros, like an unpopulated socket
    pub all_zero: bool,
    /// Fail every transfer from this index on
    pub fail_after: Option<usize>,
    pub released: usize,
    /// Error returned from `release`
    pub release_fault: Option<TransportFault>,
}

impl MockBus {
    pub fn new(profile: &ChipProfile) -> Self {
        let mut bus = Self {
            binding: BusBinding::default(),
            layout: profile.frame,
            identity: profile.identity,
            regs: [0; 0x80],
            transfers: 0,
            last_tx: [0; FRAME_LEN],
            writes: heapless::Vec::new(),
            all_zero: false,
            fail_after: None,
            released: 0,
            release_fault: None,
        };
        bus.power_on();
        bus
    }

    pub fn absent(profile: &ChipProfile) -> Self {
        let mut bus = Self::new(profile);
        bus.all_zero = true;
        bus
    }

    fn power_on(&mut self) {
        self.regs = [0; 0x80];
        if let Some(id) = self.identity {
            self.regs[id.vendor_addr as usize] = id.vendor_id as u8;
            self.regs[id.vendor_addr as usize + 1] = (id.vendor_id >> 8) as u8;
            self.regs[id.chip_type_addr as usize] = id.chip_type;
        }
    }

    fn is_read_only(&self, addr: u16) -> bool {
        self.identity.is_some_and(|id| {
            addr == id.vendor_addr || addr == id.vendor_addr + 1 || addr == id.chip_type_addr
        })
    }

    /// Position of the first write to `addr`
    pub fn first_write_to(&self, addr: u16) -> Option<usize> {
        self.writes.iter().position(|w| w.addr == addr)
    }
}

impl BusTransport for MockBus {
    fn binding(&self) -> &BusBinding {
        &self.binding
    }

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), TransportFault> {
        if tx.len() != rx.len() || tx.len() != FRAME_LEN {
            return Err(TransportFault::LengthMismatch);
        }
        let index = self.transfers;
        self.transfers += 1;
        self.last_tx.copy_from_slice(tx);
        if self.fail_after.is_some_and(|n| index >= n) {
            return Err(TransportFault::Io);
        }

        rx.fill(0);
        if self.all_zero {
            return Ok(());
        }

        let frame = self.layout.decode(&[tx[0], tx[1], tx[2]]);
        let addr = frame.addr as usize;
        if addr >= self.regs.len() {
            return Ok(());
        }
        if frame.read {
            rx[2] = self.regs[addr];
            return Ok(());
        }

        let _ = self.writes.push(frame);
        if frame.addr == REG_INTERFACE_CONFIG
            && InterfaceConfig::from_bits_retain(frame.data).contains(InterfaceConfig::SOFT_RESET)
        {
            self.power_on();
        } else if !self.is_read_only(frame.addr) {
            self.regs[addr] = frame.data;
        }
        Ok(())
    }

    fn delay_us(&mut self, _us: u32) {}

    fn release(&mut self) -> Result<(), TransportFault> {
        self.released += 1;
        self.release_fault.map_or(Ok(()), Err)
    }
}
