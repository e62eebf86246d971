//! rfsynth-dummy - In-memory synthesizer emulator for testing
//!
//! This crate provides a dummy bus transport that emulates the register
//! file of a synthesizer chip. It's useful for testing and development
//! without real hardware.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::vec;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use rfsynth_core::bus::{BusBinding, BusTransport, FRAME_LEN};
use rfsynth_core::chip::{ChipProfile, InterfaceConfig, REG_INTERFACE_CONFIG};
use rfsynth_core::error::TransportFault;

/// Configuration for the dummy synthesizer
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Bus parameters reported by the transport
    pub binding: BusBinding,
    /// Report PLL lock once N has been written
    pub locks: bool,
    /// Answer every transfer with zeros, as if no chip were fitted
    pub absent: bool,
    /// Fail every transfer from this index on
    pub fail_after: Option<usize>,
    /// Vendor ID presented after reset (defaults to the profile's)
    pub vendor_id: Option<u16>,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            binding: BusBinding::default(),
            locks: true,
            absent: false,
            fail_after: None,
            vendor_id: None,
        }
    }
}

/// Dummy synthesizer
///
/// Decodes register frames with the profile's frame layout and keeps a
/// register file in memory.
#[cfg(feature = "alloc")]
pub struct DummySynth {
    profile: &'static ChipProfile,
    config: DummyConfig,
    regs: Vec<u8>,
    transfers: usize,
    released: bool,
}

#[cfg(feature = "alloc")]
impl DummySynth {
    /// Create a new dummy synthesizer with the given configuration
    pub fn new(profile: &'static ChipProfile, config: DummyConfig) -> Self {
        let mut synth = Self {
            profile,
            config,
            regs: vec![0; profile.max_register as usize + 1],
            transfers: 0,
            released: false,
        };
        synth.power_on();
        synth
    }

    /// Create a dummy synthesizer with default configuration
    pub fn new_default(profile: &'static ChipProfile) -> Self {
        Self::new(profile, DummyConfig::default())
    }

    /// Create a dummy that behaves like an empty socket
    pub fn absent(profile: &'static ChipProfile) -> Self {
        Self::new(
            profile,
            DummyConfig {
                absent: true,
                ..Default::default()
            },
        )
    }

    /// Number of transfers attempted so far
    pub fn transfers(&self) -> usize {
        self.transfers
    }

    /// Whether the transport has been released
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Fail every transfer from `index` on
    pub fn fail_after(&mut self, index: usize) {
        self.config.fail_after = Some(index);
    }

    fn power_on(&mut self) {
        self.regs.fill(0);
        if let Some(id) = self.profile.identity {
            let vendor = self.config.vendor_id.unwrap_or(id.vendor_id).to_le_bytes();
            self.set(id.vendor_addr, vendor[0]);
            self.set(id.vendor_addr + 1, vendor[1]);
            self.set(id.chip_type_addr, id.chip_type);
        }
    }

    fn set(&mut self, addr: u16, value: u8) {
        if let Some(reg) = self.regs.get_mut(addr as usize) {
            *reg = value;
        }
    }

    fn is_read_only(&self, addr: u16) -> bool {
        if addr == self.profile.map.lock_status.addr {
            return true;
        }
        self.profile.identity.is_some_and(|id| {
            addr == id.vendor_addr || addr == id.vendor_addr + 1 || addr == id.chip_type_addr
        })
    }

    fn handle_write(&mut self, addr: u16, data: u8) {
        if addr == REG_INTERFACE_CONFIG
            && InterfaceConfig::from_bits_retain(data).contains(InterfaceConfig::SOFT_RESET)
        {
            log::debug!("dummy: soft reset");
            self.power_on();
            return;
        }
        if self.is_read_only(addr) {
            log::debug!("dummy: ignoring write to read-only register 0x{:04X}", addr);
            return;
        }
        self.set(addr, data);

        // Writing the N_INT low byte latches the new divider
        if addr == self.profile.map.n_int.addr && self.config.locks {
            let lock = self.profile.map.lock_status;
            let reg = self.regs[lock.addr as usize];
            self.regs[lock.addr as usize] = (reg & !lock.mask()) | lock.encode(1);
        }
    }
}

#[cfg(feature = "alloc")]
impl BusTransport for DummySynth {
    fn binding(&self) -> &BusBinding {
        &self.config.binding
    }

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), TransportFault> {
        if self.released {
            return Err(TransportFault::Disconnected);
        }
        if tx.len() != rx.len() {
            return Err(TransportFault::LengthMismatch);
        }

        let index = self.transfers;
        self.transfers += 1;
        if self.config.fail_after.is_some_and(|n| index >= n) {
            return Err(TransportFault::Io);
        }

        rx.fill(0);
        if self.config.absent || tx.len() != FRAME_LEN {
            return Ok(());
        }

        let frame = self.profile.frame.decode(&[tx[0], tx[1], tx[2]]);
        if frame.addr > self.profile.max_register {
            log::warn!("dummy: access to unimplemented register 0x{:04X}", frame.addr);
            return Ok(());
        }

        if frame.read {
            rx[2] = self.regs[frame.addr as usize];
        } else {
            self.handle_write(frame.addr, frame.data);
        }
        Ok(())
    }

    fn delay_us(&mut self, _us: u32) {
        // No delay needed for in-memory operations
    }

    fn release(&mut self) -> Result<(), TransportFault> {
        self.released = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfsynth_core::chip::{Muxout, ADF4368, ADF4377, ADF4382, PROFILES};
    use rfsynth_core::codec::RegisterCodec;
    use rfsynth_core::device::{self, DeviceState, Parameter, SynthConfig, SynthDevice};
    use rfsynth_core::Error;

    #[test]
    fn test_identity_after_reset() {
        let mut synth = DummySynth::new_default(&ADF4382);
        let codec = RegisterCodec::for_profile(&ADF4382);
        codec.write(&mut synth, 0x0C, 0xFF).unwrap();
        assert_eq!(codec.read(&mut synth, 0x0C).unwrap(), 0x56);
        assert_eq!(codec.read(&mut synth, 0x0D).unwrap(), 0x04);
        codec.write(&mut synth, 0x20, 0x41).unwrap();
        codec.write(&mut synth, 0x00, 0x81).unwrap();
        assert_eq!(codec.read(&mut synth, 0x20).unwrap(), 0x00);
    }

    #[test]
    fn test_every_family_comes_up() {
        for &profile in PROFILES {
            let mut synth = DummySynth::new_default(profile);
            let config = SynthConfig::for_profile(profile);
            let mut dev = device::open(&mut synth, profile, config).unwrap();
            assert_eq!(dev.state(), DeviceState::Active);
            assert_eq!(dev.get_output_frequency().unwrap(), config.freq_hz);
            assert!(dev.read_status().unwrap().locked);
            dev.remove().unwrap();
            assert!(synth.is_released());
        }
    }

    #[test]
    fn test_ten_gigahertz_scenario() {
        let mut synth = DummySynth::new_default(&ADF4377);
        let config = SynthConfig::for_profile(&ADF4377)
            .with_reference(125_000_000, true, 1)
            .with_frequency(10_000_000_000);
        let mut dev = device::open(&mut synth, &ADF4377, config).unwrap();
        let settings = dev.read_divider_settings().unwrap();
        assert_eq!(config.reference().pfd_hz(), 250_000_000);
        assert_eq!(settings.n_int, 40);
        assert_eq!(settings.frac, 0);
        assert_eq!(settings.output_divider, 1);
        assert_eq!(dev.get_output_frequency().unwrap(), 10_000_000_000);
    }

    #[test]
    fn test_absent_chip() {
        let mut synth = DummySynth::absent(&ADF4368);
        let mut dev = SynthDevice::new(&ADF4368, SynthConfig::for_profile(&ADF4368));
        assert!(matches!(
            dev.init(&mut synth),
            Err(Error::DeviceNotResponding {
                expected: 0x5A,
                actual: 0x00,
                ..
            })
        ));
        assert_ne!(dev.state(), DeviceState::Active);
        dev.remove().unwrap();
        assert!(matches!(
            dev.remove(),
            Err(Error::InvalidState {
                state: DeviceState::Removed,
                ..
            })
        ));
    }

    #[test]
    fn test_wrong_vendor() {
        let mut synth = DummySynth::new(
            &ADF4377,
            DummyConfig {
                vendor_id: Some(0x0000),
                ..Default::default()
            },
        );
        assert!(matches!(
            device::open(&mut synth, &ADF4377, SynthConfig::for_profile(&ADF4377)),
            Err(Error::DeviceNotResponding { addr: 0x0C, .. })
        ));
        assert!(synth.is_released());
    }

    #[test]
    fn test_rejections_have_no_bus_traffic() {
        let mut synth = DummySynth::new_default(&ADF4377);
        let mut dev =
            device::open(&mut synth, &ADF4377, SynthConfig::for_profile(&ADF4377)).unwrap();
        let before = dev.transport().map(|s| s.transfers());

        assert!(matches!(
            dev.set_parameter(Parameter::ChargePumpCurrent(16)),
            Err(Error::ConfigOutOfRange { value: 16, max: 15, .. })
        ));
        assert!(matches!(
            dev.read_register(0x55),
            Err(Error::InvalidAddress { addr: 0x55, max: 0x54 })
        ));
        assert!(matches!(
            dev.set_output_frequency(10_000_100_000),
            Err(Error::UnsupportedFractionalRatio { .. })
        ));
        assert_eq!(dev.transport().map(|s| s.transfers()), before);
    }

    #[test]
    fn test_fractional_round_trip() {
        let mut synth = DummySynth::new_default(&ADF4382);
        let mut dev =
            device::open(&mut synth, &ADF4382, SynthConfig::for_profile(&ADF4382)).unwrap();
        for target in [687_500_000u64, 5_000_000_003, 14_999_999_999, 22_000_000_000] {
            dev.set_output_frequency(target).unwrap();
            let got = dev.get_output_frequency().unwrap();
            // f_PFD / 2^25 at 250 MHz is under 8 Hz
            assert!(target >= got && target - got <= 8, "{} -> {}", target, got);
        }
    }

    #[test]
    fn test_muxout_and_update_bits() {
        let mut synth = DummySynth::new_default(&ADF4377);
        let mut dev =
            device::open(&mut synth, &ADF4377, SynthConfig::for_profile(&ADF4377)).unwrap();
        dev.set_parameter(Parameter::Muxout(Muxout::High)).unwrap();
        assert_eq!(dev.read_register(0x1D).unwrap() & 0xF0, 0x80);
        let old = dev.read_register(0x1D).unwrap();
        let new = dev.update_register_bits(0x1D, 0x0F, 0x0A).unwrap();
        assert_eq!(new, (old & !0x0F) | 0x0A);
        assert_eq!(dev.read_register(0x1D).unwrap(), new);
    }

    #[test]
    fn test_transport_failure_mid_update() {
        let config = SynthConfig::for_profile(&ADF4382);
        let mut synth = DummySynth::new_default(&ADF4382);
        device::open(&mut synth, &ADF4382, config).unwrap();
        let init_transfers = synth.transfers();

        let mut synth = DummySynth::new_default(&ADF4382);
        synth.fail_after(init_transfers + 2);
        let mut dev = device::open(&mut synth, &ADF4382, config).unwrap();
        assert!(matches!(
            dev.set_output_frequency(12_000_000_000),
            Err(Error::Transport { .. })
        ));
        assert_eq!(dev.settings().freq_hz, None);
        assert_eq!(dev.state(), DeviceState::Active);
        dev.remove().unwrap();
        assert!(synth.is_released());
    }
}
