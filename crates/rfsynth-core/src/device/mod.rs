//! Synthesizer device handle
//!
//! [`SynthDevice`] owns the bus transport for one chip and walks it
//! through its lifecycle:
//!
//! 1. [`SynthDevice::new`] - nothing attached (`Uninitialized`)
//! 2. [`SynthDevice::init`] - take the bus (`Bound`), soft reset and set the
//!    SPI interface mode (`Configured`), run the scratchpad and identity
//!    checks (`Verified`), then program the reference path and the
//!    initial frequency (`Active`)
//! 3. [`SynthDevice::remove`] - release the bus (`Removed`)
//!
//! The device is single-threaded and blocking. Register accesses are not
//! atomic with respect to other masters on the same chip.

mod config;
#[cfg(feature = "std")]
mod config_file;
mod state;

pub use config::{SynthConfig, WireMode};
pub use state::DeviceState;
#[cfg(feature = "std")]
pub use config_file::{parse_frequency, ConfigFileError};

use crate::bus::{BitOrder, BusTransport};
use crate::chip::{
    ChipProfile, Field, InterfaceConfig, Muxout, VerifyStage, WideField, REG_INTERFACE_CONFIG,
};
use crate::codec::RegisterCodec;
use crate::error::{Error, Result};
use crate::freq::{
    self, check_range, compute_divider_plan, DividerSettings, FrequencyPlan, Reference,
    RegisterUpdate,
};

/// A runtime-tunable setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    /// Output frequency in Hz
    Frequency(u64),
    /// Charge pump current code
    ChargePumpCurrent(u8),
    /// Bleed current word
    BleedWord(u16),
    /// Output phase adjust word
    PhaseAdjust(u8),
    /// MUXOUT function
    Muxout(Muxout),
    /// Lock detect count
    LockDetectCount(u8),
    /// Reference doubler on/off; reprograms the current frequency
    ReferenceDoubler(bool),
    /// Reference divider R; reprograms the current frequency
    ReferenceDivider(u8),
}

/// Settings the device believes the chip holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Reference path
    pub reference: Reference,
    /// Programmed output frequency; `None` after an interrupted update
    pub freq_hz: Option<u64>,
    /// Charge pump current code
    pub cp_current: u8,
    /// Bleed current word
    pub bleed_word: Option<u16>,
    /// Lock detect count
    pub ld_count: Option<u8>,
    /// Output phase adjust
    pub phase_adjust: Option<u8>,
    /// MUXOUT function
    pub muxout: Muxout,
}

impl From<&SynthConfig> for Settings {
    fn from(config: &SynthConfig) -> Self {
        Self {
            reference: config.reference(),
            freq_hz: None,
            cp_current: config.cp_current,
            bleed_word: config.bleed_word,
            ld_count: config.ld_count,
            phase_adjust: config.phase_adjust,
            muxout: config.muxout,
        }
    }
}

/// Snapshot returned by [`SynthDevice::read_status`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    /// Lifecycle state
    pub state: DeviceState,
    /// Digital lock detect
    pub locked: bool,
}

/// Handle to one synthesizer chip
pub struct SynthDevice<T: BusTransport> {
    profile: &'static ChipProfile,
    codec: RegisterCodec,
    config: SynthConfig,
    bus: Option<T>,
    state: DeviceState,
    settings: Settings,
}

impl<T: BusTransport> SynthDevice<T> {
    /// Create an unbound device
    pub fn new(profile: &'static ChipProfile, config: SynthConfig) -> Self {
        Self {
            profile,
            codec: RegisterCodec::for_profile(profile),
            settings: Settings::from(&config),
            config,
            bus: None,
            state: DeviceState::Uninitialized,
        }
    }

    /// Chip profile
    pub fn profile(&self) -> &'static ChipProfile {
        self.profile
    }

    /// Configuration given at construction
    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// Current lifecycle state
    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// Cached settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Reference input frequency
    pub fn reference_hz(&self) -> u64 {
        self.settings.reference.freq_hz
    }

    /// Attached transport, if any
    pub fn transport(&self) -> Option<&T> {
        self.bus.as_ref()
    }

    fn set_state(&mut self, state: DeviceState) {
        log::debug!("{}: {} -> {}", self.profile.name, self.state, state);
        self.state = state;
    }

    fn require(&self, state: DeviceState, operation: &'static str) -> Result<()> {
        if self.state != state {
            return Err(Error::InvalidState {
                state: self.state,
                operation,
            });
        }
        Ok(())
    }

    fn bus_mut(&mut self, operation: &'static str) -> Result<&mut T> {
        let state = self.state;
        self.bus
            .as_mut()
            .ok_or(Error::InvalidState { state, operation })
    }

    fn read(&mut self, addr: u16) -> Result<u8> {
        let codec = self.codec;
        codec.read(self.bus_mut("read register")?, addr)
    }

    fn write(&mut self, addr: u16, value: u8) -> Result<()> {
        let codec = self.codec;
        codec.write(self.bus_mut("write register")?, addr, value)
    }

    fn update_bits(&mut self, addr: u16, mask: u8, value: u8) -> Result<u8> {
        let codec = self.codec;
        codec.update_bits(self.bus_mut("update register")?, addr, mask, value)
    }

    fn write_field(&mut self, field: Field, value: u8) -> Result<()> {
        if field.mask() == 0xFF {
            self.write(field.addr, value)
        } else {
            self.update_bits(field.addr, field.mask(), field.encode(value))
                .map(|_| ())
        }
    }

    fn write_wide(&mut self, field: WideField, value: u32) -> Result<()> {
        for (addr, mask, byte) in field.split(value) {
            self.apply(&RegisterUpdate {
                addr,
                mask,
                value: byte,
            })?;
        }
        Ok(())
    }

    fn apply(&mut self, update: &RegisterUpdate) -> Result<()> {
        if update.is_full() {
            self.write(update.addr, update.value)
        } else {
            self.update_bits(update.addr, update.mask, update.value)
                .map(|_| ())
        }
    }

    /// Attach the bus and bring the chip up
    ///
    /// Configuration is validated before any bus traffic. On failure the
    /// device keeps the bus and stays in the state it reached; call
    /// [`remove`](Self::remove) to release it.
    pub fn init(&mut self, bus: T) -> Result<()> {
        self.require(DeviceState::Uninitialized, "init")?;
        log::debug!(
            "{}: binding to bus {} cs {} ({} Hz, mode {})",
            self.profile.name,
            bus.binding().bus,
            bus.binding().chip_select,
            bus.binding().speed_hz,
            bus.binding().mode.as_u8()
        );
        let lsb_first = bus.binding().bit_order == BitOrder::LsbFirst;
        self.bus = Some(bus);
        self.set_state(DeviceState::Bound);

        if lsb_first && !self.profile.lsb_first {
            return Err(Error::Unsupported {
                parameter: "lsb_first",
            });
        }
        let plan = self.config.validate(self.profile)?;

        self.reset()?;
        self.write_interface_config(lsb_first)?;
        self.set_state(DeviceState::Configured);

        if self.profile.verify_stage == VerifyStage::AfterReset {
            self.verify()?;
        }
        self.write_defaults()?;
        if self.profile.verify_stage == VerifyStage::AfterDefaults {
            self.verify()?;
        }
        self.set_state(DeviceState::Verified);

        let reference = self.config.reference();
        self.program_reference(&reference)?;
        self.program_frequency(&plan)?;
        self.set_state(DeviceState::Active);

        log::info!(
            "{}: active at {} Hz (ref {} Hz{}, R={})",
            self.profile.name,
            plan.target_hz,
            reference.freq_hz,
            if reference.doubler { " x2" } else { "" },
            reference.divider
        );
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.write(REG_INTERFACE_CONFIG, InterfaceConfig::RESET.bits())?;
        let delay = self.profile.por_delay_us;
        self.bus_mut("reset")?.delay_us(delay);
        Ok(())
    }

    fn write_interface_config(&mut self, lsb_first: bool) -> Result<()> {
        let mut bits = InterfaceConfig::empty();
        if self.config.wire_mode == WireMode::FourWire {
            bits |= InterfaceConfig::FOUR_WIRE;
        }
        if lsb_first {
            bits |= InterfaceConfig::LSB;
        }
        self.write(REG_INTERFACE_CONFIG, bits.bits())
    }

    fn write_defaults(&mut self) -> Result<()> {
        for &(addr, value) in self.profile.defaults {
            self.write(addr, value)?;
        }

        let map = self.profile.map;
        let config = self.config;
        self.write_field(map.cp_current, config.cp_current)?;
        if let (Some(field), Some(word)) = (map.bleed, config.bleed_word) {
            self.write_wide(field, u32::from(word))?;
        }
        if let (Some(field), Some(count)) = (map.ld_count, config.ld_count) {
            self.write_field(field, count)?;
        }
        if let (Some(field), Some(phase)) = (map.phase_adjust, config.phase_adjust) {
            self.write_field(field, phase)?;
        }
        if let (Some(field), Some(level)) = (map.output_level, config.output_level) {
            self.write_field(field, level)?;
        }
        if let Some(field) = map.cmos_3v3 {
            self.write_field(field, u8::from(config.cmos_3v3))?;
        }
        self.write_field(map.muxout, config.muxout.code())
    }

    /// Scratchpad readback, then vendor ID if the profile has one
    fn verify(&mut self) -> Result<()> {
        let scratch = self.profile.scratchpad;
        let pattern = self.profile.scratch_pattern;
        self.write(scratch, pattern)?;
        let actual = self.read(scratch)?;
        if actual != pattern {
            log::error!(
                "{}: scratchpad 0x{:04X} read 0x{:02X}, wrote 0x{:02X}",
                self.profile.name,
                scratch,
                actual,
                pattern
            );
            return Err(Error::DeviceNotResponding {
                addr: scratch,
                expected: pattern,
                actual,
            });
        }

        let Some(id) = self.profile.identity else {
            return Ok(());
        };
        let expected = id.vendor_id.to_le_bytes();
        for (i, &want) in expected.iter().enumerate() {
            let addr = id.vendor_addr + i as u16;
            let got = self.read(addr)?;
            if got != want {
                return Err(Error::DeviceNotResponding {
                    addr,
                    expected: want,
                    actual: got,
                });
            }
        }
        let chip_type = self.read(id.chip_type_addr)?;
        if chip_type != id.chip_type {
            log::warn!(
                "{}: unexpected chip type 0x{:02X} (expected 0x{:02X})",
                self.profile.name,
                chip_type,
                id.chip_type
            );
        }
        let product =
            u16::from_le_bytes([self.read(id.product_addr)?, self.read(id.product_addr + 1)?]);
        log::debug!(
            "{}: vendor 0x{:04X}, chip type 0x{:02X}, product 0x{:04X}",
            self.profile.name,
            id.vendor_id,
            chip_type,
            product
        );
        Ok(())
    }

    fn program_reference(&mut self, reference: &Reference) -> Result<()> {
        for update in reference.register_updates(self.profile).iter() {
            self.apply(update)?;
        }
        self.settings.reference = *reference;
        Ok(())
    }

    fn program_frequency(&mut self, plan: &FrequencyPlan) -> Result<()> {
        let updates = plan.register_updates(self.profile);
        for update in updates.iter() {
            if let Err(e) = self.apply(update) {
                log::warn!(
                    "{}: frequency update to {} Hz interrupted at register 0x{:04X}, output frequency unknown",
                    self.profile.name,
                    plan.target_hz,
                    update.addr
                );
                self.settings.freq_hz = None;
                return Err(e);
            }
        }
        self.settings.freq_hz = Some(plan.target_hz);
        Ok(())
    }

    /// Read one register
    pub fn read_register(&mut self, addr: u16) -> Result<u8> {
        self.read(addr)
    }

    /// Write one register
    pub fn write_register(&mut self, addr: u16, value: u8) -> Result<()> {
        self.write(addr, value)
    }

    /// Read-modify-write a register; returns the value written
    ///
    /// Not atomic: two bus transactions.
    pub fn update_register_bits(&mut self, addr: u16, mask: u8, value: u8) -> Result<u8> {
        self.update_bits(addr, mask, value)
    }

    /// Program a new output frequency
    pub fn set_output_frequency(&mut self, freq_hz: u64) -> Result<()> {
        self.set_parameter(Parameter::Frequency(freq_hz))
    }

    /// Output frequency implied by the divider registers
    pub fn get_output_frequency(&mut self) -> Result<u64> {
        Ok(self
            .read_divider_settings()?
            .output_hz(self.settings.reference.freq_hz))
    }

    /// Divider settings currently held in the chip
    pub fn read_divider_settings(&mut self) -> Result<DividerSettings> {
        let profile = self.profile;
        let codec = self.codec;
        let bus = self.bus_mut("read frequency")?;
        freq::read_divider_settings(profile, |addr| codec.read(&mut *bus, addr))
    }

    /// Read the lock detect status
    pub fn read_status(&mut self) -> Result<Status> {
        let field = self.profile.map.lock_status;
        let reg = self.read(field.addr)?;
        Ok(Status {
            state: self.state,
            locked: field.extract(reg) != 0,
        })
    }

    /// Change one setting
    ///
    /// Only legal once the device is `Active`. Values are checked before
    /// anything is written.
    pub fn set_parameter(&mut self, param: Parameter) -> Result<()> {
        self.require(DeviceState::Active, "set parameter")?;
        let profile = self.profile;
        let map = profile.map;

        match param {
            Parameter::Frequency(freq_hz) => {
                let plan = compute_divider_plan(profile, &self.settings.reference, freq_hz)?;
                self.program_frequency(&plan)?;
                log::info!("{}: output set to {} Hz", profile.name, freq_hz);
            }
            Parameter::ChargePumpCurrent(code) => {
                check_range(
                    "cp_current",
                    u64::from(code),
                    0,
                    u64::from(profile.cp_code_max()),
                )?;
                self.write_field(map.cp_current, code)?;
                self.settings.cp_current = code;
            }
            Parameter::BleedWord(word) => {
                let field = map.bleed.ok_or(Error::Unsupported {
                    parameter: "bleed_word",
                })?;
                check_range("bleed_word", u64::from(word), 0, u64::from(field.max_value()))?;
                // Multi-register: only trust the cache once every byte landed
                self.settings.bleed_word = None;
                self.write_wide(field, u32::from(word))?;
                self.settings.bleed_word = Some(word);
            }
            Parameter::PhaseAdjust(phase) => {
                let field = map.phase_adjust.ok_or(Error::Unsupported {
                    parameter: "phase_adjust",
                })?;
                check_range("phase_adjust", u64::from(phase), 0, u64::from(field.max_value()))?;
                self.write_field(field, phase)?;
                self.settings.phase_adjust = Some(phase);
            }
            Parameter::Muxout(muxout) => {
                self.write_field(map.muxout, muxout.code())?;
                self.settings.muxout = muxout;
            }
            Parameter::LockDetectCount(count) => {
                let field = map.ld_count.ok_or(Error::Unsupported {
                    parameter: "ld_count",
                })?;
                check_range("ld_count", u64::from(count), 0, u64::from(field.max_value()))?;
                self.write_field(field, count)?;
                self.settings.ld_count = Some(count);
            }
            Parameter::ReferenceDoubler(doubler) => {
                let reference = Reference {
                    doubler,
                    ..self.settings.reference
                };
                self.retune_reference(reference)?;
            }
            Parameter::ReferenceDivider(divider) => {
                let reference = Reference {
                    divider,
                    ..self.settings.reference
                };
                self.retune_reference(reference)?;
            }
        }
        Ok(())
    }

    /// Reprogram the reference path and re-plan the current frequency
    ///
    /// Refused while the output frequency is unknown; set a frequency first.
    fn retune_reference(&mut self, reference: Reference) -> Result<()> {
        let target = self.settings.freq_hz.ok_or(Error::InvalidState {
            state: self.state,
            operation: "change reference with unknown output frequency",
        })?;
        let plan = compute_divider_plan(self.profile, &reference, target)?;
        self.settings.freq_hz = None;
        self.program_reference(&reference)?;
        self.program_frequency(&plan)
    }

    /// Release the bus
    ///
    /// Legal from any state except `Removed`. The device ends up
    /// `Removed` even if the transport fails to release; that failure is
    /// returned as [`Error::ReleaseFailed`].
    pub fn remove(&mut self) -> Result<()> {
        if self.state == DeviceState::Removed {
            return Err(Error::InvalidState {
                state: self.state,
                operation: "remove",
            });
        }
        let released = match self.bus.take() {
            Some(mut bus) => bus.release(),
            None => Ok(()),
        };
        self.set_state(DeviceState::Removed);
        released.map_err(|fault| Error::ReleaseFailed { fault })
    }
}

/// Create a device and initialize it on `bus`
///
/// If initialization fails the device is removed (bus released) before
/// the error is returned. The init error is the one returned; a release
/// failure on that path is logged.
pub fn open<T: BusTransport>(
    bus: T,
    profile: &'static ChipProfile,
    config: SynthConfig,
) -> Result<SynthDevice<T>> {
    let mut dev = SynthDevice::new(profile, config);
    if let Err(e) = dev.init(bus) {
        log::debug!("{}: init failed: {}", profile.name, e);
        if let Err(release) = dev.remove() {
            log::error!("{}: {} after failed init", profile.name, release);
        }
        return Err(e);
    }
    Ok(dev)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::BusBinding;
    use crate::chip::{Identity, ADF4368, ADF4377, ADF4382};
    use crate::error::TransportFault;
    use crate::testing::MockBus;

    fn active<'a>(
        profile: &'static ChipProfile,
        bus: &'a mut MockBus,
    ) -> SynthDevice<&'a mut MockBus> {
        open(bus, profile, SynthConfig::for_profile(profile)).unwrap()
    }

    #[test]
    fn init_walks_to_active() {
        let mut bus = MockBus::new(&ADF4382);
        let mut dev = SynthDevice::new(&ADF4382, SynthConfig::for_profile(&ADF4382));
        assert_eq!(dev.state(), DeviceState::Uninitialized);
        dev.init(&mut bus).unwrap();
        assert_eq!(dev.state(), DeviceState::Active);
        assert_eq!(dev.settings().freq_hz, Some(20_000_000_000));
        assert_eq!(dev.get_output_frequency().unwrap(), 20_000_000_000);
        dev.remove().unwrap();
        assert_eq!(dev.state(), DeviceState::Removed);
        assert_eq!(bus.released, 1);
    }

    #[test]
    fn init_writes_reset_then_four_wire() {
        let mut bus = MockBus::new(&ADF4382);
        active(&ADF4382, &mut bus);
        assert_eq!(bus.writes[0].addr, 0x00);
        assert_eq!(bus.writes[0].data, 0x81);
        assert_eq!(bus.writes[1].addr, 0x00);
        assert_eq!(bus.writes[1].data, 0x18);
    }

    #[test]
    fn three_wire_clears_sdo() {
        let mut bus = MockBus::new(&ADF4368);
        let config = SynthConfig::for_profile(&ADF4368).with_wire_mode(WireMode::ThreeWire);
        open(&mut bus, &ADF4368, config).unwrap();
        assert_eq!(bus.writes[1].data, 0x00);
    }

    #[test]
    fn absent_chip_never_becomes_active() {
        let mut bus = MockBus::absent(&ADF4382);
        let mut dev = SynthDevice::new(&ADF4382, SynthConfig::for_profile(&ADF4382));
        assert_eq!(
            dev.init(&mut bus),
            Err(Error::DeviceNotResponding {
                addr: 0x0A,
                expected: 0xAA,
                actual: 0x00
            })
        );
        assert_eq!(dev.state(), DeviceState::Configured);
        assert!(matches!(
            dev.set_output_frequency(10_000_000_000),
            Err(Error::InvalidState { .. })
        ));
        dev.remove().unwrap();
    }

    #[test]
    fn open_releases_bus_on_failure() {
        let mut bus = MockBus::absent(&ADF4377);
        assert!(matches!(
            open(&mut bus, &ADF4377, SynthConfig::for_profile(&ADF4377)),
            Err(Error::DeviceNotResponding { addr: 0x0A, .. })
        ));
        assert_eq!(bus.released, 1);
    }

    #[test]
    fn wrong_vendor_id_is_not_responding() {
        let mut bus = MockBus::new(&ADF4382);
        bus.identity = ADF4382.identity.map(|id| Identity {
            vendor_id: 0x1234,
            ..id
        });
        let mut dev = SynthDevice::new(&ADF4382, SynthConfig::for_profile(&ADF4382));
        assert_eq!(
            dev.init(&mut bus),
            Err(Error::DeviceNotResponding {
                addr: 0x0C,
                expected: 0x56,
                actual: 0x34
            })
        );
        assert_eq!(dev.state(), DeviceState::Configured);
    }

    #[test]
    fn remove_twice_is_invalid() {
        let mut bus = MockBus::new(&ADF4377);
        let mut dev = active(&ADF4377, &mut bus);
        dev.remove().unwrap();
        assert_eq!(
            dev.remove(),
            Err(Error::InvalidState {
                state: DeviceState::Removed,
                operation: "remove"
            })
        );
    }

    #[test]
    fn remove_uninitialized_device() {
        let mut dev: SynthDevice<MockBus> =
            SynthDevice::new(&ADF4377, SynthConfig::for_profile(&ADF4377));
        dev.remove().unwrap();
        assert!(dev.init(MockBus::new(&ADF4377)).is_err());
    }

    #[test]
    fn read_beyond_map_has_no_bus_traffic() {
        let mut bus = MockBus::new(&ADF4382);
        let mut dev = active(&ADF4382, &mut bus);
        let before = dev.transport().map(|b| b.transfers);
        assert_eq!(
            dev.read_register(0x64),
            Err(Error::InvalidAddress {
                addr: 0x64,
                max: 0x63
            })
        );
        assert_eq!(dev.transport().map(|b| b.transfers), before);
    }

    #[test]
    fn ten_gigahertz_from_doubled_reference() {
        let mut bus = MockBus::new(&ADF4377);
        let config = SynthConfig::for_profile(&ADF4377)
            .with_reference(125_000_000, true, 1)
            .with_frequency(10_000_000_000);
        let mut dev = open(&mut bus, &ADF4377, config).unwrap();
        let settings = dev.read_divider_settings().unwrap();
        assert_eq!(settings.n_int, 40);
        assert_eq!(settings.output_divider, 1);
        assert_eq!(dev.config().reference().pfd_hz(), 250_000_000);
        assert_eq!(dev.get_output_frequency().unwrap(), 10_000_000_000);
    }

    #[test]
    fn charge_pump_out_of_range_writes_nothing() {
        let mut bus = MockBus::new(&ADF4377);
        let mut dev = active(&ADF4377, &mut bus);
        let before = dev.transport().map(|b| b.transfers);
        assert_eq!(
            dev.set_parameter(Parameter::ChargePumpCurrent(16)),
            Err(Error::ConfigOutOfRange {
                parameter: "cp_current",
                value: 16,
                min: 0,
                max: 15
            })
        );
        assert_eq!(dev.transport().map(|b| b.transfers), before);
        assert_eq!(dev.settings().cp_current, 15);
    }

    #[test]
    fn invalid_config_fails_before_bus_traffic() {
        let mut bus = MockBus::new(&ADF4377);
        let mut dev = SynthDevice::new(
            &ADF4377,
            SynthConfig::for_profile(&ADF4377).with_frequency(30_000_000_000),
        );
        assert!(matches!(
            dev.init(&mut bus),
            Err(Error::ConfigOutOfRange {
                parameter: "freq",
                ..
            })
        ));
        assert_eq!(dev.state(), DeviceState::Bound);
        dev.remove().unwrap();
        assert_eq!(bus.transfers, 0);
    }

    #[test]
    fn lsb_first_only_where_supported() {
        let mut bus = MockBus::new(&ADF4382);
        bus.binding = BusBinding::new(0, 0).with_bit_order(BitOrder::LsbFirst);
        assert_eq!(
            open(&mut bus, &ADF4382, SynthConfig::for_profile(&ADF4382)).err(),
            Some(Error::Unsupported {
                parameter: "lsb_first"
            })
        );
        assert_eq!(bus.transfers, 0);

        let mut bus = MockBus::new(&ADF4377);
        bus.binding = BusBinding::new(0, 0).with_bit_order(BitOrder::LsbFirst);
        open(&mut bus, &ADF4377, SynthConfig::for_profile(&ADF4377)).unwrap();
        assert_eq!(bus.writes[1].data, 0x18 | 0x42);
    }

    #[test]
    fn scratchpad_check_placement_follows_profile() {
        let mut bus = MockBus::new(&ADF4377);
        active(&ADF4377, &mut bus);
        assert!(bus.first_write_to(0x0A) < bus.first_write_to(0x01));

        let mut bus = MockBus::new(&ADF4382);
        active(&ADF4382, &mut bus);
        assert!(bus.first_write_to(0x0A) > bus.first_write_to(0x01));
        assert!(bus.first_write_to(0x0A) < bus.first_write_to(0x10));
    }

    #[test]
    fn set_parameter_requires_active() {
        let mut dev: SynthDevice<MockBus> =
            SynthDevice::new(&ADF4382, SynthConfig::for_profile(&ADF4382));
        assert_eq!(
            dev.set_parameter(Parameter::Muxout(Muxout::LockDetect)),
            Err(Error::InvalidState {
                state: DeviceState::Uninitialized,
                operation: "set parameter"
            })
        );
    }

    #[test]
    fn tuning_parameters_land_in_registers() {
        let mut bus = MockBus::new(&ADF4382);
        let mut dev = active(&ADF4382, &mut bus);
        dev.set_parameter(Parameter::Muxout(Muxout::High)).unwrap();
        dev.set_parameter(Parameter::ChargePumpCurrent(7)).unwrap();
        dev.set_parameter(Parameter::BleedWord(0x1ABC)).unwrap();
        dev.set_parameter(Parameter::PhaseAdjust(0x40)).unwrap();
        dev.set_parameter(Parameter::LockDetectCount(3)).unwrap();
        assert_eq!(dev.read_register(0x2E).unwrap() >> 4, 0x8);
        assert_eq!(dev.read_register(0x1F).unwrap() & 0x0F, 7);
        assert_eq!(dev.read_register(0x1D).unwrap(), 0xBC);
        assert_eq!(dev.read_register(0x1E).unwrap() & 0x1F, 0x1A);
        assert_eq!(dev.read_register(0x33).unwrap(), 0x40);
        assert_eq!(dev.read_register(0x2C).unwrap() & 0x1F, 3);
        assert_eq!(dev.settings().bleed_word, Some(0x1ABC));
    }

    #[test]
    fn missing_fields_are_unsupported() {
        let mut bus = MockBus::new(&ADF4377);
        let mut dev = active(&ADF4377, &mut bus);
        assert_eq!(
            dev.set_parameter(Parameter::BleedWord(1)),
            Err(Error::Unsupported {
                parameter: "bleed_word"
            })
        );
        assert_eq!(
            dev.set_parameter(Parameter::PhaseAdjust(1)),
            Err(Error::Unsupported {
                parameter: "phase_adjust"
            })
        );
    }

    #[test]
    fn update_bits_through_device() {
        let mut bus = MockBus::new(&ADF4382);
        let mut dev = active(&ADF4382, &mut bus);
        dev.write_register(0x0A, 0b1100_0011).unwrap();
        let new = dev.update_register_bits(0x0A, 0x0F, 0xA5).unwrap();
        assert_eq!(new, 0b1100_0101);
        assert_eq!(dev.read_register(0x0A).unwrap(), new);
    }

    #[test]
    fn frequency_change_and_readback() {
        let mut bus = MockBus::new(&ADF4382);
        let mut dev = active(&ADF4382, &mut bus);
        dev.set_output_frequency(12_345_678_901).unwrap();
        let got = dev.get_output_frequency().unwrap();
        assert!(12_345_678_901 - got <= 8);
        assert_eq!(
            dev.set_output_frequency(100_000_000),
            Err(Error::FrequencyOutOfRange {
                freq_hz: 100_000_000
            })
        );
        assert_eq!(dev.settings().freq_hz, Some(12_345_678_901));
    }

    #[test]
    fn interrupted_frequency_update_clears_cache() {
        let mut bus = MockBus::new(&ADF4382);
        let mut dev = active(&ADF4382, &mut bus);
        let done = dev.transport().map(|b| b.transfers).unwrap_or(0);
        // Let the first few register writes through, then fail
        if let Some(b) = dev.bus.as_mut() {
            b.fail_after = Some(done + 3);
        }
        assert!(matches!(
            dev.set_output_frequency(12_345_678_901),
            Err(Error::Transport { .. })
        ));
        assert_eq!(dev.settings().freq_hz, None);
        assert_eq!(dev.state(), DeviceState::Active);
    }

    #[test]
    fn reference_divider_retunes() {
        let mut bus = MockBus::new(&ADF4382);
        let mut dev = active(&ADF4382, &mut bus);
        dev.set_parameter(Parameter::ReferenceDivider(2)).unwrap();
        let settings = dev.read_divider_settings().unwrap();
        assert_eq!(settings.ref_div, 2);
        assert_eq!(settings.n_int, 160);
        assert_eq!(dev.get_output_frequency().unwrap(), 20_000_000_000);

        dev.set_parameter(Parameter::ReferenceDoubler(false)).unwrap();
        assert_eq!(dev.read_divider_settings().unwrap().n_int, 320);
        assert!(matches!(
            dev.set_parameter(Parameter::ReferenceDivider(0)),
            Err(Error::ConfigOutOfRange { .. })
        ));
    }

    #[test]
    fn release_failure_reaches_caller() {
        let mut bus = MockBus::new(&ADF4377);
        bus.release_fault = Some(TransportFault::Io);
        let mut dev = active(&ADF4377, &mut bus);
        assert_eq!(
            dev.remove(),
            Err(Error::ReleaseFailed {
                fault: TransportFault::Io
            })
        );
        assert_eq!(dev.state(), DeviceState::Removed);
        assert!(dev.transport().is_none());
        assert!(matches!(dev.remove(), Err(Error::InvalidState { .. })));
    }

    #[test]
    fn open_keeps_init_error_when_release_fails() {
        let mut bus = MockBus::absent(&ADF4382);
        bus.release_fault = Some(TransportFault::Disconnected);
        assert!(matches!(
            open(&mut bus, &ADF4382, SynthConfig::for_profile(&ADF4382)),
            Err(Error::DeviceNotResponding { .. })
        ));
        assert_eq!(bus.released, 1);
    }

    #[test]
    fn reference_change_refused_after_interrupted_update() {
        let mut bus = MockBus::new(&ADF4382);
        let mut dev = active(&ADF4382, &mut bus);
        let done = dev.transport().map(|b| b.transfers).unwrap_or(0);
        if let Some(b) = dev.bus.as_mut() {
            b.fail_after = Some(done + 3);
        }
        assert!(dev.set_output_frequency(12_345_678_901).is_err());
        if let Some(b) = dev.bus.as_mut() {
            b.fail_after = None;
        }

        let before = dev.transport().map(|b| b.transfers);
        assert_eq!(
            dev.set_parameter(Parameter::ReferenceDivider(2)),
            Err(Error::InvalidState {
                state: DeviceState::Active,
                operation: "change reference with unknown output frequency"
            })
        );
        assert_eq!(dev.transport().map(|b| b.transfers), before);
        assert_eq!(dev.settings().reference.divider, 1);

        // A successful frequency write makes the output known again
        dev.set_output_frequency(12_000_000_000).unwrap();
        dev.set_parameter(Parameter::ReferenceDivider(2)).unwrap();
        assert_eq!(dev.read_divider_settings().unwrap().ref_div, 2);
        assert_eq!(dev.get_output_frequency().unwrap(), 12_000_000_000);
    }

    #[test]
    fn lock_status_reads_field() {
        let mut bus = MockBus::new(&ADF4382);
        let mut dev = active(&ADF4382, &mut bus);
        assert!(!dev.read_status().unwrap().locked);
        if let Some(b) = dev.bus.as_mut() {
            b.regs[0x58] = 0x01;
        }
        let status = dev.read_status().unwrap();
        assert!(status.locked);
        assert_eq!(status.state, DeviceState::Active);
    }
}
