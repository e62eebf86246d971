//! Requested device configuration

use crate::chip::{ChipFamily, ChipProfile, Muxout};
use crate::error::{Error, Result};
use crate::freq::{check_output_range, check_range, compute_divider_plan, FrequencyPlan, Reference};

/// SPI wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WireMode {
    /// Shared SDIO line
    ThreeWire,
    /// Separate SDO line
    #[default]
    FourWire,
}

/// Configuration applied by [`SynthDevice::init`](super::SynthDevice::init)
///
/// Built once, then handed to the device. Optional settings are left
/// untouched in the chip when `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthConfig {
    /// Reference input frequency
    pub ref_freq_hz: u64,
    /// Reference doubler enabled
    pub ref_doubler: bool,
    /// Reference divider R
    pub ref_div: u8,
    /// Initial output frequency
    pub freq_hz: u64,
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
    /// 3- or 4-wire SPI
    pub wire_mode: WireMode,
    /// Output amplitude code
    pub output_level: Option<u8>,
    /// Drive CMOS outputs at 3.3 V instead of 1.8 V
    pub cmos_3v3: bool,
}

impl SynthConfig {
    /// Power-up configuration for a chip family
    pub fn for_profile(profile: &ChipProfile) -> Self {
        match profile.family {
            ChipFamily::Adf4377 => Self {
                ref_freq_hz: 125_000_000,
                ref_doubler: true,
                ref_div: 1,
                freq_hz: 10_000_000_000,
                cp_current: 15,
                bleed_word: None,
                ld_count: None,
                phase_adjust: None,
                muxout: Muxout::HighZ,
                wire_mode: WireMode::FourWire,
                output_level: Some(3),
                cmos_3v3: false,
            },
            ChipFamily::Adf4382 => Self {
                ref_freq_hz: 125_000_000,
                ref_doubler: true,
                ref_div: 1,
                freq_hz: 20_000_000_000,
                cp_current: 15,
                bleed_word: Some(4903),
                ld_count: Some(10),
                phase_adjust: None,
                muxout: Muxout::HighZ,
                wire_mode: WireMode::FourWire,
                output_level: None,
                cmos_3v3: true,
            },
            ChipFamily::Adf4368 => Self {
                ref_freq_hz: 100_000_000,
                ref_doubler: false,
                ref_div: 1,
                freq_hz: 2_400_000_000,
                cp_current: 2,
                bleed_word: None,
                ld_count: Some(0),
                phase_adjust: None,
                muxout: Muxout::HighZ,
                wire_mode: WireMode::FourWire,
                output_level: None,
                cmos_3v3: true,
            },
        }
    }

    /// Set the initial output frequency
    pub fn with_frequency(mut self, freq_hz: u64) -> Self {
        self.freq_hz = freq_hz;
        self
    }

    /// Set the reference path
    pub fn with_reference(mut self, freq_hz: u64, doubler: bool, divider: u8) -> Self {
        self.ref_freq_hz = freq_hz;
        self.ref_doubler = doubler;
        self.ref_div = divider;
        self
    }

    /// Set the charge pump current code
    pub fn with_cp_current(mut self, code: u8) -> Self {
        self.cp_current = code;
        self
    }

    /// Set the MUXOUT function
    pub fn with_muxout(mut self, muxout: Muxout) -> Self {
        self.muxout = muxout;
        self
    }

    /// Set the SPI wiring
    pub fn with_wire_mode(mut self, wire_mode: WireMode) -> Self {
        self.wire_mode = wire_mode;
        self
    }

    /// Reference path as a [`Reference`]
    pub fn reference(&self) -> Reference {
        Reference {
            freq_hz: self.ref_freq_hz,
            doubler: self.ref_doubler,
            divider: self.ref_div,
        }
    }

    /// Check every setting against the chip and plan the initial frequency
    pub fn validate(&self, profile: &ChipProfile) -> Result<FrequencyPlan> {
        let map = &profile.map;

        check_output_range(profile, self.freq_hz)?;
        check_range(
            "cp_current",
            u64::from(self.cp_current),
            0,
            u64::from(profile.cp_code_max()),
        )?;
        if let Some(word) = self.bleed_word {
            let field = map.bleed.ok_or(Error::Unsupported {
                parameter: "bleed_word",
            })?;
            check_range("bleed_word", u64::from(word), 0, u64::from(field.max_value()))?;
        }
        if let Some(count) = self.ld_count {
            let field = map.ld_count.ok_or(Error::Unsupported {
                parameter: "ld_count",
            })?;
            check_range("ld_count", u64::from(count), 0, u64::from(field.max_value()))?;
        }
        if let Some(phase) = self.phase_adjust {
            let field = map.phase_adjust.ok_or(Error::Unsupported {
                parameter: "phase_adjust",
            })?;
            check_range("phase_adjust", u64::from(phase), 0, u64::from(field.max_value()))?;
        }
        if let Some(level) = self.output_level {
            let field = map.output_level.ok_or(Error::Unsupported {
                parameter: "output_level",
            })?;
            check_range("output_level", u64::from(level), 0, u64::from(field.max_value()))?;
        }
        if self.cmos_3v3 && map.cmos_3v3.is_none() {
            return Err(Error::Unsupported {
                parameter: "cmos_3v3",
            });
        }

        compute_divider_plan(profile, &self.reference(), self.freq_hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::{ADF4368, ADF4377, ADF4382, PROFILES};

    #[test]
    fn family_defaults_are_valid() {
        for p in PROFILES {
            let config = SynthConfig::for_profile(p);
            assert!(config.validate(p).is_ok(), "{}", p.name);
        }
    }

    #[test]
    fn default_plans() {
        let plan = SynthConfig::for_profile(&ADF4382).validate(&ADF4382).unwrap();
        assert_eq!(plan.settings.n_int, 80);
        let plan = SynthConfig::for_profile(&ADF4368).validate(&ADF4368).unwrap();
        assert_eq!(plan.settings.output_divider, 4);
    }

    #[test]
    fn charge_pump_code_out_of_range() {
        let config = SynthConfig::for_profile(&ADF4377).with_cp_current(16);
        assert_eq!(
            config.validate(&ADF4377),
            Err(Error::ConfigOutOfRange {
                parameter: "cp_current",
                value: 16,
                min: 0,
                max: 15
            })
        );
    }

    #[test]
    fn bleed_word_needs_field() {
        let mut config = SynthConfig::for_profile(&ADF4377);
        config.bleed_word = Some(100);
        assert_eq!(
            config.validate(&ADF4377),
            Err(Error::Unsupported {
                parameter: "bleed_word"
            })
        );
        let mut config = SynthConfig::for_profile(&ADF4382);
        config.bleed_word = Some(8192);
        assert!(matches!(
            config.validate(&ADF4382),
            Err(Error::ConfigOutOfRange { max: 8191, .. })
        ));
    }
}
