//! Chip family definitions
//!
//! Each supported synthesizer family is described by one `static`
//! [`ChipProfile`]: register map size, frequency plan limits, and where
//! each tunable setting lives. The codec, frequency model and device
//! handle are written once against this description.

mod adf4368;
mod adf4377;
mod adf4382;
mod regs;

pub use adf4368::ADF4368;
pub use adf4377::ADF4377;
pub use adf4382::ADF4382;
pub use regs::{Field, InterfaceConfig, WideField, REG_INTERFACE_CONFIG};

use core::fmt;

use crate::bus::FrameLayout;

/// Supported chip families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChipFamily {
    /// ADF4377/ADF4378 integer-N synthesizers
    Adf4377,
    /// ADF4382 fractional-N synthesizer
    Adf4382,
    /// ADF4368 fractional-N synthesizer
    Adf4368,
}

impl ChipFamily {
    /// Static profile for this family
    pub fn profile(self) -> &'static ChipProfile {
        match self {
            Self::Adf4377 => &ADF4377,
            Self::Adf4382 => &ADF4382,
            Self::Adf4368 => &ADF4368,
        }
    }
}

impl fmt::Display for ChipFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().name)
    }
}

/// All known profiles
pub static PROFILES: &[&ChipProfile] = &[&ADF4377, &ADF4382, &ADF4368];

/// Look up a profile by name or alias (case-insensitive)
pub fn find_profile(name: &str) -> Option<&'static ChipProfile> {
    PROFILES.iter().copied().find(|p| {
        p.name.eq_ignore_ascii_case(name) || p.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    })
}

/// When the scratchpad check runs during initialization
///
/// Both variants complete before any frequency is programmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyStage {
    /// Right after reset and interface setup, before defaults are written
    AfterReset,
    /// After the default register sequence and tuning settings
    AfterDefaults,
}

/// Read-only identification registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// Address of the vendor ID low byte (high byte follows)
    pub vendor_addr: u16,
    /// Expected vendor ID
    pub vendor_id: u16,
    /// Chip type register
    pub chip_type_addr: u16,
    /// Expected chip type
    pub chip_type: u8,
    /// Address of the product ID low byte (high byte follows)
    pub product_addr: u16,
}

/// Limits used by the frequency plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyLimits {
    /// Lowest RF output frequency
    pub rf_min_hz: u64,
    /// Highest RF output frequency
    pub rf_max_hz: u64,
    /// Lowest VCO frequency
    pub vco_min_hz: u64,
    /// Highest VCO frequency
    pub vco_max_hz: u64,
    /// Highest phase-frequency detector rate
    pub pfd_max_hz: u64,
    /// Lowest reference input
    pub ref_min_hz: u64,
    /// Highest reference input
    pub ref_max_hz: u64,
    /// Highest reference input with the doubler enabled
    pub doubler_max_ref_hz: u64,
    /// Smallest reference divider
    pub ref_div_min: u8,
    /// Largest reference divider
    pub ref_div_max: u8,
    /// Smallest integer N
    pub n_int_min: u32,
    /// Largest integer N
    pub n_int_max: u32,
    /// Legal output dividers, ascending powers of two
    pub output_dividers: &'static [u32],
    /// Fractional accumulator modulus; `None` for integer-N parts
    pub frac_modulus: Option<u32>,
}

/// Where each setting lives in the register map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterMap {
    /// Integer part of N
    pub n_int: WideField,
    /// Fractional part of N
    pub frac: Option<WideField>,
    /// Output divider select (log2 of the divider)
    pub output_div: Field,
    /// Reference divider R
    pub ref_div: Field,
    /// Reference doubler enable
    pub ref_doubler: Field,
    /// Charge pump current code
    pub cp_current: Field,
    /// Bleed current word
    pub bleed: Option<WideField>,
    /// Lock detect count
    pub ld_count: Option<Field>,
    /// MUXOUT select
    pub muxout: Field,
    /// Output phase adjust
    pub phase_adjust: Option<Field>,
    /// Output amplitude code
    pub output_level: Option<Field>,
    /// CMOS output voltage select (set = 3.3 V)
    pub cmos_3v3: Option<Field>,
    /// Digital lock detect status
    pub lock_status: Field,
}

/// Everything that differs between chip families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipProfile {
    /// Family
    pub family: ChipFamily,
    /// Canonical name
    pub name: &'static str,
    /// Alternative names
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
    /// Command frame layout
    pub frame: FrameLayout,
    /// Highest implemented register
    pub max_register: u16,
    /// Delay after soft reset
    pub por_delay_us: u32,
    /// Scratchpad register used for the readback check
    pub scratchpad: u16,
    /// Pattern written to the scratchpad
    pub scratch_pattern: u8,
    /// When the scratchpad check runs
    pub verify_stage: VerifyStage,
    /// Identification registers, if they are checked
    pub identity: Option<Identity>,
    /// Registers written after reset, in order
    pub defaults: &'static [(u16, u8)],
    /// Whether the chip can shift data LSB first
    pub lsb_first: bool,
    /// Frequency plan limits
    pub limits: FrequencyLimits,
    /// Register locations
    pub map: RegisterMap,
    /// Charge pump current per code, in µA
    pub cp_currents_ua: &'static [u32],
}

impl ChipProfile {
    /// Highest charge pump code
    pub fn cp_code_max(&self) -> u8 {
        self.cp_currents_ua.len().saturating_sub(1) as u8
    }

    /// Charge pump current for a code, in µA
    pub fn cp_current_ua(&self, code: u8) -> Option<u32> {
        self.cp_currents_ua.get(code as usize).copied()
    }

    /// Whether fractional N is available
    pub fn is_fractional(&self) -> bool {
        self.limits.frac_modulus.is_some()
    }
}

/// MUXOUT pin function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Muxout {
    /// High impedance
    #[default]
    HighZ,
    /// Digital lock detect
    LockDetect,
    /// Driven low
    Low,
    /// Reference divider output / 2
    DivRclk2,
    /// N divider output / 2
    DivNclk2,
    /// Driven high
    High,
}

impl Muxout {
    /// Field code
    pub const fn code(self) -> u8 {
        match self {
            Self::HighZ => 0x0,
            Self::LockDetect => 0x1,
            Self::Low => 0x2,
            Self::DivRclk2 => 0x4,
            Self::DivNclk2 => 0x5,
            Self::High => 0x8,
        }
    }

    /// Decode a field code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x0 => Some(Self::HighZ),
            0x1 => Some(Self::LockDetect),
            0x2 => Some(Self::Low),
            0x4 => Some(Self::DivRclk2),
            0x5 => Some(Self::DivNclk2),
            0x8 => Some(Self::High),
            _ => None,
        }
    }

    /// Parse a name as used on the command line and in config files
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "high_z" | "highz" | "tristate" => Some(Self::HighZ),
            "lock_detect" | "lkdet" | "ld" => Some(Self::LockDetect),
            "low" => Some(Self::Low),
            "div_rclk_2" => Some(Self::DivRclk2),
            "div_nclk_2" => Some(Self::DivNclk2),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}
