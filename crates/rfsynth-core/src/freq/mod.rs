//! Frequency model
//!
//! ```text
//! f_PFD  = f_REF * (doubler ? 2 : 1) / R
//! f_VCO  = f_PFD * (N_INT + FRAC / MOD)
//! RF OUT = f_VCO / output_divider
//! ```
//!
//! [`compute_divider_plan`] goes from a requested output frequency to
//! divider settings; [`recompute_from_registers`] goes back from register
//! contents to the output frequency. Everything here is pure integer
//! arithmetic; no bus access happens in this module.

mod plan;
mod readback;

pub use plan::{check_output_range, compute_divider_plan, FrequencyPlan};
pub use readback::{read_divider_settings, recompute_from_registers};

use heapless::Vec;

use crate::chip::{ChipProfile, Field, WideField};
use crate::error::{Error, Result};

/// Maximum number of register updates in one plan
pub const MAX_UPDATES: usize = 8;

/// Ordered list of register updates
pub type UpdateList = Vec<RegisterUpdate, MAX_UPDATES>;

/// Reference path settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    /// Reference input frequency
    pub freq_hz: u64,
    /// Reference doubler enabled
    pub doubler: bool,
    /// Reference divider R
    pub divider: u8,
}

impl Reference {
    /// Multiplier applied by the doubler
    pub fn multiplier(&self) -> u64 {
        if self.doubler {
            2
        } else {
            1
        }
    }

    /// Phase-frequency detector rate, rounded down
    pub fn pfd_hz(&self) -> u64 {
        self.freq_hz * self.multiplier() / u64::from(self.divider.max(1))
    }

    /// Check the reference path against chip limits
    pub fn validate(&self, profile: &ChipProfile) -> Result<()> {
        let limits = &profile.limits;
        check_range("ref_freq", self.freq_hz, limits.ref_min_hz, limits.ref_max_hz)?;
        if self.doubler {
            check_range(
                "ref_freq",
                self.freq_hz,
                limits.ref_min_hz,
                limits.doubler_max_ref_hz,
            )?;
        }
        check_range(
            "ref_div",
            u64::from(self.divider),
            u64::from(limits.ref_div_min),
            u64::from(limits.ref_div_max),
        )?;
        check_range("pfd_freq", self.pfd_hz(), 1, limits.pfd_max_hz)
    }

    /// Register updates that program the reference path
    pub fn register_updates(&self, profile: &ChipProfile) -> UpdateList {
        let map = &profile.map;
        let mut updates = UpdateList::new();
        push_field(&mut updates, map.ref_div, self.divider);
        push_field(&mut updates, map.ref_doubler, u8::from(self.doubler));
        updates
    }
}

/// Divider settings as held in the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DividerSettings {
    /// Reference doubler enabled
    pub doubler: bool,
    /// Reference divider R
    pub ref_div: u8,
    /// Integer part of N
    pub n_int: u32,
    /// Fractional part of N, in units of `1 / modulus`
    pub frac: u32,
    /// Fractional modulus (1 for integer-N)
    pub modulus: u32,
    /// Output divider
    pub output_divider: u32,
}

impl DividerSettings {
    /// Output frequency produced from `ref_hz`, rounded down
    pub fn output_hz(&self, ref_hz: u64) -> u64 {
        let mult: u128 = if self.doubler { 2 } else { 1 };
        let modulus = u128::from(self.modulus.max(1));
        let num = u128::from(ref_hz)
            * mult
            * (u128::from(self.n_int) * modulus + u128::from(self.frac));
        let den = u128::from(self.ref_div.max(1)) * modulus * u128::from(self.output_divider.max(1));
        (num / den) as u64
    }
}

/// One register write, possibly partial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterUpdate {
    /// Register address
    pub addr: u16,
    /// Bits being changed
    pub mask: u8,
    /// New value of the masked bits
    pub value: u8,
}

impl RegisterUpdate {
    /// Whether the whole register is replaced (no readback needed)
    pub fn is_full(&self) -> bool {
        self.mask == 0xFF
    }
}

/// Merge an update into the list, combining updates to the same register
pub(crate) fn push_update(updates: &mut UpdateList, addr: u16, mask: u8, value: u8) {
    if let Some(existing) = updates.iter_mut().find(|u| u.addr == addr) {
        existing.mask |= mask;
        existing.value = (existing.value & !mask) | (value & mask);
        return;
    }
    // Capacity covers the largest plan any profile can produce
    let _ = updates.push(RegisterUpdate { addr, mask, value });
}

pub(crate) fn push_field(updates: &mut UpdateList, field: Field, value: u8) {
    push_update(updates, field.addr, field.mask(), field.encode(value));
}

pub(crate) fn push_wide(updates: &mut UpdateList, field: WideField, value: u32) {
    for (addr, mask, byte) in field.split(value) {
        push_update(updates, addr, mask, byte);
    }
}

pub(crate) fn check_range(parameter: &'static str, value: u64, min: u64, max: u64) -> Result<()> {
    if value < min || value > max {
        return Err(Error::ConfigOutOfRange {
            parameter,
            value,
            min,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::{ADF4377, ADF4382};

    #[test]
    fn pfd_from_doubled_reference() {
        let r = Reference {
            freq_hz: 125_000_000,
            doubler: true,
            divider: 1,
        };
        assert_eq!(r.pfd_hz(), 250_000_000);
        assert!(r.validate(&ADF4377).is_ok());
    }

    #[test]
    fn doubler_rejects_fast_reference() {
        let r = Reference {
            freq_hz: 300_000_000,
            doubler: true,
            divider: 1,
        };
        assert!(matches!(
            r.validate(&ADF4382),
            Err(Error::ConfigOutOfRange {
                parameter: "ref_freq",
                ..
            })
        ));
    }

    #[test]
    fn zero_ref_divider_rejected() {
        let r = Reference {
            freq_hz: 100_000_000,
            doubler: false,
            divider: 0,
        };
        assert_eq!(
            r.validate(&ADF4382),
            Err(Error::ConfigOutOfRange {
                parameter: "ref_div",
                value: 0,
                min: 1,
                max: 63
            })
        );
    }

    #[test]
    fn reference_updates_share_register() {
        let r = Reference {
            freq_hz: 125_000_000,
            doubler: true,
            divider: 2,
        };
        let updates = r.register_updates(&ADF4382);
        assert_eq!(
            updates.as_slice(),
            &[RegisterUpdate {
                addr: 0x20,
                mask: 0x7F,
                value: 0x42
            }]
        );
    }
}
