//! Forward path: output frequency to divider settings

use super::{check_range, push_field, push_wide, DividerSettings, Reference, UpdateList};
use crate::chip::ChipProfile;
use crate::error::{Error, Result};

/// Divider settings chosen for a target frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyPlan {
    /// Requested output frequency
    pub target_hz: u64,
    /// Phase-frequency detector rate, rounded down
    pub pfd_hz: u64,
    /// VCO frequency
    pub vco_hz: u64,
    /// Register-level settings
    pub settings: DividerSettings,
}

impl FrequencyPlan {
    /// Output frequency the plan actually produces
    pub fn output_hz(&self, ref_hz: u64) -> u64 {
        self.settings.output_hz(ref_hz)
    }

    /// Worst-case distance between target and produced frequency
    pub fn resolution_hz(&self) -> u64 {
        self.pfd_hz / u64::from(self.settings.modulus.max(1)) + 1
    }

    /// Register writes that program N and the output divider
    ///
    /// Ordered by descending address. The lowest N_INT byte is the
    /// double-buffer trigger, so it goes out last and the new N takes
    /// effect in one step.
    pub fn register_updates(&self, profile: &ChipProfile) -> UpdateList {
        let map = &profile.map;
        let mut updates = UpdateList::new();

        let div_code = self.settings.output_divider.trailing_zeros() as u8;
        push_field(&mut updates, map.output_div, div_code);
        if let Some(frac) = map.frac {
            push_wide(&mut updates, frac, self.settings.frac);
        }
        push_wide(&mut updates, map.n_int, self.settings.n_int);

        updates.sort_unstable_by(|a, b| b.addr.cmp(&a.addr));
        updates
    }
}

/// Choose divider settings for `target_hz`
///
/// Output dividers are tried smallest first, so the highest legal VCO
/// frequency wins. For each candidate the VCO must lie within the chip's
/// range and the integer part of N within the counter range. On
/// fractional parts the remainder goes into the accumulator, rounded
/// down; integer-N parts skip candidates that would need one.
pub fn compute_divider_plan(
    profile: &ChipProfile,
    reference: &Reference,
    target_hz: u64,
) -> Result<FrequencyPlan> {
    let limits = &profile.limits;
    reference.validate(profile)?;

    if target_hz < limits.rf_min_hz || target_hz > limits.rf_max_hz {
        return Err(Error::FrequencyOutOfRange { freq_hz: target_hz });
    }

    // f_PFD = pfd_num / pfd_den exactly, so N = vco * pfd_den / pfd_num
    let pfd_num = u128::from(reference.freq_hz) * u128::from(reference.multiplier());
    let pfd_den = u128::from(reference.divider);
    let modulus = limits.frac_modulus.unwrap_or(1);

    let mut needs_fraction = false;

    for &div in limits.output_dividers {
        let vco_hz = target_hz * u64::from(div);
        if vco_hz < limits.vco_min_hz || vco_hz > limits.vco_max_hz {
            continue;
        }

        let scaled = u128::from(vco_hz) * pfd_den;
        let n_int = scaled / pfd_num;
        let rem = scaled % pfd_num;

        if n_int < u128::from(limits.n_int_min) || n_int > u128::from(limits.n_int_max) {
            continue;
        }

        let frac = if limits.frac_modulus.is_some() {
            (rem * u128::from(modulus) / pfd_num) as u32
        } else if rem != 0 {
            needs_fraction = true;
            continue;
        } else {
            0
        };

        let plan = FrequencyPlan {
            target_hz,
            pfd_hz: reference.pfd_hz(),
            vco_hz,
            settings: DividerSettings {
                doubler: reference.doubler,
                ref_div: reference.divider,
                n_int: n_int as u32,
                frac,
                modulus,
                output_divider: div,
            },
        };
        log::debug!(
            "plan {} Hz: pfd={} Hz vco={} Hz N={}+{}/{} div={}",
            target_hz,
            plan.pfd_hz,
            vco_hz,
            plan.settings.n_int,
            frac,
            modulus,
            div
        );
        return Ok(plan);
    }

    if needs_fraction {
        Err(Error::UnsupportedFractionalRatio { freq_hz: target_hz })
    } else {
        Err(Error::FrequencyOutOfRange { freq_hz: target_hz })
    }
}

/// Validate a requested output frequency without planning it
pub fn check_output_range(profile: &ChipProfile, freq_hz: u64) -> Result<()> {
    check_range(
        "freq",
        freq_hz,
        profile.limits.rf_min_hz,
        profile.limits.rf_max_hz,
    )
}
