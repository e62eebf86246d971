//! ADF4368 fractional-N synthesizer
//!
//! Same register map as the ADF4382 with a lower VCO range.

use super::adf4382::{CP_CURRENTS_UA, FRAC_MODULUS, IDENTITY, MAP};
use super::{ChipFamily, ChipProfile, FrequencyLimits, VerifyStage};
use crate::bus::FrameLayout;

/// ADF4368 family profile
pub static ADF4368: ChipProfile = ChipProfile {
    family: ChipFamily::Adf4368,
    name: "ADF4368",
    aliases: &[],
    description: "800 MHz to 12.8 GHz fractional-N synthesizer",
    frame: FrameLayout::STANDARD,
    max_register: 0x63,
    por_delay_us: 10_000,
    scratchpad: 0x0A,
    scratch_pattern: 0x5A,
    verify_stage: VerifyStage::AfterDefaults,
    identity: Some(IDENTITY),
    defaults: &[(0x01, 0x00), (0x02, 0x00)],
    lsb_first: false,
    limits: FrequencyLimits {
        rf_min_hz: 800_000_000,
        rf_max_hz: 12_800_000_000,
        vco_min_hz: 6_400_000_000,
        vco_max_hz: 12_800_000_000,
        pfd_max_hz: 625_000_000,
        ref_min_hz: 10_000_000,
        ref_max_hz: 1_000_000_000,
        doubler_max_ref_hz: 250_000_000,
        ref_div_min: 1,
        ref_div_max: 63,
        n_int_min: 19,
        n_int_max: 4095,
        output_dividers: &[1, 2, 4, 8],
        frac_modulus: Some(FRAC_MODULUS),
    },
    map: MAP,
    cp_currents_ua: CP_CURRENTS_UA,
};
