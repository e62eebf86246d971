//! ADF4377/ADF4378 integer-N synthesizer

use super::{
    ChipFamily, ChipProfile, Field, FrequencyLimits, Identity, RegisterMap, VerifyStage,
    WideField,
};
use crate::bus::FrameLayout;

/// Charge pump currents in µA, code 0-15
const CP_CURRENTS_UA: &[u32] = &[
    700, 900, 1100, 1300, 1600, 1800, 2100, 2400, 2800, 3300, 3900, 4600, 5400, 6400, 8500,
    10_100,
];

/// ADF4377 family profile
pub static ADF4377: ChipProfile = ChipProfile {
    family: ChipFamily::Adf4377,
    name: "ADF4377",
    aliases: &["adf4378"],
    description: "800 MHz to 12.8 GHz integer-N synthesizer with dual outputs",
    frame: FrameLayout::STANDARD,
    max_register: 0x54,
    por_delay_us: 10_000,
    scratchpad: 0x0A,
    scratch_pattern: 0x5A,
    verify_stage: VerifyStage::AfterReset,
    identity: Some(Identity {
        vendor_addr: 0x0C,
        vendor_id: 0x0456,
        chip_type_addr: 0x03,
        chip_type: 0x06,
        product_addr: 0x04,
    }),
    defaults: &[(0x01, 0x00), (0x02, 0x00)],
    lsb_first: true,
    limits: FrequencyLimits {
        rf_min_hz: 800_000_000,
        rf_max_hz: 12_800_000_000,
        vco_min_hz: 6_400_000_000,
        vco_max_hz: 12_800_000_000,
        pfd_max_hz: 500_000_000,
        ref_min_hz: 10_000_000,
        ref_max_hz: 1_000_000_000,
        doubler_max_ref_hz: 250_000_000,
        ref_div_min: 1,
        ref_div_max: 63,
        n_int_min: 16,
        n_int_max: 4095,
        output_dividers: &[1, 2, 4, 8],
        frac_modulus: None,
    },
    map: RegisterMap {
        n_int: WideField::new(0x10, 12),
        frac: None,
        output_div: Field::new(0x11, 6, 2),
        ref_div: Field::new(0x12, 0, 6),
        ref_doubler: Field::bit(0x12, 6),
        cp_current: Field::new(0x15, 0, 4),
        bleed: None,
        ld_count: None,
        muxout: Field::new(0x1D, 4, 4),
        phase_adjust: None,
        output_level: Some(Field::new(0x19, 0, 2)),
        cmos_3v3: None,
        lock_status: Field::bit(0x49, 0),
    },
    cp_currents_ua: CP_CURRENTS_UA,
};
