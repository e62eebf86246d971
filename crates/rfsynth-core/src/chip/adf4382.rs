//! ADF4382 fractional-N synthesizer

use super::{
    ChipFamily, ChipProfile, Field, FrequencyLimits, Identity, RegisterMap, VerifyStage,
    WideField,
};
use crate::bus::FrameLayout;

/// Charge pump currents in µA, code 0-15
pub(super) const CP_CURRENTS_UA: &[u32] = &[
    790, 990, 1190, 1380, 1590, 1980, 2390, 2790, 3180, 3970, 4770, 5570, 6350, 7940, 9530,
    11_110,
];

/// Register map shared by the ADF4382 and ADF4368
pub(super) const MAP: RegisterMap = RegisterMap {
    n_int: WideField::new(0x10, 16),
    frac: Some(WideField::new(0x12, 25)),
    output_div: Field::new(0x24, 4, 3),
    ref_div: Field::new(0x20, 0, 6),
    ref_doubler: Field::bit(0x20, 6),
    cp_current: Field::new(0x1F, 0, 4),
    bleed: Some(WideField::new(0x1D, 13)),
    ld_count: Some(Field::new(0x2C, 0, 5)),
    muxout: Field::new(0x2E, 4, 4),
    phase_adjust: Some(Field::new(0x33, 0, 8)),
    output_level: None,
    cmos_3v3: Some(Field::bit(0x3D, 5)),
    lock_status: Field::bit(0x58, 0),
};

/// Vendor and chip type registers shared by the ADF4382 and ADF4368
pub(super) const IDENTITY: Identity = Identity {
    vendor_addr: 0x0C,
    vendor_id: 0x0456,
    chip_type_addr: 0x03,
    chip_type: 0x06,
    product_addr: 0x04,
};

/// Modulus of the 25-bit fractional accumulator
pub(super) const FRAC_MODULUS: u32 = 1 << 25;

/// ADF4382 family profile
pub static ADF4382: ChipProfile = ChipProfile {
    family: ChipFamily::Adf4382,
    name: "ADF4382",
    aliases: &["adf4382a"],
    description: "687.5 MHz to 22 GHz fractional-N synthesizer",
    frame: FrameLayout::STANDARD,
    max_register: 0x63,
    por_delay_us: 10_000,
    scratchpad: 0x0A,
    scratch_pattern: 0xAA,
    verify_stage: VerifyStage::AfterDefaults,
    identity: Some(IDENTITY),
    defaults: &[(0x01, 0x00), (0x02, 0x00)],
    lsb_first: false,
    limits: FrequencyLimits {
        rf_min_hz: 687_500_000,
        rf_max_hz: 22_000_000_000,
        vco_min_hz: 11_000_000_000,
        vco_max_hz: 22_000_000_000,
        pfd_max_hz: 625_000_000,
        ref_min_hz: 10_000_000,
        ref_max_hz: 1_000_000_000,
        doubler_max_ref_hz: 250_000_000,
        ref_div_min: 1,
        ref_div_max: 63,
        n_int_min: 19,
        n_int_max: 4095,
        output_dividers: &[1, 2, 4, 8, 16],
        frac_modulus: Some(FRAC_MODULUS),
    },
    map: MAP,
    cp_currents_ua: CP_CURRENTS_UA,
};
