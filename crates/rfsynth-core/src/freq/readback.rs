//! Inverse path: register contents to output frequency

use super::{check_range, DividerSettings};
use crate::chip::{ChipProfile, WideField};
use crate::error::Result;

fn read_wide<F>(field: WideField, read: &mut F) -> Result<u32>
where
    F: FnMut(u16) -> Result<u8>,
{
    let mut bytes = [0u8; 4];
    for (i, byte) in bytes.iter_mut().enumerate().take(field.len()) {
        *byte = read(field.addr + i as u16)?;
    }
    Ok(field.assemble(&bytes))
}

/// Read the divider settings currently held in the chip
///
/// `read` fetches one register. A reference or output divider value the
/// chip could never have been programmed with is reported as
/// `ConfigOutOfRange`.
pub fn read_divider_settings<F>(profile: &ChipProfile, mut read: F) -> Result<DividerSettings>
where
    F: FnMut(u16) -> Result<u8>,
{
    let map = &profile.map;
    let limits = &profile.limits;

    let ref_reg = read(map.ref_div.addr)?;
    let ref_div = map.ref_div.extract(ref_reg);
    let doubler_reg = if map.ref_doubler.addr == map.ref_div.addr {
        ref_reg
    } else {
        read(map.ref_doubler.addr)?
    };
    let doubler = map.ref_doubler.extract(doubler_reg) != 0;
    check_range(
        "ref_div",
        u64::from(ref_div),
        u64::from(limits.ref_div_min),
        u64::from(limits.ref_div_max),
    )?;

    let n_int = read_wide(map.n_int, &mut read)?;
    let frac = match map.frac {
        Some(field) => read_wide(field, &mut read)?,
        None => 0,
    };

    let div_code = map.output_div.extract(read(map.output_div.addr)?);
    let output_divider = 1u32 << div_code;
    if !limits.output_dividers.contains(&output_divider) {
        let max = limits.output_dividers.last().copied().unwrap_or(1);
        check_range("output_div", u64::from(output_divider), 1, u64::from(max))?;
    }

    Ok(DividerSettings {
        doubler,
        ref_div,
        n_int,
        frac,
        modulus: limits.frac_modulus.unwrap_or(1),
        output_divider,
    })
}

/// Output frequency implied by register contents
pub fn recompute_from_registers<F>(profile: &ChipProfile, ref_hz: u64, read: F) -> Result<u64>
where
    F: FnMut(u16) -> Result<u8>,
{
    let settings = read_divider_settings(profile, read)?;
    Ok(settings.output_hz(ref_hz))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::{ADF4377, ADF4382};
    use crate::error::Error;

    #[test]
    fn unprogrammed_ref_divider_is_rejected() {
        let regs = [0u8; 0x80];
        assert!(matches!(
            recompute_from_registers(&ADF4382, 125_000_000, |a| Ok(regs[a as usize])),
            Err(Error::ConfigOutOfRange {
                parameter: "ref_div",
                ..
            })
        ));
    }

    #[test]
    fn reads_hand_programmed_registers() {
        let mut regs = [0u8; 0x80];
        regs[0x12] = 0x41; // doubler, R=1
        regs[0x10] = 40;
        assert_eq!(
            recompute_from_registers(&ADF4377, 125_000_000, |a| Ok(regs[a as usize])),
            Ok(10_000_000_000)
        );
    }

    #[test]
    fn read_errors_propagate() {
        let err = Error::InvalidAddress { addr: 0, max: 0 };
        assert_eq!(
            recompute_from_registers(&ADF4377, 125_000_000, |_| Err(err)),
            Err(err)
        );
    }
}
