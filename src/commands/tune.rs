//! Frequency and tuning commands

use super::{format_freq, Device};
use crate::cli::SetArgs;
use rfsynth_core::chip::Muxout;
use rfsynth_core::device::Parameter;

/// Translate `set` options into device parameters, in application order
pub fn parameters(args: &SetArgs) -> Result<Vec<Parameter>, Box<dyn std::error::Error>> {
    let mut params = Vec::new();
    if let Some(code) = args.cp_current {
        params.push(Parameter::ChargePumpCurrent(code));
    }
    if let Some(word) = args.bleed {
        params.push(Parameter::BleedWord(word));
    }
    if let Some(count) = args.ld_count {
        params.push(Parameter::LockDetectCount(count));
    }
    if let Some(name) = &args.muxout {
        let muxout =
            Muxout::from_name(name).ok_or_else(|| format!("Unknown MUXOUT function: {}", name))?;
        params.push(Parameter::Muxout(muxout));
    }
    if let Some(phase) = args.phase {
        params.push(Parameter::PhaseAdjust(phase));
    }
    // Frequency last so the loop settles with the new charge pump settings
    if let Some(freq) = args.freq {
        params.push(Parameter::Frequency(freq));
    }
    Ok(params)
}

/// Apply the requested settings
pub fn run_set(dev: &mut Device, args: &SetArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.is_empty() {
        return Err("Nothing to set (see --help)".into());
    }
    for param in parameters(args)? {
        dev.set_parameter(param)?;
        log::debug!("Applied {:?}", param);
    }
    if args.freq.is_some() {
        println!("Output: {}", format_freq(dev.get_output_frequency()?));
    }
    Ok(())
}

/// Print the output frequency implied by the divider registers
pub fn run_get_freq(dev: &mut Device) -> Result<(), Box<dyn std::error::Error>> {
    let freq = dev.get_output_frequency()?;
    println!("{} Hz ({})", freq, format_freq(freq));
    Ok(())
}

/// Print lock status, divider registers and cached settings
pub fn run_status(dev: &mut Device) -> Result<(), Box<dyn std::error::Error>> {
    let profile = dev.profile();
    let status = dev.read_status()?;
    let dividers = dev.read_divider_settings()?;
    let settings = *dev.settings();
    let reference = settings.reference;

    println!("{} status", profile.name);
    println!("==============");
    println!("State:           {}", status.state);
    println!(
        "Lock detect:     {}",
        if status.locked { "locked" } else { "unlocked" }
    );
    println!(
        "Reference:       {} (doubler {}, R={})",
        format_freq(reference.freq_hz),
        if dividers.doubler { "on" } else { "off" },
        dividers.ref_div
    );
    println!("PFD:             {}", format_freq(reference.pfd_hz()));
    if dividers.modulus > 1 {
        println!(
            "N:               {} + {}/{}",
            dividers.n_int, dividers.frac, dividers.modulus
        );
    } else {
        println!("N:               {}", dividers.n_int);
    }
    println!("Output divider:  {}", dividers.output_divider);
    println!(
        "Output:          {}",
        format_freq(dividers.output_hz(reference.freq_hz))
    );
    match settings.freq_hz {
        Some(freq) => println!("Requested:       {}", format_freq(freq)),
        None => println!("Requested:       unknown (last update interrupted)"),
    }

    let cp = profile
        .cp_current_ua(settings.cp_current)
        .map(|ua| format!(" ({} uA)", ua))
        .unwrap_or_default();
    println!("Charge pump:     code {}{}", settings.cp_current, cp);
    if let Some(word) = settings.bleed_word {
        println!("Bleed word:      {}", word);
    }
    if let Some(count) = settings.ld_count {
        println!("Lock detect cnt: {}", count);
    }
    if let Some(phase) = settings.phase_adjust {
        println!("Phase adjust:    {}", phase);
    }
    println!("MUXOUT:          {:?}", settings.muxout);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_applied_last() {
        let args = SetArgs {
            freq: Some(10_000_000_000),
            cp_current: Some(3),
            muxout: Some("lock_detect".to_string()),
            ..Default::default()
        };
        assert_eq!(
            parameters(&args).unwrap(),
            vec![
                Parameter::ChargePumpCurrent(3),
                Parameter::Muxout(Muxout::LockDetect),
                Parameter::Frequency(10_000_000_000),
            ]
        );
    }

    #[test]
    fn test_unknown_muxout() {
        let args = SetArgs {
            muxout: Some("sideways".to_string()),
            ..Default::default()
        };
        assert!(parameters(&args).is_err());
    }
}
