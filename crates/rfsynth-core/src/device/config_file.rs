//! TOML configuration files
//!
//! ```toml
//! [synth]
//! chip = "adf4382"
//! ref_freq = "125 MHz"
//! ref_doubler = true
//! ref_div = 1
//! freq = "20 GHz"
//! cp_current = 15
//! bleed_word = 4903
//! ld_count = 10
//! muxout = "lock_detect"
//! wire_mode = "4-wire"
//! ```
//!
//! Every key except `chip` is optional and falls back to the chip's
//! power-up defaults. `chip` may be omitted when the caller supplies one.

use std::format;
use std::fs;
use std::path::{Path, PathBuf};
use std::string::{String, ToString};

use super::{SynthConfig, WireMode};
use crate::chip::{find_profile, ChipProfile, Muxout};

/// Errors from loading a configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// TOML syntax or type error
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// `chip` names no known family
    #[error("unknown chip: {0}")]
    UnknownChip(String),
    /// No chip in the file and none given by the caller
    #[error("no chip specified")]
    MissingChip,
    /// A key has a value that cannot be interpreted
    #[error("invalid value for {key}: {value}")]
    InvalidValue {
        /// Key name
        key: &'static str,
        /// Offending value
        value: String,
    },
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlFile {
    synth: TomlSynth,
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlSynth {
    chip: Option<String>,
    #[serde(default, deserialize_with = "deserialize_freq")]
    ref_freq: Option<u64>,
    ref_doubler: Option<bool>,
    ref_div: Option<u8>,
    #[serde(default, deserialize_with = "deserialize_freq")]
    freq: Option<u64>,
    cp_current: Option<u8>,
    bleed_word: Option<u16>,
    ld_count: Option<u8>,
    phase_adjust: Option<u8>,
    muxout: Option<String>,
    wire_mode: Option<String>,
    output_level: Option<u8>,
    cmos_3v3: Option<bool>,
}

/// Deserialize a frequency given as an integer or a string with unit
fn deserialize_freq<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FreqOrInt {
        Int(u64),
        Str(String),
    }

    match FreqOrInt::deserialize(deserializer)? {
        FreqOrInt::Int(n) => Ok(Some(n)),
        FreqOrInt::Str(s) => parse_frequency(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Parse a frequency like "125 MHz", "10GHz", "2.4 GHz", "0x1000" or "1000000"
pub fn parse_frequency(s: &str) -> Result<u64, String> {
    let s = s.trim();

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u64::from_str_radix(hex.trim(), 16).map_err(|e| format!("invalid hex: {}", e));
    }
    if let Ok(n) = s.parse::<u64>() {
        return Ok(n);
    }

    let lower = s.to_ascii_lowercase();
    let (num, multiplier) = if let Some(n) = lower.strip_suffix("ghz") {
        (n.trim(), 1_000_000_000u64)
    } else if let Some(n) = lower.strip_suffix("mhz") {
        (n.trim(), 1_000_000)
    } else if let Some(n) = lower.strip_suffix("khz") {
        (n.trim(), 1_000)
    } else if let Some(n) = lower.strip_suffix("hz") {
        (n.trim(), 1)
    } else {
        return Err(format!("invalid frequency: {}", s));
    };

    // Decimal fractions are scaled exactly, without going through floats
    let (int_part, frac_part) = num.split_once('.').unwrap_or((num, ""));
    let digits = multiplier.ilog10() as usize;
    if frac_part.len() > digits || (int_part.is_empty() && frac_part.is_empty()) {
        return Err(format!("invalid frequency: {}", s));
    }
    let int: u64 = if int_part.is_empty() {
        0
    } else {
        int_part
            .parse()
            .map_err(|_| format!("invalid frequency: {}", s))?
    };
    let frac: u64 = if frac_part.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac_part, width = digits);
        padded
            .parse()
            .map_err(|_| format!("invalid frequency: {}", s))?
    };
    int.checked_mul(multiplier)
        .and_then(|v| v.checked_add(frac))
        .ok_or_else(|| format!("frequency too large: {}", s))
}

fn parse_wire_mode(s: &str) -> Option<WireMode> {
    match s.to_ascii_lowercase().as_str() {
        "3-wire" | "3wire" | "three" => Some(WireMode::ThreeWire),
        "4-wire" | "4wire" | "four" => Some(WireMode::FourWire),
        _ => None,
    }
}

impl SynthConfig {
    /// Load a configuration file
    ///
    /// Returns the chip named in the file (or `fallback`) and its
    /// configuration.
    pub fn from_toml_file(
        path: impl AsRef<Path>,
        fallback: Option<&'static ChipProfile>,
    ) -> Result<(&'static ChipProfile, Self), ConfigFileError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, fallback)
    }

    /// Parse a configuration from a TOML string
    pub fn from_toml_str(
        content: &str,
        fallback: Option<&'static ChipProfile>,
    ) -> Result<(&'static ChipProfile, Self), ConfigFileError> {
        let file: TomlFile = toml::from_str(content)?;
        let synth = file.synth;

        let profile = match synth.chip.as_deref() {
            Some(name) => {
                find_profile(name).ok_or_else(|| ConfigFileError::UnknownChip(name.to_string()))?
            }
            None => fallback.ok_or(ConfigFileError::MissingChip)?,
        };

        let mut config = SynthConfig::for_profile(profile);
        if let Some(v) = synth.ref_freq {
            config.ref_freq_hz = v;
        }
        if let Some(v) = synth.ref_doubler {
            config.ref_doubler = v;
        }
        if let Some(v) = synth.ref_div {
            config.ref_div = v;
        }
        if let Some(v) = synth.freq {
            config.freq_hz = v;
        }
        if let Some(v) = synth.cp_current {
            config.cp_current = v;
        }
        if synth.bleed_word.is_some() {
            config.bleed_word = synth.bleed_word;
        }
        if synth.ld_count.is_some() {
            config.ld_count = synth.ld_count;
        }
        if synth.phase_adjust.is_some() {
            config.phase_adjust = synth.phase_adjust;
        }
        if synth.output_level.is_some() {
            config.output_level = synth.output_level;
        }
        if let Some(v) = synth.cmos_3v3 {
            config.cmos_3v3 = v;
        }
        if let Some(name) = synth.muxout {
            config.muxout = Muxout::from_name(&name).ok_or(ConfigFileError::InvalidValue {
                key: "muxout",
                value: name,
            })?;
        }
        if let Some(mode) = synth.wire_mode {
            config.wire_mode = parse_wire_mode(&mode).ok_or(ConfigFileError::InvalidValue {
                key: "wire_mode",
                value: mode,
            })?;
        }

        log::debug!("loaded {} configuration: {:?}", profile.name, config);
        Ok((profile, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::{ADF4368, ADF4382};

    #[test]
    fn parse_frequency_units() {
        assert_eq!(parse_frequency("125 MHz"), Ok(125_000_000));
        assert_eq!(parse_frequency("10GHz"), Ok(10_000_000_000));
        assert_eq!(parse_frequency("2.4 GHz"), Ok(2_400_000_000));
        assert_eq!(parse_frequency("687.5MHz"), Ok(687_500_000));
        assert_eq!(parse_frequency("1000"), Ok(1000));
        assert_eq!(parse_frequency("0x10"), Ok(16));
        assert!(parse_frequency("fast").is_err());
        assert!(parse_frequency("1.5 Hz").is_err());
        assert!(parse_frequency("GHz").is_err());
    }

    #[test]
    fn full_file() {
        let (profile, config) = SynthConfig::from_toml_str(
            r#"
            [synth]
            chip = "adf4382"
            ref_freq = "100 MHz"
            ref_doubler = false
            freq = 12000000000
            cp_current = 7
            bleed_word = 100
            muxout = "lock_detect"
            wire_mode = "3-wire"
            "#,
            None,
        )
        .unwrap();
        assert_eq!(profile.name, "ADF4382");
        assert_eq!(config.ref_freq_hz, 100_000_000);
        assert!(!config.ref_doubler);
        assert_eq!(config.freq_hz, 12_000_000_000);
        assert_eq!(config.cp_current, 7);
        assert_eq!(config.bleed_word, Some(100));
        assert_eq!(config.ld_count, Some(10));
        assert_eq!(config.muxout, Muxout::LockDetect);
        assert_eq!(config.wire_mode, WireMode::ThreeWire);
    }

    #[test]
    fn chip_from_fallback() {
        let (profile, config) =
            SynthConfig::from_toml_str("[synth]\nfreq = \"3 GHz\"\n", Some(&ADF4368)).unwrap();
        assert_eq!(profile.name, "ADF4368");
        assert_eq!(config.freq_hz, 3_000_000_000);
        assert_eq!(config.ref_freq_hz, 100_000_000);
    }

    #[test]
    fn bad_files() {
        assert!(matches!(
            SynthConfig::from_toml_str("[synth]\n", None),
            Err(ConfigFileError::MissingChip)
        ));
        assert!(matches!(
            SynthConfig::from_toml_str("[synth]\nchip = \"adf4351\"\n", None),
            Err(ConfigFileError::UnknownChip(_))
        ));
        assert!(matches!(
            SynthConfig::from_toml_str("[synth]\nmuxout = \"sideways\"\n", Some(&ADF4382)),
            Err(ConfigFileError::InvalidValue { key: "muxout", .. })
        ));
        assert!(matches!(
            SynthConfig::from_toml_str("[synth]\nbogus = 1\n", Some(&ADF4382)),
            Err(ConfigFileError::Parse(_))
        ));
    }
}
