//! Transport registration and dispatch
//!
//! This module provides a centralized registry for all bus transports, with
//! support for feature-gated inclusion and dynamic help text generation.

use rfsynth_core::bus::BusTransport;
use rfsynth_core::chip::ChipProfile;
use thiserror::Error;

/// Boxed transport handed to the device
pub type BoxedTransport = Box<dyn BusTransport + Send>;

/// Errors from transport selection
#[derive(Debug, Error)]
pub enum TransportError {
    /// Name not known or not compiled in
    #[error("Unknown transport: {0} (available: {1})")]
    Unknown(String, String),

    /// Malformed `key=value` list
    #[error("Invalid parameter format: '{0}' (expected key=value)")]
    BadFormat(String),

    /// Option rejected by the transport
    #[error("Invalid {transport} parameters: {message}")]
    InvalidParameter {
        transport: &'static str,
        message: String,
    },

    /// Device could not be opened
    #[error("Failed to open {transport}: {message}")]
    OpenFailed {
        transport: &'static str,
        message: String,
    },
}

/// Information about a transport
pub struct TransportInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available transports (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_transports() -> Vec<TransportInfo> {
    let mut transports = Vec::new();

    #[cfg(feature = "dummy")]
    transports.push(TransportInfo {
        name: "dummy",
        aliases: &[],
        description: "In-memory register file emulator (absent=1, locks=0, vendor=<id>)",
    });

    #[cfg(feature = "linux-spi")]
    transports.push(TransportInfo {
        name: "linux_spi",
        aliases: &["linux-spi", "spidev"],
        description:
            "Linux spidev interface (dev=/dev/spidevX.Y or bus=X,cs=Y,spispeed=<kHz>,mode=<0-3>,lsb=<0|1>)",
    });

    transports
}

/// Generate a short list of transport names for CLI help
pub fn transport_names_short() -> String {
    let transports = available_transports();
    let names: Vec<&str> = transports.iter().map(|t| t.name).collect();
    names.join(", ")
}

/// Resolve a name or alias to the canonical transport name
pub fn find_transport(name: &str) -> Option<&'static str> {
    available_transports()
        .into_iter()
        .find(|t| t.name == name || t.aliases.contains(&name))
        .map(|t| t.name)
}

/// Parsed transport parameters
#[derive(Debug, PartialEq, Eq)]
pub struct TransportParams {
    /// Transport name as given
    pub name: String,
    /// Key-value parameters, in command-line order
    pub params: Vec<(String, String)>,
}

impl TransportParams {
    /// Parameters as borrowed pairs
    pub fn options(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

/// Parse a transport string into name and parameters
///
/// Format: "name" or "name:key1=value1,key2=value2"
pub fn parse_transport_params(s: &str) -> Result<TransportParams, TransportError> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    let mut params = Vec::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            let (key, value) = opt
                .split_once('=')
                .ok_or_else(|| TransportError::BadFormat(opt.to_string()))?;
            params.push((key.to_string(), value.to_string()));
        }
    }

    Ok(TransportParams {
        name: name.to_string(),
        params,
    })
}

/// Open the transport named by `transport` for a chip of the given family
///
/// The dummy transport emulates `profile`; hardware transports ignore it.
#[allow(unused_variables)]
pub fn open_transport(
    transport: &str,
    profile: &'static ChipProfile,
) -> Result<BoxedTransport, TransportError> {
    let params = parse_transport_params(transport)?;

    match find_transport(&params.name) {
        #[cfg(feature = "dummy")]
        Some("dummy") => open_dummy(&params, profile),

        #[cfg(feature = "linux-spi")]
        Some("linux_spi") => open_linux_spi(&params),

        _ => Err(TransportError::Unknown(
            params.name,
            transport_names_short(),
        )),
    }
}

#[cfg(feature = "dummy")]
fn open_dummy(
    params: &TransportParams,
    profile: &'static ChipProfile,
) -> Result<BoxedTransport, TransportError> {
    use rfsynth_dummy::{DummyConfig, DummySynth};

    let invalid = |message: String| TransportError::InvalidParameter {
        transport: "dummy",
        message,
    };
    let flag = |key: &str, value: &str| match value {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(invalid(format!("Invalid {} value: {}", key, value))),
    };

    let mut config = DummyConfig::default();
    for (key, value) in params.options() {
        match key {
            "absent" => config.absent = flag(key, value)?,
            "locks" => config.locks = flag(key, value)?,
            "vendor" => {
                let hex = value.trim_start_matches("0x").trim_start_matches("0X");
                config.vendor_id = Some(
                    u16::from_str_radix(hex, 16)
                        .map_err(|_| invalid(format!("Invalid vendor value: {}", value)))?,
                );
            }
            _ => log::warn!("dummy: Unknown option: {}={}", key, value),
        }
    }

    log::info!("Opening dummy {} emulator", profile.name);
    Ok(Box::new(DummySynth::new(profile, config)))
}

#[cfg(feature = "linux-spi")]
fn open_linux_spi(params: &TransportParams) -> Result<BoxedTransport, TransportError> {
    use rfsynth_linux_spi::{parse_options, LinuxSpi};

    log::info!("Opening Linux SPI transport...");

    let config = parse_options(&params.options()).map_err(|message| {
        TransportError::InvalidParameter {
            transport: "linux_spi",
            message,
        }
    })?;

    let spi = LinuxSpi::open(&config).map_err(|e| TransportError::OpenFailed {
        transport: "linux_spi",
        message: format!(
            "{}\n\
             Make sure the device exists and you have read/write permissions.\n\
             You may need to: sudo usermod -aG spi $USER",
            e
        ),
    })?;

    Ok(Box::new(spi))
}
