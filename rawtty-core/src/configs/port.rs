use serde::{Deserialize, Deserializer};
use std::path::PathBuf;

use crate::{
    baud,
    path_utils::ExpandPaths,
    settings::{DataBits, FlowControl, LineSettings, Parity, ReadTimeout, StopBits},
};

/// The device configured when none is given on the command line.
pub const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";

/// Represents the `[port]` table of the `config.toml` file.
///
/// The `[port]` table holds the device and line settings `rawtty` uses
/// when they are not given on the command line.
///
/// The default values (if no config exists):
/// ```toml
/// [port]
/// device = "/dev/ttyUSB0"
/// baud = 9600
/// data-bits = 8
/// parity = "none"
/// stop-bits = 1
/// flow-control = "none"
/// vmin = 0
/// vtime = 10
/// ```
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PortDefaults {
    #[serde(default = "default_device")]
    #[serde(deserialize_with = "expand_path")]
    pub device: PathBuf,
    #[serde(default = "default_baud")]
    #[serde(deserialize_with = "supported_baud")]
    pub baud: u32,
    #[serde(default)]
    pub data_bits: DataBits,
    #[serde(default)]
    pub parity: Parity,
    #[serde(default)]
    pub stop_bits: StopBits,
    #[serde(default)]
    pub flow_control: FlowControl,
    #[serde(default)]
    pub vmin: u8,
    #[serde(default = "default_vtime")]
    pub vtime: u8,
}

impl Default for PortDefaults {
    fn default() -> Self {
        Self {
            device: default_device(),
            baud: default_baud(),
            data_bits: DataBits::default(),
            parity: Parity::default(),
            stop_bits: StopBits::default(),
            flow_control: FlowControl::default(),
            vmin: 0,
            vtime: default_vtime(),
        }
    }
}

impl PortDefaults {
    #[must_use]
    pub const fn line_settings(&self) -> LineSettings {
        LineSettings {
            baud: self.baud,
            data_bits: self.data_bits,
            parity: self.parity,
            stop_bits: self.stop_bits,
            flow_control: self.flow_control,
            read_timeout: ReadTimeout {
                min_bytes: self.vmin,
                deciseconds: self.vtime,
            },
        }
    }
}

fn default_device() -> PathBuf {
    PathBuf::from(DEFAULT_DEVICE)
}

const fn default_baud() -> u32 {
    9600
}

const fn default_vtime() -> u8 {
    10
}

pub(super) fn expand_path<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: Deserializer<'de>,
{
    PathBuf::deserialize(deserializer)?
        .get_expanded_path()
        .ok_or_else(|| serde::de::Error::custom("Error expanding path."))
}

fn supported_baud<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let rate = u32::deserialize(deserializer)?;
    baud::to_baud_rate(rate).map_err(<D::Error as serde::de::Error>::custom)?;
    Ok(rate)
}
