//! This module handles the structuring, valid options, and parsing of user config
//! files. User config files must be `config.toml` and are parsed with [`serde`] and
//! respectively serde's [`toml`] crate.
//!
//! The default location is `$XDG_CONFIG_HOME/rawtty/config.toml`, falling back
//! to `~/.config/rawtty/config.toml`.

pub mod errors;
mod log;
mod port;
pub use log::*;
pub use port::*;

use crate::{
    configs::errors::{ConfigError, TomlError},
    path_utils::home_dir,
    settings::{DataBits, FlowControl, Parity, StopBits},
};
use serde::Deserialize;
use std::{
    ops::Range,
    path::{Path, PathBuf},
    sync::OnceLock,
};
use tracing::Level;

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Represents the entire `config.toml` configuration file.
///
/// See [`PortDefaults`] and [`LogDefaults`]
#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub port: PortDefaults,
    #[serde(default)]
    pub log: LogDefaults,
}

impl Config {
    fn apply_overrides(&mut self, overrides: ConfigOverride) {
        let port = &mut self.port;
        if let Some(device) = overrides.device {
            port.device = device;
        }
        if let Some(baud) = overrides.baud {
            port.baud = baud;
        }
        if let Some(data_bits) = overrides.data_bits {
            port.data_bits = data_bits;
        }
        if let Some(parity) = overrides.parity {
            port.parity = parity;
        }
        if let Some(stop_bits) = overrides.stop_bits {
            port.stop_bits = stop_bits;
        }
        if let Some(flow_control) = overrides.flow_control {
            port.flow_control = flow_control;
        }
        if let Some(vmin) = overrides.vmin {
            port.vmin = vmin;
        }
        if let Some(vtime) = overrides.vtime {
            port.vtime = vtime;
        }
        if let Some(file) = overrides.log_file {
            self.log.file = Some(file);
        }
        if let Some(level) = overrides.log_level {
            self.log.level = Some(level);
        }
    }
}

/// Values given on the command line. Any field that is `Some` replaces the
/// value from `config.toml`.
#[derive(Debug, Default)]
pub struct ConfigOverride {
    pub device: Option<PathBuf>,
    pub baud: Option<u32>,
    pub data_bits: Option<DataBits>,
    pub parity: Option<Parity>,
    pub stop_bits: Option<StopBits>,
    pub flow_control: Option<FlowControl>,
    pub vmin: Option<u8>,
    pub vtime: Option<u8>,
    pub log_file: Option<PathBuf>,
    pub log_level: Option<Level>,
}

/// Parses the contents of a config file. `name` is only used to label errors.
///
/// # Errors
/// Returns [`ConfigError::TomlError`] pointing at the offending span.
pub fn parse_config(name: &str, contents: &str) -> Result<Config, ConfigError> {
    toml::from_str(contents).map_err(|e| {
        TomlError::new(
            name,
            e.span().unwrap_or(Range { start: 0, end: 0 }),
            contents.to_string(),
            e.message().to_string(),
        )
        .into()
    })
}

/// Loads the config at `path`, or at the default location when `path` is `None`.
///
/// A missing file at the default location yields [`Config::default()`]; a
/// missing file that was asked for explicitly is an error.
///
/// # Errors
/// [`ConfigError::NotFound`] for an explicit `path` that is not a file,
/// otherwise any read or parse error.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(p) if p.is_file() => p.to_path_buf(),
        Some(p) => return Err(ConfigError::NotFound(p.to_path_buf())),
        None => match get_config_file() {
            Some(p) => p,
            None => return Ok(Config::default()),
        },
    };

    let contents = std::fs::read_to_string(&file)?;
    let name = file
        .file_name()
        .map_or_else(|| "config.toml".into(), |n| n.to_string_lossy());
    parse_config(&name, &contents)
}

/// This function constructs a `static CONFIG` for the rest of rawtty to get a
/// reference to throughout the remainder of the program.
///
/// See [`load_config`] for where the file is read from. If the user's config
/// does not set values for every field, the unspecified fields are filled in
/// with their default values before `overrides` are applied.
///
/// # Errors
/// Any error from [`load_config`], or [`ConfigError::AlreadyInitialized`].
pub fn initialize_config(
    path: Option<&Path>,
    overrides: ConfigOverride,
) -> Result<&'static Config, ConfigError> {
    let mut config = load_config(path)?;
    config.apply_overrides(overrides);

    CONFIG
        .set(config)
        .map_err(|_| ConfigError::AlreadyInitialized)?;
    Ok(get_config())
}

/// When called, `get_config()` returns a reference to the global `static CONFIG`
/// that was initialized at the start of the program.
///
/// # Panics
/// If [`initialize_config`] has not been called.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// `$XDG_CONFIG_HOME/rawtty`, or `~/.config/rawtty`.
#[must_use]
pub fn get_conf_dir() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|d| !d.is_empty())
        .map(PathBuf::from)
        .or_else(|| home_dir().map(|h| h.join(".config")))?;
    Some(base.join("rawtty"))
}

fn get_config_file() -> Option<PathBuf> {
    let conf_file = get_conf_dir()?.join("config.toml");
    conf_file.is_file().then_some(conf_file)
}
