use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use tracing::Level;

/// Represents the `[log]` table of the `config.toml` file.
///
/// When `file` is unset, log output goes to stderr. `level` is one of
/// `trace`, `debug`, `info`, `warn` or `error`.
///
/// ```toml
/// [log]
/// file = "~/.local/state/rawtty.log"
/// level = "info"
/// ```
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LogDefaults {
    #[serde(default)]
    #[serde(deserialize_with = "optional_path")]
    pub file: Option<PathBuf>,
    #[serde(default)]
    #[serde(deserialize_with = "level")]
    pub level: Option<Level>,
}

fn optional_path<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    super::port::expand_path(deserializer).map(Some)
}

fn level<'de, D>(deserializer: D) -> Result<Option<Level>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse::<Level>().map(Some).map_err(|_| {
        serde::de::Error::unknown_variant(&s, &["trace", "debug", "info", "warn", "error"])
    })
}
