use std::{ops::Range, path::PathBuf};

use crossterm::style::Stylize;
use miette::{NamedSource, SourceSpan};

/// A wrapper around error types that may arise from attempting to load a config
/// file.
///
/// Used to allow better, more specific, handling of errors that may arise
/// from parsing the file.
///
/// [`ConfigError::AlreadyInitialized`] only arises if
/// [`initialize_config()`][`super::initialize_config()`] is called a second time.
#[derive(Debug, miette::Diagnostic, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Could not find config file '{}'", .0.display())]
    #[diagnostic(help("Leave out `--config` to use the default location."))]
    NotFound(PathBuf),
    #[error(transparent)]
    #[diagnostic(transparent)]
    TomlError(#[from] TomlError),
    #[error(
        "Config already initialized.\nPlease report the bug to {}", "https://github.com/tkatter/rawtty".bold()
    )]
    AlreadyInitialized,
}

/// A wrapper around [`toml::de::Error`] to print custom error messages with [`miette`].
///
/// The toml message is split at its first ',' into the label shown under the
/// offending span and the help text.
#[derive(thiserror::Error, miette::Diagnostic, Debug)]
#[error("{}", "Error reading config file".red())]
#[diagnostic(
    help("{}", self.msg.split_once(',').unwrap_or(("", self.msg.as_str())).1.trim())
)]
pub struct TomlError {
    #[label("{}", self.msg.split_once(',').unwrap_or((self.msg.as_str(), "")).0.trim())]
    at: SourceSpan,

    #[source_code]
    src: NamedSource<String>,

    msg: String,
}

impl TomlError {
    pub(crate) fn new(name: &str, span: Range<usize>, source: String, message: String) -> Self {
        let at: SourceSpan = (span.start, span.end - span.start).into();
        let src = NamedSource::new(name, source);
        Self {
            at,
            src,
            msg: message,
        }
    }

    /// The toml parser's message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Byte offset of the offending value in the file.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.at.offset()
    }
}
