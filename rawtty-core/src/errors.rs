//! Errors raised while opening and configuring a serial device.
//!
//! Every variant that comes from a failed system call keeps the raw `errno`
//! alongside its description, so that the message reads the same way the
//! C library reports it: `Error 2 from open: No such file or directory`.

use std::path::{Path, PathBuf};

use nix::errno::Errno;

/// A wrapper around the failures of the `open` -> `tcgetattr` -> `tcsetattr`
/// sequence used to configure a device.
#[derive(Debug, miette::Diagnostic, thiserror::Error)]
pub enum TtyError {
    #[error("Error {errno} from open: {message}")]
    #[diagnostic(
        code(rawtty::open),
        help("Make sure {path:?} exists and that you have read/write permission for it.")
    )]
    Open {
        path: PathBuf,
        errno: i32,
        message: String,
    },
    #[error("Error {errno} from fcntl: {message}")]
    #[diagnostic(code(rawtty::fcntl))]
    FileFlags { errno: i32, message: String },
    #[error("Error {errno} from tcgetattr: {message}")]
    #[diagnostic(
        code(rawtty::tcgetattr),
        help("Terminal attributes can only be read from a terminal device.")
    )]
    GetAttributes { errno: i32, message: String },
    #[error("Error {errno} from tcsetattr: {message}")]
    #[diagnostic(code(rawtty::tcsetattr))]
    SetAttributes { errno: i32, message: String },
    #[error("Error {errno} from cfsetspeed: {message}")]
    #[diagnostic(code(rawtty::cfsetspeed))]
    SetSpeed { errno: i32, message: String },
    #[error("'{0}' is not a supported baud rate")]
    #[diagnostic(
        code(rawtty::baud),
        help("To see the supported baud rates, try `rawtty list-bauds`.")
    )]
    UnsupportedBaud(u32),
}

impl TtyError {
    pub(crate) fn open(path: &Path, err: &std::io::Error) -> Self {
        let errno = err.raw_os_error().unwrap_or(0);
        Self::Open {
            path: path.to_path_buf(),
            errno,
            message: describe(errno),
        }
    }

    pub(crate) fn file_flags(errno: Errno) -> Self {
        Self::FileFlags {
            errno: errno as i32,
            message: errno.desc().to_string(),
        }
    }

    pub(crate) fn get_attributes(errno: Errno) -> Self {
        Self::GetAttributes {
            errno: errno as i32,
            message: errno.desc().to_string(),
        }
    }

    pub(crate) fn set_attributes(errno: Errno) -> Self {
        Self::SetAttributes {
            errno: errno as i32,
            message: errno.desc().to_string(),
        }
    }

    pub(crate) fn set_speed(errno: Errno) -> Self {
        Self::SetSpeed {
            errno: errno as i32,
            message: errno.desc().to_string(),
        }
    }

    /// The [`Errno`] of the failed system call, if there was one.
    #[must_use]
    pub fn errno(&self) -> Option<Errno> {
        match self {
            Self::Open { errno, .. }
            | Self::FileFlags { errno, .. }
            | Self::GetAttributes { errno, .. }
            | Self::SetAttributes { errno, .. }
            | Self::SetSpeed { errno, .. } => Some(Errno::from_raw(*errno)),
            Self::UnsupportedBaud(_) => None,
        }
    }
}

fn describe(errno: i32) -> String {
    Errno::from_raw(errno).desc().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_error_reads_like_strerror() {
        let io = std::io::Error::from_raw_os_error(Errno::ENOENT as i32);
        let err = TtyError::open(Path::new("/dev/ttyUSB9"), &io);
        assert_eq!(
            err.to_string(),
            format!("Error {} from open: No such file or directory", Errno::ENOENT as i32)
        );
        assert_eq!(err.errno(), Some(Errno::ENOENT));
    }

    #[test]
    fn open_error_help_names_the_device() {
        let io = std::io::Error::from_raw_os_error(Errno::EACCES as i32);
        let err = TtyError::open(Path::new("/dev/ttyUSB9"), &io);
        let help = miette::Diagnostic::help(&err).unwrap().to_string();
        assert!(help.contains("/dev/ttyUSB9"), "{help}");
    }

    #[test]
    fn tcgetattr_error_names_the_call() {
        let err = TtyError::get_attributes(Errno::ENOTTY);
        assert!(err.to_string().contains("from tcgetattr"));
        assert_eq!(err.errno(), Some(Errno::ENOTTY));
    }

    #[test]
    fn unsupported_baud_has_no_errno() {
        assert_eq!(TtyError::UnsupportedBaud(14400).errno(), None);
    }
}
