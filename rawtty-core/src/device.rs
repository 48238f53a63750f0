//! An open serial device and the three system calls used to configure it.

use std::{
    fmt,
    fs::{File, OpenOptions},
    os::{
        fd::{AsFd, AsRawFd, BorrowedFd},
        unix::fs::OpenOptionsExt,
    },
    path::{Path, PathBuf},
    str::FromStr,
};

use nix::{
    fcntl::{self, FcntlArg, OFlag},
    sys::termios::{self, SetArg, Termios},
};
use tracing::{debug, info, instrument};

use crate::{errors::TtyError, settings::NORMALIZER};

/// When [`SerialDevice::apply`] takes effect (`tcsetattr`'s `optional_actions`).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ApplyWhen {
    /// `TCSANOW`: immediately.
    #[default]
    Now,
    /// `TCSADRAIN`: after all queued output has been transmitted.
    Drain,
    /// `TCSAFLUSH`: after output drains, discarding any unread input.
    Flush,
}

impl From<ApplyWhen> for SetArg {
    fn from(value: ApplyWhen) -> Self {
        match value {
            ApplyWhen::Now => Self::TCSANOW,
            ApplyWhen::Drain => Self::TCSADRAIN,
            ApplyWhen::Flush => Self::TCSAFLUSH,
        }
    }
}

impl FromStr for ApplyWhen {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match NORMALIZER(s).as_ref() {
            "now" | "tcsanow" => Ok(Self::Now),
            "drain" | "tcsadrain" => Ok(Self::Drain),
            "flush" | "tcsaflush" => Ok(Self::Flush),
            _ => Err(format!(
                "`{s}` isn't a valid option; valid options include [\"now\", \"drain\", \"flush\"]"
            )),
        }
    }
}

impl fmt::Display for ApplyWhen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Now => write!(f, "now"),
            Self::Drain => write!(f, "drain"),
            Self::Flush => write!(f, "flush"),
        }
    }
}

/// A serial device opened for reading and writing.
///
/// The descriptor is opened with `O_NOCTTY` so the device never becomes the
/// controlling terminal of the process, and it is closed when the
/// [`SerialDevice`] is dropped.
#[derive(Debug)]
pub struct SerialDevice {
    file: File,
    path: PathBuf,
}

impl SerialDevice {
    /// Opens `path` read/write.
    ///
    /// The device is opened with `O_NONBLOCK` so that `open(2)` does not wait
    /// for carrier on a line whose `CLOCAL` is still clear. The flag is cleared
    /// again before returning, leaving reads to `VMIN`/`VTIME`.
    ///
    /// # Errors
    /// Returns [`TtyError::Open`] carrying the `errno` of the failed `open(2)`,
    /// or [`TtyError::FileFlags`] if `O_NONBLOCK` cannot be cleared.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TtyError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags((OFlag::O_NOCTTY | OFlag::O_NONBLOCK).bits())
            .open(path)
            .map_err(|e| TtyError::open(path, &e))?;
        let flags = fcntl::fcntl(file.as_raw_fd(), FcntlArg::F_GETFL)
            .map(OFlag::from_bits_truncate)
            .map_err(TtyError::file_flags)?;
        fcntl::fcntl(
            file.as_raw_fd(),
            FcntlArg::F_SETFL(flags.difference(OFlag::O_NONBLOCK)),
        )
        .map_err(TtyError::file_flags)?;
        debug!("device opened");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the current terminal attributes (`tcgetattr`).
    ///
    /// A `termios` passed to [`apply`][Self::apply] must start from one
    /// returned here; POSIX leaves `tcsetattr` undefined otherwise.
    ///
    /// # Errors
    /// Returns [`TtyError::GetAttributes`], e.g. `ENOTTY` when the path is not a terminal.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn attributes(&self) -> Result<Termios, TtyError> {
        termios::tcgetattr(&self.file).map_err(TtyError::get_attributes)
    }

    /// Writes `termios` back to the device (`tcsetattr`).
    ///
    /// # Errors
    /// Returns [`TtyError::SetAttributes`] if the call fails.
    #[instrument(skip_all, fields(path = %self.path.display(), when = %when))]
    pub fn apply(&self, termios: &Termios, when: ApplyWhen) -> Result<(), TtyError> {
        termios::tcsetattr(&self.file, when.into(), termios).map_err(TtyError::set_attributes)?;
        info!("terminal attributes applied");
        Ok(())
    }
}

impl AsFd for SerialDevice {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::errno::Errno;

    #[test]
    fn missing_device_reports_enoent() {
        let err = SerialDevice::open("/dev/rawtty-does-not-exist").unwrap_err();
        assert!(matches!(err, TtyError::Open { .. }));
        assert_eq!(err.errno(), Some(Errno::ENOENT));
        assert!(err.to_string().starts_with(&format!("Error {} from open: ", Errno::ENOENT as i32)));
    }

    #[test]
    fn regular_file_is_not_a_tty() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let device = SerialDevice::open(file.path()).unwrap();
        let err = device.attributes().unwrap_err();
        assert_eq!(err.errno(), Some(Errno::ENOTTY));
        assert!(err.to_string().contains("from tcgetattr"));
    }

    #[test]
    fn apply_when_parses() {
        assert_eq!("TCSADRAIN".parse::<ApplyWhen>(), Ok(ApplyWhen::Drain));
        assert_eq!("flush".parse::<ApplyWhen>(), Ok(ApplyWhen::Flush));
        assert!("later".parse::<ApplyWhen>().is_err());
        assert_eq!(SetArg::from(ApplyWhen::Now), SetArg::TCSANOW);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn pty_attributes_round_trip() {
        let (_master, path) = crate::test_utils::open_pty();
        let device = SerialDevice::open(&path).unwrap();
        let tty = device.attributes().unwrap();
        device.apply(&tty, ApplyWhen::Now).unwrap();
        assert_eq!(device.path(), path.as_path());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn opened_device_blocks_on_reads() {
        let (_master, path) = crate::test_utils::open_pty();
        let device = SerialDevice::open(&path).unwrap();
        let flags = fcntl::fcntl(device.as_fd().as_raw_fd(), FcntlArg::F_GETFL).unwrap();
        assert!(!OFlag::from_bits_truncate(flags).contains(OFlag::O_NONBLOCK));
    }
}
