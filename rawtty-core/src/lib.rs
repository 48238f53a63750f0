#![doc(html_root_url = "https://docs.rs/rawtty-core/0.1.0")]
//! `rawtty-core` is the underlying library for [`rawtty`](https://crates.io/crates/rawtty)
//!
//! It opens a POSIX serial device, reads its terminal attributes (`termios`),
//! rewrites them for raw byte I/O (framing, flow control, line discipline,
//! read timeouts and baud rate) and writes them back to the device.
//!
//! ## Example
//! ```no_run
//! use rawtty_core::{
//!     device::{ApplyWhen, SerialDevice},
//!     raw,
//!     settings::LineSettings,
//! };
//!
//! fn configure() -> Result<(), rawtty_core::errors::TtyError> {
//!     let device = SerialDevice::open("/dev/ttyUSB0")?;
//!     let mut tty = device.attributes()?;
//!     raw::configure(&mut tty, &LineSettings::default())?;
//!     device.apply(&tty, ApplyWhen::Now)
//! }
//! ```

pub mod baud;
pub mod cli;
pub mod configs;
pub mod device;
pub mod errors;
pub mod path_utils;
pub mod raw;
pub mod report;
pub mod settings;

#[cfg(all(test, target_os = "linux"))]
pub(crate) mod test_utils;
