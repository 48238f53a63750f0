//! Human readable dumps of a device's terminal attributes.

use std::{
    fs::File,
    io::{self, Write},
    path::Path,
};

use nix::sys::termios::{ControlFlags, LocalFlags, Termios};

use crate::{baud, create_recursive, settings::LineSettings};

const fn on_off(b: bool) -> &'static str {
    if b { "on" } else { "off" }
}

fn rate(baud: u32) -> String {
    if baud == 0 {
        "0 (hang up or custom rate)".to_string()
    } else {
        baud.to_string()
    }
}

/// Writes one `Label: value` line per setting of `termios`.
///
/// Lines end in `\r\n` so the output reads the same when the terminal it is
/// printed to is itself in raw mode.
///
/// # Errors
/// Any error from writing to `handle`.
pub fn write_settings<W: Write + ?Sized>(
    handle: &mut W,
    device: &Path,
    termios: &Termios,
) -> io::Result<()> {
    let settings = LineSettings::decode(termios);
    let local = termios.local_flags;

    write!(handle, "Device: {}\r\n", device.display())?;
    write!(handle, "Baud rate: {}\r\n", rate(settings.baud))?;
    let input = baud::input_speed(termios);
    if input != settings.baud {
        write!(handle, "Input baud rate: {}\r\n", rate(input))?;
    }
    write!(handle, "Char size: {}\r\n", settings.data_bits)?;
    write!(handle, "Stop bits: {}\r\n", settings.stop_bits)?;
    write!(handle, "Parity mechanism: {}\r\n", settings.parity)?;
    write!(handle, "Flow control: {}\r\n", settings.flow_control)?;
    write!(
        handle,
        "Receiver: {}\r\n",
        on_off(termios.control_flags.contains(ControlFlags::CREAD))
    )?;
    write!(
        handle,
        "Ignore modem lines: {}\r\n",
        on_off(termios.control_flags.contains(ControlFlags::CLOCAL))
    )?;
    write!(handle, "Canonical mode: {}\r\n", on_off(local.contains(LocalFlags::ICANON)))?;
    write!(handle, "Echo: {}\r\n", on_off(local.contains(LocalFlags::ECHO)))?;
    write!(handle, "Signal chars: {}\r\n", on_off(local.contains(LocalFlags::ISIG)))?;
    write!(handle, "Read timeout: {}\r\n", settings.read_timeout)?;
    write_flag_words(handle, termios)
}

fn write_flag_words<W: Write + ?Sized>(handle: &mut W, termios: &Termios) -> io::Result<()> {
    write!(handle, "c_iflag: {:#010x}\r\n", termios.input_flags.bits())?;
    write!(handle, "c_oflag: {:#010x}\r\n", termios.output_flags.bits())?;
    write!(handle, "c_cflag: {:#010x}\r\n", termios.control_flags.bits())?;
    write!(handle, "c_lflag: {:#010x}\r\n", termios.local_flags.bits())
}

/// Opens `path` for appending a report about `device`, creating it and its
/// parent directories if needed, and writes a UTC timestamped header.
///
/// Reports appended to a non-empty file are separated by a blank line.
///
/// # Errors
/// Any error from creating, opening or writing to the file.
pub fn open_report(path: &Path, device: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_recursive!(parent)?;
    }

    let mut file = File::options().append(true).create(true).open(path)?;
    let separator = if file.metadata()?.len() == 0 { "" } else { "\r\n" };
    write!(
        file,
        "{separator}TIMESTAMP: {}\r\nDEVICE: {}\r\n",
        chrono::Utc::now(),
        device.display()
    )?;
    Ok(file)
}
