use std::{
    io::{self, Write},
    path::Path,
};

use crossterm::style::Stylize;
use miette::{Context, IntoDiagnostic};
use nix::sys::termios::Termios;
use serial2_tokio::{KeepSettings, SerialPort};
use tracing::{info, instrument, warn};

use crate::{
    baud,
    device::{ApplyWhen, SerialDevice},
    map_miette, raw, report,
    settings::LineSettings,
};

/// Opens `device`, reads its attributes, rewrites them for raw I/O with
/// `settings` and, unless `dry_run` is set, writes them back.
///
/// Returns the `termios` that was (or, for a dry run, would have been) applied.
/// A dry run leaves the device exactly as it was.
///
/// # Errors
/// Any failure of `open`, `tcgetattr`, the baud rate lookup or `tcsetattr`.
#[instrument(skip(settings), fields(settings = %settings))]
pub fn configure_port(
    device: &Path,
    settings: &LineSettings,
    when: ApplyWhen,
    dry_run: bool,
) -> miette::Result<Termios> {
    let con = map_miette!(
        SerialDevice::open(device),
        format!("Failed to open device '{}'", device.display()),
        "[OPTIONS] [DEVICE] [COMMAND]",
        help = format!(
            "To see available ports, try `{}`.",
            "rawtty list-ports".bold().cyan()
        )
    )?;
    let mut tty = map_miette!(
        con.attributes(),
        format!("Failed to read the settings of '{}'", device.display())
    )?;

    map_miette!(
        raw::configure(&mut tty, settings),
        format!("Failed to configure '{}'", device.display()),
        help = format!(
            "To see the supported baud rates, try `{}`.",
            "rawtty list-bauds".bold().cyan()
        )
    )?;

    if dry_run {
        warn!("dry run, leaving the device untouched");
    } else {
        map_miette!(
            con.apply(&tty, when),
            format!("Failed to apply the settings to '{}'", device.display())
        )?;
        info!("configured {settings}");
    }
    Ok(tty)
}

/// Prints `termios` to stdout, or appends it to `file` under a timestamped header.
///
/// # Errors
/// Any error opening `file` or writing the report.
pub fn print_settings(device: &Path, termios: &Termios, file: Option<&Path>) -> miette::Result<()> {
    if let Some(path) = file {
        let mut handle = report::open_report(path, device)
            .into_diagnostic()
            .wrap_err(format!("Failed to open '{}'.", path.display()).red())?;
        report::write_settings(&mut handle, device, termios)
            .into_diagnostic()
            .wrap_err(format!("Failed to write to '{}'.", path.display()).red())
    } else {
        let mut stdout = io::stdout().lock();
        report::write_settings(&mut stdout, device, termios)
            .into_diagnostic()
            .wrap_err("Failed to write to stdout.".red())
    }
}

/// Prints the current settings of `device` without changing them.
///
/// With `lines`, also reports the modem status lines (CTS, DSR, RI, CD).
/// Reading those goes through [`serial2_tokio`], which must be called from
/// within a tokio runtime.
///
/// # Errors
/// Any failure opening the device or reading its attributes or modem lines.
pub fn show_settings(device: &Path, file: Option<&Path>, lines: bool) -> miette::Result<()> {
    let usage = format!("{} [OPTIONS] {} <DEVICE>", "show".bold(), "--device".bold());
    let tty = {
        let con = map_miette!(
            SerialDevice::open(device),
            format!("Failed to open device '{}'", device.display()),
            usage,
            help = format!(
                "To see available ports, try `{}`.",
                "rawtty list-ports".bold().cyan()
            )
        )?;
        map_miette!(
            con.attributes(),
            format!("Failed to get settings for device '{}'", device.display()),
            usage
        )?
    };

    print_settings(device, &tty, file)?;

    if lines {
        print_modem_lines(device, file, &usage)?;
    }
    Ok(())
}

fn print_modem_lines(device: &Path, file: Option<&Path>, usage: &str) -> miette::Result<()> {
    let con = map_miette!(
        SerialPort::open(device, KeepSettings),
        format!("Failed to open device '{}'", device.display()),
        usage
    )?;
    let cts = map_miette!(
        con.read_cts(),
        format!("Failed to read CTS for device '{}'", device.display()),
        usage
    )?;
    let dsr = map_miette!(
        con.read_dsr(),
        format!("Failed to read DSR for device '{}'", device.display()),
        usage
    )?;
    let ri = map_miette!(
        con.read_ri(),
        format!("Failed to read RI for device '{}'", device.display()),
        usage
    )?;
    let cd = map_miette!(
        con.read_cd(),
        format!("Failed to read CD for device '{}'", device.display()),
        usage
    )?;

    let mut handle: Box<dyn Write> = match file {
        Some(path) => Box::new(
            std::fs::File::options()
                .append(true)
                .open(path)
                .into_diagnostic()
                .wrap_err(format!("Failed to open '{}'.", path.display()).red())?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    write!(
        handle,
        "Clear To Send line: {cts}\r\nData Set Ready line: {dsr}\r\nRing Indicator line: {ri}\r\nCarrier Detect line: {cd}\r\n"
    )
    .into_diagnostic()
    .wrap_err("Failed to write modem lines.".red())
}

/// Lists the serial ports the operating system knows about.
///
/// # Errors
/// If the ports cannot be enumerated or stdout cannot be written to.
pub fn list_serial_ports() -> miette::Result<()> {
    let mut stdout = io::stdout().lock();
    let ports = map_miette!(
        SerialPort::available_ports(),
        "Could not list available ports.",
        "list-ports".bold()
    )?;
    for path in ports {
        write!(stdout, "{}\r\n", path.display())
            .into_diagnostic()
            .wrap_err("Failed to write to stdout.".red())?;
    }
    Ok(())
}

/// Lists the baud rates that have a speed constant on this platform.
///
/// # Errors
/// If stdout cannot be written to.
pub fn list_bauds() -> miette::Result<()> {
    let mut stdout = io::stdout().lock();
    write!(stdout, "Valid baud rates:\r\n")
        .into_diagnostic()
        .wrap_err("Failed to write to stdout.".red())?;
    for baud in baud::standard_baud_rates() {
        write!(stdout, "{baud}\r\n")
            .into_diagnostic()
            .wrap_err("Failed to write to stdout.".red())?;
    }
    Ok(())
}
