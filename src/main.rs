//! Rawtty is a CLI tool for configuring POSIX serial devices for raw byte I/O.
//!
//! It reads a device's current terminal attributes, switches it to
//! non-canonical mode with the requested baud rate, framing and flow control,
//! writes the attributes back and prints what the device ended up with.

use std::{io, path::PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use crossterm::style::Stylize;
use miette::{Context, IntoDiagnostic};
use rawtty_core::{
    baud::valid_baud_rate,
    cli::{configure_port, list_bauds, list_serial_ports, print_settings, show_settings},
    configs::{ConfigOverride, LogDefaults, initialize_config},
    create_recursive,
    device::ApplyWhen,
    path_utils::{expand_path, validate_out_file},
    settings::{DataBits, FlowControl, Parity, StopBits},
};
use tracing::{Level, event, level_filters::LevelFilter, span};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rawtty", version, about, long_about = None)]
#[command(next_line_help = true)]
#[command(propagate_version = true)]
struct Cli {
    /// The path to the serial device to configure.
    ///
    /// For Linux something like `/dev/ttyUSB0`, MacOS `/dev/cu.usbserial-10`.
    /// Defaults to `device` in the `[port]` table of config.toml, else `/dev/ttyUSB0`.
    /// To see available ports, use `rawtty list-ports`.
    #[arg(value_parser = expand_path)]
    device: Option<PathBuf>,
    /// Baud rate for the serial connection.
    ///
    /// To see a list of valid baud rates, use `rawtty list-bauds`.
    #[arg(short, long, value_parser = valid_baud_rate)]
    baud: Option<u32>,
    /// Data bits per character: 5, 6, 7 or 8
    #[arg(long)]
    data_bits: Option<DataBits>,
    /// Parity: none, odd or even
    #[arg(long)]
    parity: Option<Parity>,
    /// Stop bits: 1 or 2
    #[arg(long)]
    stop_bits: Option<StopBits>,
    /// Flow control: none, hardware (rts-cts) or software (xon-xoff)
    #[arg(long)]
    flow_control: Option<FlowControl>,
    /// Minimum number of bytes a read waits for (VMIN)
    #[arg(long)]
    vmin: Option<u8>,
    /// Read timeout in tenths of a second (VTIME)
    #[arg(long)]
    vtime: Option<u8>,
    /// When the new settings take effect: now, drain or flush
    #[arg(long, default_value_t = ApplyWhen::Now)]
    when: ApplyWhen,
    /// Compute the settings and print them without applying them to the device
    #[arg(long)]
    dry_run: bool,
    /// Don't print the resulting settings to stdout
    #[arg(short, long)]
    quiet: bool,
    /// Append the resulting settings to a file
    #[arg(short, long, value_parser = validate_out_file)]
    file: Option<PathBuf>,
    /// Path to a config file to use instead of the default one
    #[arg(long, global = true, value_parser = expand_path)]
    config: Option<PathBuf>,
    /// Write log output to a file instead of stderr
    #[arg(long, global = true, value_parser = validate_out_file)]
    log_file: Option<PathBuf>,
    /// Display debug output
    #[arg(short, long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists all valid baud rates
    ListBauds,
    /// Lists all available serial ports
    ListPorts,
    /// Shows the current settings of a serial device without changing them
    Show {
        /// Path to the device to inspect
        #[arg(short = 'p', long, value_parser = expand_path)]
        device: Option<PathBuf>,
        /// Also read the modem status lines (CTS, DSR, RI, CD)
        #[arg(short, long)]
        lines: bool,
        /// Append the settings to a file
        #[arg(short, long, value_parser = validate_out_file)]
        file: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    if cli.device.is_some() && cli.command.is_some() {
        let mut cmd = Cli::command();
        cmd.error(
            clap::error::ErrorKind::ArgumentConflict,
            "Must specify either DEVICE or SUBCOMMAND, not both.",
        )
        .exit();
    }

    let device = match &cli.command {
        Some(Commands::Show { device, .. }) => device.clone(),
        _ => cli.device.clone(),
    };
    let config = initialize_config(
        cli.config.as_deref(),
        ConfigOverride {
            device,
            baud: cli.baud,
            data_bits: cli.data_bits,
            parity: cli.parity,
            stop_bits: cli.stop_bits,
            flow_control: cli.flow_control,
            vmin: cli.vmin,
            vtime: cli.vtime,
            log_file: cli.log_file.clone(),
            log_level: cli.debug.then_some(Level::DEBUG),
        },
    )?;

    let _guard = init_tracing(&config.log)?;

    let span = span!(Level::TRACE, "Main");
    let _enter = span.enter();

    let device = &config.port.device;
    match cli.command {
        None => {
            event!(Level::DEBUG, device = %device.display(), "configuring device");
            let tty = configure_port(
                device,
                &config.port.line_settings(),
                cli.when,
                cli.dry_run,
            )?;
            if let Some(file) = cli.file.as_deref() {
                print_settings(device, &tty, Some(file))?;
            }
            if !cli.quiet {
                print_settings(device, &tty, None)?;
            }
        }
        Some(Commands::ListBauds) => list_bauds()?,
        Some(Commands::ListPorts) => {
            event!(Level::INFO, "listing ports");
            list_serial_ports()?;
        }
        Some(Commands::Show { lines, file, .. }) => {
            show_settings(device, file.as_deref(), lines)?;
        }
    }
    Ok(())
}

/// Installs the global `tracing` subscriber.
///
/// Logs go to `log.file` through a non-blocking writer when one is configured,
/// otherwise to stderr. The level comes from `RAWTTY_LOG` if set, then
/// `log.level`, then defaults to `WARN`. The returned guard flushes the
/// file writer when dropped and must live until the end of `main`.
fn init_tracing(log: &LogDefaults) -> miette::Result<Option<WorkerGuard>> {
    let level = log.level.unwrap_or(Level::WARN);
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .with_env_var("RAWTTY_LOG")
        .from_env_lossy();

    let Some(path) = log.file.as_deref() else {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .into_diagnostic()
            .wrap_err("Failed to set subscriber")?;
        return Ok(None);
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_recursive!(parent)
            .into_diagnostic()
            .wrap_err(format!("Failed to create '{}'.", parent.display()).red())?;
    }
    let file = std::fs::File::options()
        .create(true)
        .append(true)
        .open(path)
        .into_diagnostic()
        .wrap_err(format!("Failed to open log file '{}'.", path.display()).red())?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(non_blocking)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .into_diagnostic()
        .wrap_err("Failed to set subscriber")?;
    Ok(Some(guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_line_settings() {
        let cli = Cli::try_parse_from([
            "rawtty",
            "/dev/ttyS0",
            "-b",
            "115200",
            "--data-bits",
            "7",
            "--parity",
            "even",
            "--stop-bits",
            "2",
            "--flow-control",
            "xon-xoff",
            "--vmin",
            "1",
            "--vtime",
            "0",
            "--when",
            "drain",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.device, Some(PathBuf::from("/dev/ttyS0")));
        assert_eq!(cli.baud, Some(115_200));
        assert_eq!(cli.data_bits, Some(DataBits::Seven));
        assert_eq!(cli.parity, Some(Parity::Even));
        assert_eq!(cli.stop_bits, Some(StopBits::Two));
        assert_eq!(cli.flow_control, Some(FlowControl::Software));
        assert_eq!(cli.when, ApplyWhen::Drain);
        assert!(cli.dry_run);
    }

    #[test]
    fn rejects_unsupported_baud() {
        assert!(Cli::try_parse_from(["rawtty", "-b", "14400"]).is_err());
    }

    #[test]
    fn show_takes_its_own_device() {
        let cli = Cli::try_parse_from(["rawtty", "show", "-p", "/dev/ttyACM0", "--lines"]).unwrap();
        match cli.command {
            Some(Commands::Show { device, lines, file }) => {
                assert_eq!(device, Some(PathBuf::from("/dev/ttyACM0")));
                assert!(lines);
                assert_eq!(file, None);
            }
            _ => panic!("expected the show subcommand"),
        }
    }
}
