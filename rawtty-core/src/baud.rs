//! Conversion between numeric baud rates and the POSIX `Bxxxx` speed constants.
//!
//! Only rates that have a speed constant on the target platform can be
//! configured through `termios`, so the table here is narrower than the list of
//! "common" rates some serial libraries advertise (e.g. 14400 has no constant).

#[cfg(any(target_os = "linux", target_os = "android"))]
use nix::{libc, sys::termios::ControlFlags};
use nix::sys::termios::{BaudRate, Termios};

use crate::errors::TtyError;

const BAUD_TABLE: &[(u32, BaudRate)] = &[
    (50, BaudRate::B50),
    (75, BaudRate::B75),
    (110, BaudRate::B110),
    (134, BaudRate::B134),
    (150, BaudRate::B150),
    (200, BaudRate::B200),
    (300, BaudRate::B300),
    (600, BaudRate::B600),
    (1200, BaudRate::B1200),
    (1800, BaudRate::B1800),
    (2400, BaudRate::B2400),
    (4800, BaudRate::B4800),
    (9600, BaudRate::B9600),
    (19200, BaudRate::B19200),
    (38400, BaudRate::B38400),
    (57600, BaudRate::B57600),
    (115_200, BaudRate::B115200),
    (230_400, BaudRate::B230400),
    #[cfg(any(target_os = "linux", target_os = "android"))]
    (460_800, BaudRate::B460800),
    #[cfg(any(target_os = "linux", target_os = "android"))]
    (500_000, BaudRate::B500000),
    #[cfg(any(target_os = "linux", target_os = "android"))]
    (576_000, BaudRate::B576000),
    #[cfg(any(target_os = "linux", target_os = "android"))]
    (921_600, BaudRate::B921600),
    #[cfg(any(target_os = "linux", target_os = "android"))]
    (1_000_000, BaudRate::B1000000),
    #[cfg(any(target_os = "linux", target_os = "android"))]
    (1_152_000, BaudRate::B1152000),
    #[cfg(any(target_os = "linux", target_os = "android"))]
    (1_500_000, BaudRate::B1500000),
    #[cfg(any(target_os = "linux", target_os = "android"))]
    (2_000_000, BaudRate::B2000000),
    #[cfg(all(
        any(target_os = "linux", target_os = "android"),
        not(target_arch = "sparc64")
    ))]
    (2_500_000, BaudRate::B2500000),
    #[cfg(all(
        any(target_os = "linux", target_os = "android"),
        not(target_arch = "sparc64")
    ))]
    (3_000_000, BaudRate::B3000000),
    #[cfg(all(
        any(target_os = "linux", target_os = "android"),
        not(target_arch = "sparc64")
    ))]
    (3_500_000, BaudRate::B3500000),
    #[cfg(all(
        any(target_os = "linux", target_os = "android"),
        not(target_arch = "sparc64")
    ))]
    (4_000_000, BaudRate::B4000000),
];

/// Every numeric baud rate that can be configured on this platform, ascending.
pub fn standard_baud_rates() -> impl Iterator<Item = u32> {
    BAUD_TABLE.iter().map(|(rate, _)| *rate)
}

/// Looks up the speed constant for `baud`.
///
/// # Errors
/// Returns [`TtyError::UnsupportedBaud`] when the platform has no constant for `baud`.
pub fn to_baud_rate(baud: u32) -> Result<BaudRate, TtyError> {
    BAUD_TABLE
        .iter()
        .find(|(rate, _)| *rate == baud)
        .map(|(_, constant)| *constant)
        .ok_or(TtyError::UnsupportedBaud(baud))
}

/// The numeric rate for a speed constant. `B0` (hang up) and constants
/// outside the table map to `0`.
#[must_use]
pub fn from_baud_rate(constant: BaudRate) -> u32 {
    BAUD_TABLE
        .iter()
        .find(|(_, c)| *c == constant)
        .map_or(0, |(rate, _)| *rate)
}

/// The speed bits of `c_cflag`, which is all `cfgetospeed` and `cfgetispeed`
/// look at on Linux. A custom rate set through `termios2` leaves `BOTHER` here.
#[cfg(any(target_os = "linux", target_os = "android"))]
fn speed_bits(termios: &Termios) -> libc::speed_t {
    (termios.control_flags & (ControlFlags::CBAUD | ControlFlags::CBAUDEX)).bits()
}

/// The configured output speed of `termios` as a numeric rate.
///
/// `0` means hang up (`B0`) or a custom rate with no speed constant.
#[cfg(any(target_os = "linux", target_os = "android"))]
#[must_use]
pub fn output_speed(termios: &Termios) -> u32 {
    BaudRate::try_from(speed_bits(termios)).map_or(0, from_baud_rate)
}

/// The configured input speed of `termios`. Linux keeps a single speed for
/// both directions, so this is always [`output_speed`].
#[cfg(any(target_os = "linux", target_os = "android"))]
#[must_use]
pub fn input_speed(termios: &Termios) -> u32 {
    output_speed(termios)
}

/// The configured output speed of `termios` as a numeric rate.
#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
#[must_use]
pub fn output_speed(termios: &Termios) -> u32 {
    nix::sys::termios::cfgetospeed(termios)
}

/// The configured input speed of `termios` as a numeric rate.
#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
#[must_use]
pub fn input_speed(termios: &Termios) -> u32 {
    nix::sys::termios::cfgetispeed(termios)
}

/// The configured output speed of `termios` as a numeric rate.
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
)))]
#[must_use]
pub fn output_speed(termios: &Termios) -> u32 {
    from_baud_rate(nix::sys::termios::cfgetospeed(termios))
}

/// The configured input speed of `termios` as a numeric rate.
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
)))]
#[must_use]
pub fn input_speed(termios: &Termios) -> u32 {
    from_baud_rate(nix::sys::termios::cfgetispeed(termios))
}

/// Used as a `clap` value parser for `--baud`.
///
/// # Errors
/// Errors if `s` is not a number or has no speed constant on this platform.
pub fn valid_baud_rate(s: &str) -> Result<u32, String> {
    let baud: u32 = s
        .parse()
        .map_err(|_| format!("`{s}` isn't a valid baud rate"))?;
    if to_baud_rate(baud).is_ok() {
        Ok(baud)
    } else {
        Err(format!(
            "'{}' is not a valid baud rate; valid baud rates include {:?}",
            baud,
            standard_baud_rates().collect::<Vec<_>>()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_ascending() {
        let rates: Vec<u32> = standard_baud_rates().collect();
        assert!(rates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn every_rate_maps_both_ways() {
        for rate in standard_baud_rates() {
            let constant = to_baud_rate(rate).unwrap();
            assert_eq!(from_baud_rate(constant), rate);
        }
    }

    #[test]
    fn rates_without_constants_are_rejected() {
        assert!(matches!(to_baud_rate(14400), Err(TtyError::UnsupportedBaud(14400))));
        assert!(valid_baud_rate("14400").is_err());
        assert!(valid_baud_rate("fast").is_err());
        assert_eq!(valid_baud_rate("115200"), Ok(115_200));
    }

    #[test]
    fn hang_up_has_no_rate() {
        assert_eq!(from_baud_rate(BaudRate::B0), 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn custom_speed_reads_as_zero() {
        let (_master, path) = crate::test_utils::open_pty();
        let device = crate::device::SerialDevice::open(&path).unwrap();
        let mut tty = device.attributes().unwrap();
        nix::sys::termios::cfsetspeed(&mut tty, BaudRate::B9600).unwrap();
        assert_eq!(output_speed(&tty), 9600);

        tty.control_flags.remove(ControlFlags::CBAUD);
        tty.control_flags.insert(ControlFlags::from_bits_truncate(libc::BOTHER));
        assert_eq!(output_speed(&tty), 0);
        assert_eq!(input_speed(&tty), 0);
    }
}
