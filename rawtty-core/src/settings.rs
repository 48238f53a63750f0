//! The serial line parameters that `rawtty` writes into a device's `termios`.
//!
//! Each parameter parses from the forms a user would type on the command line
//! or in `config.toml`; see [`NORMALIZER`].

use nix::sys::termios::{ControlFlags, InputFlags, SpecialCharacterIndices, Termios};
use serde::Deserialize;
use std::{borrow::Cow, fmt, str::FromStr};

use crate::baud;

/// Uses [`Cow`] to normalize strings passed to it.
///
/// If the input is already normalized, it simply returns a [`Cow::Borrowed`],
/// else will remove '-', '_', and whitespace and transform to lowercase.
pub const NORMALIZER: fn(&str) -> Cow<'_, str> = normalizer;

fn normalizer(s: &str) -> Cow<'_, str> {
    let mut curr_cow: Cow<'_, str> = Cow::Borrowed(s);

    if curr_cow.contains([' ', '-', '_']) {
        let owned_str = curr_cow.to_mut();
        *owned_str = owned_str.replace([' ', '-', '_'], "");
    }

    if curr_cow.chars().any(|c| c.is_ascii_uppercase()) {
        let owned_str = curr_cow.to_mut();
        *owned_str = owned_str.to_lowercase();
    }
    curr_cow
}

/// Number of data bits per character (`CS5`..`CS8` under the `CSIZE` mask).
#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "u8")]
pub enum DataBits {
    Five,
    Six,
    Seven,
    #[default]
    Eight,
}

impl DataBits {
    /// The `CSn` flag for this size.
    #[must_use]
    pub const fn flag(self) -> ControlFlags {
        match self {
            Self::Five => ControlFlags::CS5,
            Self::Six => ControlFlags::CS6,
            Self::Seven => ControlFlags::CS7,
            Self::Eight => ControlFlags::CS8,
        }
    }

    /// Reads the size back out of the `CSIZE` bits of `flags`.
    #[must_use]
    pub fn from_flags(flags: ControlFlags) -> Self {
        let size = flags & ControlFlags::CSIZE;
        if size == ControlFlags::CS5 {
            Self::Five
        } else if size == ControlFlags::CS6 {
            Self::Six
        } else if size == ControlFlags::CS7 {
            Self::Seven
        } else {
            Self::Eight
        }
    }
}

impl TryFrom<u8> for DataBits {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            5 => Ok(Self::Five),
            6 => Ok(Self::Six),
            7 => Ok(Self::Seven),
            8 => Ok(Self::Eight),
            n => Err(format!("'{n}' is not a valid number of data bits; expected 5, 6, 7 or 8")),
        }
    }
}

impl FromStr for DataBits {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .map_err(|_| format!("`{s}` isn't a valid number of data bits"))
            .and_then(Self::try_from)
    }
}

impl fmt::Display for DataBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits = match self {
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
        };
        write!(f, "{bits}")
    }
}

/// A list of the valid options for [`Parity`].
pub static VALID_PARITIES: &[&str] = &["none", "odd", "even"];

/// Parity checking (`PARENB`, `PARODD`).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

impl Parity {
    /// Parses `input` to a [`Parity`]. Returns `Ok(Parity)` if successful,
    /// otherwise returns `Err(VALID_PARITIES)`.
    ///
    /// # Errors
    /// Returns an error of [`VALID_PARITIES`] if unable to parse into [`Parity`]
    ///
    /// ## Example
    ///
    /// ```
    /// use rawtty_core::settings::*;
    ///
    /// assert_eq!(Parity::parse_from_str("E", NORMALIZER), Ok(Parity::Even));
    /// ```
    pub fn parse_from_str<S, F>(input: S, normalizer: F) -> Result<Self, &'static [&'static str]>
    where
        S: AsRef<str>,
        F: Fn(&str) -> Cow<'_, str>,
    {
        match normalizer(input.as_ref()).as_ref() {
            "none" | "n" => Ok(Self::None),
            "odd" | "o" => Ok(Self::Odd),
            "even" | "e" => Ok(Self::Even),
            _ => Err(VALID_PARITIES),
        }
    }

    #[must_use]
    pub fn from_flags(flags: ControlFlags) -> Self {
        if !flags.contains(ControlFlags::PARENB) {
            Self::None
        } else if flags.contains(ControlFlags::PARODD) {
            Self::Odd
        } else {
            Self::Even
        }
    }
}

/// A list of the valid options for [`StopBits`].
pub static VALID_STOP_BITS: &[&str] = &["1", "2"];

/// Number of stop bits (`CSTOPB`).
#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "u8")]
pub enum StopBits {
    #[default]
    One,
    Two,
}

impl TryFrom<u8> for StopBits {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            n => Err(format!("'{n}' is not a valid number of stop bits; expected 1 or 2")),
        }
    }
}

impl FromStr for StopBits {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match NORMALIZER(s).as_ref() {
            "1" | "one" => Ok(Self::One),
            "2" | "two" => Ok(Self::Two),
            _ => Err(format!(
                "`{s}` isn't a valid number of stop bits; valid options include {VALID_STOP_BITS:?}"
            )),
        }
    }
}

impl fmt::Display for StopBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => write!(f, "1"),
            Self::Two => write!(f, "2"),
        }
    }
}

/// A list of the valid options for [`FlowControl`].
pub static VALID_FLOW_CONTROLS: &[&str] = &["none", "hardware", "rts-cts", "software", "xon-xoff"];

/// Flow control: none, RTS/CTS (`CRTSCTS`) or XON/XOFF (`IXON | IXOFF`).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
    #[default]
    None,
    Hardware,
    Software,
}

impl FlowControl {
    /// Parses `input` to a [`FlowControl`]. Returns `Ok(FlowControl)` if successful,
    /// otherwise returns `Err(VALID_FLOW_CONTROLS)`.
    ///
    /// # Errors
    /// Returns an error of [`VALID_FLOW_CONTROLS`] if unable to parse into [`FlowControl`]
    ///
    /// ## Example
    ///
    /// ```
    /// use rawtty_core::settings::*;
    ///
    /// assert_eq!(FlowControl::parse_from_str("RTS-CTS", NORMALIZER), Ok(FlowControl::Hardware));
    /// ```
    pub fn parse_from_str<S, F>(input: S, normalizer: F) -> Result<Self, &'static [&'static str]>
    where
        S: AsRef<str>,
        F: Fn(&str) -> Cow<'_, str>,
    {
        match normalizer(input.as_ref()).as_ref() {
            "none" | "off" => Ok(Self::None),
            "hardware" | "rtscts" => Ok(Self::Hardware),
            "software" | "xonxoff" => Ok(Self::Software),
            _ => Err(VALID_FLOW_CONTROLS),
        }
    }

    #[must_use]
    pub fn from_flags(control: ControlFlags, input: InputFlags) -> Self {
        if control.contains(ControlFlags::CRTSCTS) {
            Self::Hardware
        } else if input.intersects(InputFlags::IXON | InputFlags::IXOFF) {
            Self::Software
        } else {
            Self::None
        }
    }
}

macro_rules! impl_named_setting {
    ($ty:ty, $what:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse_from_str(s, NORMALIZER).map_err(|valid| {
                    format!(concat!("`{}` isn't a valid ", $what, "; valid options include {:?}"), s, valid)
                })
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::parse_from_str(&s, NORMALIZER)
                    .map_err(|valid| serde::de::Error::unknown_variant(&s, valid))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let name = match self {
                    $(Self::$variant => $name,)+
                };
                write!(f, "{name}")
            }
        }
    };
}

impl_named_setting!(Parity, "parity", {
    None => "none",
    Odd => "odd",
    Even => "even",
});

impl_named_setting!(FlowControl, "flow control", {
    None => "none",
    Hardware => "hardware (RTS/CTS)",
    Software => "software (XON/XOFF)",
});

/// Non-canonical read completion (`VMIN`, `VTIME`).
///
/// With both at zero a read returns immediately with whatever is available.
/// With `deciseconds > 0` and `min_bytes == 0` a read waits up to
/// `deciseconds / 10` seconds for the first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadTimeout {
    pub min_bytes: u8,
    pub deciseconds: u8,
}

impl Default for ReadTimeout {
    fn default() -> Self {
        Self {
            min_bytes: 0,
            deciseconds: 10,
        }
    }
}

impl ReadTimeout {
    #[must_use]
    pub fn from_termios(termios: &Termios) -> Self {
        Self {
            min_bytes: termios.control_chars[SpecialCharacterIndices::VMIN as usize],
            deciseconds: termios.control_chars[SpecialCharacterIndices::VTIME as usize],
        }
    }
}

impl fmt::Display for ReadTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VMIN={} VTIME={} ({:.1}s)",
            self.min_bytes,
            self.deciseconds,
            f32::from(self.deciseconds) / 10.0
        )
    }
}

/// Everything [`raw::configure`][crate::raw::configure] writes into a `termios`.
///
/// The default is 9600 baud, 8N1, no flow control, and reads that wait up to
/// one second for the first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSettings {
    pub baud: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    pub read_timeout: ReadTimeout,
}

impl Default for LineSettings {
    fn default() -> Self {
        Self {
            baud: 9600,
            data_bits: DataBits::default(),
            parity: Parity::default(),
            stop_bits: StopBits::default(),
            flow_control: FlowControl::default(),
            read_timeout: ReadTimeout::default(),
        }
    }
}

impl LineSettings {
    /// Reads the line settings back out of a `termios`.
    #[must_use]
    pub fn decode(termios: &Termios) -> Self {
        let control = termios.control_flags;
        Self {
            baud: baud::output_speed(termios),
            data_bits: DataBits::from_flags(control),
            parity: Parity::from_flags(control),
            stop_bits: if control.contains(ControlFlags::CSTOPB) {
                StopBits::Two
            } else {
                StopBits::One
            },
            flow_control: FlowControl::from_flags(control, termios.input_flags),
            read_timeout: ReadTimeout::from_termios(termios),
        }
    }
}

impl fmt::Display for LineSettings {
    /// Short form, e.g. `9600 8N1`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
        };
        write!(f, "{} {}{}{}", self.baud, self.data_bits, parity, self.stop_bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizer_borrows_when_clean() {
        assert!(matches!(NORMALIZER("even"), Cow::Borrowed("even")));
        assert_eq!(NORMALIZER("Xon-Xoff"), "xonxoff");
        assert_eq!(NORMALIZER("rts cts"), "rtscts");
    }

    #[test]
    fn parse_from_cli_forms() {
        assert_eq!("7".parse::<DataBits>(), Ok(DataBits::Seven));
        assert!("9".parse::<DataBits>().is_err());
        assert_eq!("odd".parse::<Parity>(), Ok(Parity::Odd));
        assert_eq!("N".parse::<Parity>(), Ok(Parity::None));
        assert_eq!("two".parse::<StopBits>(), Ok(StopBits::Two));
        assert_eq!("xon_xoff".parse::<FlowControl>(), Ok(FlowControl::Software));
        assert!("mark".parse::<Parity>().unwrap_err().contains("valid options"));
    }

    #[test]
    fn size_bits_round_trip_through_flags() {
        for bits in [DataBits::Five, DataBits::Six, DataBits::Seven, DataBits::Eight] {
            let flags = ControlFlags::CREAD | bits.flag();
            assert_eq!(DataBits::from_flags(flags), bits);
        }
    }

    #[test]
    fn parity_from_flags() {
        assert_eq!(Parity::from_flags(ControlFlags::PARODD), Parity::None);
        assert_eq!(Parity::from_flags(ControlFlags::PARENB), Parity::Even);
        assert_eq!(
            Parity::from_flags(ControlFlags::PARENB | ControlFlags::PARODD),
            Parity::Odd
        );
    }

    #[test]
    fn short_form_display() {
        let settings = LineSettings {
            baud: 115_200,
            data_bits: DataBits::Seven,
            parity: Parity::Even,
            stop_bits: StopBits::Two,
            ..LineSettings::default()
        };
        assert_eq!(settings.to_string(), "115200 7E2");
        assert_eq!(LineSettings::default().to_string(), "9600 8N1");
    }

    #[test]
    fn read_timeout_display() {
        assert_eq!(ReadTimeout::default().to_string(), "VMIN=0 VTIME=10 (1.0s)");
    }
}
