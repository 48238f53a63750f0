//! Bitmask edits that turn a terminal's `termios` into a raw serial line.
//!
//! Each step edits one concern in place. [`configure`] runs them in order:
//!
//! 1. [`set_framing`]: parity, character size and stop bits
//! 2. [`set_flow_control`]: RTS/CTS and XON/XOFF
//! 3. [`enable_receiver`]: `CREAD | CLOCAL`
//! 4. [`disable_canonical`]: no line editing, echo or signal characters
//! 5. [`raw_input`]: no special handling of received bytes
//! 6. [`raw_output`]: no post-processing of sent bytes
//! 7. [`set_read_timeout`]: `VMIN` / `VTIME`
//! 8. [`set_baud`]: input and output speed
//!
//! The edits only touch the bits they own, so a `termios` read from the device
//! keeps everything else it had.

use nix::sys::termios::{
    self, ControlFlags, InputFlags, LocalFlags, OutputFlags, SpecialCharacterIndices, Termios,
};
use tracing::{debug, instrument};

use crate::{
    baud,
    errors::TtyError,
    settings::{DataBits, FlowControl, LineSettings, Parity, ReadTimeout, StopBits},
};

/// Runs every step against `termios` using `settings`.
///
/// # Errors
/// Only [`set_baud`] can fail: the rate has no speed constant, or `cfsetspeed` rejected it.
#[instrument(skip(termios))]
pub fn configure(termios: &mut Termios, settings: &LineSettings) -> Result<(), TtyError> {
    set_framing(termios, settings.data_bits, settings.parity, settings.stop_bits);
    set_flow_control(termios, settings.flow_control);
    enable_receiver(termios);
    disable_canonical(termios);
    raw_input(termios);
    raw_output(termios);
    set_read_timeout(termios, settings.read_timeout);
    set_baud(termios, settings.baud)
}

pub fn set_framing(termios: &mut Termios, data_bits: DataBits, parity: Parity, stop_bits: StopBits) {
    let cflag = &mut termios.control_flags;

    cflag.remove(ControlFlags::PARENB | ControlFlags::PARODD);
    match parity {
        Parity::None => {}
        Parity::Odd => cflag.insert(ControlFlags::PARENB | ControlFlags::PARODD),
        Parity::Even => cflag.insert(ControlFlags::PARENB),
    }

    cflag.remove(ControlFlags::CSIZE);
    cflag.insert(data_bits.flag());

    cflag.set(ControlFlags::CSTOPB, stop_bits == StopBits::Two);
    debug!(%data_bits, %parity, %stop_bits, "framing set");
}

/// Hardware flow control relies on RTS/CTS signalling between both ends;
/// with [`FlowControl::None`] it is switched off along with XON/XOFF.
/// `IXANY` (restart output on any byte) is always cleared.
pub fn set_flow_control(termios: &mut Termios, flow_control: FlowControl) {
    termios
        .control_flags
        .set(ControlFlags::CRTSCTS, flow_control == FlowControl::Hardware);
    termios.input_flags.set(
        InputFlags::IXON | InputFlags::IXOFF,
        flow_control == FlowControl::Software,
    );
    termios.input_flags.remove(InputFlags::IXANY);
    debug!(%flow_control, "flow control set");
}

/// Turns on the receiver and ignores modem control lines (`CLOCAL`), so
/// the device neither waits for carrier nor sends `SIGHUP` when it drops.
pub fn enable_receiver(termios: &mut Termios) {
    termios
        .control_flags
        .insert(ControlFlags::CREAD | ControlFlags::CLOCAL);
}

/// Non-canonical mode: input is delivered byte by byte instead of per line,
/// echo and erasure are off, and INTR/QUIT/SUSP are ordinary bytes.
pub fn disable_canonical(termios: &mut Termios) {
    termios.local_flags.remove(
        LocalFlags::ICANON
            | LocalFlags::ECHO
            | LocalFlags::ECHOE
            | LocalFlags::ECHONL
            | LocalFlags::ISIG,
    );
}

pub fn raw_input(termios: &mut Termios) {
    termios.input_flags.remove(
        InputFlags::IGNBRK
            | InputFlags::BRKINT
            | InputFlags::PARMRK
            | InputFlags::ISTRIP
            | InputFlags::INLCR
            | InputFlags::IGNCR
            | InputFlags::ICRNL,
    );
}

/// No output processing; in particular `\n` is not turned into `\r\n`.
pub fn raw_output(termios: &mut Termios) {
    termios
        .output_flags
        .remove(OutputFlags::OPOST | OutputFlags::ONLCR);
}

pub fn set_read_timeout(termios: &mut Termios, timeout: ReadTimeout) {
    termios.control_chars[SpecialCharacterIndices::VMIN as usize] = timeout.min_bytes;
    termios.control_chars[SpecialCharacterIndices::VTIME as usize] = timeout.deciseconds;
    debug!(%timeout, "read timeout set");
}

/// Sets both input and output speed.
///
/// # Errors
/// [`TtyError::UnsupportedBaud`] if `baud` has no speed constant,
/// [`TtyError::SetSpeed`] if `cfsetspeed` fails.
pub fn set_baud(termios: &mut Termios, baud: u32) -> Result<(), TtyError> {
    let constant = baud::to_baud_rate(baud)?;
    termios::cfsetspeed(termios, constant).map_err(TtyError::set_speed)?;
    debug!(baud, "baud rate set");
    Ok(())
}
