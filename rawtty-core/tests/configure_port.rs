#![cfg(target_os = "linux")]

mod common;

use std::os::fd::{AsFd, AsRawFd};

use nix::{
    libc,
    sys::termios::{ControlFlags, LocalFlags, SpecialCharacterIndices},
};
use rawtty_core::{
    cli::{configure_port, print_settings, show_settings},
    device::{ApplyWhen, SerialDevice},
    settings::{DataBits, FlowControl, LineSettings, Parity, ReadTimeout, StopBits},
};

use common::open_pty;

#[test]
fn applies_raw_settings_to_device() {
    let (_master, path) = open_pty();
    let settings = LineSettings {
        baud: 115_200,
        ..LineSettings::default()
    };

    let returned = configure_port(&path, &settings, ApplyWhen::Now, false).unwrap();
    let on_device = SerialDevice::open(&path).unwrap().attributes().unwrap();

    assert_eq!(LineSettings::decode(&on_device), settings);
    assert_eq!(LineSettings::decode(&returned), settings);
    assert!(!on_device.local_flags.intersects(LocalFlags::ICANON | LocalFlags::ECHO));
    assert!(on_device.control_flags.contains(ControlFlags::CREAD | ControlFlags::CLOCAL));
    assert_eq!(on_device.control_chars[SpecialCharacterIndices::VTIME as usize], 10);
}

// A pty forces CS8 and clears PARENB on every tcsetattr, so only the framing
// it keeps is exercised against the device.
#[test]
fn drain_and_flush_apply_too() {
    let (_master, path) = open_pty();
    let settings = LineSettings {
        baud: 57600,
        data_bits: DataBits::Eight,
        parity: Parity::None,
        stop_bits: StopBits::Two,
        flow_control: FlowControl::Software,
        read_timeout: ReadTimeout {
            min_bytes: 1,
            deciseconds: 0,
        },
    };

    for when in [ApplyWhen::Drain, ApplyWhen::Flush] {
        configure_port(&path, &settings, when, false).unwrap();
        let on_device = SerialDevice::open(&path).unwrap().attributes().unwrap();
        assert_eq!(LineSettings::decode(&on_device), settings, "{when}");
    }
}

#[test]
fn dry_run_leaves_device_untouched() {
    let (_master, path) = open_pty();
    let before = SerialDevice::open(&path).unwrap().attributes().unwrap();
    assert!(before.local_flags.contains(LocalFlags::ICANON));

    let planned = configure_port(&path, &LineSettings::default(), ApplyWhen::Now, true).unwrap();
    let after = SerialDevice::open(&path).unwrap().attributes().unwrap();

    assert!(!planned.local_flags.contains(LocalFlags::ICANON));
    assert_eq!(after.local_flags, before.local_flags);
    assert_eq!(after.input_flags, before.input_flags);
    assert_eq!(after.output_flags, before.output_flags);
    assert_eq!(after.control_flags, before.control_flags);
}

#[test]
fn missing_device_is_reported_with_errno() {
    let err = configure_port(
        std::path::Path::new("/dev/rawtty-missing"),
        &LineSettings::default(),
        ApplyWhen::Now,
        false,
    )
    .unwrap_err();
    assert!(
        err.chain().any(|e| e.to_string().starts_with("Error 2 from open: ")),
        "{err:?}"
    );
}

#[test]
fn regular_file_fails_at_tcgetattr() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let err = configure_port(file.path(), &LineSettings::default(), ApplyWhen::Now, false).unwrap_err();
    assert!(err.chain().any(|e| e.to_string().contains("from tcgetattr")), "{err:?}");
}

#[test]
fn reports_append_to_file() {
    let (_master, path) = open_pty();
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("settings.txt");

    let tty = configure_port(&path, &LineSettings::default(), ApplyWhen::Now, false).unwrap();
    print_settings(&path, &tty, Some(&report)).unwrap();
    show_settings(&path, Some(&report), false).unwrap();

    let contents = std::fs::read_to_string(&report).unwrap();
    assert_eq!(contents.matches("TIMESTAMP: ").count(), 2);
    assert_eq!(contents.matches("Canonical mode: off\r\n").count(), 2);
    assert!(contents.contains(&format!("DEVICE: {}\r\n", path.display())));
}

// Another program can leave a rate with no speed constant behind through
// termios2, after which c_cflag only carries BOTHER.
#[test]
fn show_reports_a_custom_speed() {
    let (_master, path) = open_pty();
    let device = SerialDevice::open(&path).unwrap();
    let fd = device.as_fd().as_raw_fd();

    // SAFETY: `tio` is a valid termios2 for both ioctls to read and write.
    let mut tio: libc::termios2 = unsafe { std::mem::zeroed() };
    assert_eq!(unsafe { libc::ioctl(fd, libc::TCGETS2, &raw mut tio) }, 0);
    tio.c_cflag &= !libc::CBAUD;
    tio.c_cflag |= libc::BOTHER;
    tio.c_ispeed = 250_000;
    tio.c_ospeed = 250_000;
    assert_eq!(unsafe { libc::ioctl(fd, libc::TCSETS2, &raw const tio) }, 0);

    let tty = device.attributes().unwrap();
    assert_eq!(LineSettings::decode(&tty).baud, 0);

    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("custom.txt");
    show_settings(&path, Some(&report), false).unwrap();
    let contents = std::fs::read_to_string(&report).unwrap();
    assert!(
        contents.contains("Baud rate: 0 (hang up or custom rate)\r\n"),
        "{contents}"
    );
}

// A pty may not implement the modem control ioctls, in which case the
// failure comes back as a diagnostic instead of a panic.
#[tokio::test]
async fn show_reads_modem_lines() {
    let (_master, path) = open_pty();
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("lines.txt");

    match show_settings(&path, Some(&report), true) {
        Ok(()) => {
            let contents = std::fs::read_to_string(&report).unwrap();
            assert!(contents.contains("Clear To Send line: "), "{contents}");
            assert!(contents.contains("Carrier Detect line: "), "{contents}");
        }
        Err(err) => {
            let chain: Vec<String> = err.chain().map(ToString::to_string).collect();
            assert!(
                chain.iter().any(|e| e.contains("Failed to")),
                "{chain:?}"
            );
            assert!(
                chain.iter().any(|e| e.contains(&*path.to_string_lossy())),
                "{chain:?}"
            );
        }
    }
}
