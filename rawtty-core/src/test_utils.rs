use std::path::PathBuf;

use nix::{
    fcntl::OFlag,
    pty::{PtyMaster, grantpt, posix_openpt, ptsname_r, unlockpt},
};

/// Opens a pseudo-terminal pair and returns the master along with the path
/// of the slave. The slave stays usable for as long as the master is alive.
pub(crate) fn open_pty() -> (PtyMaster, PathBuf) {
    let master = posix_openpt(OFlag::O_RDWR | OFlag::O_NOCTTY).expect("Failed to open pty master");
    grantpt(&master).expect("grantpt");
    unlockpt(&master).expect("unlockpt");
    let slave = ptsname_r(&master).expect("ptsname_r");
    (master, PathBuf::from(slave))
}
