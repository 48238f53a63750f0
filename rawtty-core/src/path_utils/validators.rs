use std::path::PathBuf;

use crate::path_utils::ExpandPaths;

/// Expands a path such as `~/dev/ttyV0` or `$HOME/rawtty.toml`.
///
/// Existence is not checked here; a missing device is reported by
/// [`SerialDevice::open`][crate::device::SerialDevice::open] with the
/// errno of the failed `open(2)`.
///
/// # Errors
/// Errors if path-expansion fails.
pub fn expand_path(input: &str) -> Result<PathBuf, String> {
    PathBuf::from(input)
        .get_expanded_path()
        .ok_or_else(|| format!("Error expanding path '{input}'."))
}

/// Validates a file to write output to (a report or a log file).
///
/// Expands the path and rejects it if it points to an existing directory.
///
/// Used in `rawtty`s `clap` cli interface to validate user input and
/// propogate errors before running the program.
///
/// # Errors
/// Errors if path-expansion fails or if the path is a directory.
pub fn validate_out_file(input: &str) -> Result<PathBuf, String> {
    let p = PathBuf::from(input)
        .get_expanded_path()
        .ok_or("Error expanding path.")?;
    if p.is_dir() {
        return Err(format!("Invalid file '{input}'\nThe path is a directory"));
    }
    Ok(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_file_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        let as_str = dir.path().to_str().unwrap();
        assert!(validate_out_file(as_str).is_err());
        let file = dir.path().join("report.txt");
        assert_eq!(validate_out_file(file.to_str().unwrap()), Ok(file));
    }

    #[test]
    fn device_path_is_not_required_to_exist() {
        assert_eq!(
            expand_path("/dev/does-not-exist"),
            Ok(PathBuf::from("/dev/does-not-exist"))
        );
    }
}
