//! Path expansion for user supplied paths (cli arguments and `config.toml`)
//! along with the `clap` value parsers built on top of it.

mod macros;
mod validators;
pub use validators::*;

use std::path::{Component, Path, PathBuf};

/// Expands a leading `~`, `$HOME` or `${HOME}` to the user's home directory.
pub trait ExpandPaths {
    /// Returns the expanded path, or `None` if the path needs the home
    /// directory and `$HOME` is not set.
    fn get_expanded_path(&self) -> Option<PathBuf>;
}

impl ExpandPaths for Path {
    fn get_expanded_path(&self) -> Option<PathBuf> {
        let mut components = self.components();
        let Some(Component::Normal(first)) = components.next() else {
            return Some(self.to_path_buf());
        };

        match first.to_str() {
            Some("~" | "$HOME" | "${HOME}") => {
                let mut expanded = home_dir()?;
                expanded.extend(components);
                Some(expanded)
            }
            _ => Some(self.to_path_buf()),
        }
    }
}

impl ExpandPaths for PathBuf {
    fn get_expanded_path(&self) -> Option<PathBuf> {
        self.as_path().get_expanded_path()
    }
}

pub(crate) fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_absolute_paths_alone() {
        let p = PathBuf::from("/dev/ttyUSB0");
        assert_eq!(p.get_expanded_path(), Some(PathBuf::from("/dev/ttyUSB0")));
    }

    #[test]
    fn leaves_relative_paths_alone() {
        let p = PathBuf::from("logs/rawtty.log");
        assert_eq!(p.get_expanded_path(), Some(p.clone()));
    }

    #[test]
    fn expands_home_forms() {
        let Some(home) = home_dir() else {
            return;
        };
        for form in ["~/rawtty.log", "$HOME/rawtty.log", "${HOME}/rawtty.log"] {
            let p = PathBuf::from(form);
            assert_eq!(p.get_expanded_path(), Some(home.join("rawtty.log")), "{form}");
        }
    }

    #[test]
    fn tilde_inside_path_is_literal() {
        let p = PathBuf::from("/tmp/~/x");
        assert_eq!(p.get_expanded_path(), Some(p.clone()));
    }
}
