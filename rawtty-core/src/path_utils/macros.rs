//! This module holds helper macros for dealing with paths and errors

/// Takes a [`&Path`][std::path::Path] and first checks whether it exists or if it is a
/// directory. If it doesn't exist or is not a directory, it will create
/// the directory recursively; creating the necessary parent directories.
///
/// Evaluates to the [`std::io::Result`] of creating the directory.
///
/// ## Example
/// ```
/// use rawtty_core::create_recursive;
/// use std::path::PathBuf;
/// fn mkdir() -> std::io::Result<()> {
///     let path = std::env::temp_dir().join("rawtty-doc/some/dir");
///     create_recursive!(&path)?;
///     assert!(path.is_dir() && path.exists());
///     Ok(())
/// }
/// mkdir().unwrap();
/// ```
#[macro_export]
macro_rules! create_recursive {
    ($path:expr) => {{
        let create_recursive_dir = |p: &std::path::Path| -> std::io::Result<()> {
            if !p.exists() || !p.is_dir() {
                let mut builder = std::fs::DirBuilder::new();
                builder.recursive(true);
                builder.create(p)?;
            }
            Ok(())
        };

        create_recursive_dir($path)
    }};
}

/// Used to add a `.map_err()` to function calls that return a `Result<T, E>`
/// to provide better context for the error and print it nicely to stderr.
///
/// Takes 2 arguements and optionally a third and fourth:
/// - The first argument is the expression or function call that would return a `Result<T, E>`
/// - The second argument is context that better describes the returned error
/// - The optional third argument is the 'USAGE: rawtty ...' that would typically be printed by `clap`
///   for the respective command
/// - The optional fourth argument is an additional "help:" message
///
/// ## Example
/// ```
/// use crossterm::style::Stylize;
/// use rawtty_core::{device::SerialDevice, map_miette};
/// fn returns_err() -> miette::Result<()> {
///     let device = "/dev/fakeport";
///     let _con = map_miette!(
///         SerialDevice::open(device),
///         format!("Failed to open device '{}'", device),
///         format!("{} {} [OPTIONS] [DEVICE] [COMMAND]",
///             "USAGE:".bold().underlined(),
///             "rawtty".bold()
///         ),
///         help = format!(
///             "To see available ports, try `{}`.",
///             "rawtty list-ports".bold().cyan()
///         )
///     )?;
///     Ok(())
/// }
/// let fn_err = returns_err();
/// assert!(fn_err.is_err());
/// ```
#[macro_export]
macro_rules! map_miette {
    // Clap-style USAGE: && additional "help" message
    ($expr:expr, $wrap_msg:expr, $usage:expr, help = $add_help:expr) => {
        $expr.map_err(|e| {
            use crossterm::style::Stylize;
            miette::miette!(
                help = format!("{}\nFor more information, try `rawtty --help`.", $add_help),
                "{e}"
            )
            .wrap_err(format!("{}\n\n{}\n", $wrap_msg, $usage).red())
        })
    };

    // Additional "help" message, must come before the USAGE: arm
    // since `help = ...` also parses as an expression
    ($expr:expr, $wrap_msg:expr, help = $add_help:expr) => {
        $expr.map_err(|e| {
            use crossterm::style::Stylize;
            miette::miette!(
                help = format!("{}\nFor more information, try `rawtty --help`.", $add_help),
                "{e}"
            )
            .wrap_err(format!("{}", $wrap_msg).red())
        })
    };

    // Clap-style USAGE: && default "help" message
    ($expr:expr, $wrap_msg:expr, $usage:expr) => {
        $expr.map_err(|e| {
            use crossterm::style::Stylize;
            miette::miette!(help = "For more information, try `rawtty --help`.", "{e}")
                .wrap_err(format!("{}\n\n{}\n", $wrap_msg, $usage).red())
        })
    };

    // Default "help" message
    ($expr:expr, $wrap_msg:expr) => {
        $expr.map_err(|e| {
            use crossterm::style::Stylize;
            miette::miette!(help = "For more information, try `rawtty --help`.", "{e}")
                .wrap_err(format!("{}", $wrap_msg).red())
        })
    };
}
