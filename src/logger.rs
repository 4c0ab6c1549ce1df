//! Logging with colored module prefixes.
//!
//! Provides the `log!` and `debug!` macros for formatted terminal output.
//! Messages carry a colored `[module]` prefix and are truncated to the
//! terminal width. Verbosity follows the CLI: `--quiet` drops everything
//! but errors, `--verbose` additionally enables `debug!`.
//!
//! ```ignore
//! log!("render"; "instantiated {} stages", count);
//! debug!("env"; "removing old symlink: {}", path.display());
//! ```

use colored::{ColoredString, Colorize};
use crossterm::terminal::size;
use std::{
    io::{Write, stdout},
    sync::{
        OnceLock,
        atomic::{AtomicU8, Ordering},
    },
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Output verbosity: 0 = quiet, 1 = normal, 2 = verbose
static LEVEL: AtomicU8 = AtomicU8::new(1);

/// Set verbosity from the CLI flags.
pub fn set_level(verbose: bool, quiet: bool) {
    let level = if verbose {
        2
    } else if quiet {
        0
    } else {
        1
    };
    LEVEL.store(level, Ordering::Relaxed);
}

/// Get terminal width, cached after first call.
/// Falls back to 120 columns if detection fails.
fn terminal_width() -> usize {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120)) as usize
}

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a message only when `--verbose` is set.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::debug($module, &format!($($arg)*))
    }};
}

/// Log a message with a colored module prefix.
///
/// Automatically truncates single-line messages to fit terminal width.
pub fn log(module: &str, message: &str) {
    let level = LEVEL.load(Ordering::Relaxed);
    if level == 0 && module != "error" {
        return;
    }
    print_line(module, message);
}

/// Log a debug message; only shown in verbose mode.
pub fn debug(module: &str, message: &str) {
    if LEVEL.load(Ordering::Relaxed) < 2 {
        return;
    }
    print_line(module, message);
}

fn print_line(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    let mut stdout = stdout().lock();

    if message.contains('\n') {
        // Multiline output is never truncated
        writeln!(stdout, "{prefix} {message}").ok();
    } else {
        // "[module] " overhead: brackets plus trailing space
        let max_msg_len = terminal_width().saturating_sub(module.len() + 3);
        writeln!(stdout, "{prefix} {}", truncate_str(message, max_msg_len)).ok();
    }
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type.
#[inline]
fn colorize_prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module {
        "run" => prefix.bright_blue().bold(),
        "test" => prefix.bright_green().bold(),
        "error" => prefix.bright_red().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Truncate a string to fit within `max_len` bytes.
///
/// Ensures the result is valid UTF-8 by finding the nearest character
/// boundary.
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
