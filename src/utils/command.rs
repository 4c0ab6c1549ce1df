//! External command execution utilities.
//!
//! Provides macros for running external tools with captured or inherited
//! output. Captured runs log their stdout through `log!`; a failing command
//! surfaces its stderr in the error.

use crate::log;
use anyhow::{Context, Result, bail};
use std::{
    ffi::OsString,
    path::Path,
    process::{Command, Output, Stdio},
};

// ============================================================================
// Macros
// ============================================================================

/// Run an external command and capture its output.
///
/// # Examples
/// ```ignore
/// // Without working directory
/// exec!(["git"]; "status", "-s")?;
///
/// // With working directory
/// exec!(root; ["git"]; "checkout", branch)?;
/// ```
#[macro_export]
macro_rules! exec {
    ($cmd:expr; $($arg:expr),* $(,)?) => {{
        $crate::utils::command::exec(
            None,
            &$crate::utils::command::to_cmd_vec($cmd),
            &[$($crate::utils::command::to_os($arg)),*],
        )
    }};
    ($root:expr; $cmd:expr; $($arg:expr),* $(,)?) => {{
        $crate::utils::command::exec(
            Some($root),
            &$crate::utils::command::to_cmd_vec($cmd),
            &[$($crate::utils::command::to_os($arg)),*],
        )
    }};
}

/// Run an external command with stdio inherited from this process.
///
/// For long-running tools whose output should stream to the user, like
/// build steps.
#[macro_export]
macro_rules! exec_status {
    ($root:expr; $cmd:expr; $args:expr) => {{
        $crate::utils::command::exec_inherit(
            Some($root),
            &$crate::utils::command::to_cmd_vec($cmd),
            &$args.iter().map($crate::utils::command::to_os).collect::<Vec<_>>(),
        )
    }};
}

// ============================================================================
// Argument Conversion
// ============================================================================

/// Convert to OsString.
#[inline]
pub fn to_os<S: Into<OsString>>(s: S) -> OsString {
    s.into()
}

/// Trait for converting to command vector.
pub trait ToCmd {
    fn to_cmd(self) -> Vec<OsString>;
}

impl<const N: usize> ToCmd for [&str; N] {
    #[inline]
    fn to_cmd(self) -> Vec<OsString> {
        self.into_iter().map(OsString::from).collect()
    }
}

impl ToCmd for &[String] {
    #[inline]
    fn to_cmd(self) -> Vec<OsString> {
        self.iter().map(OsString::from).collect()
    }
}

impl ToCmd for &Vec<String> {
    #[inline]
    fn to_cmd(self) -> Vec<OsString> {
        self.iter().map(OsString::from).collect()
    }
}

/// Convert command to `Vec<OsString>`.
#[inline]
pub fn to_cmd_vec<C: ToCmd>(cmd: C) -> Vec<OsString> {
    cmd.to_cmd()
}

// ============================================================================
// Command Execution
// ============================================================================

/// Execute a command and capture its output.
///
/// # Errors
/// Returns error if command fails to execute or returns non-zero exit code.
pub fn exec(root: Option<&Path>, cmd: &[OsString], args: &[OsString]) -> Result<Output> {
    let (name, mut command) = prepare(root, cmd, args)?;

    let output = command
        .output()
        .with_context(|| format!("Failed to execute `{name}`"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if !stderr.is_empty() {
            eprintln!("{stderr}");
        }
        bail!("Command `{name}` failed with {}", output.status);
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        log!(&name; "{line}");
    }

    Ok(output)
}

/// Execute a command with inherited stdio and check its exit status.
pub fn exec_inherit(root: Option<&Path>, cmd: &[OsString], args: &[OsString]) -> Result<()> {
    let (name, mut command) = prepare(root, cmd, args)?;

    let status = command
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("Failed to execute `{name}`"))?;

    if !status.success() {
        bail!("Command `{name}` failed with {status}");
    }
    Ok(())
}

/// Prepare a Command from components.
fn prepare(root: Option<&Path>, cmd: &[OsString], args: &[OsString]) -> Result<(String, Command)> {
    let name = cmd
        .first()
        .and_then(|s| s.to_str())
        .context("Empty command")?
        .to_owned();

    let mut command = Command::new(&cmd[0]);
    command.args(&cmd[1..]).args(args);

    if let Some(dir) = root {
        command.current_dir(dir);
    }

    Ok((name, command))
}

// ============================================================================
// Tests
// ============================================================================
