//! Building and running tutorials.
//!
//! Drives the external build system and the per-platform emulator. `run`
//! streams the emulator to the terminal; `test` watches it through a pty
//! for the stage's expected completion text and reports JUnit-style
//! results.
//!
//! Build configs are files named `<plat>_<name>_defconfig` in the active
//! environment's configs dir; the set of valid (platform, tutorial) pairs
//! is derived from those filenames.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use portable_pty::{CommandBuilder, PtySize, native_pty_system};
use regex::Regex;

use crate::config::{PlatformConfig, WorkspaceConfig, config_filename_from_parts};
use crate::render::CompletionSpec;
use crate::report::{self, Failure, TestCase};
use crate::{debug, exec_status, log};

/// Substitute `{key}` placeholders in a pattern.
fn subst(pattern: &str, vars: &[(&str, &str)]) -> String {
    let mut out = pattern.to_owned();
    for (key, value) in vars {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

/// (platform, tutorial) pairs that have a build config file.
fn list_configs(config: &WorkspaceConfig) -> Result<Vec<(String, String)>> {
    let dir = &config.env.configs_link;
    let entries = fs::read_dir(dir).with_context(|| {
        format!(
            "no build configs at {} (run `tutkit env <NAME>` first)",
            dir.display()
        )
    })?;

    let mut pairs = Vec::new();
    for entry in entries {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        match config.config_filename_to_parts(&file_name) {
            Ok(pair) => pairs.push(pair),
            Err(_) => debug!("run"; "skipping {file_name}"),
        }
    }
    pairs.sort();
    Ok(pairs)
}

/// Pick the platform to use, defaulting to the first one that has a build
/// config for this tutorial.
fn resolve_plat(
    pairs: &[(String, String)],
    name: &str,
    plat: Option<&str>,
) -> Result<String> {
    if let Some(plat) = plat {
        check_config(pairs, plat, name)?;
        return Ok(plat.to_owned());
    }
    match pairs.iter().find(|(_, n)| n == name) {
        Some((plat, _)) => Ok(plat.clone()),
        None => {
            let names: Vec<&str> = pairs.iter().map(|(_, n)| n.as_str()).collect();
            log!("error"; "No tutorial named \"{name}\".");
            log!("error"; "Available tutorials: {}", names.join(", "));
            bail!("no build config for {name}")
        }
    }
}

/// Verify a (platform, tutorial) pair exists, listing alternatives when it
/// does not.
fn check_config(pairs: &[(String, String)], plat: &str, name: &str) -> Result<()> {
    if pairs.iter().any(|(p, n)| p == plat && n == name) {
        return Ok(());
    }

    let for_plat: Vec<&str> = pairs
        .iter()
        .filter(|(p, _)| p == plat)
        .map(|(_, n)| n.as_str())
        .collect();
    log!("error"; "No tutorial named \"{name}\" for {plat}.");
    log!("error"; "Tutorials for {plat}: {}", for_plat.join(", "));

    let plats_with: Vec<&str> = pairs
        .iter()
        .filter(|(_, n)| n == name)
        .map(|(p, _)| p.as_str())
        .collect();
    if !plats_with.is_empty() {
        log!("error"; "Platforms with \"{name}\": {}", plats_with.join(", "));
    }
    bail!("no build config for {plat}/{name}")
}

/// Run the configured build steps for one tutorial.
fn build(config: &WorkspaceConfig, plat: &str, name: &str, jobs: usize) -> Result<()> {
    let config_file = config_filename_from_parts(plat, name);
    let jobs = jobs.to_string();
    let root = config.get_root();

    for step in &config.run.build_steps {
        let args: Vec<String> = step
            .iter()
            .map(|arg| subst(arg, &[("config", &config_file), ("jobs", &jobs)]))
            .collect();
        log!("run"; "{} {}", config.run.build_command.join(" "), args.join(" "));
        exec_status!(root; &config.run.build_command; args)?;
    }
    Ok(())
}

/// Emulator binary and argument list for one tutorial image.
fn emulator_cmd(platform: &PlatformConfig, name: &str, plat: &str) -> (String, Vec<String>) {
    let vars = [("name", name), ("arch", platform.arch.as_str()), ("plat", plat)];
    let image = subst(&platform.image, &vars);

    let mut args = platform.args.clone();
    match &platform.kernel {
        Some(kernel) => args.extend([
            "-kernel".to_owned(),
            subst(kernel, &vars),
            "-initrd".to_owned(),
            image,
        ]),
        None => args.extend(["-kernel".to_owned(), image]),
    }
    (platform.qemu.clone(), args)
}

fn platform<'a>(config: &'a WorkspaceConfig, plat: &str) -> Result<&'a PlatformConfig> {
    config
        .run
        .platforms
        .get(plat)
        .with_context(|| format!("[run.platforms.{plat}] is not configured"))
}

/// Entry point for the `run` subcommand.
pub fn handle_run(
    config: &WorkspaceConfig,
    name: &str,
    plat: Option<&str>,
    jobs: Option<usize>,
) -> Result<()> {
    let pairs = list_configs(config)?;
    let plat = resolve_plat(&pairs, name, plat)?;
    let jobs = jobs.unwrap_or(config.run.jobs);

    build(config, &plat, name, jobs)?;

    let platform = platform(config, &plat)?;
    let (qemu, args) = emulator_cmd(platform, name, &plat);
    which::which(&qemu).with_context(|| format!("`{qemu}` is not installed"))?;

    log!("run"; "{qemu} {}", args.join(" "));
    log!("run"; "Ctrl+A X to quit");
    let cmd = vec![qemu];
    exec_status!(config.get_root(); &cmd; args)
}

/// Entry point for the `test` subcommand.
pub fn handle_test(
    config: &WorkspaceConfig,
    name: Option<&str>,
    plat: Option<&str>,
    timeout: Option<u64>,
) -> Result<()> {
    let timeout = Duration::from_secs(timeout.unwrap_or(config.run.timeout));

    let selected: Vec<(String, String)> = list_configs(config)?
        .into_iter()
        .filter(|(p, n)| {
            plat.is_none_or(|want| want == p) && name.is_none_or(|want| want == n)
        })
        .collect();
    if selected.is_empty() {
        bail!("no build configs match the requested tutorial/platform");
    }

    let mut cases = Vec::new();
    for (plat, name) in &selected {
        log!("test"; "{plat}_{name}");
        let failure = run_single_test(config, plat, name, timeout)?;
        match &failure {
            None => log!("test"; "Success!"),
            Some(failure) => log!("test"; "{}", failure.message),
        }
        cases.push(TestCase {
            classname: "tutorials".into(),
            name: format!("{plat}_{name}"),
            failure,
        });
    }

    report::print_report(&cases)?;

    let failed = cases.iter().filter(|c| c.failure.is_some()).count();
    if failed > 0 {
        bail!("{failed}/{} tutorial tests failed", cases.len());
    }
    Ok(())
}

/// Build one tutorial and watch the emulator for its completion text.
///
/// The expected text comes from the active view's rendered completion
/// artifact, so the check always matches what was actually built.
fn run_single_test(
    config: &WorkspaceConfig,
    plat: &str,
    name: &str,
    timeout: Duration,
) -> Result<Option<Failure>> {
    build(config, plat, name, config.run.jobs)?;

    let completion_path = config
        .env
        .apps_link
        .join(name)
        .join(&config.render.completion_file);
    let spec = CompletionSpec::load(&completion_path).with_context(|| {
        format!("no completion text for `{name}`; run `tutkit solution` first")
    })?;
    let completion = Regex::new(&spec.finish)
        .with_context(|| format!("invalid completion pattern for `{name}`"))?;

    let platform = platform(config, plat)?;
    let (qemu, args) = emulator_cmd(platform, name, plat);
    let (outcome, captured) = expect_output(
        &qemu,
        &args,
        config.get_root(),
        &completion,
        &config.run.failure_markers,
        timeout,
    )?;

    let failure = |message: String| {
        Some(Failure {
            kind: "failure".into(),
            message,
            output: captured.clone(),
        })
    };
    Ok(match outcome {
        ExpectOutcome::Matched => None,
        ExpectOutcome::FailureMarker(marker) => {
            failure(format!("failure marker in output: {marker}"))
        }
        ExpectOutcome::Eof => failure("EOF received before completion text".into()),
        ExpectOutcome::Timeout => failure("Test timed out".into()),
    })
}

/// How an expect-watch over emulator output ended.
#[derive(Debug)]
enum ExpectOutcome {
    /// The completion text appeared.
    Matched,
    /// A configured failure marker appeared first.
    FailureMarker(String),
    /// The process exited before the completion text appeared.
    Eof,
    Timeout,
}

/// Spawn a command in a pty and watch its output for a completion pattern.
///
/// Returns the outcome and everything captured so far. The child is killed
/// before returning.
fn expect_output(
    cmd: &str,
    args: &[String],
    cwd: &Path,
    completion: &Regex,
    failure_markers: &[String],
    timeout: Duration,
) -> Result<(ExpectOutcome, String)> {
    let pty = native_pty_system();
    let pair = pty.openpty(PtySize {
        rows: 24,
        cols: 80,
        pixel_width: 0,
        pixel_height: 0,
    })?;

    let mut builder = CommandBuilder::new(cmd);
    builder.args(args);
    builder.cwd(cwd);
    let mut child = pair.slave.spawn_command(builder)?;
    drop(pair.slave);

    // Reader thread feeds chunks over a channel so the match loop can
    // enforce the deadline with recv_timeout.
    let mut reader = pair.master.try_clone_reader()?;
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        loop {
            match reader.read(&mut buf) {
                Ok(0) | Err(_) => {
                    tx.send(None).ok();
                    break;
                }
                Ok(n) => {
                    if tx.send(Some(buf[..n].to_vec())).is_err() {
                        break;
                    }
                }
            }
        }
    });

    let deadline = Instant::now() + timeout;
    let mut captured = String::new();
    let outcome = loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break ExpectOutcome::Timeout;
        }
        match rx.recv_timeout(remaining) {
            Ok(Some(chunk)) => {
                captured.push_str(&String::from_utf8_lossy(&chunk));
                if completion.is_match(&captured) {
                    break ExpectOutcome::Matched;
                }
                if let Some(marker) = failure_markers
                    .iter()
                    .find(|marker| captured.contains(marker.as_str()))
                {
                    break ExpectOutcome::FailureMarker(marker.clone());
                }
            }
            Ok(None) | Err(RecvTimeoutError::Disconnected) => break ExpectOutcome::Eof,
            Err(RecvTimeoutError::Timeout) => break ExpectOutcome::Timeout,
        }
    };

    child.kill().ok();
    Ok((outcome, captured))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subst() {
        assert_eq!(
            subst("images/{name}-image-{arch}-{plat}", &[
                ("name", "hello-1"),
                ("arch", "ia32"),
                ("plat", "pc99"),
            ]),
            "images/hello-1-image-ia32-pc99"
        );
        // every occurrence is replaced
        assert_eq!(subst("{jobs}x{jobs}", &[("jobs", "4")]), "4x4");
        // unknown placeholders pass through
        assert_eq!(subst("-j{jobs}", &[("config", "c")]), "-j{jobs}");
    }

    #[test]
    fn test_emulator_cmd_with_kernel() {
        let config = WorkspaceConfig::default();
        let platform = &config.run.platforms["pc99"];
        let (qemu, args) = emulator_cmd(platform, "hello-1", "pc99");

        assert_eq!(qemu, "qemu-system-i386");
        let tail: Vec<&str> = args.iter().map(String::as_str).collect();
        assert!(tail.ends_with(&[
            "-kernel",
            "images/kernel-ia32-pc99",
            "-initrd",
            "images/hello-1-image-ia32-pc99",
        ]));
    }

    #[test]
    fn test_emulator_cmd_without_kernel() {
        let config = WorkspaceConfig::default();
        let platform = &config.run.platforms["imx31"];
        let (qemu, args) = emulator_cmd(platform, "hello-timer", "imx31");

        assert_eq!(qemu, "qemu-system-arm");
        let tail: Vec<&str> = args.iter().map(String::as_str).collect();
        assert!(tail.ends_with(&["-kernel", "images/hello-timer-image-arm-imx31"]));
    }

    fn pairs() -> Vec<(String, String)> {
        vec![
            ("imx31".into(), "hello-timer".into()),
            ("pc99".into(), "hello-1".into()),
            ("pc99".into(), "hello-2".into()),
        ]
    }

    #[test]
    fn test_resolve_plat_explicit() {
        assert_eq!(resolve_plat(&pairs(), "hello-1", Some("pc99")).unwrap(), "pc99");
        assert!(resolve_plat(&pairs(), "hello-1", Some("imx31")).is_err());
    }

    #[test]
    fn test_resolve_plat_defaults_to_first_match() {
        assert_eq!(resolve_plat(&pairs(), "hello-timer", None).unwrap(), "imx31");
        assert!(resolve_plat(&pairs(), "hello-9", None).is_err());
    }

    #[test]
    fn test_check_config() {
        assert!(check_config(&pairs(), "pc99", "hello-2").is_ok());
        assert!(check_config(&pairs(), "imx31", "hello-2").is_err());
    }

    #[cfg(unix)]
    mod expect {
        use super::super::*;

        fn sh(script: &str) -> Vec<String> {
            vec!["-c".to_owned(), script.to_owned()]
        }

        #[test]
        fn test_expect_matches_completion() {
            let completion = Regex::new("hello world").unwrap();
            let (outcome, captured) = expect_output(
                "sh",
                &sh("echo hello world; sleep 5"),
                Path::new("."),
                &completion,
                &[],
                Duration::from_secs(10),
            )
            .unwrap();
            assert!(matches!(outcome, ExpectOutcome::Matched));
            assert!(captured.contains("hello world"));
        }

        #[test]
        fn test_expect_failure_marker_wins() {
            let completion = Regex::new("never printed").unwrap();
            let (outcome, _) = expect_output(
                "sh",
                &sh("echo fatal error; sleep 5"),
                Path::new("."),
                &completion,
                &["fatal error".to_owned()],
                Duration::from_secs(10),
            )
            .unwrap();
            assert!(matches!(outcome, ExpectOutcome::FailureMarker(marker) if marker == "fatal error"));
        }

        #[test]
        fn test_expect_eof() {
            let completion = Regex::new("never printed").unwrap();
            let (outcome, _) = expect_output(
                "sh",
                &sh("echo something else"),
                Path::new("."),
                &completion,
                &[],
                Duration::from_secs(10),
            )
            .unwrap();
            assert!(matches!(outcome, ExpectOutcome::Eof));
        }

        #[test]
        fn test_expect_timeout() {
            let completion = Regex::new("never printed").unwrap();
            let (outcome, _) = expect_output(
                "sh",
                &sh("sleep 5"),
                Path::new("."),
                &completion,
                &[],
                Duration::from_millis(300),
            )
            .unwrap();
            assert!(matches!(outcome, ExpectOutcome::Timeout));
        }

        #[test]
        fn test_expect_alternation_pattern() {
            // completion strings may be regexes with alternation
            let completion = Regex::new("(thread_2: two)|(main: one)").unwrap();
            let (outcome, _) = expect_output(
                "sh",
                &sh("echo main: one; sleep 5"),
                Path::new("."),
                &completion,
                &[],
                Duration::from_secs(10),
            )
            .unwrap();
            assert!(matches!(outcome, ExpectOutcome::Matched));
        }
    }
}
