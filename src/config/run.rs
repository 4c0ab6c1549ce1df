//! `[run]` section configuration.
//!
//! Settings for driving the external build system and the emulator.

use std::collections::BTreeMap;

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[run]` section in tutkit.toml - build and emulation settings.
///
/// Build steps are argument lists handed to `build_command` in order, with
/// `{config}` and `{jobs}` placeholders substituted per invocation.
///
/// # Example
/// ```toml
/// [run]
/// build_command = ["make"]
/// build_steps = [["clean"], ["{config}"], ["silentoldconfig"], ["-j{jobs}"]]
/// timeout = 1800
///
/// [run.platforms.pc99]
/// qemu = "qemu-system-i386"
/// args = ["-nographic", "-m", "512", "-cpu", "Haswell"]
/// arch = "ia32"
/// image = "images/{name}-image-{arch}-{plat}"
/// kernel = "images/kernel-ia32-pc99"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Build tool invocation.
    #[serde(default = "defaults::run::build_command")]
    #[educe(Default = defaults::run::build_command())]
    pub build_command: Vec<String>,

    /// Argument lists run against `build_command`, in order.
    #[serde(default = "defaults::run::build_steps")]
    #[educe(Default = defaults::run::build_steps())]
    pub build_steps: Vec<Vec<String>>,

    /// Parallel build jobs.
    #[serde(default = "defaults::run::jobs")]
    #[educe(Default = defaults::run::jobs())]
    pub jobs: usize,

    /// Per-test timeout in seconds.
    #[serde(default = "defaults::run::timeout")]
    #[educe(Default = defaults::run::timeout())]
    pub timeout: u64,

    /// Output substrings that mark a test run as failed.
    #[serde(default = "defaults::run::failure_markers")]
    #[educe(Default = defaults::run::failure_markers())]
    pub failure_markers: Vec<String>,

    /// Emulation targets, keyed by platform name.
    #[serde(default = "defaults::run::platforms")]
    #[educe(Default = defaults::run::platforms())]
    pub platforms: BTreeMap<String, PlatformConfig>,
}

/// One emulation target.
///
/// `image` and `kernel` are path templates; `{name}`, `{arch}` and `{plat}`
/// are substituted at launch. With `kernel` set the image boots as an
/// initrd behind the kernel, otherwise the image itself is the kernel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformConfig {
    pub qemu: String,

    #[serde(default)]
    pub args: Vec<String>,

    pub arch: String,

    pub image: String,

    #[serde(default)]
    pub kernel: Option<String>,
}
