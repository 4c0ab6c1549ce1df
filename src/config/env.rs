//! `[env]` section configuration.
//!
//! Names the workspace environments and the symlinks that select between
//! them.

use std::path::PathBuf;

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[env]` section in tutkit.toml - workspace environment layout.
///
/// An environment groups the tutorials built against one platform flavour.
/// Each environment `NAME` owns entries suffixed `-NAME` in the build
/// config dir; the `apps` symlink selects which generated view (exercises,
/// solutions or raw templates) the build system sees.
///
/// # Example
/// ```toml
/// [env]
/// environments = ["sel4", "camkes"]
/// apps_link = "apps"
/// build_config_dir = "build-config"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct EnvConfig {
    /// Known environment names.
    #[serde(default = "defaults::env::environments")]
    #[educe(Default = defaults::env::environments())]
    pub environments: Vec<String>,

    /// Symlink the build system reads the apps from.
    #[serde(default = "defaults::env::apps_link")]
    #[educe(Default = defaults::env::apps_link())]
    pub apps_link: PathBuf,

    /// Symlink holding the active environment's build config files.
    #[serde(default = "defaults::env::configs_link")]
    #[educe(Default = defaults::env::configs_link())]
    pub configs_link: PathBuf,

    /// Directory holding per-environment build config dirs.
    #[serde(default = "defaults::env::build_config_dir")]
    #[educe(Default = defaults::env::build_config_dir())]
    pub build_config_dir: PathBuf,
}
