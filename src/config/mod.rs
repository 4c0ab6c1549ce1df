//! Workspace configuration management for `tutkit.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[base]`    | Collection metadata (name, description, author)  |
//! | `[env]`     | Environment names and workspace symlink layout   |
//! | `[render]`  | Template dirs, rendered extensions, artifacts    |
//! | `[run]`     | Build tool, build steps, emulation platforms     |
//! | `[publish]` | Extra dirs/files for the published repo          |
//! | `[extra]`   | User-defined custom fields                       |
//!
//! # Example
//!
//! ```toml
//! [base]
//! name = "os-tutorials"
//! description = "Hands-on microkernel exercises"
//!
//! [env]
//! environments = ["sel4", "camkes"]
//!
//! [run]
//! build_command = ["make"]
//! timeout = 900
//!
//! [extra]
//! course_id = "COMP9242"
//! ```

mod base;
pub mod defaults;
mod env;
mod error;
mod publish;
mod render;
mod run;

// Re-export public types used by other modules
pub use env::EnvConfig;
pub use publish::PublishConfig;
pub use render::RenderConfig;
pub use run::{PlatformConfig, RunConfig};

use base::BaseConfig;
use error::ConfigError;

use crate::cli::{Cli, Commands};
use anyhow::{Context, Result, bail};
use educe::Educe;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

/// Format a build config filename from its platform and tutorial parts.
pub fn config_filename_from_parts(prefix: &str, name: &str) -> String {
    format!("{prefix}_{name}_defconfig")
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing tutkit.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceConfig {
    /// CLI arguments reference
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Workspace root (set after loading)
    #[serde(skip)]
    root: Option<PathBuf>,

    /// Collection metadata
    #[serde(default)]
    pub base: BaseConfig,

    /// Environment layout
    #[serde(default)]
    pub env: EnvConfig,

    /// Template rendering settings
    #[serde(default)]
    pub render: RenderConfig,

    /// Build and emulation settings
    #[serde(default)]
    pub run: RunConfig,

    /// Publishing settings
    #[serde(default)]
    pub publish: PublishConfig,

    /// User-defined extra fields
    #[serde(default)]
    pub extra: HashMap<String, toml::Value>,
}

impl WorkspaceConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: WorkspaceConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.root = Some(path.to_path_buf())
    }

    /// Update configuration with CLI arguments and normalize paths
    pub fn update_with_cli(&mut self, cli: &'static Cli) {
        self.cli = Some(cli);

        // Determine the final root path based on command
        let root = match &cli.command {
            Commands::Init { name: Some(name) } => {
                let base = cli
                    .root
                    .as_ref()
                    .cloned()
                    .unwrap_or_else(|| self.get_root().to_owned());
                base.join(name)
            }
            _ => cli
                .root
                .as_ref()
                .cloned()
                .unwrap_or_else(|| self.get_root().to_owned()),
        };
        let root = Self::normalize_path(&root);

        self.config_path = Self::normalize_path(&root.join(&cli.config));

        // Normalize all workspace-relative directory paths
        self.render.templates = Self::normalize_path(&root.join(&self.render.templates));
        self.render.solutions = Self::normalize_path(&root.join(&self.render.solutions));
        self.render.exercises = Self::normalize_path(&root.join(&self.render.exercises));
        self.env.apps_link = Self::normalize_path(&root.join(&self.env.apps_link));
        self.env.configs_link = Self::normalize_path(&root.join(&self.env.configs_link));
        self.env.build_config_dir = Self::normalize_path(&root.join(&self.env.build_config_dir));

        self.root = Some(root);
    }

    /// Normalize a path to absolute, expanding a leading tilde and using
    /// canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        let path = match path.to_str() {
            Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
            None => path.to_path_buf(),
        };
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(&path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration for the current command
    pub fn validate(&self) -> Result<()> {
        if self.env.environments.is_empty() {
            bail!(ConfigError::Validation(
                "[env.environments] must name at least one environment".into()
            ));
        }

        if self.render.source_exts.is_empty() {
            bail!(ConfigError::Validation(
                "[render.source_exts] must list at least one extension".into()
            ));
        }

        if self.run.build_command.is_empty() {
            bail!(ConfigError::Validation(
                "[run.build_command] must have at least one element".into()
            ));
        }

        if self.run.timeout == 0 {
            bail!(ConfigError::Validation(
                "[run.timeout] must be positive".into()
            ));
        }

        // Command-specific checks for external tools
        if let Some(cli) = self.cli
            && matches!(cli.command, Commands::Run { .. } | Commands::Test { .. })
        {
            if self.run.platforms.is_empty() {
                bail!(ConfigError::Validation(
                    "[run.platforms] must define at least one platform".into()
                ));
            }
            Self::check_command_installed("[run.build_command]", &self.run.build_command)?;
        }

        Ok(())
    }

    /// Check if a command is installed and available
    fn check_command_installed(field: &str, command: &[String]) -> Result<()> {
        if command.is_empty() {
            bail!(ConfigError::Validation(format!(
                "{field} must have at least one element"
            )));
        }

        let cmd = &command[0];
        which::which(cmd)
            .with_context(|| format!("`{cmd}` not found. Please install it first."))?;

        Ok(())
    }

    // ========================================================================
    // Build config filenames
    // ========================================================================

    /// Regex matching build config filenames for the configured platforms.
    fn build_config_re(&self) -> Result<Regex> {
        let prefixes = self
            .run
            .platforms
            .keys()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!("^(?P<prefix>{prefixes})_(?P<name>.*)_defconfig$"))
            .context("failed to build config filename pattern")
    }

    /// Return the (platform, name) parts of a build config filename.
    pub fn config_filename_to_parts(&self, filename: &str) -> Result<(String, String)> {
        let re = self.build_config_re()?;
        let caps = re
            .captures(filename)
            .with_context(|| format!("invalid build config filename: {filename}"))?;
        Ok((caps["prefix"].to_owned(), caps["name"].to_owned()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        let config = WorkspaceConfig::from_str(
            r#"
            [base]
            name = "os-tutorials"
            description = "exercises"
        "#,
        )
        .unwrap();
        assert_eq!(config.base.name, "os-tutorials");
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let result = WorkspaceConfig::from_str("[base\nname = \"x\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_top_level_field_rejection() {
        let result: Result<WorkspaceConfig, _> = toml::from_str(
            r#"
            [unknown_section]
            field = "value"
        "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_get_root_default() {
        let config = WorkspaceConfig::default();
        assert_eq!(config.get_root(), Path::new("./"));
    }

    #[test]
    fn test_config_filename_roundtrip() {
        let config = WorkspaceConfig::default();
        for (plat, name) in [("pc99", "hello-1"), ("imx31", "hello-timer")] {
            let filename = config_filename_from_parts(plat, name);
            let (p, n) = config.config_filename_to_parts(&filename).unwrap();
            assert_eq!((p.as_str(), n.as_str()), (plat, name));
        }
    }

    #[test]
    fn test_config_filename_unknown_platform() {
        let config = WorkspaceConfig::default();
        assert!(config.config_filename_to_parts("mips_hello_defconfig").is_err());
        assert!(config.config_filename_to_parts("not a config").is_err());
    }

    #[test]
    fn test_validate_rejects_empty_environments() {
        let config: WorkspaceConfig = toml::from_str("[env]\nenvironments = []").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config: WorkspaceConfig = toml::from_str("[run]\ntimeout = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_default_config() {
        let config = WorkspaceConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_extra_fields() {
        let config: WorkspaceConfig = toml::from_str(
            r#"
            [extra]
            course_id = "COMP9242"
            week = 3
        "#,
        )
        .unwrap();

        assert_eq!(
            config.extra.get("course_id").and_then(|v| v.as_str()),
            Some("COMP9242")
        );
        assert_eq!(config.extra.get("week").and_then(|v| v.as_integer()), Some(3));
    }

    #[test]
    fn test_full_config_all_sections() {
        let config: WorkspaceConfig = toml::from_str(
            r#"
            [base]
            name = "os-tutorials"
            description = "exercises"
            author = "Staff"

            [env]
            environments = ["sel4"]

            [render]
            templates = "tuts"
            target = "ia32"

            [run]
            build_command = ["ninja"]
            jobs = 4

            [publish]
            dirs = ["docs"]
            files = ["LICENSE"]
        "#,
        )
        .unwrap();

        assert_eq!(config.base.author, "Staff");
        assert_eq!(config.env.environments, vec!["sel4"]);
        assert_eq!(config.render.templates.to_str(), Some("tuts"));
        assert_eq!(config.run.jobs, 4);
        assert_eq!(config.publish.dirs, vec!["docs"]);
    }
}
