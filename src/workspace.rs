//! Workspace environment management.
//!
//! A workspace points its `apps` symlink at one of three generated views of
//! the tutorial templates:
//!
//! - **exercises**: starting-state render of every tutorial
//! - **solutions**: finished render of every tutorial
//! - **templates**: symlinks to the raw templates, which build and behave
//!   like the solutions because directives live inside comments
//!
//! Each environment also owns `<entry>-<env>` directories in the build
//! config dir; selecting an environment links them into the workspace root
//! under their unsuffixed names (`configs-sel4` becomes `configs`).

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::config::WorkspaceConfig;
use crate::render;
use crate::{debug, log};

/// Which generated view the apps symlink selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Exercise,
    Solution,
    Template,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exercise => write!(f, "exercises"),
            Self::Solution => write!(f, "solutions"),
            Self::Template => write!(f, "templates"),
        }
    }
}

const ALL_VIEWS: [View; 3] = [View::Exercise, View::Solution, View::Template];

/// One workspace environment and its derived paths.
pub struct Environment<'a> {
    config: &'a WorkspaceConfig,
    name: String,
}

impl<'a> Environment<'a> {
    pub fn new(config: &'a WorkspaceConfig, name: &str) -> Result<Self> {
        if !config.env.environments.iter().any(|e| e == name) {
            bail!(
                "unknown environment `{name}`; valid environments: {}",
                config.env.environments.join(", ")
            );
        }
        Ok(Self {
            config,
            name: name.to_owned(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn view_dir(&self, view: View) -> PathBuf {
        self.config
            .get_root()
            .join(format!("apps-{}-{view}", self.name))
    }

    /// Instantiate all views and the per-environment root symlinks.
    pub fn setup(&self) -> Result<()> {
        self.create_build_symlinks()?;
        self.instantiate(View::Solution)?;
        self.instantiate(View::Exercise)?;
        self.link_template_dirs()?;
        Ok(())
    }

    /// Link every `<entry>-<env>` build config entry into the root under
    /// its unsuffixed name.
    fn create_build_symlinks(&self) -> Result<()> {
        let dir = &self.config.env.build_config_dir;
        let suffix = format!("-{}", self.name);

        let entries = fs::read_dir(dir)
            .with_context(|| format!("failed to read build config dir {}", dir.display()))?;
        for entry in entries {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let Some(stem) = file_name.strip_suffix(&suffix) else {
                continue;
            };
            let link = self.config.get_root().join(stem);
            replace_link(&entry.path(), &link)?;
            debug!("env"; "symlink {} -> {}", link.display(), entry.path().display());
        }
        Ok(())
    }

    fn instantiate(&self, view: View) -> Result<()> {
        let dest = self.view_dir(view);
        if dest.exists() {
            debug!("env"; "{view} dir already present: {}", dest.display());
            return Ok(());
        }
        log!("env"; "instantiating {view}: {}", dest.display());
        render::instantiate_tree(&self.config.render, &dest, view == View::Solution)
    }

    fn link_template_dirs(&self) -> Result<()> {
        let dest = self.view_dir(View::Template);
        if dest.exists() {
            debug!("env"; "templates dir already present: {}", dest.display());
            return Ok(());
        }
        fs::create_dir_all(&dest)?;
        for (name, src) in render::stage_dirs(&self.config.render.templates)? {
            symlink(&src, &dest.join(&name))?;
        }
        Ok(())
    }

    /// Point the apps symlink at one view.
    pub fn link_view(&self, view: View) -> Result<()> {
        let target = self.view_dir(view);
        replace_link(&target, &self.config.env.apps_link)?;
        log!("env"; "{} -> {}", self.config.env.apps_link.display(), target.display());
        Ok(())
    }

    /// Which view the apps symlink currently selects, if any.
    pub fn current_view(&self) -> Option<View> {
        let target = fs::read_link(&self.config.env.apps_link).ok()?;
        ALL_VIEWS.into_iter().find(|view| self.view_dir(*view) == target)
    }

    /// Delete the generated views and the apps symlink.
    pub fn reset(&self) -> Result<()> {
        for view in ALL_VIEWS {
            let dir = self.view_dir(view);
            if dir.exists() {
                fs::remove_dir_all(&dir)
                    .with_context(|| format!("failed to remove {}", dir.display()))?;
            }
        }
        fs::remove_file(&self.config.env.apps_link).ok();
        Ok(())
    }
}

/// Detect the active environment from the apps symlink target.
pub fn detect(config: &WorkspaceConfig) -> Option<Environment<'_>> {
    config
        .env
        .environments
        .iter()
        .filter_map(|name| Environment::new(config, name).ok())
        .find(|env| env.current_view().is_some())
}

/// Entry point for the `env` subcommand.
pub fn switch_env(config: &WorkspaceConfig, name: &str) -> Result<()> {
    // keep the previously selected view across environment switches
    let view = detect(config)
        .and_then(|env| env.current_view())
        .unwrap_or(View::Exercise);

    let env = Environment::new(config, name)?;
    env.setup()?;
    env.link_view(view)
}

/// Entry point for the `exercise`/`solution`/`template` subcommands.
pub fn switch_view(config: &WorkspaceConfig, view: View) -> Result<()> {
    let env = detect(config)
        .context("Environment not set up. Run `tutkit env <NAME>` first.")?;
    env.link_view(view)
}

/// Entry point for the `status` subcommand.
pub fn status(config: &WorkspaceConfig) -> Result<()> {
    match detect(config) {
        Some(env) => {
            let view = env
                .current_view()
                .map_or_else(|| "no view set".to_owned(), |view| view.to_string());
            log!("status"; "{} {view}", env.name());
        }
        None => log!("status"; "no environment set up"),
    }
    Ok(())
}

/// Entry point for the `reset` subcommand.
pub fn reset(config: &WorkspaceConfig) -> Result<()> {
    let env = detect(config)
        .context("Environment not set up. Run `tutkit env <NAME>` first.")?;
    // record the view before reset deletes the symlink used to detect it
    let view = env.current_view().unwrap_or(View::Exercise);
    env.reset()?;
    env.setup()?;
    env.link_view(view)
}

fn replace_link(target: &Path, link: &Path) -> Result<()> {
    if fs::symlink_metadata(link).is_ok() {
        fs::remove_file(link)
            .with_context(|| format!("failed to remove old symlink {}", link.display()))?;
        debug!("env"; "removed old symlink: {}", link.display());
    }
    symlink(target, link)
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, link)
        .with_context(|| format!("failed to link {} -> {}", link.display(), target.display()))
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
        .with_context(|| format!("failed to link {} -> {}", link.display(), target.display()))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    /// Workspace with one templates stage and one build config entry.
    fn test_config(root: &Path) -> WorkspaceConfig {
        let mut config = WorkspaceConfig::default();
        config.set_root(root);
        config.env.apps_link = root.join("apps");
        config.env.build_config_dir = root.join("build-config");
        config.render.templates = root.join("templates");
        config.render.solutions = root.join("solutions");
        config.render.exercises = root.join("exercises");

        fs::create_dir_all(root.join("templates/hello-1/src")).unwrap();
        fs::write(
            root.join("templates/hello-1/src/main.c"),
            "/*- if solution -*/int main(void) { return 0; }/*- endif -*/\n",
        )
        .unwrap();
        fs::create_dir_all(root.join("build-config/configs-sel4")).unwrap();
        config
    }

    #[test]
    fn test_setup_and_view_switching() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        switch_env(&config, "sel4").unwrap();

        // all three views exist
        assert!(dir.path().join("apps-sel4-exercises/hello-1/src/main.c").exists());
        assert!(dir.path().join("apps-sel4-solutions/hello-1/src/main.c").exists());
        assert!(dir.path().join("apps-sel4-templates/hello-1").exists());
        // build config entry linked under its unsuffixed name
        assert!(dir.path().join("configs").exists());

        // default view is exercises, and the render respected the mode
        let env = detect(&config).unwrap();
        assert_eq!(env.name(), "sel4");
        assert_eq!(env.current_view(), Some(View::Exercise));
        let exercise =
            fs::read_to_string(dir.path().join("apps/hello-1/src/main.c")).unwrap();
        assert!(!exercise.contains("int main"));

        // flip to solutions
        switch_view(&config, View::Solution).unwrap();
        assert_eq!(env.current_view(), Some(View::Solution));
        let solution =
            fs::read_to_string(dir.path().join("apps/hello-1/src/main.c")).unwrap();
        assert!(solution.contains("int main"));
    }

    #[test]
    fn test_unknown_environment() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        assert!(Environment::new(&config, "riscv").is_err());
    }

    #[test]
    fn test_reset_preserves_view() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        switch_env(&config, "sel4").unwrap();
        switch_view(&config, View::Template).unwrap();
        reset(&config).unwrap();

        let env = detect(&config).unwrap();
        assert_eq!(env.current_view(), Some(View::Template));
    }

    #[test]
    fn test_switch_view_without_setup_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        assert!(switch_view(&config, View::Solution).is_err());
    }
}
