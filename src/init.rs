//! Workspace initialization module.
//!
//! Creates a new tutorial workspace with default configuration.

use crate::config::WorkspaceConfig;
use crate::exec;
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Files to write ignore patterns to
const IGNORE_FILES: &[&str] = &[".gitignore", ".ignore"];

/// Default config filename
const CONFIG_FILE: &str = "tutkit.toml";

/// Directories every workspace starts with
const WORKSPACE_DIRS: &[&str] = &["templates", "docs"];

/// Generated paths that should never be committed
const IGNORED_PATHS: &[&str] = &["/apps", "/apps-*", "/configs*", "/solutions", "/exercises"];

/// Create a new workspace with default structure
pub fn new_workspace(config: &WorkspaceConfig, has_name: bool) -> Result<()> {
    let root = config.get_root();

    // Safety check: if no name was provided (init in current dir),
    // the directory must be completely empty
    if !has_name && !is_dir_empty(root)? {
        bail!(
            "Current directory is not empty. Use `tutkit init <NAME>` to create in a subdirectory."
        );
    }

    fs::create_dir_all(root)
        .with_context(|| format!("Failed to create {}", root.display()))?;
    init_structure(config, root)?;
    init_default_config(root)?;
    init_ignored_files(root)?;
    exec!(root; ["git"]; "init")?;

    Ok(())
}

/// Check if a directory is completely empty
fn is_dir_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Create the workspace directory structure
fn init_structure(config: &WorkspaceConfig, root: &Path) -> Result<()> {
    let env_dirs = config
        .env
        .environments
        .iter()
        .map(|env| format!("build-config/configs-{env}"));

    for dir in WORKSPACE_DIRS.iter().map(|d| (*d).to_owned()).chain(env_dirs) {
        let path = root.join(&dir);
        if path.exists() {
            bail!(
                "Path `{}` already exists. Try `tutkit init <NAME>` instead.",
                path.display()
            );
        }
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }
    Ok(())
}

/// Write default configuration file
fn init_default_config(root: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&WorkspaceConfig::default())?;
    fs::write(root.join(CONFIG_FILE), content)?;
    Ok(())
}

/// Initialize .gitignore and .ignore files with the generated paths
fn init_ignored_files(root: &Path) -> Result<()> {
    let content = IGNORED_PATHS.join("\n");

    for filename in IGNORE_FILES {
        let path = root.join(filename);
        if !path.exists() {
            fs::write(&path, &content)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_structure_creates_env_config_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = WorkspaceConfig::default();
        config.set_root(dir.path());

        init_structure(&config, dir.path()).unwrap();

        assert!(dir.path().join("templates").is_dir());
        assert!(dir.path().join("build-config/configs-sel4").is_dir());
        assert!(dir.path().join("build-config/configs-camkes").is_dir());

        // a second init must refuse to clobber
        assert!(init_structure(&config, dir.path()).is_err());
    }

    #[test]
    fn test_default_config_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        init_default_config(dir.path()).unwrap();

        let written = fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        let config = WorkspaceConfig::from_str(&written).unwrap();
        assert_eq!(config.env.environments, vec!["sel4", "camkes"]);
        assert_eq!(config.run.build_command, vec!["make"]);
    }

    #[test]
    fn test_ignore_files_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".gitignore"), "custom\n").unwrap();

        init_ignored_files(dir.path()).unwrap();

        let gitignore = fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert_eq!(gitignore, "custom\n");
        let ignore = fs::read_to_string(dir.path().join(".ignore")).unwrap();
        assert!(ignore.contains("/solutions"));
    }
}
