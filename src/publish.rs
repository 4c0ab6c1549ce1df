//! Publishing to a git repository.
//!
//! Stages a throwaway clone of the target branch, replaces its contents
//! with the publishable files and freshly rendered solution/exercise trees,
//! then leaves the user in a shell inside the clone to review and push.
//! The clone is deleted when the shell exits.

use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::config::WorkspaceConfig;
use crate::render;
use crate::{exec, log};

/// Entry point for the `publish` subcommand.
pub fn publish(config: &WorkspaceConfig, git_uri: &str, branch: &str) -> Result<()> {
    let temp = tempfile::Builder::new()
        .prefix("tutkit-publish-")
        .tempdir()?;
    let dir = temp.path();
    log!("publish"; "staging clone in {}", dir.display());

    exec!(dir; ["git"]; "init")?;
    exec!(dir; ["git"]; "remote", "add", "origin", git_uri)?;
    log!("publish"; "git fetch origin");
    exec!(dir; ["git"]; "fetch", "origin")?;
    exec!(dir; ["git"]; "checkout", branch)
        .with_context(|| format!("branch `{branch}` does not exist on {git_uri}"))?;

    clear_clone(dir)?;

    let root = config.get_root();
    for name in &config.publish.dirs {
        let src = root.join(name);
        log!("publish"; "copying directory: {name}");
        copy_tree(&src, &dir.join(name))
            .with_context(|| format!("failed to copy {}", src.display()))?;
    }
    for name in &config.publish.files {
        let src = root.join(name);
        log!("publish"; "copying file: {name}");
        fs::copy(&src, dir.join(name))
            .with_context(|| format!("failed to copy {}", src.display()))?;
    }

    log!("publish"; "instantiating solutions");
    render::instantiate_tree(&config.render, &dir.join("solutions"), true)?;
    log!("publish"; "instantiating exercises");
    render::instantiate_tree(&config.render, &dir.join("exercises"), false)?;

    log!("publish"; "review the published tree and push; press ctrl+d when done");
    let shell = env::var("SHELL").unwrap_or_else(|_| "/bin/sh".into());
    Command::new(shell)
        .current_dir(dir)
        .status()
        .context("failed to start review shell")?;

    Ok(())
}

/// Remove everything in the clone except its git metadata.
fn clear_clone(dir: &Path) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name() == ".git" {
            continue;
        }
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(src)?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_tree() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("sub")).unwrap();
        fs::write(src.path().join("a.txt"), "a").unwrap();
        fs::write(src.path().join("sub/b.txt"), "b").unwrap();

        copy_tree(src.path(), &dest.path().join("out")).unwrap();

        assert_eq!(
            fs::read_to_string(dest.path().join("out/a.txt")).unwrap(),
            "a"
        );
        assert_eq!(
            fs::read_to_string(dest.path().join("out/sub/b.txt")).unwrap(),
            "b"
        );
    }

    #[test]
    fn test_clear_clone_keeps_git_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/HEAD"), "ref: refs/heads/master").unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("stale.txt"), "old").unwrap();

        clear_clone(dir.path()).unwrap();

        assert!(dir.path().join(".git/HEAD").exists());
        assert!(!dir.path().join("docs").exists());
        assert!(!dir.path().join("stale.txt").exists());
    }
}
