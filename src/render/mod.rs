//! Template rendering driver.
//!
//! One [`RenderSession`] covers one stage render. The driver walks the
//! stage's template tree in sorted order, renders files whose extension is
//! listed in `[render].source_exts`, and copies everything else verbatim.
//! Templates may queue further templates (the `external` directive), which
//! forms a worklist that is drained until empty; every file is rendered at
//! most once per session.
//!
//! ```text
//! render_stage()
//!     │
//!     ├── render_tree() ──► rendered sources + copied assets
//!     │       │
//!     │       └── worklist loop (templates queued by `external`)
//!     │
//!     └── finish() ──► stage artifacts (for tutorials that declare tasks)
//!             ├── tasks.list       task names, declaration order
//!             ├── completion.toml  expected output (start/finish)
//!             └── manifest.json    files written by this render
//! ```
//!
//! A tutorial that declares tasks must define completion text for its
//! stages; rendering fails otherwise, which is the intended authoring-time
//! check.

pub mod directive;
mod error;

pub use error::TemplateError;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::config::{RenderConfig, WorkspaceConfig};
use crate::log;
use crate::tutorial::{ContentKind, RenderSession};
use directive::{Mode, Node};

/// Expected-output artifact for one rendered stage.
///
/// `start` is what the program prints before the stage's work is done,
/// `finish` what it prints once completed. The test harness matches
/// `finish` against captured emulator output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionSpec {
    pub start: String,
    pub finish: String,
}

impl CompletionSpec {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("invalid completion file {}", path.display()))
    }
}

/// What one stage render produced.
#[derive(Debug, Default)]
pub struct RenderSummary {
    pub rendered: usize,
    pub copied: usize,
    /// Files written under the output dir, relative paths.
    pub written: Vec<PathBuf>,
}

/// Stage renderer: template evaluation plus file bookkeeping.
pub struct Renderer<'a> {
    session: &'a mut RenderSession,
    cfg: &'a RenderConfig,
    out_dir: PathBuf,
    processed: HashSet<PathBuf>,
    summary: RenderSummary,
}

impl<'a> Renderer<'a> {
    pub fn new(session: &'a mut RenderSession, cfg: &'a RenderConfig, out_dir: PathBuf) -> Self {
        Self {
            session,
            cfg,
            out_dir,
            processed: HashSet::new(),
            summary: RenderSummary::default(),
        }
    }

    /// Render a single template string.
    pub fn render_str(&mut self, template: &str) -> Result<String, TemplateError> {
        let nodes = directive::parse(template)?;
        self.eval(&nodes)
    }

    fn eval(&mut self, nodes: &[Node]) -> Result<String, TemplateError> {
        let mut out = String::new();
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::DeclareTasks(names) => self.session.declare_tasks(names)?,
                Node::Include(r) => {
                    if let Some(content) = self.session.print_task(r)? {
                        out.push_str(&content);
                    }
                }
                Node::Replace(refs) => out.push_str(&self.session.include_replace(refs)?),
                Node::Append(refs) => out.push_str(&self.session.include_append(refs)?),
                Node::External(path) => self.session.push_file(path.clone()),
                Node::Task {
                    task,
                    kind,
                    subtask,
                    hidden,
                    body,
                } => {
                    let content = self.eval(body)?;
                    self.session
                        .set_content(task, *kind, &content, subtask.as_deref())?;
                    if !hidden {
                        out.push_str(&content);
                    }
                }
                Node::Completion {
                    task,
                    kind,
                    hidden,
                    body,
                } => {
                    let content = self.eval(body)?;
                    self.session.set_completion(task, *kind, &content)?;
                    if !hidden {
                        out.push_str(&content);
                    }
                }
                Node::File { path, body } => {
                    let content = self.eval(body)?;
                    self.write_out(path, &content)?;
                    out.push_str(&content);
                }
                Node::If { mode, body, alt } => {
                    let solution = *mode == Mode::Solution;
                    let chosen = if solution == self.session.solution() {
                        body
                    } else {
                        alt
                    };
                    out.push_str(&self.eval(chosen)?);
                }
            }
        }
        Ok(out)
    }

    /// Write a file under the output dir and record it.
    fn write_out(&mut self, rel: &Path, content: &str) -> Result<(), TemplateError> {
        let path = self.out_dir.join(rel);
        let io = |err| TemplateError::Io(path.clone(), err);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io)?;
        }
        fs::write(&path, content).map_err(io)?;
        self.summary.written.push(rel.to_path_buf());
        Ok(())
    }

    /// Render a whole template tree, then drain the session worklist.
    pub fn render_tree(&mut self, src: &Path) -> Result<()> {
        for entry in WalkDir::new(src).sort_by_file_name() {
            let entry = entry.with_context(|| format!("failed to walk {}", src.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(src)
                .with_context(|| format!("path escapes {}", src.display()))?
                .to_path_buf();

            if self.is_source(&rel) {
                self.render_file(entry.path(), &rel)?;
            } else {
                self.copy_file(entry.path(), &rel)?;
            }
        }

        // Queued templates; queueing may continue while the list drains.
        // Files outside the extension filter are copied by the walk above
        // and rendered here if a template asked for them.
        while let Some(rel) = self.session.next_file() {
            if self.processed.contains(&rel) {
                continue;
            }
            self.render_file(&src.join(&rel), &rel)?;
        }
        Ok(())
    }

    fn is_source(&self, rel: &Path) -> bool {
        rel.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.cfg.source_exts.iter().any(|e| e == ext))
    }

    fn render_file(&mut self, src_file: &Path, rel: &Path) -> Result<()> {
        self.processed.insert(rel.to_path_buf());
        let template = fs::read_to_string(src_file)
            .with_context(|| format!("failed to read {}", src_file.display()))?;
        let rendered = self
            .render_str(&template)
            .with_context(|| format!("failed to render {}", src_file.display()))?;
        self.write_out(rel, &rendered)?;
        self.summary.rendered += 1;
        Ok(())
    }

    fn copy_file(&mut self, src_file: &Path, rel: &Path) -> Result<()> {
        let dest = self.out_dir.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src_file, &dest)
            .with_context(|| format!("failed to copy {}", src_file.display()))?;
        self.summary.written.push(rel.to_path_buf());
        self.summary.copied += 1;
        Ok(())
    }

    /// Write the stage artifacts and hand back the summary.
    pub fn finish(mut self) -> Result<RenderSummary> {
        // a queued render may overwrite a file the walk already copied
        let mut seen = HashSet::new();
        self.summary.written.retain(|p| seen.insert(p.clone()));

        if self.session.is_declared() {
            let names: Vec<&str> = self.session.task_names().collect();
            let tasks = names.join("\n") + "\n";
            let tasks_rel = self.cfg.tasks_manifest.clone();
            self.write_out(&tasks_rel, &tasks)?;

            let spec = CompletionSpec {
                start: self.session.print_completion(ContentKind::Before)?,
                finish: self.session.print_completion(ContentKind::Completed)?,
            };
            let completion_rel = self.cfg.completion_file.clone();
            self.write_out(&completion_rel, &toml::to_string(&spec)?)?;

            let written: Vec<String> = self
                .summary
                .written
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            let manifest_rel = self.cfg.files_manifest.clone();
            self.write_out(&manifest_rel, &serde_json::to_string_pretty(&written)?)?;
        }
        Ok(self.summary)
    }
}

/// Render one stage tree into `dest` with artifacts.
pub fn render_stage(
    src: &Path,
    dest: &Path,
    session: &mut RenderSession,
    cfg: &RenderConfig,
) -> Result<RenderSummary> {
    let mut renderer = Renderer::new(session, cfg, dest.to_path_buf());
    renderer.render_tree(src)?;
    renderer.finish()
}

/// Tutorial template dirs under the templates root, sorted by name.
pub fn stage_dirs(templates: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut dirs = Vec::new();
    let entries = fs::read_dir(templates)
        .with_context(|| format!("failed to read templates dir {}", templates.display()))?;
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Instantiate every tutorial template into `dest_root` for one mode.
///
/// Used by the environment switcher and the publisher: with no current task
/// named, solution mode shows every stage finished and exercise mode shows
/// the starting state.
pub fn instantiate_tree(cfg: &RenderConfig, dest_root: &Path, solution: bool) -> Result<()> {
    for (name, src) in stage_dirs(&cfg.templates)? {
        let dest = dest_root.join(&name);
        let mut session = RenderSession::new(None, solution, cfg.target.as_str());
        render_stage(&src, &dest, &mut session, cfg)
            .with_context(|| format!("failed to instantiate `{name}`"))?;
        log!("render"; "instantiated {}", dest.display());
    }
    Ok(())
}

/// Entry point for the `render` subcommand.
pub fn handle(
    config: &WorkspaceConfig,
    tut: &str,
    task: Option<&str>,
    solution: bool,
    target: Option<&str>,
    out_dir: Option<&Path>,
) -> Result<()> {
    let src = config.render.templates.join(tut);
    if !src.is_dir() {
        bail!(
            "no tutorial named `{tut}` under {}",
            config.render.templates.display()
        );
    }

    let dest = match out_dir {
        Some(dir) => dir.to_path_buf(),
        None if solution => config.render.solutions.join(tut),
        None => config.render.exercises.join(tut),
    };

    let target = target.unwrap_or(config.render.target.as_str());
    let mut session = RenderSession::new(task, solution, target);
    crate::debug!("render"; "rendering {tut} for target {}", session.target());
    let summary = render_stage(&src, &dest, &mut session, &config.render)?;
    log!("render"; "{}: {} rendered, {} copied", dest.display(), summary.rendered, summary.copied);
    Ok(())
}
