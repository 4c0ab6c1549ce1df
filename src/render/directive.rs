//! Restricted template directive language.
//!
//! Directives are embedded between `/*-` and `-*/`, so directive-bearing
//! sources remain valid C while the delimiters sit inside comments. The
//! directive set is closed: everything a template may invoke is listed
//! here, which keeps the authoring surface statically checkable.
//!
//! Inline directives:
//!
//! | Directive               | Effect                                        |
//! |-------------------------|-----------------------------------------------|
//! | `declare_tasks NAME...` | establish the ordered task list (once)        |
//! | `include REF`           | emit one task's content for the current stage |
//! | `replace REF...`        | emit the variant matching tutorial progress   |
//! | `append REF...`         | emit all due variants, newline-joined         |
//! | `external PATH`         | queue another template for this session       |
//!
//! Block directives capture their body up to the matching `end`
//! (`endif` is accepted); blocks nest and bodies are rendered before use:
//!
//! | Directive                                | Effect                      |
//! |------------------------------------------|-----------------------------|
//! | `task NAME KIND [subtask=KEY] [hidden]`  | register body as content    |
//! | `completion NAME KIND [hidden]`          | register body as completion |
//! | `file PATH`                              | write body under output dir |
//! | `if solution\|exercise` ... [`else` ...] | mode conditional            |
//!
//! A REF is `name` or `name:subtask`; KIND is `before`, `completed` or
//! `all`. `hidden` registers content without emitting it at the
//! declaration site.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use super::error::TemplateError;
use crate::tutorial::{ContentKind, TaskRef};

static DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*-\s*(.*?)\s*-\*/").unwrap());

/// Render mode a conditional selects on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Solution,
    Exercise,
}

/// A parsed template fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text, preserved byte for byte.
    Text(String),
    DeclareTasks(Vec<String>),
    Include(TaskRef),
    Replace(Vec<TaskRef>),
    Append(Vec<TaskRef>),
    External(PathBuf),
    Task {
        task: String,
        kind: ContentKind,
        subtask: Option<String>,
        hidden: bool,
        body: Vec<Node>,
    },
    Completion {
        task: String,
        kind: ContentKind,
        hidden: bool,
        body: Vec<Node>,
    },
    File {
        path: PathBuf,
        body: Vec<Node>,
    },
    If {
        mode: Mode,
        body: Vec<Node>,
        alt: Vec<Node>,
    },
}

/// One scanned directive, before block structure is established.
#[derive(Debug)]
enum Directive {
    DeclareTasks(Vec<String>),
    Include(TaskRef),
    Replace(Vec<TaskRef>),
    Append(Vec<TaskRef>),
    External(PathBuf),
    Task {
        task: String,
        kind: ContentKind,
        subtask: Option<String>,
        hidden: bool,
    },
    Completion {
        task: String,
        kind: ContentKind,
        hidden: bool,
    },
    File(PathBuf),
    If(Mode),
    Else,
    End,
}

enum Segment<'a> {
    Text(&'a str),
    Directive(Directive),
}

/// Parse a template into its node tree.
pub fn parse(template: &str) -> Result<Vec<Node>, TemplateError> {
    let mut segments = scan(template)?.into_iter();
    let (nodes, _) = parse_nodes(&mut segments, None)?;
    Ok(nodes)
}

/// Split a template into literal text and directives.
fn scan(template: &str) -> Result<Vec<Segment<'_>>, TemplateError> {
    let mut segments = Vec::new();
    let mut last = 0;

    for m in DIRECTIVE_RE.find_iter(template) {
        if m.start() > last {
            segments.push(Segment::Text(&template[last..m.start()]));
        }
        let inner = m
            .as_str()
            .trim_start_matches("/*-")
            .trim_end_matches("-*/")
            .trim();
        segments.push(Segment::Directive(parse_directive(inner)?));
        last = m.end();
    }
    if last < template.len() {
        segments.push(Segment::Text(&template[last..]));
    }
    Ok(segments)
}

fn parse_directive(inner: &str) -> Result<Directive, TemplateError> {
    let mut words = inner.split_whitespace();
    let head = words.next().ok_or(TemplateError::EmptyDirective)?;

    let directive = match head {
        // these consume the rest of the directive, so no trailing check
        "declare_tasks" => {
            let names: Vec<String> = words.map(str::to_owned).collect();
            if names.is_empty() {
                return Err(TemplateError::MissingArgument("declare_tasks"));
            }
            return Ok(Directive::DeclareTasks(names));
        }
        "replace" => return Ok(Directive::Replace(ref_list(words, "replace")?)),
        "append" => return Ok(Directive::Append(ref_list(words, "append")?)),
        "include" => Directive::Include(single_ref(&mut words, "include")?),
        "external" => Directive::External(single_path(&mut words, "external")?),
        "file" => Directive::File(single_path(&mut words, "file")?),
        "task" => {
            let task = required(&mut words, "task")?.to_owned();
            let kind = parse_kind(&mut words, "task")?;
            let mut subtask = None;
            let mut hidden = false;
            for opt in words {
                if let Some(value) = opt.strip_prefix("subtask=") {
                    subtask = Some(value.to_owned());
                } else if opt == "hidden" {
                    hidden = true;
                } else {
                    return Err(bad("task", format!("unexpected `{opt}`")));
                }
            }
            return Ok(Directive::Task {
                task,
                kind,
                subtask,
                hidden,
            });
        }
        "completion" => {
            let task = required(&mut words, "completion")?.to_owned();
            let kind = parse_kind(&mut words, "completion")?;
            let hidden = match words.next() {
                None => false,
                Some("hidden") => true,
                Some(opt) => return Err(bad("completion", format!("unexpected `{opt}`"))),
            };
            Directive::Completion { task, kind, hidden }
        }
        "if" => match required(&mut words, "if")? {
            "solution" => Directive::If(Mode::Solution),
            "exercise" => Directive::If(Mode::Exercise),
            other => return Err(bad("if", format!("expected solution or exercise, got `{other}`"))),
        },
        "else" => Directive::Else,
        "end" | "endif" => Directive::End,
        other => return Err(TemplateError::UnknownDirective(other.to_owned())),
    };

    if let Some(extra) = words.next() {
        return Err(bad(head_name(&directive), format!("unexpected `{extra}`")));
    }
    Ok(directive)
}

fn head_name(directive: &Directive) -> &'static str {
    match directive {
        Directive::DeclareTasks(_) => "declare_tasks",
        Directive::Include(_) => "include",
        Directive::Replace(_) => "replace",
        Directive::Append(_) => "append",
        Directive::External(_) => "external",
        Directive::Task { .. } => "task",
        Directive::Completion { .. } => "completion",
        Directive::File(_) => "file",
        Directive::If(_) => "if",
        Directive::Else => "else",
        Directive::End => "end",
    }
}

fn bad(directive: &'static str, detail: String) -> TemplateError {
    TemplateError::BadArgument { directive, detail }
}

fn required<'a>(
    words: &mut impl Iterator<Item = &'a str>,
    directive: &'static str,
) -> Result<&'a str, TemplateError> {
    words.next().ok_or(TemplateError::MissingArgument(directive))
}

fn single_ref<'a>(
    words: &mut impl Iterator<Item = &'a str>,
    directive: &'static str,
) -> Result<TaskRef, TemplateError> {
    Ok(TaskRef::parse(required(words, directive)?))
}

fn single_path<'a>(
    words: &mut impl Iterator<Item = &'a str>,
    directive: &'static str,
) -> Result<PathBuf, TemplateError> {
    Ok(PathBuf::from(required(words, directive)?))
}

fn ref_list<'a>(
    words: impl Iterator<Item = &'a str>,
    directive: &'static str,
) -> Result<Vec<TaskRef>, TemplateError> {
    let refs: Vec<TaskRef> = words.map(TaskRef::parse).collect();
    if refs.is_empty() {
        return Err(TemplateError::MissingArgument(directive));
    }
    Ok(refs)
}

fn parse_kind<'a>(
    words: &mut impl Iterator<Item = &'a str>,
    directive: &'static str,
) -> Result<ContentKind, TemplateError> {
    required(words, directive)?
        .parse()
        .map_err(|detail| TemplateError::BadArgument { directive, detail })
}

/// What ended a node sequence.
#[derive(Debug, PartialEq, Eq)]
enum Terminator {
    Eof,
    End,
    Else,
}

/// Build the node tree for one nesting level.
///
/// `block` names the enclosing block directive, or is `None` at top level;
/// the bool says whether `else` is accepted (only inside `if`).
fn parse_nodes<'a>(
    segments: &mut impl Iterator<Item = Segment<'a>>,
    block: Option<(&'static str, bool)>,
) -> Result<(Vec<Node>, Terminator), TemplateError> {
    let mut nodes = Vec::new();

    while let Some(segment) = segments.next() {
        let directive = match segment {
            Segment::Text(text) => {
                nodes.push(Node::Text(text.to_owned()));
                continue;
            }
            Segment::Directive(directive) => directive,
        };

        match directive {
            Directive::End => {
                return match block {
                    Some(_) => Ok((nodes, Terminator::End)),
                    None => Err(TemplateError::StrayDirective("end")),
                };
            }
            Directive::Else => {
                return match block {
                    Some((_, true)) => Ok((nodes, Terminator::Else)),
                    _ => Err(TemplateError::StrayDirective("else")),
                };
            }
            Directive::DeclareTasks(names) => nodes.push(Node::DeclareTasks(names)),
            Directive::Include(r) => nodes.push(Node::Include(r)),
            Directive::Replace(refs) => nodes.push(Node::Replace(refs)),
            Directive::Append(refs) => nodes.push(Node::Append(refs)),
            Directive::External(path) => nodes.push(Node::External(path)),
            Directive::Task {
                task,
                kind,
                subtask,
                hidden,
            } => {
                let body = parse_block(segments, "task")?;
                nodes.push(Node::Task {
                    task,
                    kind,
                    subtask,
                    hidden,
                    body,
                });
            }
            Directive::Completion { task, kind, hidden } => {
                let body = parse_block(segments, "completion")?;
                nodes.push(Node::Completion {
                    task,
                    kind,
                    hidden,
                    body,
                });
            }
            Directive::File(path) => {
                let body = parse_block(segments, "file")?;
                nodes.push(Node::File { path, body });
            }
            Directive::If(mode) => {
                let (body, terminator) = parse_nodes(segments, Some(("if", true)))?;
                let alt = match terminator {
                    Terminator::Else => {
                        let (alt, terminator) = parse_nodes(segments, Some(("if", false)))?;
                        match terminator {
                            Terminator::End => alt,
                            _ => return Err(TemplateError::UnclosedBlock("if")),
                        }
                    }
                    Terminator::End => Vec::new(),
                    Terminator::Eof => return Err(TemplateError::UnclosedBlock("if")),
                };
                nodes.push(Node::If { mode, body, alt });
            }
        }
    }

    match block {
        Some((name, _)) => Err(TemplateError::UnclosedBlock(name)),
        None => Ok((nodes, Terminator::Eof)),
    }
}

fn parse_block<'a>(
    segments: &mut impl Iterator<Item = Segment<'a>>,
    name: &'static str,
) -> Result<Vec<Node>, TemplateError> {
    let (body, terminator) = parse_nodes(segments, Some((name, false)))?;
    match terminator {
        Terminator::End => Ok(body),
        _ => Err(TemplateError::UnclosedBlock(name)),
    }
}
