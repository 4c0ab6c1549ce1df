//! Task data model.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// When a piece of task content should be shown.
///
/// `Before` and `Completed` are mutually exclusive renderings of a task's
/// code at a point in the tutorial timeline: selection picks one or the
/// other, never both. `All` is content shown in either case; it only acts
/// as a fallback and is never selected directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Before,
    Completed,
    All,
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before" => Ok(Self::Before),
            "completed" => Ok(Self::Completed),
            "all" => Ok(Self::All),
            other => Err(format!("unknown content kind `{other}`")),
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => write!(f, "before"),
            Self::Completed => write!(f, "completed"),
            Self::All => write!(f, "all"),
        }
    }
}

/// Reference to a task, optionally narrowed to one of its subtasks.
///
/// Template syntax: `name` or `name:subtask`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRef {
    pub name: String,
    pub subtask: Option<String>,
}

impl TaskRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subtask: None,
        }
    }

    /// Parse a `name` or `name:subtask` reference.
    pub fn parse(s: &str) -> Self {
        match s.split_once(':') {
            Some((name, subtask)) => Self {
                name: name.to_owned(),
                subtask: Some(subtask.to_owned()),
            },
            None => Self::new(s),
        }
    }
}

impl fmt::Display for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subtask {
            Some(subtask) => write!(f, "{}:{subtask}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// One ordered stage of a tutorial.
///
/// A task owns the content to reveal at its point in the tutorial timeline
/// and the completion text used to check that an assembled program produces
/// the expected output. Subtasks name spatially distinct output locations
/// (e.g. two files edited by the same stage) that share the task's position
/// in the timeline.
#[derive(Debug, Clone)]
pub struct Task {
    name: String,
    index: usize,
    content: HashMap<ContentKind, String>,
    subtask_content: HashMap<String, HashMap<ContentKind, String>>,
    completion: HashMap<ContentKind, String>,
}

impl Task {
    pub(crate) fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
            content: HashMap::new(),
            subtask_content: HashMap::new(),
            completion: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position in the declared task order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Set content for a kind, in the primary scope or a subtask's scope.
    ///
    /// Overwrites silently: templates may legitimately re-declare content
    /// while the session iterates additional generated files.
    pub fn set_content(&mut self, kind: ContentKind, content: impl Into<String>, subtask: Option<&str>) {
        match subtask {
            Some(subtask) => {
                self.subtask_content
                    .entry(subtask.to_owned())
                    .or_default()
                    .insert(kind, content.into());
            }
            None => {
                self.content.insert(kind, content.into());
            }
        }
    }

    pub fn get_content(&self, kind: ContentKind, subtask: Option<&str>) -> Option<&str> {
        match subtask {
            Some(subtask) => self
                .subtask_content
                .get(subtask)
                .and_then(|content| content.get(&kind)),
            None => self.content.get(&kind),
        }
        .map(String::as_str)
    }

    /// Set completion text for a kind.
    ///
    /// Completion text only exists in the primary scope; subtasks share the
    /// task's expected output.
    pub fn set_completion(&mut self, kind: ContentKind, content: impl Into<String>) {
        self.completion.insert(kind, content.into());
    }

    pub fn get_completion(&self, kind: ContentKind) -> Option<&str> {
        self.completion.get(&kind).map(String::as_str)
    }
}

// The total order over tasks is by `index` alone: the name is identity, not
// ordering, and two tasks compare equal iff they share an index.
impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for Task {}

impl PartialOrd for Task {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Task {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_kind_from_str() {
        assert_eq!("before".parse(), Ok(ContentKind::Before));
        assert_eq!("completed".parse(), Ok(ContentKind::Completed));
        assert_eq!("all".parse(), Ok(ContentKind::All));
        assert!("BEFORE".parse::<ContentKind>().is_err());
        assert!("done".parse::<ContentKind>().is_err());
    }

    #[test]
    fn test_task_ref_parse_plain() {
        let r = TaskRef::parse("setup-ipc");
        assert_eq!(r.name, "setup-ipc");
        assert_eq!(r.subtask, None);
    }

    #[test]
    fn test_task_ref_parse_subtask() {
        let r = TaskRef::parse("setup-ipc:server");
        assert_eq!(r.name, "setup-ipc");
        assert_eq!(r.subtask.as_deref(), Some("server"));
        assert_eq!(r.to_string(), "setup-ipc:server");
    }

    #[test]
    fn test_ordering_by_index_only() {
        let a = Task::new("zzz", 0);
        let b = Task::new("aaa", 1);
        assert!(a < b);
        assert!(!(b < a));
        // equality follows index, not name
        let c = Task::new("ccc", 1);
        assert_eq!(b, c);
    }

    #[test]
    fn test_content_roundtrip_and_overwrite() {
        let mut task = Task::new("t", 0);
        assert_eq!(task.get_content(ContentKind::Before, None), None);

        task.set_content(ContentKind::Before, "first", None);
        assert_eq!(task.get_content(ContentKind::Before, None), Some("first"));

        // last write wins
        task.set_content(ContentKind::Before, "second", None);
        assert_eq!(task.get_content(ContentKind::Before, None), Some("second"));
    }

    #[test]
    fn test_subtask_content_is_separate() {
        let mut task = Task::new("t", 0);
        task.set_content(ContentKind::Completed, "main", None);
        task.set_content(ContentKind::Completed, "aux", Some("header"));

        assert_eq!(task.get_content(ContentKind::Completed, None), Some("main"));
        assert_eq!(
            task.get_content(ContentKind::Completed, Some("header")),
            Some("aux")
        );
        assert_eq!(task.get_content(ContentKind::Completed, Some("other")), None);
    }

    #[test]
    fn test_completion_roundtrip() {
        let mut task = Task::new("t", 3);
        assert_eq!(task.get_completion(ContentKind::Completed), None);
        task.set_completion(ContentKind::Completed, "hello world");
        assert_eq!(task.get_completion(ContentKind::Completed), Some("hello world"));
    }
}
