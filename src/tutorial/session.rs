//! Render-session state and content selection.

use std::collections::VecDeque;
use std::path::PathBuf;

use super::error::TutorialError;
use super::registry::TaskRegistry;
use super::task::{ContentKind, Task, TaskRef};

/// State of the tutorial being generated.
///
/// Templates are evaluated top to bottom like a program, and the files of a
/// stage are processed in a deterministic order, so code snippets are built
/// up as templates are processed and then used to generate tutorial sources
/// and stage metadata.
///
/// The session tracks the ordered task list, the additional files still to
/// be processed, the task the tutorial is currently rendered for, and
/// whether rendering is in solution mode. Solution mode generates the
/// solution of the current task instead of its starting state. Generally
/// the starting state of task N equals the solution state of task N-1, but
/// this may not always be the case.
#[derive(Debug)]
pub struct RenderSession {
    registry: TaskRegistry,
    /// Resolved current task, by index into the registry.
    current: Option<usize>,
    /// The task name asked for at construction, kept for diagnostics.
    requested: Option<String>,
    solution: bool,
    /// Opaque architecture/runtime tag, passed through to templates.
    target: String,
    worklist: VecDeque<PathBuf>,
}

impl RenderSession {
    /// Create a session for one render pass.
    ///
    /// `current_task` names the stage to render for; it is resolved against
    /// the registry once [`declare_tasks`](Self::declare_tasks) runs.
    pub fn new(current_task: Option<&str>, solution: bool, target: impl Into<String>) -> Self {
        Self {
            registry: TaskRegistry::new(),
            current: None,
            requested: current_task.map(str::to_owned),
            solution,
            target: target.into(),
            worklist: VecDeque::new(),
        }
    }

    pub fn solution(&self) -> bool {
        self.solution
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_declared(&self) -> bool {
        self.registry.is_declared()
    }

    /// Declared task names, in tutorial order.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.registry.names()
    }

    /// Declare the ordered task list for the tutorial.
    ///
    /// Resolves the pending current-task reference: the named task if it
    /// was declared, otherwise the last task in solution mode and the first
    /// task in exercise mode.
    pub fn declare_tasks(&mut self, names: &[String]) -> Result<(), TutorialError> {
        self.registry.declare(names)?;

        self.current = match &self.requested {
            Some(name) if self.registry.get(name).is_ok() => {
                Some(self.registry.get(name)?.index())
            }
            _ if self.registry.is_empty() => None,
            _ if self.solution => Some(self.registry.len() - 1),
            _ => Some(0),
        };
        Ok(())
    }

    /// The task this session renders the tutorial for.
    pub fn current_task(&self) -> Result<&Task, TutorialError> {
        self.current
            .and_then(|index| self.registry.by_index(index))
            .ok_or_else(|| self.unknown_current())
    }

    fn unknown_current(&self) -> TutorialError {
        let name = self.requested.clone().unwrap_or_else(|| "(current)".into());
        TutorialError::UnknownTask(name)
    }

    pub fn set_content(
        &mut self,
        task: &str,
        kind: ContentKind,
        content: &str,
        subtask: Option<&str>,
    ) -> Result<(), TutorialError> {
        self.registry.get_mut(task)?.set_content(kind, content, subtask);
        Ok(())
    }

    pub fn set_completion(
        &mut self,
        task: &str,
        kind: ContentKind,
        content: &str,
    ) -> Result<(), TutorialError> {
        self.registry.get_mut(task)?.set_completion(kind, content);
        Ok(())
    }

    /// Select the content of the referenced task for the current stage.
    ///
    /// In solution mode the current task's own completed form is already
    /// visible (`task <= current`); in exercise mode the current task is
    /// still in progress, so only strictly earlier tasks show their
    /// completed form (`task < current`). Content absent for the selected
    /// kind falls back to `All`; `None` is a valid outcome meaning
    /// "nothing to show yet".
    pub fn print_task(&self, r: &TaskRef) -> Result<Option<String>, TutorialError> {
        let task = self.registry.get(&r.name)?;
        let current = self.current_task()?;

        let completed = if self.solution {
            task <= current
        } else {
            task < current
        };
        let kind = if completed {
            ContentKind::Completed
        } else {
            ContentKind::Before
        };

        let subtask = r.subtask.as_deref();
        let content = task
            .get_content(kind, subtask)
            .or_else(|| task.get_content(ContentKind::All, subtask));
        Ok(content.map(str::to_owned))
    }

    /// Step-function selection across task variants.
    ///
    /// Exactly one entry of `refs` is displayed: the one whose task index
    /// matches the tutorial's progress, or the closest earlier one when the
    /// exact match has no content defined for this stage. Before the first
    /// variant is reached nothing is shown; past the last variant, the last
    /// one stays visible.
    pub fn include_replace(&self, refs: &[TaskRef]) -> Result<String, TutorialError> {
        let current_index = self.current_task()?.index();

        for (i, r) in refs.iter().enumerate() {
            let task = self.registry.get(&r.name)?;

            let selected = if task.index() > current_index {
                if i == 0 {
                    return Ok(String::new());
                }
                &refs[i - 1]
            } else if task.index() == current_index || i == refs.len() - 1 {
                r
            } else {
                continue;
            };

            let mut content = self.print_task(selected)?;
            if content.is_none() && i > 0 {
                content = self.print_task(&refs[i - 1])?;
            }
            return Ok(content.unwrap_or_default());
        }

        Err(TutorialError::MissingContent)
    }

    /// Concatenate the content of every due variant, newline-joined, in
    /// list order.
    ///
    /// A variant is due once its task index is at or before the current
    /// task. Absent content is skipped in exercise mode; in solution mode a
    /// due task without content is an authoring error, since a published
    /// solution must be complete.
    pub fn include_append(&self, refs: &[TaskRef]) -> Result<String, TutorialError> {
        let current_index = self.current_task()?.index();

        let mut parts = Vec::new();
        for r in refs {
            let task = self.registry.get(&r.name)?;
            if task.index() > current_index {
                continue;
            }
            match self.print_task(r)? {
                Some(content) => parts.push(content),
                None if self.solution => {
                    return Err(TutorialError::SolutionContentRequired(r.name.clone()));
                }
                None => {}
            }
        }
        Ok(parts.join("\n"))
    }

    /// Expected program output of the current task for a content kind.
    ///
    /// When a task defines no `Before` completion text, the starting state
    /// of the stage is assumed to equal the finished state of the previous
    /// stage, and the previous task's `Completed` text is inherited. A task
    /// with no text and no predecessor to inherit from is an authoring
    /// error.
    pub fn print_completion(&self, kind: ContentKind) -> Result<String, TutorialError> {
        fn completion_of(task: &Task, kind: ContentKind) -> Option<&str> {
            task.get_completion(kind)
                .or_else(|| task.get_completion(ContentKind::All))
        }

        let current = self.current_task()?;
        let missing = || TutorialError::MissingCompletionText(current.name().to_owned());

        let mut text = completion_of(current, kind);
        if text.is_none() && kind == ContentKind::Before {
            let previous = match current.index() {
                0 => return Err(missing()),
                index => self.registry.by_index(index - 1).ok_or_else(missing)?,
            };
            text = completion_of(previous, ContentKind::Completed);
        }

        text.map(str::to_owned).ok_or_else(missing)
    }

    /// Queue an additional template for processing in this session.
    pub fn push_file(&mut self, path: impl Into<PathBuf>) {
        self.worklist.push_back(path.into());
    }

    /// Take the next queued template off the worklist.
    pub fn next_file(&mut self) -> Option<PathBuf> {
        self.worklist.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    /// Three tasks with distinct before/completed content, current = task-1.
    fn boundary_session(solution: bool) -> RenderSession {
        let mut session = RenderSession::new(Some("task-1"), solution, "arm");
        session
            .declare_tasks(&names(&["task-0", "task-1", "task-2"]))
            .unwrap();
        for name in ["task-0", "task-1", "task-2"] {
            session
                .set_content(name, ContentKind::Before, &format!("{name} before"), None)
                .unwrap();
            session
                .set_content(name, ContentKind::Completed, &format!("{name} completed"), None)
                .unwrap();
        }
        session
    }

    fn print(session: &RenderSession, name: &str) -> Option<String> {
        session.print_task(&TaskRef::new(name)).unwrap()
    }

    #[test]
    fn test_solution_mode_boundary() {
        let session = boundary_session(true);
        assert_eq!(print(&session, "task-0").unwrap(), "task-0 completed");
        assert_eq!(print(&session, "task-1").unwrap(), "task-1 completed");
        assert_eq!(print(&session, "task-2").unwrap(), "task-2 before");
    }

    #[test]
    fn test_exercise_mode_boundary() {
        let session = boundary_session(false);
        assert_eq!(print(&session, "task-0").unwrap(), "task-0 completed");
        assert_eq!(print(&session, "task-1").unwrap(), "task-1 before");
        assert_eq!(print(&session, "task-2").unwrap(), "task-2 before");
    }

    #[test]
    fn test_print_task_is_deterministic() {
        let session = boundary_session(true);
        let first = print(&session, "task-1");
        for _ in 0..3 {
            assert_eq!(print(&session, "task-1"), first);
        }
    }

    #[test]
    fn test_all_fallback() {
        let mut session = RenderSession::new(Some("task-1"), true, "arm");
        session.declare_tasks(&names(&["task-0", "task-1"])).unwrap();
        // task-0 would select Completed, which is absent; All fills in
        session
            .set_content("task-0", ContentKind::All, "always shown", None)
            .unwrap();
        assert_eq!(print(&session, "task-0").unwrap(), "always shown");
    }

    #[test]
    fn test_absent_content_is_none() {
        let mut session = RenderSession::new(Some("task-0"), false, "arm");
        session.declare_tasks(&names(&["task-0"])).unwrap();
        assert_eq!(print(&session, "task-0"), None);
    }

    #[test]
    fn test_subtask_selection_follows_task_timeline() {
        let mut session = RenderSession::new(Some("task-1"), true, "arm");
        session.declare_tasks(&names(&["task-0", "task-1"])).unwrap();
        session
            .set_content("task-1", ContentKind::Completed, "main slot", None)
            .unwrap();
        session
            .set_content("task-1", ContentKind::Completed, "header slot", Some("header"))
            .unwrap();

        let r = TaskRef::parse("task-1:header");
        assert_eq!(session.print_task(&r).unwrap().unwrap(), "header slot");
    }

    #[test]
    fn test_default_current_task_resolution() {
        // no such task: exercise mode falls back to the first task
        let mut session = RenderSession::new(None, false, "arm");
        session.declare_tasks(&names(&["a", "b", "c"])).unwrap();
        assert_eq!(session.current_task().unwrap().name(), "a");

        // solution mode falls back to the last task
        let mut session = RenderSession::new(Some("missing"), true, "arm");
        session.declare_tasks(&names(&["a", "b", "c"])).unwrap();
        assert_eq!(session.current_task().unwrap().name(), "c");
    }

    #[test]
    fn test_current_task_before_declaration() {
        let session = RenderSession::new(Some("a"), false, "arm");
        assert_eq!(
            session.current_task().unwrap_err(),
            TutorialError::UnknownTask("a".to_owned())
        );
    }

    #[test]
    fn test_replace_selects_matching_variant() {
        let session = boundary_session(false);
        let refs = vec![
            TaskRef::new("task-0"),
            TaskRef::new("task-1"),
            TaskRef::new("task-2"),
        ];
        // current is task-1: its variant wins, rendered as its before form
        assert_eq!(session.include_replace(&refs).unwrap(), "task-1 before");
    }

    #[test]
    fn test_replace_beyond_last_uses_last_entry() {
        let mut session = RenderSession::new(Some("task-3"), true, "arm");
        session
            .declare_tasks(&names(&["task-0", "task-1", "task-2", "task-3"]))
            .unwrap();
        for name in ["task-0", "task-1", "task-2"] {
            session
                .set_content(name, ContentKind::Completed, &format!("{name} completed"), None)
                .unwrap();
        }
        let refs = vec![
            TaskRef::new("task-0"),
            TaskRef::new("task-1"),
            TaskRef::new("task-2"),
        ];
        assert_eq!(session.include_replace(&refs).unwrap(), "task-2 completed");
    }

    #[test]
    fn test_replace_before_first_variant_is_empty() {
        let mut session = RenderSession::new(Some("task-0"), false, "arm");
        session
            .declare_tasks(&names(&["task-0", "task-1", "task-2"]))
            .unwrap();
        let refs = vec![TaskRef::new("task-1"), TaskRef::new("task-2")];
        assert_eq!(session.include_replace(&refs).unwrap(), "");
    }

    #[test]
    fn test_replace_falls_back_to_previous_on_missing_content() {
        let mut session = RenderSession::new(Some("task-1"), true, "arm");
        session
            .declare_tasks(&names(&["task-0", "task-1"]))
            .unwrap();
        session
            .set_content("task-0", ContentKind::Completed, "task-0 completed", None)
            .unwrap();
        // task-1 matches but has no content for this stage
        let refs = vec![TaskRef::new("task-0"), TaskRef::new("task-1")];
        assert_eq!(session.include_replace(&refs).unwrap(), "task-0 completed");
    }

    #[test]
    fn test_replace_empty_list_fails() {
        let session = boundary_session(false);
        assert_eq!(
            session.include_replace(&[]).unwrap_err(),
            TutorialError::MissingContent
        );
    }

    #[test]
    fn test_append_accumulates_due_tasks() {
        let session = boundary_session(true);
        let refs = vec![
            TaskRef::new("task-0"),
            TaskRef::new("task-1"),
            TaskRef::new("task-2"),
        ];
        // current is task-1: entries 0 and 1 are due, joined in list order
        assert_eq!(
            session.include_append(&refs).unwrap(),
            "task-0 completed\ntask-1 completed"
        );
    }

    #[test]
    fn test_append_skips_missing_content_in_exercise_mode() {
        let mut session = RenderSession::new(Some("task-1"), false, "arm");
        session
            .declare_tasks(&names(&["task-0", "task-1"]))
            .unwrap();
        session
            .set_content("task-1", ContentKind::Before, "task-1 before", None)
            .unwrap();
        let refs = vec![TaskRef::new("task-0"), TaskRef::new("task-1")];
        assert_eq!(session.include_append(&refs).unwrap(), "task-1 before");
    }

    #[test]
    fn test_append_requires_content_in_solution_mode() {
        let mut session = RenderSession::new(Some("task-1"), true, "arm");
        session
            .declare_tasks(&names(&["task-0", "task-1"]))
            .unwrap();
        session
            .set_content("task-1", ContentKind::Completed, "task-1 completed", None)
            .unwrap();
        let refs = vec![TaskRef::new("task-0"), TaskRef::new("task-1")];
        assert_eq!(
            session.include_append(&refs).unwrap_err(),
            TutorialError::SolutionContentRequired("task-0".to_owned())
        );
    }

    #[test]
    fn test_completion_inheritance_from_previous_task() {
        let mut session = RenderSession::new(Some("task-1"), false, "arm");
        session
            .declare_tasks(&names(&["task-0", "task-1"]))
            .unwrap();
        session
            .set_completion("task-0", ContentKind::Completed, "X")
            .unwrap();
        // task-1 has no Before text: inherit task-0's Completed text
        assert_eq!(session.print_completion(ContentKind::Before).unwrap(), "X");
    }

    #[test]
    fn test_completion_no_predecessor_fails() {
        let mut session = RenderSession::new(Some("task-0"), false, "arm");
        session
            .declare_tasks(&names(&["task-0", "task-1"]))
            .unwrap();
        assert_eq!(
            session.print_completion(ContentKind::Before).unwrap_err(),
            TutorialError::MissingCompletionText("task-0".to_owned())
        );
    }

    #[test]
    fn test_completion_all_fallback() {
        let mut session = RenderSession::new(Some("task-0"), false, "arm");
        session.declare_tasks(&names(&["task-0"])).unwrap();
        session
            .set_completion("task-0", ContentKind::All, "any stage")
            .unwrap();
        assert_eq!(
            session.print_completion(ContentKind::Before).unwrap(),
            "any stage"
        );
        assert_eq!(
            session.print_completion(ContentKind::Completed).unwrap(),
            "any stage"
        );
    }

    #[test]
    fn test_worklist_is_fifo() {
        let mut session = RenderSession::new(None, false, "arm");
        session.push_file("a.c");
        session.push_file("b.c");
        assert_eq!(session.next_file(), Some(PathBuf::from("a.c")));
        session.push_file("c.c");
        assert_eq!(session.next_file(), Some(PathBuf::from("b.c")));
        assert_eq!(session.next_file(), Some(PathBuf::from("c.c")));
        assert_eq!(session.next_file(), None);
    }
}
