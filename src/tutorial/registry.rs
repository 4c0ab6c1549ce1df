//! Ordered task registry.

use std::collections::HashMap;

use super::error::TutorialError;
use super::task::Task;

/// The ordered, named task set of one render session.
///
/// Declaration happens exactly once and assigns each task its index in list
/// order; that index defines the total order every selection rule relies on.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
    by_name: HashMap<String, usize>,
    declared: bool,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the full task list for the tutorial.
    ///
    /// Callable exactly once per session; a second call fails with
    /// [`TutorialError::DuplicateDeclaration`].
    pub fn declare(&mut self, names: &[String]) -> Result<(), TutorialError> {
        if self.declared {
            return Err(TutorialError::DuplicateDeclaration);
        }
        self.declared = true;

        for (index, name) in names.iter().enumerate() {
            self.by_name.insert(name.clone(), index);
            self.tasks.push(Task::new(name.clone(), index));
        }
        Ok(())
    }

    pub fn is_declared(&self) -> bool {
        self.declared
    }

    /// Look a task up by name.
    pub fn get(&self, name: &str) -> Result<&Task, TutorialError> {
        self.by_name
            .get(name)
            .map(|&index| &self.tasks[index])
            .ok_or_else(|| TutorialError::UnknownTask(name.to_owned()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Task, TutorialError> {
        match self.by_name.get(name) {
            Some(&index) => Ok(&mut self.tasks[index]),
            None => Err(TutorialError::UnknownTask(name.to_owned())),
        }
    }

    /// Look a task up by its position in the tutorial.
    pub fn by_index(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Task names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(Task::name)
    }
}
