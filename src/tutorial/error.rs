//! Fatal authoring errors.

use thiserror::Error;

/// Errors raised by the tutorial state machine.
///
/// Every variant aborts the render session immediately; there is no
/// partial-failure or retry path for authoring mistakes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TutorialError {
    /// The task list was declared twice in one session.
    #[error("task list already declared for this render session")]
    DuplicateDeclaration,

    /// A task name was used that was never declared.
    #[error("unknown task `{0}`")]
    UnknownTask(String),

    /// A variant list does not cover the tutorial's current progress.
    #[error("no task variant matches the current stage")]
    MissingContent,

    /// No completion text is defined and there is no predecessor to
    /// inherit from.
    #[error("no completion text found for task `{0}`")]
    MissingCompletionText(String),

    /// A published solution must have content for every task it reaches.
    #[error("solution rendering requires content for task `{0}`")]
    SolutionContentRequired(String),
}
