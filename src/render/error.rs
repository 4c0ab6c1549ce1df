//! Template evaluation error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::tutorial::TutorialError;

/// Errors raised while parsing or evaluating a template.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("unknown directive `{0}`")]
    UnknownDirective(String),

    #[error("empty directive")]
    EmptyDirective,

    #[error("`{0}` is missing an argument")]
    MissingArgument(&'static str),

    #[error("bad argument for `{directive}`: {detail}")]
    BadArgument {
        directive: &'static str,
        detail: String,
    },

    #[error("`{0}` block is never closed")]
    UnclosedBlock(&'static str),

    #[error("`{0}` outside of a block")]
    StrayDirective(&'static str),

    #[error("failed to write `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error(transparent)]
    Tutorial(#[from] TutorialError),
}
