//! Error types for the progression engine and its collaborators.
//!
//! Collaborator traits return these typed errors so the engine can classify
//! failures (recoverable view, developer diagnostic, refused action) without
//! string matching.

use thiserror::Error;

/// Errors raised by a content provider while loading a module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    /// No content mapping exists for the module identifier.
    #[error("no content found for module '{0}'")]
    NotFound(String),

    /// The content payload could not be parsed.
    #[error("malformed content for module '{module_id}': {message}")]
    Parse { module_id: String, message: String },

    /// The content source could not be read.
    #[error("failed to read content at {path}: {message}")]
    Io { path: String, message: String },
}

/// A canonical answer key that cannot be graded. Indicates an authoring defect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnswerKeyError {
    #[error("answer key is empty")]
    Empty,

    #[error("answer key lists '{0}' more than once")]
    DuplicateKey(String),
}

/// Actions on an answer attempt that the attempt refuses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    /// Reveal was requested with nothing selected.
    #[error("no option selected")]
    NoSelection,

    /// The attempt has been graded; selection is frozen until retry or navigation.
    #[error("answer already revealed, retry or navigate to change the selection")]
    InputFrozen,

    /// The option key does not belong to the question.
    #[error("unknown option '{0}'")]
    UnknownOption(String),

    /// The current section has no question to answer.
    #[error("current section has no question")]
    NotGradable,

    /// Retry is only offered after an incorrect evaluation.
    #[error("retry requested without an incorrect evaluation")]
    RetryWithoutIncorrect,
}

/// Errors from the progress store backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressError {
    #[error("progress backend error: {0}")]
    Backend(String),

    #[error("stored value for '{key}' is not a non-negative integer: {value:?}")]
    Corrupt { key: String, value: String },
}

/// Errors from submitting an exam result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// No current user; the submission was skipped.
    #[error("no signed-in user, exam result not submitted")]
    MissingIdentity,

    /// The exam section carries no exam to name the result after.
    #[error("exam section has no exam, nothing to submit")]
    NoExam,

    /// The sink refused the result.
    #[error("result rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The sink could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The sink did not answer in time.
    #[error("submission timed out after {0}s")]
    Timeout(u64),

    /// The sink's own storage failed.
    #[error("result storage failed: {0}")]
    Storage(String),
}

impl SubmissionError {
    /// Returns `true` if resubmitting the same result cannot succeed.
    pub fn is_permanent(&self) -> bool {
        match self {
            SubmissionError::MissingIdentity | SubmissionError::NoExam => true,
            SubmissionError::Rejected { status, .. } => (400..500).contains(status) && *status != 429,
            _ => false,
        }
    }
}
