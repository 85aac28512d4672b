use thiserror::Error;

use crate::registry::{ListField, QuestionKind};

/// Programmer-facing failures raised by the survey and question models.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurveyError {
    #[error("unsupported question kind '{0}'")]
    UnsupportedKind(String),
    #[error("question '{0}' not found")]
    QuestionNotFound(String),
    #[error("{field} must keep at least one item")]
    MinimumItems { field: ListField },
    #[error("{field} has no item at index {index} (len {len})")]
    ItemIndexOutOfRange {
        field: ListField,
        index: usize,
        len: usize,
    },
    #[error("{kind} questions have no {field}")]
    ListFieldUnavailable { kind: QuestionKind, field: ListField },
    #[error("invalid survey definition: {0}")]
    InvalidDefinition(String),
    #[error("question id '{0}' is used more than once")]
    DuplicateQuestionId(String),
    #[error("question '{question_id}' has an unusable scale {min}..={max}")]
    InvalidScale {
        question_id: String,
        min: i64,
        max: i64,
    },
}
