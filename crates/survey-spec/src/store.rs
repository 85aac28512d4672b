//! Seams to the external services that persist definitions and collect submissions.

use thiserror::Error;

use crate::answers::Submission;
use crate::spec::Survey;

/// Failure reported by a survey store; the caller may retry.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("survey store unavailable: {0}")]
    Unavailable(String),
    #[error("failed to encode survey: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("survey store io: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by a submission sink; the caller may retry.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("submission endpoint unavailable: {0}")]
    Unavailable(String),
    #[error("failed to encode submission: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("submission io: {0}")]
    Io(#[from] std::io::Error),
}

/// Receives finished survey definitions.
pub trait SurveyStore {
    fn save(&mut self, survey: &Survey) -> Result<(), PersistenceError>;
}

/// Receives finished submissions.
pub trait SubmissionSink {
    fn deliver(&mut self, submission: &Submission) -> Result<(), TransportError>;
}

/// Keeps every saved revision in memory.
#[derive(Debug, Default)]
pub struct MemorySurveyStore {
    pub revisions: Vec<Survey>,
    failures: usize,
}

impl MemorySurveyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` saves fail.
    pub fn fail_next(&mut self, count: usize) {
        self.failures = count;
    }

    pub fn latest(&self) -> Option<&Survey> {
        self.revisions.last()
    }
}

impl SurveyStore for MemorySurveyStore {
    fn save(&mut self, survey: &Survey) -> Result<(), PersistenceError> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(PersistenceError::Unavailable("memory store offline".into()));
        }
        self.revisions.push(survey.clone());
        Ok(())
    }
}

/// Collects delivered submissions in memory.
#[derive(Debug, Default)]
pub struct MemorySubmissionSink {
    pub delivered: Vec<Submission>,
    failures: usize,
}

impl MemorySubmissionSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` deliveries fail.
    pub fn fail_next(&mut self, count: usize) {
        self.failures = count;
    }
}

impl SubmissionSink for MemorySubmissionSink {
    fn deliver(&mut self, submission: &Submission) -> Result<(), TransportError> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(TransportError::Unavailable("memory sink offline".into()));
        }
        self.delivered.push(submission.clone());
        Ok(())
    }
}
