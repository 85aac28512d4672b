//! Respondent session: sequential navigation, answer collection and submission.

use std::{cell::Cell, collections::BTreeMap, rc::Rc};

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::answers::{Answer, AnswerMap, ResponseEntry, Scalar, Submission};
use crate::error::SurveyError;
use crate::registry::QuestionKind;
use crate::spec::{Question, QuestionConfig, Survey};
use crate::store::{SubmissionSink, TransportError};
use crate::validate::{validate, validate_all};

/// Source of wall-clock time for elapsed and completion timestamps.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock; clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn advance(&self, delta: TimeDelta) {
        self.now.set(self.now.get() + delta);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("survey has no questions")]
    EmptySurvey,
    #[error("question '{0}' not found")]
    QuestionNotFound(String),
    #[error("{kind} question '{question_id}' does not take keyed answers")]
    SubKeyUnsupported {
        question_id: String,
        kind: QuestionKind,
    },
    #[error("response session already completed")]
    AlreadyCompleted,
    #[error("submission failed: {0}")]
    SubmissionFailed(#[source] TransportError),
    #[error(transparent)]
    InvalidSurvey(#[from] SurveyError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RuntimeState {
    InProgress { current_index: usize },
    Completed,
}

/// Mutable respondent state for one survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSession {
    pub survey_id: String,
    pub answers: AnswerMap,
    pub started_at: DateTime<Utc>,
    pub current_index: usize,
}

/// Result of [`ResponseRuntime::next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Moved(usize),
    /// Current question passed but it is the last one.
    AtEnd,
    Blocked(String),
}

/// Result of a submit attempt that reached validation.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Completed(Submission),
    Invalid {
        errors: BTreeMap<String, String>,
        first_invalid_index: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
}

pub struct ResponseRuntime<C: Clock = SystemClock> {
    survey: Survey,
    session: ResponseSession,
    state: RuntimeState,
    errors: BTreeMap<String, String>,
    anonymous: bool,
    clock: C,
}

impl ResponseRuntime<SystemClock> {
    pub fn load(survey_id: impl Into<String>, survey: Survey) -> Result<Self, RuntimeError> {
        Self::with_clock(survey_id, survey, SystemClock)
    }
}

impl<C: Clock> ResponseRuntime<C> {
    pub fn with_clock(
        survey_id: impl Into<String>,
        mut survey: Survey,
        clock: C,
    ) -> Result<Self, RuntimeError> {
        if survey.is_empty() {
            return Err(RuntimeError::EmptySurvey);
        }
        survey.check_integrity()?;
        survey.normalize();
        let session = ResponseSession {
            survey_id: survey_id.into(),
            answers: AnswerMap::new(),
            started_at: clock.now(),
            current_index: 0,
        };
        debug!(survey_id = %session.survey_id, questions = survey.len(), "response session started");
        Ok(Self {
            survey,
            session,
            state: RuntimeState::InProgress { current_index: 0 },
            errors: BTreeMap::new(),
            anonymous: false,
            clock,
        })
    }

    pub fn survey(&self) -> &Survey {
        &self.survey
    }

    pub fn session(&self) -> &ResponseSession {
        &self.session
    }

    pub fn survey_id(&self) -> &str {
        &self.session.survey_id
    }

    pub fn state(&self) -> RuntimeState {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state == RuntimeState::Completed
    }

    pub fn current_index(&self) -> usize {
        self.session.current_index
    }

    pub fn current_question(&self) -> &Question {
        &self.survey.questions[self.session.current_index]
    }

    pub fn is_last(&self) -> bool {
        self.session.current_index + 1 == self.survey.len()
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.session.answers
    }

    pub fn answer_for(&self, question_id: &str) -> Option<&Answer> {
        self.session.answers.get(question_id)
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn error_for(&self, question_id: &str) -> Option<&str> {
        self.errors.get(question_id).map(String::as_str)
    }

    pub fn anonymous(&self) -> bool {
        self.anonymous
    }

    pub fn set_anonymous(&mut self, anonymous: bool) {
        self.anonymous = anonymous;
    }

    /// Time since the session started, measured on every call.
    pub fn elapsed(&self) -> TimeDelta {
        self.clock.now() - self.session.started_at
    }

    pub fn progress(&self) -> Progress {
        let answered = self
            .survey
            .questions
            .iter()
            .filter(|question| {
                self.session
                    .answers
                    .get(&question.id)
                    .is_some_and(|answer| !answer.is_empty())
            })
            .count();
        Progress {
            answered,
            total: self.survey.len(),
        }
    }

    /// Replaces the answer to `question_id`.
    pub fn answer(
        &mut self,
        question_id: &str,
        value: impl Into<Answer>,
    ) -> Result<(), RuntimeError> {
        self.ensure_in_progress()?;
        self.lookup(question_id)?;
        self.session
            .answers
            .insert(question_id.to_string(), value.into());
        self.errors.remove(question_id);
        Ok(())
    }

    /// Sets one entry of a keyed answer: a likert statement or a matrix row.
    pub fn answer_sub(
        &mut self,
        question_id: &str,
        sub_key: &str,
        value: impl Into<Scalar>,
    ) -> Result<(), RuntimeError> {
        self.ensure_in_progress()?;
        let question = self.lookup(question_id)?;
        if !matches!(
            question.config,
            QuestionConfig::LikertScale(_) | QuestionConfig::Matrix(_)
        ) {
            return Err(RuntimeError::SubKeyUnsupported {
                question_id: question_id.to_string(),
                kind: question.kind(),
            });
        }
        let entry = self
            .session
            .answers
            .entry(question_id.to_string())
            .or_insert_with(|| Answer::Keyed(BTreeMap::new()));
        if !matches!(entry, Answer::Keyed(_)) {
            *entry = Answer::Keyed(BTreeMap::new());
        }
        if let Answer::Keyed(values) = entry {
            values.insert(sub_key.to_string(), value.into());
        }
        self.errors.remove(question_id);
        Ok(())
    }

    /// Selects `option`. Multi-select questions toggle membership and return
    /// whether the option is now selected; single-select always selects.
    pub fn toggle_choice(&mut self, question_id: &str, option: &str) -> Result<bool, RuntimeError> {
        self.ensure_in_progress()?;
        let question = self.lookup(question_id)?;
        let multi_options = match &question.config {
            QuestionConfig::MultipleChoice(config) if config.allow_multiple => {
                Some(config.options.clone())
            }
            _ => None,
        };
        let Some(options) = multi_options else {
            self.answer(question_id, option)?;
            return Ok(true);
        };

        let mut selected = match self.session.answers.get(question_id) {
            Some(Answer::List(values)) => values.clone(),
            _ => Vec::new(),
        };
        let now_selected = if let Some(pos) = selected.iter().position(|value| value == option) {
            selected.remove(pos);
            false
        } else {
            selected.push(option.to_string());
            true
        };
        // Keep selections in option order so the set has one representation.
        selected.sort_by_key(|value| {
            options
                .iter()
                .position(|candidate| candidate == value)
                .unwrap_or(usize::MAX)
        });
        self.session
            .answers
            .insert(question_id.to_string(), Answer::List(selected));
        self.errors.remove(question_id);
        Ok(now_selected)
    }

    /// Validates the current question and advances when it passes.
    pub fn next(&mut self) -> Result<StepOutcome, RuntimeError> {
        self.ensure_in_progress()?;
        let question = self.current_question();
        let question_id = question.id.clone();
        if let Some(message) = validate(question, self.session.answers.get(&question_id)) {
            debug!(question_id = %question_id, %message, "advance blocked");
            self.errors.insert(question_id, message.clone());
            return Ok(StepOutcome::Blocked(message));
        }
        self.errors.remove(&question_id);
        if self.is_last() {
            return Ok(StepOutcome::AtEnd);
        }
        self.move_to(self.session.current_index + 1);
        Ok(StepOutcome::Moved(self.session.current_index))
    }

    /// Steps back without validating; stays put on the first question.
    pub fn previous(&mut self) -> Result<usize, RuntimeError> {
        self.ensure_in_progress()?;
        if self.session.current_index > 0 {
            self.move_to(self.session.current_index - 1);
        }
        Ok(self.session.current_index)
    }

    /// Validates every question and, when clean, delivers the submission.
    ///
    /// A delivery failure leaves answers and position untouched, so calling
    /// `submit` again resends the same responses.
    pub fn submit(
        &mut self,
        sink: &mut dyn SubmissionSink,
    ) -> Result<SubmitOutcome, RuntimeError> {
        self.ensure_in_progress()?;

        let errors = validate_all(&self.survey, &self.session.answers);
        if !errors.is_empty() {
            let first_invalid_index = self
                .survey
                .questions
                .iter()
                .position(|question| errors.contains_key(&question.id))
                .unwrap_or(self.session.current_index);
            self.move_to(first_invalid_index);
            self.errors = errors.clone();
            debug!(count = errors.len(), first_invalid_index, "submit blocked by validation");
            return Ok(SubmitOutcome::Invalid {
                errors,
                first_invalid_index,
            });
        }

        let submission = self.build_submission();
        if let Err(err) = sink.deliver(&submission) {
            warn!(survey_id = %self.session.survey_id, error = %err, "submission delivery failed");
            return Err(RuntimeError::SubmissionFailed(err));
        }

        self.errors.clear();
        self.state = RuntimeState::Completed;
        info!(
            survey_id = %submission.survey_id,
            responses = submission.responses.len(),
            time_spent = submission.time_spent,
            "submission delivered"
        );
        Ok(SubmitOutcome::Completed(submission))
    }

    /// Submission content for the current answers, timed at this instant.
    pub fn build_submission(&self) -> Submission {
        let now = self.clock.now();
        let responses = self
            .survey
            .questions
            .iter()
            .map(|question| ResponseEntry {
                question_id: question.id.clone(),
                answer: self
                    .session
                    .answers
                    .get(&question.id)
                    .cloned()
                    .unwrap_or_else(|| Answer::empty_for(question)),
                kind: question.kind(),
            })
            .collect();
        Submission {
            survey_id: self.session.survey_id.clone(),
            responses,
            anonymous: self.anonymous,
            completed_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            time_spent: (now - self.session.started_at).num_seconds().max(0) as u64,
        }
    }

    fn move_to(&mut self, index: usize) {
        self.session.current_index = index;
        self.state = RuntimeState::InProgress {
            current_index: index,
        };
    }

    fn ensure_in_progress(&self) -> Result<(), RuntimeError> {
        match self.state {
            RuntimeState::InProgress { .. } => Ok(()),
            RuntimeState::Completed => Err(RuntimeError::AlreadyCompleted),
        }
    }

    fn lookup(&self, question_id: &str) -> Result<&Question, RuntimeError> {
        self.survey
            .question(question_id)
            .ok_or_else(|| RuntimeError::QuestionNotFound(question_id.to_string()))
    }
}
