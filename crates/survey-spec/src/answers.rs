use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_cbor::{to_vec, value::to_value};

use crate::registry::QuestionKind;
use crate::spec::{Question, QuestionConfig};

/// Single value inside a keyed answer (a likert rating or a matrix column).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl Scalar {
    pub fn is_empty(&self) -> bool {
        matches!(self, Scalar::Text(text) if text.is_empty())
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value as f64)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

/// A respondent's answer to one question; the shape follows the question kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Answer {
    Number(f64),
    Text(String),
    /// Selected options of a multi-select question, or the order of a ranking.
    List(Vec<String>),
    /// Statement to rating for likert scales, row to column for matrices.
    Keyed(BTreeMap<String, Scalar>),
}

impl Answer {
    /// The answer submitted for a question the respondent skipped.
    pub fn empty_for(question: &Question) -> Self {
        match &question.config {
            QuestionConfig::MultipleChoice(config) if config.allow_multiple => {
                Answer::List(Vec::new())
            }
            QuestionConfig::RankOrder(_) => Answer::List(Vec::new()),
            QuestionConfig::LikertScale(_) | QuestionConfig::Matrix(_) => {
                Answer::Keyed(BTreeMap::new())
            }
            _ => Answer::Text(String::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Answer::Number(_) => false,
            Answer::Text(text) => text.is_empty(),
            Answer::List(values) => values.is_empty(),
            Answer::Keyed(values) => values.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Answer::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_keyed(&self) -> Option<&BTreeMap<String, Scalar>> {
        match self {
            Answer::Keyed(values) => Some(values),
            _ => None,
        }
    }
}

impl From<&str> for Answer {
    fn from(value: &str) -> Self {
        Answer::Text(value.to_string())
    }
}

impl From<String> for Answer {
    fn from(value: String) -> Self {
        Answer::Text(value)
    }
}

impl From<f64> for Answer {
    fn from(value: f64) -> Self {
        Answer::Number(value)
    }
}

impl From<Vec<String>> for Answer {
    fn from(value: Vec<String>) -> Self {
        Answer::List(value)
    }
}

/// Answers keyed by question id.
pub type AnswerMap = BTreeMap<String, Answer>;

/// One answered (or skipped) question inside a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEntry {
    pub question_id: String,
    pub answer: Answer,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
}

/// Immutable record of a completed response session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub survey_id: String,
    pub responses: Vec<ResponseEntry>,
    pub anonymous: bool,
    /// ISO-8601 completion timestamp.
    pub completed_at: String,
    /// Whole seconds between session start and completion.
    pub time_spent: u64,
}

impl Submission {
    /// Serializes the submission as canonical CBOR bytes.
    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        let canonical = to_value(self)?;
        to_vec(&canonical)
    }

    /// Serializes the submission as indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn response(&self, question_id: &str) -> Option<&ResponseEntry> {
        self.responses
            .iter()
            .find(|entry| entry.question_id == question_id)
    }
}
