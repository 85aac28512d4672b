use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SurveyError;
use crate::registry::{ListField, QuestionKind};
use crate::spec::config::QuestionConfig;
use crate::spec::question::{Question, QuestionPatch};

/// Most points a likert or opinion scale may span.
pub const MAX_SCALE_POINTS: i64 = 101;

static GENERATED_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^q(\d+)$").expect("static regex"));

/// Survey definition: metadata plus questions kept in dense `order`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Survey {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Last generated id counter; reseeded from existing ids after loading.
    #[serde(skip)]
    id_counter: u64,
}

impl PartialEq for Survey {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title
            && self.description == other.description
            && self.questions == other.questions
    }
}

impl Default for Survey {
    fn default() -> Self {
        Self::new("Untitled Survey", "")
    }
}

impl Survey {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            questions: Vec::new(),
            id_counter: 0,
        }
    }

    /// Parses a persisted definition, checks it and repairs its ordering.
    pub fn from_json(json: &str) -> Result<Self, SurveyError> {
        let mut survey: Survey = serde_json::from_str(json)
            .map_err(|err| SurveyError::InvalidDefinition(err.to_string()))?;
        survey.check_integrity()?;
        survey.normalize();
        Ok(survey)
    }

    /// Rejects repeated question ids and likert or opinion scales that are
    /// inverted or wider than [`MAX_SCALE_POINTS`].
    pub fn check_integrity(&self) -> Result<(), SurveyError> {
        let mut seen = HashSet::new();
        for question in &self.questions {
            if !seen.insert(question.id.as_str()) {
                return Err(SurveyError::DuplicateQuestionId(question.id.clone()));
            }
            let bounds = match &question.config {
                QuestionConfig::LikertScale(config) => Some((config.scale.min, config.scale.max)),
                QuestionConfig::OpinionScale(config) => Some((config.min, config.max)),
                _ => None,
            };
            if let Some((min, max)) = bounds
                && !max
                    .checked_sub(min)
                    .is_some_and(|span| (0..MAX_SCALE_POINTS).contains(&span))
            {
                return Err(SurveyError::InvalidScale {
                    question_id: question.id.clone(),
                    min,
                    max,
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.questions.iter().position(|question| question.id == id)
    }

    fn index_of(&self, id: &str) -> Result<usize, SurveyError> {
        self.position(id)
            .ok_or_else(|| SurveyError::QuestionNotFound(id.to_string()))
    }

    fn question_mut(&mut self, id: &str) -> Result<&mut Question, SurveyError> {
        let index = self.index_of(id)?;
        Ok(&mut self.questions[index])
    }

    /// Appends a default question of `kind`.
    pub fn add_question(&mut self, kind: QuestionKind) -> &Question {
        let id = self.next_question_id();
        let order = self.questions.len();
        debug!(question_id = %id, %kind, order, "question added");
        self.questions.push(Question::create(id, kind, order));
        &self.questions[order]
    }

    pub fn remove_question(&mut self, id: &str) -> Result<Question, SurveyError> {
        let index = self.index_of(id)?;
        let removed = self.questions.remove(index);
        self.renumber();
        debug!(question_id = %id, remaining = self.questions.len(), "question removed");
        Ok(removed)
    }

    /// Appends a deep copy of `id` at the end of the survey.
    pub fn duplicate_question(&mut self, id: &str) -> Result<&Question, SurveyError> {
        let index = self.index_of(id)?;
        let new_id = self.next_question_id();
        let order = self.questions.len();
        let copy = self.questions[index].duplicate(new_id, order);
        debug!(source = %id, question_id = %copy.id, "question duplicated");
        self.questions.push(copy);
        Ok(&self.questions[order])
    }

    /// Moves `id` to `new_index` (clamped to the last slot) and renumbers.
    pub fn reorder(&mut self, id: &str, new_index: usize) -> Result<(), SurveyError> {
        let index = self.index_of(id)?;
        let question = self.questions.remove(index);
        let target = new_index.min(self.questions.len());
        self.questions.insert(target, question);
        self.renumber();
        debug!(question_id = %id, from = index, to = target, "question reordered");
        Ok(())
    }

    pub fn update(&mut self, id: &str, patch: QuestionPatch) -> Result<&Question, SurveyError> {
        let question = self.question_mut(id)?;
        question.update(patch);
        Ok(question)
    }

    pub fn add_item(&mut self, id: &str, field: ListField) -> Result<usize, SurveyError> {
        self.question_mut(id)?.add_item(field)
    }

    pub fn update_item(
        &mut self,
        id: &str,
        field: ListField,
        index: usize,
        value: impl Into<String>,
    ) -> Result<(), SurveyError> {
        self.question_mut(id)?.update_item(field, index, value)
    }

    pub fn remove_item(
        &mut self,
        id: &str,
        field: ListField,
        index: usize,
    ) -> Result<String, SurveyError> {
        self.question_mut(id)?.remove_item(field, index)
    }

    /// Sorts by stored `order` (stable) and rewrites it as `0..len`.
    pub fn normalize(&mut self) {
        self.questions.sort_by_key(|question| question.order);
        self.renumber();
    }

    fn renumber(&mut self) {
        for (order, question) in self.questions.iter_mut().enumerate() {
            question.order = order;
        }
    }

    fn next_question_id(&mut self) -> String {
        if self.id_counter == 0 {
            self.id_counter = self
                .questions
                .iter()
                .filter_map(|question| GENERATED_ID.captures(&question.id))
                .filter_map(|captures| captures[1].parse::<u64>().ok())
                .max()
                .unwrap_or(0);
        }
        loop {
            self.id_counter += 1;
            let candidate = format!("q{}", self.id_counter);
            if self.question(&candidate).is_none() {
                return candidate;
            }
        }
    }
}
