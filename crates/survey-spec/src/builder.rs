//! Authoring session: one survey plus the editor's focus and collapse state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::SurveyError;
use crate::registry::{ListField, QuestionKind};
use crate::spec::{Question, QuestionPatch, Survey};
use crate::store::{PersistenceError, SurveyStore};

/// Session-scoped builder state. Serializable so a session can be snapshotted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderController {
    survey: Survey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active_question_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    collapsed_ids: BTreeSet<String>,
}

impl BuilderController {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::from_survey(Survey::new(title, description))
    }

    /// Opens an existing definition for editing.
    pub fn from_survey(mut survey: Survey) -> Self {
        survey.normalize();
        Self {
            survey,
            active_question_id: None,
            collapsed_ids: BTreeSet::new(),
        }
    }

    pub fn survey(&self) -> &Survey {
        &self.survey
    }

    pub fn into_survey(self) -> Survey {
        self.survey
    }

    pub fn active_question_id(&self) -> Option<&str> {
        self.active_question_id.as_deref()
    }

    pub fn active_question(&self) -> Option<&Question> {
        self.active_question_id
            .as_deref()
            .and_then(|id| self.survey.question(id))
    }

    pub fn collapsed_ids(&self) -> &BTreeSet<String> {
        &self.collapsed_ids
    }

    pub fn is_collapsed(&self, id: &str) -> bool {
        self.collapsed_ids.contains(id)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.survey.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.survey.description = description.into();
    }

    /// Appends a question and focuses it, expanded.
    pub fn add_question(&mut self, kind: QuestionKind) -> &Question {
        let id = self.survey.add_question(kind).id.clone();
        self.focus(&id);
        self.last_question()
    }

    pub fn remove_question(&mut self, id: &str) -> Result<Question, SurveyError> {
        let removed = self.survey.remove_question(id)?;
        if self.active_question_id.as_deref() == Some(id) {
            self.active_question_id = None;
        }
        self.collapsed_ids.remove(id);
        Ok(removed)
    }

    /// Appends a copy of `id` and focuses the copy.
    pub fn duplicate_question(&mut self, id: &str) -> Result<&Question, SurveyError> {
        let copy_id = self.survey.duplicate_question(id)?.id.clone();
        self.focus(&copy_id);
        Ok(self.last_question())
    }

    pub fn reorder(&mut self, id: &str, new_index: usize) -> Result<(), SurveyError> {
        self.survey.reorder(id, new_index)
    }

    pub fn update_question(
        &mut self,
        id: &str,
        patch: QuestionPatch,
    ) -> Result<&Question, SurveyError> {
        self.survey.update(id, patch)
    }

    pub fn add_item(&mut self, id: &str, field: ListField) -> Result<usize, SurveyError> {
        self.survey.add_item(id, field)
    }

    pub fn update_item(
        &mut self,
        id: &str,
        field: ListField,
        index: usize,
        value: impl Into<String>,
    ) -> Result<(), SurveyError> {
        self.survey.update_item(id, field, index, value)
    }

    pub fn remove_item(
        &mut self,
        id: &str,
        field: ListField,
        index: usize,
    ) -> Result<String, SurveyError> {
        self.survey.remove_item(id, field, index)
    }

    /// Focuses `id`, or clears focus with `None`.
    pub fn set_active(&mut self, id: Option<&str>) -> Result<(), SurveyError> {
        match id {
            Some(id) => {
                if self.survey.question(id).is_none() {
                    return Err(SurveyError::QuestionNotFound(id.to_string()));
                }
                self.active_question_id = Some(id.to_string());
            }
            None => self.active_question_id = None,
        }
        Ok(())
    }

    /// Flips the collapsed flag of `id` and returns the new state.
    pub fn toggle_collapsed(&mut self, id: &str) -> Result<bool, SurveyError> {
        if self.survey.question(id).is_none() {
            return Err(SurveyError::QuestionNotFound(id.to_string()));
        }
        if self.collapsed_ids.remove(id) {
            Ok(false)
        } else {
            self.collapsed_ids.insert(id.to_string());
            Ok(true)
        }
    }

    pub fn collapse_all(&mut self) {
        self.collapsed_ids = self
            .survey
            .questions
            .iter()
            .map(|question| question.id.clone())
            .collect();
    }

    pub fn expand_all(&mut self) {
        self.collapsed_ids.clear();
    }

    /// Hands the current survey to `store`. Takes `&mut self` so saves never overlap;
    /// builder state is unchanged either way.
    pub fn save(&mut self, store: &mut dyn SurveyStore) -> Result<(), PersistenceError> {
        match store.save(&self.survey) {
            Ok(()) => {
                info!(
                    title = %self.survey.title,
                    questions = self.survey.len(),
                    "survey saved"
                );
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "survey save failed");
                Err(err)
            }
        }
    }

    fn focus(&mut self, id: &str) {
        self.active_question_id = Some(id.to_string());
        self.collapsed_ids.remove(id);
    }

    // Added and duplicated questions are always appended.
    fn last_question(&self) -> &Question {
        &self.survey.questions[self.survey.len() - 1]
    }
}
