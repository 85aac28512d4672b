use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SurveyError;
use crate::registry::{ListField, QuestionKind, default_config};
use crate::spec::config::{ConfigPatch, QuestionConfig};

/// One question instance inside a survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Question {
    pub id: String,
    #[serde(rename = "question")]
    pub prompt: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub order: usize,
    #[serde(flatten)]
    pub config: QuestionConfig,
}

/// Shallow update of a question. There is no way to change the kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionPatch {
    #[serde(
        default,
        rename = "question",
        skip_serializing_if = "Option::is_none"
    )]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(flatten)]
    pub config: ConfigPatch,
}

impl QuestionPatch {
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            prompt: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn required(required: bool) -> Self {
        Self {
            required: Some(required),
            ..Self::default()
        }
    }

    pub fn config(config: ConfigPatch) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }
}

impl Question {
    /// New question of `kind` with the kind's default config.
    pub fn create(id: impl Into<String>, kind: QuestionKind, order: usize) -> Self {
        Self {
            id: id.into(),
            prompt: format!("New {} question", kind.display_name()),
            required: false,
            order,
            config: default_config(kind),
        }
    }

    pub fn kind(&self) -> QuestionKind {
        self.config.kind()
    }

    pub fn update(&mut self, patch: QuestionPatch) {
        if let Some(prompt) = patch.prompt {
            self.prompt = prompt;
        }
        if let Some(required) = patch.required {
            self.required = required;
        }
        let ignored = self.config.apply(patch.config);
        if !ignored.is_empty() {
            debug!(question_id = %self.id, kind = %self.kind(), ?ignored, "patch fields ignored");
        }
    }

    /// Deep copy under a new id, with the prompt marked as a copy.
    pub fn duplicate(&self, id: impl Into<String>, order: usize) -> Self {
        Self {
            id: id.into(),
            prompt: format!("{} (Copy)", self.prompt),
            required: self.required,
            order,
            config: self.config.clone(),
        }
    }

    pub fn items(&self, field: ListField) -> Result<&[String], SurveyError> {
        self.config
            .list(field)
            .map(Vec::as_slice)
            .ok_or(SurveyError::ListFieldUnavailable {
                kind: self.kind(),
                field,
            })
    }

    /// Appends a placeholder item and returns its index.
    pub fn add_item(&mut self, field: ListField) -> Result<usize, SurveyError> {
        let items = self.items_mut(field)?;
        let index = items.len();
        items.push(field.item_label(index));
        Ok(index)
    }

    pub fn update_item(
        &mut self,
        field: ListField,
        index: usize,
        value: impl Into<String>,
    ) -> Result<(), SurveyError> {
        let items = self.items_mut(field)?;
        let len = items.len();
        let slot = items
            .get_mut(index)
            .ok_or(SurveyError::ItemIndexOutOfRange { field, index, len })?;
        *slot = value.into();
        Ok(())
    }

    /// Removes an item; the last remaining item cannot be removed.
    pub fn remove_item(&mut self, field: ListField, index: usize) -> Result<String, SurveyError> {
        let items = self.items_mut(field)?;
        let len = items.len();
        if index >= len {
            return Err(SurveyError::ItemIndexOutOfRange { field, index, len });
        }
        if len <= 1 {
            return Err(SurveyError::MinimumItems { field });
        }
        Ok(items.remove(index))
    }

    fn items_mut(&mut self, field: ListField) -> Result<&mut Vec<String>, SurveyError> {
        let kind = self.kind();
        self.config
            .list_mut(field)
            .ok_or(SurveyError::ListFieldUnavailable { kind, field })
    }
}
