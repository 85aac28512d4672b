use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::answers::{Answer, AnswerMap, Scalar};
use crate::spec::{Question, QuestionConfig, Survey};

pub const REQUIRED_MESSAGE: &str = "This question is required.";
pub const LIKERT_INCOMPLETE_MESSAGE: &str = "Please rate all statements.";

/// Required-field check for one question. `None` means the answer passes.
pub fn validate(question: &Question, answer: Option<&Answer>) -> Option<String> {
    if !question.required {
        return None;
    }

    if let QuestionConfig::LikertScale(config) = &question.config {
        let rated = answer.and_then(Answer::as_keyed);
        let complete = config.statements.iter().all(|statement| {
            rated
                .and_then(|values| values.get(statement))
                .is_some_and(|value| !value.is_empty())
        });
        return (!complete).then(|| LIKERT_INCOMPLETE_MESSAGE.to_string());
    }

    match answer {
        Some(answer) if !answer.is_empty() => None,
        _ => Some(REQUIRED_MESSAGE.to_string()),
    }
}

/// Runs [`validate`] over every question, keyed by question id.
pub fn validate_all(survey: &Survey, answers: &AnswerMap) -> BTreeMap<String, String> {
    survey
        .questions
        .iter()
        .filter_map(|question| {
            validate(question, answers.get(&question.id))
                .map(|message| (question.id.clone(), message))
        })
        .collect()
}

/// Validation error metadata reported for externally supplied answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub question_id: String,
    pub message: String,
    pub code: String,
}

/// Full report for an answer map: required checks, shape checks and stray keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknown_fields: Vec<String>,
}

pub fn check_answers(survey: &Survey, answers: &AnswerMap) -> ValidationResult {
    let mut errors = Vec::new();

    for question in &survey.questions {
        let answer = answers.get(&question.id);
        if let Some(message) = validate(question, answer) {
            let code = match question.config {
                QuestionConfig::LikertScale(_) => "incomplete",
                _ => "required",
            };
            errors.push(base_error(question, &message, code));
            continue;
        }
        if let Some(answer) = answer
            && !answer.is_empty()
            && let Some(error) = validate_value(question, answer)
        {
            errors.push(error);
        }
    }

    let unknown_fields: Vec<String> = answers
        .keys()
        .filter(|key| survey.question(key).is_none())
        .cloned()
        .collect();

    ValidationResult {
        valid: errors.is_empty() && unknown_fields.is_empty(),
        errors,
        unknown_fields,
    }
}

fn validate_value(question: &Question, answer: &Answer) -> Option<ValidationError> {
    if !matches_kind(question, answer) {
        return Some(base_error(
            question,
            "answer does not fit the question type",
            "type_mismatch",
        ));
    }

    match (&question.config, answer) {
        (QuestionConfig::MultipleChoice(config), Answer::Text(choice))
            if !config.options.contains(choice) =>
        {
            Some(base_error(question, "invalid option", "option_mismatch"))
        }
        (QuestionConfig::MultipleChoice(config), Answer::List(choices))
            if choices.iter().any(|choice| !config.options.contains(choice)) =>
        {
            Some(base_error(question, "invalid option", "option_mismatch"))
        }
        (QuestionConfig::Dropdown(config), Answer::Text(choice))
            if !config.options.contains(choice) =>
        {
            Some(base_error(question, "invalid option", "option_mismatch"))
        }
        (QuestionConfig::Dichotomous(config), Answer::Text(choice))
            if *choice != config.yes_label && *choice != config.no_label =>
        {
            Some(base_error(question, "invalid option", "option_mismatch"))
        }
        (QuestionConfig::OpenEnded(config), Answer::Text(text))
            if text.chars().count() > config.max_length as usize =>
        {
            Some(base_error(
                question,
                "answer longer than max length",
                "max_length",
            ))
        }
        (QuestionConfig::Rating(config), Answer::Number(value)) => {
            check_bounds(question, *value, config.min, config.max)
        }
        (QuestionConfig::Slider(config), Answer::Number(value)) => {
            check_bounds(question, *value, config.min, config.max)
        }
        (QuestionConfig::OpinionScale(config), Answer::Number(value)) => {
            check_bounds(question, *value, config.min as f64, config.max as f64)
        }
        (QuestionConfig::LikertScale(config), Answer::Keyed(values)) => {
            let (min, max) = (config.scale.min as f64, config.scale.max as f64);
            values.iter().find_map(|(statement, value)| {
                if !config.statements.contains(statement) {
                    return Some(base_error(question, "unknown statement", "unknown_key"));
                }
                match value {
                    Scalar::Number(rating) if *rating < min || *rating > max => {
                        Some(base_error(question, "rating outside scale", "out_of_range"))
                    }
                    _ => None,
                }
            })
        }
        (QuestionConfig::Matrix(config), Answer::Keyed(values)) => {
            values.iter().find_map(|(row, value)| {
                if !config.rows.contains(row) {
                    return Some(base_error(question, "unknown row", "unknown_key"));
                }
                match value {
                    Scalar::Text(column) if !config.columns.contains(column) => {
                        Some(base_error(question, "invalid column", "option_mismatch"))
                    }
                    _ => None,
                }
            })
        }
        (QuestionConfig::RankOrder(config), Answer::List(ranking)) => {
            let mut sorted_ranking = ranking.clone();
            sorted_ranking.sort();
            let mut sorted_items = config.items.clone();
            sorted_items.sort();
            (sorted_ranking != sorted_items).then(|| {
                base_error(
                    question,
                    "ranking must list every item once",
                    "ranking_mismatch",
                )
            })
        }
        _ => None,
    }
}

fn matches_kind(question: &Question, answer: &Answer) -> bool {
    match &question.config {
        QuestionConfig::MultipleChoice(config) if config.allow_multiple => {
            matches!(answer, Answer::List(_))
        }
        QuestionConfig::MultipleChoice(_)
        | QuestionConfig::OpenEnded(_)
        | QuestionConfig::Dropdown(_)
        | QuestionConfig::Dichotomous(_) => matches!(answer, Answer::Text(_)),
        QuestionConfig::Rating(_) | QuestionConfig::Slider(_) | QuestionConfig::OpinionScale(_) => {
            matches!(answer, Answer::Number(_))
        }
        QuestionConfig::LikertScale(_) | QuestionConfig::Matrix(_) => {
            matches!(answer, Answer::Keyed(_))
        }
        QuestionConfig::RankOrder(_) => matches!(answer, Answer::List(_)),
    }
}

fn check_bounds(question: &Question, value: f64, min: f64, max: f64) -> Option<ValidationError> {
    if value < min {
        Some(base_error(question, "value below minimum", "min"))
    } else if value > max {
        Some(base_error(question, "value above maximum", "max"))
    } else {
        None
    }
}

fn base_error(question: &Question, message: &str, code: &str) -> ValidationError {
    ValidationError {
        question_id: question.id.clone(),
        message: message.into(),
        code: code.into(),
    }
}
