use std::collections::BTreeMap;

use crate::answers::{Answer, AnswerMap, Scalar};
use crate::spec::{Question, QuestionConfig, Survey};

/// Builds an answer for every question that passes [`crate::check_answers`].
pub fn generate(survey: &Survey) -> AnswerMap {
    survey
        .questions
        .iter()
        .map(|question| (question.id.clone(), example_answer(question)))
        .collect()
}

fn example_answer(question: &Question) -> Answer {
    match &question.config {
        QuestionConfig::MultipleChoice(config) if config.allow_multiple => {
            Answer::List(config.options.iter().take(1).cloned().collect())
        }
        QuestionConfig::MultipleChoice(config) => first_or_empty(&config.options),
        QuestionConfig::Dropdown(config) => first_or_empty(&config.options),
        QuestionConfig::Dichotomous(config) => Answer::Text(config.yes_label.clone()),
        QuestionConfig::OpenEnded(config) => Answer::Text(
            format!("example-{}", question.id)
                .chars()
                .take(config.max_length as usize)
                .collect(),
        ),
        QuestionConfig::Rating(config) => Answer::Number(config.max),
        QuestionConfig::Slider(config) => Answer::Number(config.min),
        QuestionConfig::OpinionScale(config) => Answer::Number(config.max as f64),
        QuestionConfig::LikertScale(config) => {
            let midpoint = (i128::from(config.scale.min) + i128::from(config.scale.max)) / 2;
            Answer::Keyed(
                config
                    .statements
                    .iter()
                    .map(|statement| (statement.clone(), Scalar::Number(midpoint as f64)))
                    .collect::<BTreeMap<_, _>>(),
            )
        }
        QuestionConfig::Matrix(config) => {
            let column = config.columns.first().cloned().unwrap_or_default();
            Answer::Keyed(
                config
                    .rows
                    .iter()
                    .map(|row| (row.clone(), Scalar::Text(column.clone())))
                    .collect(),
            )
        }
        QuestionConfig::RankOrder(config) => Answer::List(config.items.clone()),
    }
}

fn first_or_empty(options: &[String]) -> Answer {
    Answer::Text(options.first().cloned().unwrap_or_default())
}
