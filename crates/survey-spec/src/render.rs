use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::{
    answers::{Answer, AnswerMap, Scalar},
    registry::QuestionKind,
    runtime::{Clock, ResponseRuntime},
    spec::{QuestionConfig, Survey, survey::MAX_SCALE_POINTS},
    validate::validate_all,
};

/// Status labels returned by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// The current question still needs input or the survey is not submitted.
    NeedInput,
    /// Every required question is answered.
    Complete,
    /// The current question carries a validation error.
    Error,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::NeedInput => "need_input",
            RenderStatus::Complete => "complete",
            RenderStatus::Error => "error",
        }
    }
}

/// Progress counters exposed to renderers.
#[derive(Debug, Clone)]
pub struct RenderProgress {
    pub answered: usize,
    pub total: usize,
}

/// The question currently shown to the respondent.
#[derive(Debug, Clone)]
pub struct RenderQuestion {
    pub id: String,
    pub prompt: String,
    pub kind: QuestionKind,
    pub required: bool,
    pub position: usize,
    pub config: QuestionConfig,
    pub current_value: Option<Answer>,
    pub error: Option<String>,
}

/// Collected payload used by the text, JSON and card renderers.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub survey_id: String,
    pub survey_title: String,
    pub help: Option<String>,
    pub status: RenderStatus,
    pub current_index: usize,
    pub is_first: bool,
    pub is_last: bool,
    pub progress: RenderProgress,
    pub question: RenderQuestion,
}

/// Builds the payload for the question at `current_index` (clamped to the last one).
pub fn build_render_payload(
    survey_id: &str,
    survey: &Survey,
    answers: &AnswerMap,
    current_index: usize,
    errors: &BTreeMap<String, String>,
) -> Option<RenderPayload> {
    let last = survey.len().checked_sub(1)?;
    Some(assemble(
        survey_id,
        survey,
        answers,
        current_index.min(last),
        errors,
    ))
}

/// Payload for the runtime's current question.
pub fn runtime_payload<C: Clock>(runtime: &ResponseRuntime<C>) -> RenderPayload {
    let mut payload = assemble(
        runtime.survey_id(),
        runtime.survey(),
        runtime.answers(),
        runtime.current_index(),
        runtime.errors(),
    );
    if runtime.is_completed() {
        payload.status = RenderStatus::Complete;
    }
    payload
}

// `current_index` must point at an existing question.
fn assemble(
    survey_id: &str,
    survey: &Survey,
    answers: &AnswerMap,
    current_index: usize,
    errors: &BTreeMap<String, String>,
) -> RenderPayload {
    let last = survey.len() - 1;
    let question = &survey.questions[current_index];

    let answered = survey
        .questions
        .iter()
        .filter(|question| answers.get(&question.id).is_some_and(|a| !a.is_empty()))
        .count();
    let error = errors.get(&question.id).cloned();
    let status = if error.is_some() {
        RenderStatus::Error
    } else if validate_all(survey, answers).is_empty() {
        RenderStatus::Complete
    } else {
        RenderStatus::NeedInput
    };

    RenderPayload {
        survey_id: survey_id.to_string(),
        survey_title: survey.title.clone(),
        help: (!survey.description.is_empty()).then(|| survey.description.clone()),
        status,
        current_index,
        is_first: current_index == 0,
        is_last: current_index == last,
        progress: RenderProgress {
            answered,
            total: survey.len(),
        },
        question: RenderQuestion {
            id: question.id.clone(),
            prompt: question.prompt.clone(),
            kind: question.kind(),
            required: question.required,
            position: current_index + 1,
            config: question.config.clone(),
            current_value: answers.get(&question.id).cloned(),
            error,
        },
    }
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let question = &payload.question;
    let mut map = match serde_json::to_value(&question.config) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    map.insert("id".into(), Value::String(question.id.clone()));
    map.insert("question".into(), Value::String(question.prompt.clone()));
    map.insert("required".into(), Value::Bool(question.required));
    map.insert("position".into(), json!(question.position));
    if let Some(value) = &question.current_value {
        map.insert(
            "current_value".into(),
            serde_json::to_value(value).unwrap_or(Value::Null),
        );
    }
    if let Some(error) = &question.error {
        map.insert("error".into(), Value::String(error.clone()));
    }

    json!({
        "survey_id": payload.survey_id,
        "survey_title": payload.survey_title,
        "status": payload.status.as_str(),
        "current_index": payload.current_index,
        "is_first": payload.is_first,
        "is_last": payload.is_last,
        "progress": {
            "answered": payload.progress.answered,
            "total": payload.progress.total,
        },
        "help": payload.help,
        "question": Value::Object(map),
    })
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let question = &payload.question;
    let mut lines = Vec::new();
    lines.push(format!("Survey: {}", payload.survey_title));
    if let Some(help) = &payload.help {
        lines.push(help.clone());
    }

    let mut heading = format!(
        "{}/{} {}",
        question.position, payload.progress.total, question.prompt
    );
    if question.required {
        heading.push_str(" *");
    }
    lines.push(heading);
    lines.extend(text_hints(question));

    if let Some(value) = &question.current_value {
        lines.push(format!("  Current answer: {}", answer_to_display(value)));
    }
    if let Some(error) = &question.error {
        lines.push(format!("  ! {}", error));
    }

    lines.join("\n")
}

fn text_hints(question: &RenderQuestion) -> Vec<String> {
    fn numbered(items: &[String]) -> Vec<String> {
        items
            .iter()
            .enumerate()
            .map(|(idx, item)| format!("  {}) {}", idx + 1, item))
            .collect()
    }

    match &question.config {
        QuestionConfig::MultipleChoice(config) => {
            let mut lines = numbered(&config.options);
            if config.allow_multiple {
                lines.push("  (select all that apply)".into());
            }
            lines
        }
        QuestionConfig::Dropdown(config) => {
            let mut lines = vec![format!("  {}", config.placeholder)];
            lines.extend(numbered(&config.options));
            lines
        }
        QuestionConfig::LikertScale(config) => {
            let mut lines = vec![format!(
                "  Scale {}-{}: {}",
                config.scale.min,
                config.scale.max,
                config.scale.labels.join(" / ")
            )];
            lines.extend(numbered(&config.statements));
            lines
        }
        QuestionConfig::Matrix(config) => {
            let mut lines = vec![format!("  Columns: {}", config.columns.join(" / "))];
            lines.extend(numbered(&config.rows));
            lines
        }
        QuestionConfig::RankOrder(config) => {
            let mut lines = numbered(&config.items);
            lines.push("  (list every item, most preferred first)".into());
            lines
        }
        QuestionConfig::Rating(config) => vec![format!(
            "  ({} to {}, step {})",
            config.min, config.max, config.step
        )],
        QuestionConfig::Slider(config) => {
            let mut hint = format!("  ({} to {}, step {})", config.min, config.max, config.step);
            if !config.min_label.is_empty() || !config.max_label.is_empty() {
                hint.push_str(&format!(" {} .. {}", config.min_label, config.max_label));
            }
            vec![hint]
        }
        QuestionConfig::OpinionScale(config) => vec![format!(
            "  {} = {} .. {} = {}",
            config.min, config.left_label, config.max, config.right_label
        )],
        QuestionConfig::OpenEnded(config) => vec![format!(
            "  {} (max {} characters)",
            config.placeholder, config.max_length
        )],
        QuestionConfig::Dichotomous(config) => {
            vec![format!("  ({}/{})", config.yes_label, config.no_label)]
        }
    }
}

/// Render the payload as an Adaptive Card v1.3 transport.
pub fn render_card(payload: &RenderPayload) -> Value {
    let question = &payload.question;
    let mut body = Vec::new();

    body.push(json!({
        "type": "TextBlock",
        "text": payload.survey_title,
        "weight": "Bolder",
        "size": "Large",
        "wrap": true,
    }));

    if let Some(help) = &payload.help {
        body.push(json!({
            "type": "TextBlock",
            "text": help,
            "wrap": true,
        }));
    }

    body.push(json!({
        "type": "FactSet",
        "facts": [
            { "title": "Question", "value": format!("{}/{}", question.position, payload.progress.total) },
            { "title": "Answered", "value": payload.progress.answered.to_string() }
        ]
    }));

    let mut items = vec![json!({
        "type": "TextBlock",
        "text": question.prompt,
        "weight": "Bolder",
        "wrap": true,
    })];
    items.extend(question_inputs(question));
    if let Some(error) = &question.error {
        items.push(json!({
            "type": "TextBlock",
            "text": error,
            "color": "Attention",
            "wrap": true,
        }));
    }
    body.push(json!({
        "type": "Container",
        "items": items,
    }));

    let mut actions = Vec::new();
    if !payload.is_first {
        actions.push(card_action(payload, "Previous", "previous"));
    }
    if payload.is_last {
        actions.push(card_action(payload, "Submit", "submit"));
    } else {
        actions.push(card_action(payload, "Next", "next"));
    }

    json!({
        "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
        "type": "AdaptiveCard",
        "version": "1.3",
        "body": body,
        "actions": actions,
    })
}

fn card_action(payload: &RenderPayload, title: &str, mode: &str) -> Value {
    json!({
        "type": "Action.Submit",
        "title": title,
        "data": {
            "survey": {
                "surveyId": payload.survey_id,
                "mode": mode,
                "questionId": payload.question.id,
            }
        }
    })
}

fn question_inputs(question: &RenderQuestion) -> Vec<Value> {
    let current = question.current_value.as_ref();
    match &question.config {
        QuestionConfig::MultipleChoice(config) => {
            let mut input = choice_set(&question.id, &config.options, question.required, "expanded");
            if config.allow_multiple {
                input.insert("isMultiSelect".into(), Value::Bool(true));
                if let Some(Answer::List(values)) = current {
                    input.insert("value".into(), Value::String(values.join(",")));
                }
            } else if let Some(Answer::Text(value)) = current {
                input.insert("value".into(), Value::String(value.clone()));
            }
            vec![Value::Object(input)]
        }
        QuestionConfig::Dropdown(config) => {
            let mut input = choice_set(&question.id, &config.options, question.required, "compact");
            input.insert("placeholder".into(), Value::String(config.placeholder.clone()));
            if let Some(Answer::Text(value)) = current {
                input.insert("value".into(), Value::String(value.clone()));
            }
            vec![Value::Object(input)]
        }
        QuestionConfig::Dichotomous(config) => {
            let labels = [config.yes_label.clone(), config.no_label.clone()];
            let mut input = choice_set(&question.id, &labels, question.required, "expanded");
            if let Some(Answer::Text(value)) = current {
                input.insert("value".into(), Value::String(value.clone()));
            }
            vec![Value::Object(input)]
        }
        QuestionConfig::LikertScale(config) => {
            // Definitions are checked on load; the cap covers hand-built surveys.
            let points = || (config.scale.min..=config.scale.max).take(MAX_SCALE_POINTS as usize);
            let labels: Vec<String> = points()
                .enumerate()
                .map(|(idx, point)| match config.scale.labels.get(idx) {
                    Some(label) => format!("{} - {}", point, label),
                    None => point.to_string(),
                })
                .collect();
            let values: Vec<String> = points()
                .map(|point| point.to_string())
                .collect();
            keyed_inputs(question, &config.statements, &labels, &values)
        }
        QuestionConfig::Matrix(config) => {
            keyed_inputs(question, &config.rows, &config.columns, &config.columns)
        }
        QuestionConfig::Rating(config) => vec![number_input(question, config.min, config.max)],
        QuestionConfig::Slider(config) => vec![number_input(question, config.min, config.max)],
        QuestionConfig::OpinionScale(config) => vec![number_input(
            question,
            config.min as f64,
            config.max as f64,
        )],
        QuestionConfig::OpenEnded(config) => {
            let mut map = Map::new();
            map.insert("type".into(), Value::String("Input.Text".into()));
            map.insert("id".into(), Value::String(question.id.clone()));
            map.insert("isMultiline".into(), Value::Bool(true));
            map.insert("isRequired".into(), Value::Bool(question.required));
            map.insert("placeholder".into(), Value::String(config.placeholder.clone()));
            map.insert("maxLength".into(), json!(config.max_length));
            if let Some(Answer::Text(value)) = current {
                map.insert("value".into(), Value::String(value.clone()));
            }
            vec![Value::Object(map)]
        }
        QuestionConfig::RankOrder(config) => {
            let value = match current {
                Some(Answer::List(values)) => values.join("\n"),
                _ => config.items.join("\n"),
            };
            vec![json!({
                "type": "Input.Text",
                "id": question.id,
                "isMultiline": true,
                "isRequired": question.required,
                "value": value,
            })]
        }
    }
}

fn choice_set(id: &str, options: &[String], required: bool, style: &str) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("type".into(), Value::String("Input.ChoiceSet".into()));
    map.insert("id".into(), Value::String(id.to_string()));
    map.insert("style".into(), Value::String(style.into()));
    map.insert("isRequired".into(), Value::Bool(required));
    let choices = options
        .iter()
        .map(|option| json!({ "title": option, "value": option }))
        .collect::<Vec<_>>();
    map.insert("choices".into(), Value::Array(choices));
    map
}

/// One labelled choice set per statement/row, with ids `<question>/<key>`.
fn keyed_inputs(
    question: &RenderQuestion,
    keys: &[String],
    titles: &[String],
    values: &[String],
) -> Vec<Value> {
    let answered = question.current_value.as_ref().and_then(Answer::as_keyed);
    let mut inputs = Vec::new();
    for key in keys {
        inputs.push(json!({
            "type": "TextBlock",
            "text": key,
            "wrap": true,
            "spacing": "Small",
        }));
        let choices = titles
            .iter()
            .zip(values)
            .map(|(title, value)| json!({ "title": title, "value": value }))
            .collect::<Vec<_>>();
        let mut map = Map::new();
        map.insert("type".into(), Value::String("Input.ChoiceSet".into()));
        map.insert("id".into(), Value::String(format!("{}/{}", question.id, key)));
        map.insert("style".into(), Value::String("expanded".into()));
        map.insert("isRequired".into(), Value::Bool(question.required));
        map.insert("choices".into(), Value::Array(choices));
        if let Some(value) = answered.and_then(|values| values.get(key)) {
            map.insert("value".into(), Value::String(scalar_to_display(value)));
        }
        inputs.push(Value::Object(map));
    }
    inputs
}

fn number_input(question: &RenderQuestion, min: f64, max: f64) -> Value {
    let mut map = Map::new();
    map.insert("type".into(), Value::String("Input.Number".into()));
    map.insert("id".into(), Value::String(question.id.clone()));
    map.insert("isRequired".into(), Value::Bool(question.required));
    map.insert("min".into(), json!(min));
    map.insert("max".into(), json!(max));
    if let Some(Answer::Number(value)) = &question.current_value {
        map.insert("value".into(), json!(value));
    }
    Value::Object(map)
}

pub fn answer_to_display(answer: &Answer) -> String {
    match answer {
        Answer::Number(value) => value.to_string(),
        Answer::Text(text) => text.clone(),
        Answer::List(values) => values.join(", "),
        Answer::Keyed(values) => values
            .iter()
            .map(|(key, value)| format!("{} = {}", key, scalar_to_display(value)))
            .collect::<Vec<_>>()
            .join("; "),
    }
}

fn scalar_to_display(value: &Scalar) -> String {
    match value {
        Scalar::Number(number) => number.to_string(),
        Scalar::Text(text) => text.clone(),
    }
}
