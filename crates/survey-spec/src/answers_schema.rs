use serde_json::{Map, Value, json};

use crate::spec::{Question, QuestionConfig, Survey};

/// JSON Schema describing a valid answer map for `survey`.
pub fn generate(survey: &Survey) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for question in &survey.questions {
        properties.insert(question.id.clone(), question_schema(question));
        if question.required {
            required.push(Value::String(question.id.clone()));
        }
    }

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": survey.title,
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

/// JSON Schema of the persisted survey definition itself.
pub fn definition_schema() -> Value {
    serde_json::to_value(schemars::schema_for!(Survey)).unwrap_or(Value::Null)
}

fn question_schema(question: &Question) -> Value {
    let mut schema = match &question.config {
        QuestionConfig::MultipleChoice(config) if config.allow_multiple => json!({
            "type": "array",
            "items": { "type": "string", "enum": config.options },
            "uniqueItems": true,
        }),
        QuestionConfig::MultipleChoice(config) => json!({
            "type": "string",
            "enum": config.options,
        }),
        QuestionConfig::Dropdown(config) => json!({
            "type": "string",
            "enum": config.options,
        }),
        QuestionConfig::Dichotomous(config) => json!({
            "type": "string",
            "enum": [config.yes_label, config.no_label],
        }),
        QuestionConfig::OpenEnded(config) => json!({
            "type": "string",
            "maxLength": config.max_length,
        }),
        QuestionConfig::Rating(config) => json!({
            "type": "number",
            "minimum": config.min,
            "maximum": config.max,
        }),
        QuestionConfig::Slider(config) => json!({
            "type": "number",
            "minimum": config.min,
            "maximum": config.max,
        }),
        QuestionConfig::OpinionScale(config) => json!({
            "type": "integer",
            "minimum": config.min,
            "maximum": config.max,
        }),
        QuestionConfig::LikertScale(config) => {
            let point = json!({
                "type": "integer",
                "minimum": config.scale.min,
                "maximum": config.scale.max,
            });
            keyed_schema(&config.statements, point, question.required)
        }
        QuestionConfig::Matrix(config) => {
            let column = json!({ "type": "string", "enum": config.columns });
            keyed_schema(&config.rows, column, question.required)
        }
        QuestionConfig::RankOrder(config) => json!({
            "type": "array",
            "items": { "type": "string", "enum": config.items },
            "minItems": config.items.len(),
            "maxItems": config.items.len(),
            "uniqueItems": true,
        }),
    };

    if let Value::Object(map) = &mut schema {
        map.insert("title".into(), Value::String(question.prompt.clone()));
    }
    schema
}

fn keyed_schema(keys: &[String], value_schema: Value, all_required: bool) -> Value {
    let properties: Map<String, Value> = keys
        .iter()
        .map(|key| (key.clone(), value_schema.clone()))
        .collect();
    let required: Vec<&String> = if all_required {
        keys.iter().collect()
    } else {
        Vec::new()
    };
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}
