use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use survey_spec::{
    AnswerMap, BuilderController, ListField, MemorySubmissionSink, Question, QuestionKind,
    QuestionPatch, RenderPayload, ResponseRuntime, RuntimeError, SubmitOutcome, Survey,
    SurveyError, answers_schema, build_render_payload, check_answers, example_answers,
    list_kinds as kind_catalog, render_card as survey_render_card,
    render_json_ui as survey_render_json_ui, render_text as survey_render_text,
};

const PREVIEW_ID: &str = "preview";

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse answers: {0}")]
    AnswersParse(#[source] serde_json::Error),
    #[error("failed to parse edit: {0}")]
    EditParse(#[source] serde_json::Error),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
    #[error("survey has no questions")]
    EmptySurvey,
    #[error(transparent)]
    Survey(#[from] SurveyError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Builder operation applied by [`apply_edit`].
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum EditCommand {
    SetTitle {
        title: String,
    },
    SetDescription {
        description: String,
    },
    AddQuestion {
        kind: String,
    },
    RemoveQuestion {
        id: String,
    },
    DuplicateQuestion {
        id: String,
    },
    Reorder {
        id: String,
        index: usize,
    },
    UpdateQuestion {
        id: String,
        patch: QuestionPatch,
    },
    AddItem {
        id: String,
        field: ListField,
    },
    UpdateItem {
        id: String,
        field: ListField,
        index: usize,
        value: String,
    },
    RemoveItem {
        id: String,
        field: ListField,
        index: usize,
    },
}

fn parse_survey(survey_json: &str) -> Result<Survey, ComponentError> {
    Survey::from_json(survey_json).map_err(ComponentError::from)
}

fn parse_answers(answers_json: &str) -> Result<AnswerMap, ComponentError> {
    if answers_json.trim().is_empty() {
        return Ok(AnswerMap::new());
    }
    serde_json::from_str(answers_json).map_err(ComponentError::AnswersParse)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, ComponentError> {
    serde_json::to_value(value).map_err(ComponentError::JsonEncode)
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn respond_string(result: Result<String, ComponentError>) -> String {
    match result {
        Ok(value) => value,
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

/// The kind catalog in presentation order.
pub fn list_kinds() -> String {
    respond(to_json(&kind_catalog()))
}

/// A freshly created question of `kind`, as the builder would add it.
pub fn default_question(kind: &str) -> String {
    respond(
        kind.parse::<QuestionKind>()
            .map_err(ComponentError::from)
            .and_then(|kind| to_json(&Question::create("q1", kind, 0))),
    )
}

/// The survey definition with its ordering repaired.
pub fn describe(survey_json: &str) -> String {
    respond(parse_survey(survey_json).and_then(|survey| to_json(&survey)))
}

fn run_edit(builder: &mut BuilderController, command: EditCommand) -> Result<Value, ComponentError> {
    let result = match command {
        EditCommand::SetTitle { title } => {
            builder.set_title(title);
            Value::Null
        }
        EditCommand::SetDescription { description } => {
            builder.set_description(description);
            Value::Null
        }
        EditCommand::AddQuestion { kind } => {
            let kind = kind.parse::<QuestionKind>()?;
            json!({ "questionId": builder.add_question(kind).id })
        }
        EditCommand::RemoveQuestion { id } => to_json(&builder.remove_question(&id)?)?,
        EditCommand::DuplicateQuestion { id } => {
            json!({ "questionId": builder.duplicate_question(&id)?.id })
        }
        EditCommand::Reorder { id, index } => {
            builder.reorder(&id, index)?;
            Value::Null
        }
        EditCommand::UpdateQuestion { id, patch } => to_json(builder.update_question(&id, patch)?)?,
        EditCommand::AddItem { id, field } => json!({ "index": builder.add_item(&id, field)? }),
        EditCommand::UpdateItem {
            id,
            field,
            index,
            value,
        } => {
            builder.update_item(&id, field, index, value)?;
            Value::Null
        }
        EditCommand::RemoveItem { id, field, index } => {
            json!({ "removed": builder.remove_item(&id, field, index)? })
        }
    };
    Ok(result)
}

/// Applies one builder command and returns the edited survey plus the command result.
pub fn apply_edit(survey_json: &str, edit_json: &str) -> String {
    respond(parse_survey(survey_json).and_then(|survey| {
        let command: EditCommand =
            serde_json::from_str(edit_json).map_err(ComponentError::EditParse)?;
        debug!(?command, "applying edit");
        let mut builder = BuilderController::from_survey(survey);
        let result = run_edit(&mut builder, command)?;
        Ok(json!({
            "survey": to_json(builder.survey())?,
            "result": result,
        }))
    }))
}

pub fn validate_answers(survey_json: &str, answers_json: &str) -> String {
    respond(parse_survey(survey_json).and_then(|survey| {
        let answers = parse_answers(answers_json)?;
        to_json(&check_answers(&survey, &answers))
    }))
}

pub fn get_answer_schema(survey_json: &str) -> String {
    respond(parse_survey(survey_json).map(|survey| answers_schema(&survey)))
}

pub fn get_example_answers(survey_json: &str) -> String {
    respond(parse_survey(survey_json).and_then(|survey| to_json(&example_answers(&survey))))
}

fn render_payload(
    survey_json: &str,
    answers_json: &str,
    index: usize,
) -> Result<RenderPayload, ComponentError> {
    let survey = parse_survey(survey_json)?;
    let answers = parse_answers(answers_json)?;
    let errors = Default::default();
    build_render_payload(PREVIEW_ID, &survey, &answers, index, &errors).ok_or(ComponentError::EmptySurvey)
}

pub fn render_text(survey_json: &str, answers_json: &str, index: usize) -> String {
    respond_string(
        render_payload(survey_json, answers_json, index)
            .map(|payload| survey_render_text(&payload)),
    )
}

pub fn render_json_ui(survey_json: &str, answers_json: &str, index: usize) -> String {
    respond(
        render_payload(survey_json, answers_json, index)
            .map(|payload| survey_render_json_ui(&payload)),
    )
}

pub fn render_card(survey_json: &str, answers_json: &str, index: usize) -> String {
    respond(
        render_payload(survey_json, answers_json, index)
            .map(|payload| survey_render_card(&payload)),
    )
}

/// Runs a whole response session from a prepared answer map.
///
/// Returns `{"status":"complete","submission":...}` or
/// `{"status":"error","errors":...,"firstInvalidIndex":...}`.
pub fn submit_all(survey_id: &str, survey_json: &str, answers_json: &str, anonymous: bool) -> String {
    respond(parse_survey(survey_json).and_then(|survey| {
        let answers = parse_answers(answers_json)?;
        let mut runtime = ResponseRuntime::load(survey_id, survey)?;
        runtime.set_anonymous(anonymous);
        for (question_id, answer) in answers {
            runtime.answer(&question_id, answer)?;
        }

        let mut sink = MemorySubmissionSink::new();
        match runtime.submit(&mut sink)? {
            SubmitOutcome::Completed(submission) => Ok(json!({
                "status": "complete",
                "submission": to_json(&submission)?,
            })),
            SubmitOutcome::Invalid {
                errors,
                first_invalid_index,
            } => Ok(json!({
                "status": "error",
                "errors": errors,
                "firstInvalidIndex": first_invalid_index,
            })),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survey_json() -> String {
        json!({
            "title": "Checkout",
            "description": "",
            "questions": [
                {
                    "id": "q1",
                    "type": "dichotomous",
                    "question": "Did you find everything?",
                    "required": true,
                    "order": 0,
                    "yesLabel": "Yes",
                    "noLabel": "No"
                },
                {
                    "id": "q2",
                    "type": "rating",
                    "question": "Rate checkout",
                    "required": false,
                    "order": 1,
                    "min": 1,
                    "max": 5,
                    "step": 1
                }
            ]
        })
        .to_string()
    }

    fn parse(output: &str) -> Value {
        serde_json::from_str(output).expect("json")
    }

    #[test]
    fn list_kinds_returns_catalog() {
        let kinds = parse(&list_kinds());
        let kinds = kinds.as_array().expect("array");
        assert_eq!(kinds.len(), 10);
        assert_eq!(kinds[0]["kind"], "multiple_choice");
        assert_eq!(kinds[9]["displayName"], "Opinion Scale");
    }

    #[test]
    fn default_question_uses_kind_defaults() {
        let question = parse(&default_question("opinion_scale"));
        assert_eq!(question["type"], "opinion_scale");
        assert_eq!(question["max"], 10);
        assert_eq!(question["question"], "New Opinion Scale question");

        let error = parse(&default_question("captcha"));
        assert_eq!(error["error"], "unsupported question kind 'captcha'");
    }

    #[test]
    fn describe_normalizes_order() {
        let survey = json!({
            "title": "t",
            "questions": [
                { "id": "b", "type": "rank_order", "question": "b", "order": 7, "items": ["x"] },
                { "id": "a", "type": "rank_order", "question": "a", "order": 3, "items": ["y"] }
            ]
        });
        let described = parse(&describe(&survey.to_string()));
        assert_eq!(described["questions"][0]["id"], "a");
        assert_eq!(described["questions"][0]["order"], 0);
        assert_eq!(described["questions"][1]["order"], 1);
    }

    #[test]
    fn apply_edit_adds_and_reorders() {
        let added = parse(&apply_edit(&survey_json(), r#"{"op":"add_question","kind":"slider"}"#));
        assert_eq!(added["result"]["questionId"], "q3");
        assert_eq!(added["survey"]["questions"][2]["type"], "slider");

        let moved = parse(&apply_edit(
            &added["survey"].to_string(),
            r#"{"op":"reorder","id":"q3","index":0}"#,
        ));
        assert_eq!(moved["survey"]["questions"][0]["id"], "q3");
        assert_eq!(moved["survey"]["questions"][2]["order"], 2);
    }

    #[test]
    fn apply_edit_reports_model_errors() {
        let response = parse(&apply_edit(
            &survey_json(),
            r#"{"op":"remove_item","id":"q1","field":"options","index":0}"#,
        ));
        assert_eq!(response["error"], "dichotomous questions have no options");

        let response = parse(&apply_edit(&survey_json(), r#"{"op":"explode"}"#));
        assert!(
            response["error"]
                .as_str()
                .is_some_and(|error| error.starts_with("failed to parse edit"))
        );
    }

    #[test]
    fn validate_answers_reports_missing_required() {
        let result = parse(&validate_answers(&survey_json(), "{}"));
        assert_eq!(result["valid"], false);
        assert_eq!(result["errors"][0]["questionId"], "q1");
        assert_eq!(result["errors"][0]["code"], "required");

        let result = parse(&validate_answers(&survey_json(), r#"{"q1":"Yes","q2":4}"#));
        assert_eq!(result["valid"], true);
    }

    #[test]
    fn schema_and_examples_agree() {
        let schema = parse(&get_answer_schema(&survey_json()));
        assert_eq!(schema["required"], json!(["q1"]));

        let examples = get_example_answers(&survey_json());
        let result = parse(&validate_answers(&survey_json(), &examples));
        assert_eq!(result["valid"], true);
    }

    #[test]
    fn renderers_follow_index() {
        let text = render_text(&survey_json(), "{}", 0);
        assert!(text.contains("1/2 Did you find everything? *"));

        let ui = parse(&render_json_ui(&survey_json(), r#"{"q2":3}"#, 1));
        assert_eq!(ui["question"]["current_value"], 3.0);
        assert_eq!(ui["is_last"], true);

        let card = parse(&render_card(&survey_json(), "{}", 1));
        assert_eq!(card["version"], "1.3");
        let actions = card["actions"].as_array().expect("actions");
        assert_eq!(actions[1]["data"]["survey"]["mode"], "submit");
    }

    #[test]
    fn submit_all_returns_submission_or_errors() {
        let response = parse(&submit_all("checkout", &survey_json(), r#"{"q1":"No"}"#, true));
        assert_eq!(response["status"], "complete");
        assert_eq!(response["submission"]["surveyId"], "checkout");
        assert_eq!(response["submission"]["anonymous"], true);
        assert_eq!(response["submission"]["responses"][1]["answer"], "");
        assert_eq!(response["submission"]["responses"][1]["type"], "rating");

        let response = parse(&submit_all("checkout", &survey_json(), "{}", false));
        assert_eq!(response["status"], "error");
        assert_eq!(response["errors"]["q1"], "This question is required.");
        assert_eq!(response["firstInvalidIndex"], 0);
    }

    #[test]
    fn unusable_definitions_come_back_as_errors() {
        let extreme = json!({
            "title": "Scale",
            "questions": [{
                "id": "q1",
                "type": "likert_scale",
                "question": "Agree?",
                "order": 0,
                "statements": ["It works"],
                "scale": { "min": 0, "max": i64::MAX }
            }]
        })
        .to_string();
        let response = parse(&get_example_answers(&extreme));
        assert_eq!(
            response["error"],
            format!("question 'q1' has an unusable scale 0..={}", i64::MAX)
        );

        let repeated = json!({
            "title": "Twice",
            "questions": [
                { "id": "q1", "type": "dichotomous", "question": "a", "order": 0,
                  "yesLabel": "Yes", "noLabel": "No" },
                { "id": "q1", "type": "rank_order", "question": "b", "order": 1, "items": ["x"] }
            ]
        })
        .to_string();
        let response = parse(&submit_all("twice", &repeated, r#"{"q1":"Yes"}"#, false));
        assert_eq!(response["error"], "question id 'q1' is used more than once");
    }
}
