use std::collections::BTreeMap;

use serde_json::json;
use survey_spec::{
    Answer, AnswerMap, QuestionKind, QuestionPatch, Scalar, Survey, answers_schema,
    check_answers, definition_schema, example_answers, validate,
};

fn fixture() -> Survey {
    Survey::from_json(include_str!("fixtures/feedback_survey.json")).expect("fixture")
}

fn likert(ratings: &[(&str, f64)]) -> Answer {
    Answer::Keyed(
        ratings
            .iter()
            .map(|(statement, value)| (statement.to_string(), Scalar::Number(*value)))
            .collect(),
    )
}

#[test]
fn required_likert_fails_iff_a_statement_is_unrated() {
    let survey = fixture();
    let question = survey.question("q2").expect("likert");

    assert_eq!(
        validate(question, None).as_deref(),
        Some("Please rate all statements.")
    );
    assert_eq!(
        validate(question, Some(&likert(&[("Staff were friendly", 5.0)]))).as_deref(),
        Some("Please rate all statements.")
    );
    for (first, second) in [(1.0, 1.0), (3.0, 5.0), (5.0, 2.0)] {
        let answer = likert(&[
            ("Staff were friendly", first),
            ("The wait was short", second),
        ]);
        assert_eq!(validate(question, Some(&answer)), None);
    }
}

#[test]
fn optional_questions_always_pass() {
    let survey = fixture();
    let question = survey.question("q6").expect("open");
    assert_eq!(validate(question, None), None);
    assert_eq!(validate(question, Some(&Answer::from(""))), None);
}

#[test]
fn empty_values_fail_required_checks() {
    let mut survey = Survey::default();
    let id = survey.add_question(QuestionKind::RankOrder).id.clone();
    survey.update(&id, QuestionPatch::required(true)).expect("required");
    let question = survey.question(&id).expect("question");

    assert!(validate(question, Some(&Answer::List(Vec::new()))).is_some());
    assert!(validate(question, Some(&Answer::from(""))).is_some());
    assert_eq!(
        validate(question, Some(&Answer::from(" "))),
        None,
        "whitespace is a value"
    );
}

#[test]
fn generated_examples_pass_validation() {
    let survey = fixture();
    let answers = example_answers(&survey);
    assert_eq!(answers.len(), survey.len());

    let result = check_answers(&survey, &answers);
    assert!(result.valid, "errors: {:?}", result.errors);
}

#[test]
fn check_answers_reports_shape_problems() {
    let survey = fixture();
    let mut answers = example_answers(&survey);
    answers.insert("q1".into(), Answer::from("Billboard"));
    answers.insert("q5".into(), Answer::Number(11.0));
    answers.insert("q6".into(), Answer::from("this answer is far too long"));
    answers.insert("q4".into(), Answer::List(vec!["Price".into()]));
    answers.insert("extra".into(), Answer::from("?"));

    let result = check_answers(&survey, &answers);
    assert!(!result.valid);
    let codes: BTreeMap<&str, &str> = result
        .errors
        .iter()
        .map(|error| (error.question_id.as_str(), error.code.as_str()))
        .collect();
    assert_eq!(codes.get("q1"), Some(&"option_mismatch"));
    assert_eq!(codes.get("q4"), Some(&"ranking_mismatch"));
    assert_eq!(codes.get("q5"), Some(&"max"));
    assert_eq!(codes.get("q6"), Some(&"max_length"));
    assert_eq!(result.unknown_fields, vec!["extra".to_string()]);
}

#[test]
fn check_answers_flags_missing_required() {
    let survey = fixture();
    let result = check_answers(&survey, &AnswerMap::new());
    let codes: Vec<(&str, &str)> = result
        .errors
        .iter()
        .map(|error| (error.question_id.as_str(), error.code.as_str()))
        .collect();
    assert_eq!(
        codes,
        vec![("q1", "required"), ("q2", "incomplete"), ("q5", "required")]
    );
}

#[test]
fn answers_schema_lists_required_ids() {
    let schema = answers_schema(&fixture());
    assert_eq!(schema["type"], "object");
    assert_eq!(schema["required"], json!(["q1", "q2", "q5"]));
    assert_eq!(schema["properties"]["q1"]["enum"], json!(["Friend", "Search", "Advert"]));
    assert_eq!(schema["properties"]["q2"]["type"], "object");
    assert_eq!(schema["properties"]["q4"]["minItems"], 3);
    assert_eq!(schema["properties"]["q5"]["maximum"], 10);
    assert_eq!(schema["properties"]["q6"]["maxLength"], 20);
}

#[test]
fn definition_schema_describes_surveys() {
    let schema = definition_schema();
    assert!(schema.is_object());
    assert!(schema.to_string().contains("questions"));
}
