use chrono::{TimeDelta, TimeZone, Utc};
use survey_spec::{
    Answer, ManualClock, MemorySubmissionSink, QuestionKind, QuestionPatch, ResponseRuntime,
    RuntimeError, RuntimeState, StepOutcome, SubmitOutcome, Survey, SurveyError,
    spec::ConfigPatch,
};

fn clock() -> ManualClock {
    ManualClock::new(
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0)
            .single()
            .expect("valid start"),
    )
}

/// Required multiple choice (A/B) followed by an optional open question.
fn two_question_survey() -> Survey {
    let mut survey = Survey::new("Quick poll", "");
    let choice = survey.add_question(QuestionKind::MultipleChoice).id.clone();
    survey
        .update(
            &choice,
            QuestionPatch {
                required: Some(true),
                config: ConfigPatch {
                    options: Some(vec!["A".into(), "B".into()]),
                    allow_multiple: Some(false),
                    ..ConfigPatch::default()
                },
                ..QuestionPatch::default()
            },
        )
        .expect("configure choice");
    survey.add_question(QuestionKind::OpenEnded);
    survey
}

#[test]
fn required_choice_then_optional_text() {
    let clock = clock();
    let mut runtime =
        ResponseRuntime::with_clock("poll-1", two_question_survey(), clock.clone()).expect("load");

    assert_eq!(
        runtime.next().expect("next"),
        StepOutcome::Blocked("This question is required.".into())
    );
    assert_eq!(runtime.current_index(), 0);
    assert_eq!(runtime.error_for("q1"), Some("This question is required."));

    runtime.answer("q1", "A").expect("answer");
    assert_eq!(runtime.error_for("q1"), None);
    assert_eq!(runtime.next().expect("next"), StepOutcome::Moved(1));
    assert!(runtime.is_last());
    assert_eq!(runtime.next().expect("next"), StepOutcome::AtEnd);

    clock.advance(TimeDelta::seconds(42));
    let mut sink = MemorySubmissionSink::new();
    let SubmitOutcome::Completed(submission) = runtime.submit(&mut sink).expect("submit") else {
        panic!("expected a completed submission");
    };

    let responses: Vec<_> = submission
        .responses
        .iter()
        .map(|entry| (entry.question_id.as_str(), entry.answer.clone(), entry.kind))
        .collect();
    assert_eq!(
        responses,
        vec![
            ("q1", Answer::from("A"), QuestionKind::MultipleChoice),
            ("q2", Answer::from(""), QuestionKind::OpenEnded),
        ]
    );
    assert_eq!(submission.survey_id, "poll-1");
    assert_eq!(submission.time_spent, 42);
    assert_eq!(submission.completed_at, "2026-03-01T09:30:42Z");
    assert!(!submission.anonymous);
    assert_eq!(sink.delivered, vec![submission]);
    assert_eq!(runtime.state(), RuntimeState::Completed);
    assert!(matches!(
        runtime.answer("q2", "late"),
        Err(RuntimeError::AlreadyCompleted)
    ));
}

#[test]
fn retry_after_transport_failure_resends_same_responses() {
    let clock = clock();
    let mut runtime =
        ResponseRuntime::with_clock("poll-2", two_question_survey(), clock.clone()).expect("load");
    runtime.answer("q1", "B").expect("answer");
    runtime.answer("q2", "Great").expect("answer");
    runtime.set_anonymous(true);

    let mut sink = MemorySubmissionSink::new();
    sink.fail_next(1);
    let err = runtime.submit(&mut sink).expect_err("first attempt fails");
    assert!(matches!(err, RuntimeError::SubmissionFailed(_)));
    assert!(!runtime.is_completed());
    assert_eq!(runtime.answer_for("q2"), Some(&Answer::from("Great")));
    let first_attempt = runtime.build_submission();

    clock.advance(TimeDelta::seconds(5));
    let SubmitOutcome::Completed(submission) = runtime.submit(&mut sink).expect("retry") else {
        panic!("expected a completed submission");
    };
    assert_eq!(submission.responses, first_attempt.responses);
    assert_eq!(submission.anonymous, first_attempt.anonymous);
    assert_eq!(submission.time_spent, first_attempt.time_spent + 5);
    assert_eq!(sink.delivered.len(), 1);
}

#[test]
fn submit_jumps_to_first_invalid_question() {
    let fixture = include_str!("fixtures/feedback_survey.json");
    let survey = Survey::from_json(fixture).expect("fixture");
    let mut runtime = ResponseRuntime::with_clock("visit", survey, clock()).expect("load");

    runtime.answer("q1", "Search").expect("answer");
    runtime.answer_sub("q2", "Staff were friendly", 4.0).expect("rate");
    runtime.next().expect("next");
    runtime.next().expect("next");
    assert_eq!(runtime.current_index(), 1);

    let mut sink = MemorySubmissionSink::new();
    let outcome = runtime.submit(&mut sink).expect("submit");
    let SubmitOutcome::Invalid {
        errors,
        first_invalid_index,
    } = outcome
    else {
        panic!("expected validation errors");
    };
    assert_eq!(first_invalid_index, 1);
    assert_eq!(errors.get("q2").map(String::as_str), Some("Please rate all statements."));
    assert_eq!(errors.get("q5").map(String::as_str), Some("This question is required."));
    assert_eq!(runtime.current_index(), 1);
    assert!(sink.delivered.is_empty());
}

#[test]
fn previous_never_validates_and_stops_at_first() {
    let mut runtime =
        ResponseRuntime::with_clock("poll", two_question_survey(), clock()).expect("load");
    assert_eq!(runtime.previous().expect("previous"), 0);
    runtime.answer("q1", "A").expect("answer");
    runtime.next().expect("next");
    assert_eq!(runtime.previous().expect("previous"), 0);
    assert_eq!(runtime.answer_for("q1"), Some(&Answer::from("A")));
}

#[test]
fn multi_select_toggles_keep_option_order() {
    let mut survey = Survey::default();
    let id = survey.add_question(QuestionKind::MultipleChoice).id.clone();
    survey
        .update(
            &id,
            QuestionPatch::config(ConfigPatch {
                allow_multiple: Some(true),
                ..ConfigPatch::default()
            }),
        )
        .expect("multi");
    let mut runtime = ResponseRuntime::with_clock("multi", survey, clock()).expect("load");

    assert!(runtime.toggle_choice(&id, "Option 3").expect("toggle"));
    assert!(runtime.toggle_choice(&id, "Option 1").expect("toggle"));
    assert_eq!(
        runtime.answer_for(&id),
        Some(&Answer::List(vec!["Option 1".into(), "Option 3".into()]))
    );
    assert!(!runtime.toggle_choice(&id, "Option 3").expect("toggle"));
    assert_eq!(
        runtime.answer_for(&id),
        Some(&Answer::List(vec!["Option 1".into()]))
    );
    assert_eq!(runtime.progress().answered, 1);
}

#[test]
fn keyed_answers_only_for_likert_and_matrix() {
    let fixture = include_str!("fixtures/feedback_survey.json");
    let survey = Survey::from_json(fixture).expect("fixture");
    let mut runtime = ResponseRuntime::with_clock("visit", survey, clock()).expect("load");

    runtime.answer_sub("q3", "Food", "Great").expect("matrix row");
    assert!(matches!(
        runtime.answer_sub("q5", "x", 3.0),
        Err(RuntimeError::SubKeyUnsupported {
            kind: QuestionKind::OpinionScale,
            ..
        })
    ));
    assert!(matches!(
        runtime.answer("nope", "x"),
        Err(RuntimeError::QuestionNotFound(_))
    ));
}

#[test]
fn empty_survey_cannot_be_taken() {
    assert!(matches!(
        ResponseRuntime::load("empty", Survey::default()),
        Err(RuntimeError::EmptySurvey)
    ));
}

#[test]
fn elapsed_time_follows_the_clock() {
    let clock = clock();
    let runtime =
        ResponseRuntime::with_clock("poll", two_question_survey(), clock.clone()).expect("load");
    clock.advance(TimeDelta::minutes(2));
    assert_eq!(runtime.elapsed(), TimeDelta::seconds(120));
}

#[test]
fn deserialized_survey_with_repeated_ids_is_refused() {
    let survey: Survey = serde_json::from_str(
        r#"{"title":"Twice","questions":[
            {"id":"q1","type":"dichotomous","question":"Visited?","required":true,"order":0,
             "yesLabel":"Yes","noLabel":"No"},
            {"id":"q1","type":"rating","question":"Score","required":true,"order":1,
             "min":1,"max":5,"step":1}
        ]}"#,
    )
    .expect("shape parses");
    assert!(matches!(
        ResponseRuntime::with_clock("twice", survey, clock()),
        Err(RuntimeError::InvalidSurvey(SurveyError::DuplicateQuestionId(id))) if id == "q1"
    ));
}
