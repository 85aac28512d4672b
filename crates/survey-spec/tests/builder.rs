use survey_spec::{
    BuilderController, ListField, MemorySurveyStore, Question, QuestionConfig, QuestionKind,
    QuestionPatch, Survey, SurveyError, list_kinds, spec::ConfigPatch,
};

fn orders(survey: &Survey) -> Vec<usize> {
    survey.questions.iter().map(|question| question.order).collect()
}

fn options(survey: &Survey, id: &str) -> Vec<String> {
    survey
        .question(id)
        .expect("question")
        .items(ListField::Options)
        .expect("options")
        .to_vec()
}

#[test]
fn every_kind_gets_its_own_list_defaults() {
    let mut builder = BuilderController::new("Survey", "");
    for info in list_kinds() {
        let first = builder.add_question(info.kind).id.clone();
        let second = builder.add_question(info.kind).id.clone();
        let pristine = Question::create("fresh", info.kind, 0);

        for &field in info.kind.list_fields() {
            builder
                .update_item(&first, field, 0, "Edited")
                .expect("update item");
            builder.add_item(&first, field).expect("add item");

            let edited = builder.survey().question(&first).expect("first");
            assert_eq!(edited.items(field).expect("edited items")[0], "Edited");
            let untouched = builder.survey().question(&second).expect("second");
            assert_eq!(
                untouched.items(field).expect("untouched items"),
                pristine.items(field).expect("default items"),
                "{} {} shared with the edited question",
                info.kind,
                field
            );
        }
    }
}

#[test]
fn default_configs_are_independent_between_questions() {
    let mut builder = BuilderController::new("Survey", "");
    let first = builder.add_question(QuestionKind::MultipleChoice).id.clone();
    let second = builder.add_question(QuestionKind::MultipleChoice).id.clone();

    builder
        .update_item(&first, ListField::Options, 0, "Changed")
        .expect("update item");
    builder
        .add_item(&first, ListField::Options)
        .expect("add item");

    assert_eq!(
        options(builder.survey(), &first),
        vec!["Changed", "Option 2", "Option 3", "Option 4"]
    );
    assert_eq!(
        options(builder.survey(), &second),
        vec!["Option 1", "Option 2", "Option 3"]
    );
}

#[test]
fn duplicate_is_independent_of_its_source() {
    let mut builder = BuilderController::new("Survey", "");
    let source = builder.add_question(QuestionKind::Matrix).id.clone();
    builder
        .update_question(&source, QuestionPatch::prompt("Rate the rooms"))
        .expect("update prompt");

    let copy = builder.duplicate_question(&source).expect("duplicate").clone();
    assert_ne!(copy.id, source);
    assert_eq!(copy.prompt, "Rate the rooms (Copy)");
    assert_eq!(copy.order, 1);
    assert_eq!(builder.active_question_id(), Some(copy.id.as_str()));

    let original = builder.survey().question(&source).expect("source").clone();
    assert_eq!(copy.config, original.config);
    assert_eq!(copy.required, original.required);

    builder
        .update_item(&copy.id, ListField::Rows, 0, "Lobby")
        .expect("edit copy");
    let rows = builder
        .survey()
        .question(&source)
        .expect("source")
        .items(ListField::Rows)
        .expect("rows")
        .to_vec();
    assert_eq!(rows, vec!["Row 1", "Row 2"]);
}

#[test]
fn ordering_stays_dense_through_edits() {
    let mut builder = BuilderController::new("Survey", "");
    for kind in [
        QuestionKind::Rating,
        QuestionKind::Slider,
        QuestionKind::Dropdown,
        QuestionKind::RankOrder,
        QuestionKind::Dichotomous,
    ] {
        builder.add_question(kind);
    }
    builder.remove_question("q2").expect("remove");
    builder.reorder("q5", 0).expect("reorder");
    builder.duplicate_question("q3").expect("duplicate");
    builder.remove_question("q1").expect("remove");
    builder.add_question(QuestionKind::OpenEnded);
    builder.reorder("q4", 42).expect("reorder past end");

    let survey = builder.survey();
    assert_eq!(orders(survey), (0..survey.len()).collect::<Vec<_>>());
    let ids: Vec<&str> = survey.questions.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids, vec!["q5", "q3", "q6", "q7", "q4"]);
}

#[test]
fn removing_an_earlier_question_shifts_order_but_keeps_id() {
    let mut builder = BuilderController::new("Survey", "");
    let earlier = builder.add_question(QuestionKind::Rating).id.clone();
    let dichotomous = builder.add_question(QuestionKind::Dichotomous).clone();
    assert_eq!(dichotomous.order, 1);

    builder.remove_question(&earlier).expect("remove");

    let after = builder.survey().question(&dichotomous.id).expect("kept");
    assert_eq!(after.order, 0);
    assert_eq!(after.id, dichotomous.id);
}

#[test]
fn list_fields_never_drop_below_one_item() {
    let mut builder = BuilderController::new("Survey", "");
    let id = builder.add_question(QuestionKind::RankOrder).id.clone();

    assert_eq!(builder.remove_item(&id, ListField::Items, 0), Ok("Item 1".into()));
    assert_eq!(builder.remove_item(&id, ListField::Items, 0), Ok("Item 2".into()));
    assert_eq!(
        builder.remove_item(&id, ListField::Items, 0),
        Err(SurveyError::MinimumItems {
            field: ListField::Items
        })
    );
    assert_eq!(
        builder.remove_item(&id, ListField::Items, 3),
        Err(SurveyError::ItemIndexOutOfRange {
            field: ListField::Items,
            index: 3,
            len: 1
        })
    );
    assert_eq!(
        builder.remove_item(&id, ListField::Rows, 0),
        Err(SurveyError::ListFieldUnavailable {
            kind: QuestionKind::RankOrder,
            field: ListField::Rows
        })
    );
}

#[test]
fn focus_and_collapse_follow_edits() {
    let mut builder = BuilderController::new("Survey", "");
    let first = builder.add_question(QuestionKind::Rating).id.clone();
    let second = builder.add_question(QuestionKind::Slider).id.clone();
    assert_eq!(builder.active_question_id(), Some(second.as_str()));

    assert_eq!(builder.toggle_collapsed(&first), Ok(true));
    assert!(builder.is_collapsed(&first));
    assert_eq!(builder.toggle_collapsed(&first), Ok(false));

    builder.collapse_all();
    assert_eq!(builder.collapsed_ids().len(), 2);
    builder.remove_question(&second).expect("remove");
    assert_eq!(builder.active_question_id(), None);
    assert!(!builder.is_collapsed(&second));

    builder.expand_all();
    assert!(builder.collapsed_ids().is_empty());
    assert_eq!(
        builder.set_active(Some("missing")),
        Err(SurveyError::QuestionNotFound("missing".into()))
    );
}

#[test]
fn patches_ignore_fields_of_other_kinds() {
    let mut builder = BuilderController::new("Survey", "");
    let id = builder.add_question(QuestionKind::Rating).id.clone();
    let patch = QuestionPatch {
        required: Some(true),
        config: ConfigPatch {
            max: Some(10.0),
            options: Some(vec!["ignored".into()]),
            ..ConfigPatch::default()
        },
        ..QuestionPatch::default()
    };
    let updated = builder.update_question(&id, patch).expect("update");
    assert!(updated.required);
    match &updated.config {
        QuestionConfig::Rating(config) => assert_eq!(config.max, 10.0),
        other => panic!("unexpected config {:?}", other),
    }
}

#[test]
fn failed_save_keeps_builder_state() {
    let mut builder = BuilderController::new("Survey", "Before");
    builder.add_question(QuestionKind::OpinionScale);
    let before = builder.clone();

    let mut store = MemorySurveyStore::new();
    store.fail_next(1);
    assert!(builder.save(&mut store).is_err());
    assert_eq!(builder, before);
    assert!(store.latest().is_none());

    builder.save(&mut store).expect("retry save");
    assert_eq!(store.latest(), Some(builder.survey()));
}

#[test]
fn builder_state_serializes_with_survey() {
    let mut builder = BuilderController::new("Survey", "");
    let id = builder.add_question(QuestionKind::Dichotomous).id.clone();
    builder.toggle_collapsed(&id).expect("toggle");

    let json = serde_json::to_value(&builder).expect("serialize");
    assert_eq!(json["activeQuestionId"], id);
    assert_eq!(json["collapsedIds"][0], id);
    assert_eq!(json["survey"]["questions"][0]["type"], "dichotomous");
    assert_eq!(json["survey"]["questions"][0]["yesLabel"], "Yes");

    let restored: BuilderController = serde_json::from_value(json).expect("deserialize");
    assert_eq!(restored, builder);
}
