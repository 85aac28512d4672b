#![allow(missing_docs)]

pub mod answers;
pub mod answers_schema;
pub mod builder;
pub mod error;
pub mod examples;
pub mod registry;
pub mod render;
pub mod runtime;
pub mod spec;
pub mod store;
pub mod validate;

pub use answers::{Answer, AnswerMap, ResponseEntry, Scalar, Submission};
pub use answers_schema::{definition_schema, generate as answers_schema};
pub use builder::BuilderController;
pub use error::SurveyError;
pub use examples::generate as example_answers;
pub use registry::{KindInfo, ListField, QuestionKind, default_config, kind_info, list_kinds};
pub use render::{
    RenderPayload, RenderProgress, RenderQuestion, RenderStatus, build_render_payload, render_card,
    render_json_ui, render_text, runtime_payload,
};
pub use runtime::{
    Clock, ManualClock, Progress, ResponseRuntime, ResponseSession, RuntimeError, RuntimeState,
    StepOutcome, SubmitOutcome, SystemClock,
};
pub use spec::{ConfigPatch, Question, QuestionConfig, QuestionPatch, Survey};
pub use store::{
    MemorySubmissionSink, MemorySurveyStore, PersistenceError, SubmissionSink, SurveyStore,
    TransportError,
};
pub use validate::{ValidationError, ValidationResult, check_answers, validate, validate_all};
