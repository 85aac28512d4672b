pub mod config;
pub mod question;
pub mod survey;

pub use config::{
    ConfigPatch, DichotomousConfig, DropdownConfig, LikertConfig, LikertScale, MatrixConfig,
    MultipleChoiceConfig, OpenEndedConfig, OpinionScaleConfig, QuestionConfig, RankOrderConfig,
    RatingConfig, SliderConfig,
};
pub use question::{Question, QuestionPatch};
pub use survey::Survey;
