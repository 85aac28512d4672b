//! Compiled-in catalog of the question kinds a survey can contain.

use std::{fmt, str::FromStr};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::SurveyError;
use crate::spec::config::{
    DichotomousConfig, DropdownConfig, LikertConfig, LikertScale, MatrixConfig,
    MultipleChoiceConfig, OpenEndedConfig, OpinionScaleConfig, QuestionConfig, RankOrderConfig,
    RatingConfig, SliderConfig,
};

/// Discriminant identifying a question's interaction type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    LikertScale,
    Rating,
    Slider,
    OpenEnded,
    Dropdown,
    Matrix,
    RankOrder,
    Dichotomous,
    OpinionScale,
}

/// Display metadata for one kind, as shown in the "add question" menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindInfo {
    pub kind: QuestionKind,
    pub display_name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
}

const CATALOG: [KindInfo; 10] = [
    KindInfo {
        kind: QuestionKind::MultipleChoice,
        display_name: "Multiple Choice",
        icon: "list-checks",
        description: "Pick one or several options from a list",
    },
    KindInfo {
        kind: QuestionKind::LikertScale,
        display_name: "Likert Scale",
        icon: "sliders-horizontal",
        description: "Rate agreement with a set of statements",
    },
    KindInfo {
        kind: QuestionKind::Rating,
        display_name: "Rating",
        icon: "star",
        description: "Score something on a star scale",
    },
    KindInfo {
        kind: QuestionKind::Slider,
        display_name: "Slider",
        icon: "gauge",
        description: "Choose a value along a numeric range",
    },
    KindInfo {
        kind: QuestionKind::OpenEnded,
        display_name: "Open Ended",
        icon: "message-square",
        description: "Free-form text answer",
    },
    KindInfo {
        kind: QuestionKind::Dropdown,
        display_name: "Dropdown",
        icon: "chevron-down",
        description: "Select one option from a compact list",
    },
    KindInfo {
        kind: QuestionKind::Matrix,
        display_name: "Matrix",
        icon: "grid",
        description: "Answer several rows against shared columns",
    },
    KindInfo {
        kind: QuestionKind::RankOrder,
        display_name: "Rank Order",
        icon: "arrow-up-down",
        description: "Order items by preference",
    },
    KindInfo {
        kind: QuestionKind::Dichotomous,
        display_name: "Yes / No",
        icon: "toggle-left",
        description: "Binary choice between two labels",
    },
    KindInfo {
        kind: QuestionKind::OpinionScale,
        display_name: "Opinion Scale",
        icon: "thermometer",
        description: "Pick a point between two opposing labels",
    },
];

/// All supported kinds in canonical presentation order.
pub fn list_kinds() -> &'static [KindInfo] {
    &CATALOG
}

/// Looks up display metadata by serialized label (`"rating"`, `"matrix"`, ...).
pub fn kind_info(label: &str) -> Result<&'static KindInfo, SurveyError> {
    let kind = label.parse::<QuestionKind>()?;
    Ok(kind.info())
}

/// Returns a freshly allocated default configuration for `kind`.
pub fn default_config(kind: QuestionKind) -> QuestionConfig {
    match kind {
        QuestionKind::MultipleChoice => QuestionConfig::MultipleChoice(MultipleChoiceConfig {
            options: numbered(ListField::Options, 3),
            allow_multiple: false,
        }),
        QuestionKind::LikertScale => QuestionConfig::LikertScale(LikertConfig {
            statements: numbered(ListField::Statements, 1),
            scale: LikertScale {
                min: 1,
                max: 5,
                labels: [
                    "Strongly Disagree",
                    "Disagree",
                    "Neutral",
                    "Agree",
                    "Strongly Agree",
                ]
                .into_iter()
                .map(String::from)
                .collect(),
            },
        }),
        QuestionKind::Rating => QuestionConfig::Rating(RatingConfig {
            min: 1.0,
            max: 5.0,
            step: 1.0,
        }),
        QuestionKind::Slider => QuestionConfig::Slider(SliderConfig {
            min: 0.0,
            max: 100.0,
            step: 1.0,
            min_label: String::new(),
            max_label: String::new(),
        }),
        QuestionKind::OpenEnded => QuestionConfig::OpenEnded(OpenEndedConfig {
            placeholder: "Type your answer here...".into(),
            max_length: 500,
        }),
        QuestionKind::Dropdown => QuestionConfig::Dropdown(DropdownConfig {
            options: numbered(ListField::Options, 3),
            placeholder: "Select an option".into(),
        }),
        QuestionKind::Matrix => QuestionConfig::Matrix(MatrixConfig {
            rows: numbered(ListField::Rows, 2),
            columns: numbered(ListField::Columns, 3),
        }),
        QuestionKind::RankOrder => QuestionConfig::RankOrder(RankOrderConfig {
            items: numbered(ListField::Items, 3),
        }),
        QuestionKind::Dichotomous => QuestionConfig::Dichotomous(DichotomousConfig {
            yes_label: "Yes".into(),
            no_label: "No".into(),
        }),
        QuestionKind::OpinionScale => QuestionConfig::OpinionScale(OpinionScaleConfig {
            min: 0,
            max: 10,
            left_label: "Not likely".into(),
            right_label: "Extremely likely".into(),
        }),
    }
}

fn numbered(field: ListField, count: usize) -> Vec<String> {
    (0..count).map(|idx| field.item_label(idx)).collect()
}

impl QuestionKind {
    pub fn info(self) -> &'static KindInfo {
        // CATALOG is declared in enum order.
        &CATALOG[self as usize]
    }

    pub fn display_name(self) -> &'static str {
        self.info().display_name
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::LikertScale => "likert_scale",
            QuestionKind::Rating => "rating",
            QuestionKind::Slider => "slider",
            QuestionKind::OpenEnded => "open_ended",
            QuestionKind::Dropdown => "dropdown",
            QuestionKind::Matrix => "matrix",
            QuestionKind::RankOrder => "rank_order",
            QuestionKind::Dichotomous => "dichotomous",
            QuestionKind::OpinionScale => "opinion_scale",
        }
    }

    /// List-valued config fields editable through the item helpers.
    pub fn list_fields(self) -> &'static [ListField] {
        match self {
            QuestionKind::MultipleChoice | QuestionKind::Dropdown => &[ListField::Options],
            QuestionKind::LikertScale => &[ListField::Statements],
            QuestionKind::Matrix => &[ListField::Rows, ListField::Columns],
            QuestionKind::RankOrder => &[ListField::Items],
            _ => &[],
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionKind {
    type Err = SurveyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase().replace(['-', ' '], "_");
        CATALOG
            .iter()
            .map(|info| info.kind)
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| SurveyError::UnsupportedKind(value.to_string()))
    }
}

/// A list-valued configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ListField {
    Options,
    Statements,
    Rows,
    Columns,
    Items,
}

impl ListField {
    /// Placeholder label for the item at zero-based `index`.
    pub fn item_label(self, index: usize) -> String {
        let noun = match self {
            ListField::Options => "Option",
            ListField::Statements => "Statement",
            ListField::Rows => "Row",
            ListField::Columns => "Column",
            ListField::Items => "Item",
        };
        format!("{} {}", noun, index + 1)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ListField::Options => "options",
            ListField::Statements => "statements",
            ListField::Rows => "rows",
            ListField::Columns => "columns",
            ListField::Items => "items",
        }
    }
}

impl fmt::Display for ListField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "options" | "option" => Ok(ListField::Options),
            "statements" | "statement" => Ok(ListField::Statements),
            "rows" | "row" => Ok(ListField::Rows),
            "columns" | "column" => Ok(ListField::Columns),
            "items" | "item" => Ok(ListField::Items),
            _ => Err(format!("unknown list field '{}'", value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_follows_enum_order() {
        for (idx, info) in list_kinds().iter().enumerate() {
            assert_eq!(info.kind as usize, idx);
            assert_eq!(info.kind.info().kind, info.kind);
        }
        assert_eq!(list_kinds().len(), 10);
    }

    #[test]
    fn parse_accepts_labels_and_rejects_unknown() {
        assert_eq!(
            "likert_scale".parse::<QuestionKind>(),
            Ok(QuestionKind::LikertScale)
        );
        assert_eq!(
            "Opinion Scale".parse::<QuestionKind>(),
            Ok(QuestionKind::OpinionScale)
        );
        assert_eq!(
            "net_promoter".parse::<QuestionKind>(),
            Err(SurveyError::UnsupportedKind("net_promoter".into()))
        );
        assert!(kind_info("captcha").is_err());
    }

    #[test]
    fn default_config_matches_kind() {
        for info in list_kinds() {
            assert_eq!(default_config(info.kind).kind(), info.kind);
        }
    }
}
