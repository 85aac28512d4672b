use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::registry::{ListField, QuestionKind};

/// Kind-specific settings, tagged by the question `type`.
///
/// The variant is the kind: a config can never describe a different kind than
/// the question carrying it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionConfig {
    MultipleChoice(MultipleChoiceConfig),
    LikertScale(LikertConfig),
    Rating(RatingConfig),
    Slider(SliderConfig),
    OpenEnded(OpenEndedConfig),
    Dropdown(DropdownConfig),
    Matrix(MatrixConfig),
    RankOrder(RankOrderConfig),
    Dichotomous(DichotomousConfig),
    OpinionScale(OpinionScaleConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MultipleChoiceConfig {
    pub options: Vec<String>,
    #[serde(default)]
    pub allow_multiple: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LikertScale {
    pub min: i64,
    pub max: i64,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LikertConfig {
    pub statements: Vec<String>,
    pub scale: LikertScale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RatingConfig {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SliderConfig {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    #[serde(default)]
    pub min_label: String,
    #[serde(default)]
    pub max_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenEndedConfig {
    #[serde(default)]
    pub placeholder: String,
    pub max_length: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DropdownConfig {
    pub options: Vec<String>,
    #[serde(default)]
    pub placeholder: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MatrixConfig {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RankOrderConfig {
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DichotomousConfig {
    pub yes_label: String,
    pub no_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpinionScaleConfig {
    pub min: i64,
    pub max: i64,
    #[serde(default)]
    pub left_label: String,
    #[serde(default)]
    pub right_label: String,
}

impl QuestionConfig {
    pub fn kind(&self) -> QuestionKind {
        match self {
            QuestionConfig::MultipleChoice(_) => QuestionKind::MultipleChoice,
            QuestionConfig::LikertScale(_) => QuestionKind::LikertScale,
            QuestionConfig::Rating(_) => QuestionKind::Rating,
            QuestionConfig::Slider(_) => QuestionKind::Slider,
            QuestionConfig::OpenEnded(_) => QuestionKind::OpenEnded,
            QuestionConfig::Dropdown(_) => QuestionKind::Dropdown,
            QuestionConfig::Matrix(_) => QuestionKind::Matrix,
            QuestionConfig::RankOrder(_) => QuestionKind::RankOrder,
            QuestionConfig::Dichotomous(_) => QuestionKind::Dichotomous,
            QuestionConfig::OpinionScale(_) => QuestionKind::OpinionScale,
        }
    }

    pub fn list(&self, field: ListField) -> Option<&Vec<String>> {
        match (self, field) {
            (QuestionConfig::MultipleChoice(config), ListField::Options) => Some(&config.options),
            (QuestionConfig::Dropdown(config), ListField::Options) => Some(&config.options),
            (QuestionConfig::LikertScale(config), ListField::Statements) => {
                Some(&config.statements)
            }
            (QuestionConfig::Matrix(config), ListField::Rows) => Some(&config.rows),
            (QuestionConfig::Matrix(config), ListField::Columns) => Some(&config.columns),
            (QuestionConfig::RankOrder(config), ListField::Items) => Some(&config.items),
            _ => None,
        }
    }

    pub fn list_mut(&mut self, field: ListField) -> Option<&mut Vec<String>> {
        match (self, field) {
            (QuestionConfig::MultipleChoice(config), ListField::Options) => {
                Some(&mut config.options)
            }
            (QuestionConfig::Dropdown(config), ListField::Options) => Some(&mut config.options),
            (QuestionConfig::LikertScale(config), ListField::Statements) => {
                Some(&mut config.statements)
            }
            (QuestionConfig::Matrix(config), ListField::Rows) => Some(&mut config.rows),
            (QuestionConfig::Matrix(config), ListField::Columns) => Some(&mut config.columns),
            (QuestionConfig::RankOrder(config), ListField::Items) => Some(&mut config.items),
            _ => None,
        }
    }

    /// True for a multiple choice question that accepts several options.
    pub fn is_multi_select(&self) -> bool {
        matches!(self, QuestionConfig::MultipleChoice(config) if config.allow_multiple)
    }

    /// Shallow-merges `patch`, returning the names of fields this kind does not own.
    pub fn apply(&mut self, patch: ConfigPatch) -> Vec<&'static str> {
        let mut ignored = Vec::new();
        let ConfigPatch {
            options,
            allow_multiple,
            statements,
            scale,
            min,
            max,
            step,
            min_label,
            max_label,
            placeholder,
            max_length,
            rows,
            columns,
            items,
            yes_label,
            no_label,
            left_label,
            right_label,
        } = patch;

        macro_rules! set {
            ($value:expr, $name:literal, $target:expr) => {
                if let Some(value) = $value {
                    match $target {
                        Some(slot) => *slot = value,
                        None => ignored.push($name),
                    }
                }
            };
        }

        set!(options, "options", match self {
            QuestionConfig::MultipleChoice(config) => Some(&mut config.options),
            QuestionConfig::Dropdown(config) => Some(&mut config.options),
            _ => None,
        });
        set!(allow_multiple, "allowMultiple", match self {
            QuestionConfig::MultipleChoice(config) => Some(&mut config.allow_multiple),
            _ => None,
        });
        set!(statements, "statements", match self {
            QuestionConfig::LikertScale(config) => Some(&mut config.statements),
            _ => None,
        });
        set!(scale, "scale", match self {
            QuestionConfig::LikertScale(config) => Some(&mut config.scale),
            _ => None,
        });
        set!(step, "step", match self {
            QuestionConfig::Rating(config) => Some(&mut config.step),
            QuestionConfig::Slider(config) => Some(&mut config.step),
            _ => None,
        });
        set!(min_label, "minLabel", match self {
            QuestionConfig::Slider(config) => Some(&mut config.min_label),
            _ => None,
        });
        set!(max_label, "maxLabel", match self {
            QuestionConfig::Slider(config) => Some(&mut config.max_label),
            _ => None,
        });
        set!(placeholder, "placeholder", match self {
            QuestionConfig::OpenEnded(config) => Some(&mut config.placeholder),
            QuestionConfig::Dropdown(config) => Some(&mut config.placeholder),
            _ => None,
        });
        set!(max_length, "maxLength", match self {
            QuestionConfig::OpenEnded(config) => Some(&mut config.max_length),
            _ => None,
        });
        set!(rows, "rows", match self {
            QuestionConfig::Matrix(config) => Some(&mut config.rows),
            _ => None,
        });
        set!(columns, "columns", match self {
            QuestionConfig::Matrix(config) => Some(&mut config.columns),
            _ => None,
        });
        set!(items, "items", match self {
            QuestionConfig::RankOrder(config) => Some(&mut config.items),
            _ => None,
        });
        set!(yes_label, "yesLabel", match self {
            QuestionConfig::Dichotomous(config) => Some(&mut config.yes_label),
            _ => None,
        });
        set!(no_label, "noLabel", match self {
            QuestionConfig::Dichotomous(config) => Some(&mut config.no_label),
            _ => None,
        });
        set!(left_label, "leftLabel", match self {
            QuestionConfig::OpinionScale(config) => Some(&mut config.left_label),
            _ => None,
        });
        set!(right_label, "rightLabel", match self {
            QuestionConfig::OpinionScale(config) => Some(&mut config.right_label),
            _ => None,
        });

        // Bounds are f64 for rating/slider and whole numbers for the opinion scale.
        for (value, name, is_min) in [(min, "min", true), (max, "max", false)] {
            let Some(value) = value else { continue };
            match self {
                QuestionConfig::Rating(RatingConfig { min, max, .. })
                | QuestionConfig::Slider(SliderConfig { min, max, .. }) => {
                    *(if is_min { min } else { max }) = value;
                }
                QuestionConfig::OpinionScale(config) => {
                    let rounded = value.round() as i64;
                    if is_min {
                        config.min = rounded;
                    } else {
                        config.max = rounded;
                    }
                }
                _ => ignored.push(name),
            }
        }

        ignored
    }
}

/// Partial config update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_multiple: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statements: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<LikertScale>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yes_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_label: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::default_config;

    #[test]
    fn apply_merges_owned_fields_and_reports_foreign_ones() {
        let mut config = default_config(QuestionKind::Slider);
        let ignored = config.apply(ConfigPatch {
            max: Some(10.0),
            min_label: Some("cold".into()),
            options: Some(vec!["x".into()]),
            ..ConfigPatch::default()
        });
        assert_eq!(ignored, vec!["options"]);
        let QuestionConfig::Slider(slider) = config else {
            panic!("slider config expected");
        };
        assert_eq!(slider.max, 10.0);
        assert_eq!(slider.min, 0.0);
        assert_eq!(slider.min_label, "cold");
    }

    #[test]
    fn opinion_scale_bounds_are_rounded() {
        let mut config = default_config(QuestionKind::OpinionScale);
        assert!(
            config
                .apply(ConfigPatch {
                    min: Some(1.4),
                    max: Some(6.6),
                    ..ConfigPatch::default()
                })
                .is_empty()
        );
        let QuestionConfig::OpinionScale(scale) = config else {
            panic!("opinion scale config expected");
        };
        assert_eq!((scale.min, scale.max), (1, 7));
    }

    #[test]
    fn list_access_follows_kind() {
        let config = default_config(QuestionKind::Matrix);
        assert_eq!(config.list(ListField::Rows).map(Vec::len), Some(2));
        assert_eq!(config.list(ListField::Columns).map(Vec::len), Some(3));
        assert!(config.list(ListField::Options).is_none());
    }
}
