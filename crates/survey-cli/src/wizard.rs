//! Respondent-side presentation and answer parsing for `survey take`.

use std::collections::BTreeMap;

use survey_spec::{
    Answer, Question, QuestionConfig, RenderPayload, Scalar, Submission, render_card,
    render_json_ui, render_text,
};

/// Controls which bits of state the presenter prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: question prompts only.
    Clean,
    /// Verbose output: status and progress counters too.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum RenderMode {
    Text,
    Json,
    Card,
}

/// Prints questions as the runtime moves through the survey.
pub struct Presenter {
    verbosity: Verbosity,
    mode: RenderMode,
    show_submission_json: bool,
}

impl Presenter {
    pub fn new(verbosity: Verbosity, mode: RenderMode, show_submission_json: bool) -> Self {
        Self {
            verbosity,
            mode,
            show_submission_json,
        }
    }

    pub fn show_question(&self, payload: &RenderPayload) {
        if self.verbosity.is_verbose() {
            println!(
                "Status: {} ({}/{} answered)",
                payload.status.as_str(),
                payload.progress.answered,
                payload.progress.total
            );
        }
        match self.mode {
            RenderMode::Text => println!("{}", render_text(payload)),
            RenderMode::Json => print_json(&render_json_ui(payload)),
            RenderMode::Card => print_json(&render_card(payload)),
        }
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if let Some(expected) = &error.expected {
            eprintln!("  Expected: {}", expected);
        }
    }

    pub fn show_errors(&self, errors: &BTreeMap<String, String>) {
        println!("Please fix the following before submitting:");
        for (question_id, message) in errors {
            println!("  {} - {}", question_id, message);
        }
    }

    pub fn show_completion(&self, submission: &Submission) {
        println!("Submitted ✅");
        match submission.to_cbor() {
            Ok(bytes) => println!("Submission (CBOR hex): {}", encode_hex(&bytes)),
            Err(err) => eprintln!("Failed to serialize submission to CBOR: {}", err),
        }
        if self.show_submission_json {
            match submission.to_json_pretty() {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => eprintln!("Failed to serialize submission to JSON: {}", err),
            }
        }
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(pretty) => println!("{}", pretty),
        Err(err) => eprintln!("Failed to render JSON: {}", err),
    }
}

/// Error produced when parsing answers typed by the respondent.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub expected: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, expected: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            expected,
        }
    }
}

/// Resolves `raw` against `options` either by 1-based number or by exact text.
fn pick(options: &[String], raw: &str) -> Result<String, AnswerParseError> {
    let raw = raw.trim();
    if let Ok(number) = raw.parse::<usize>()
        && let Some(option) = number.checked_sub(1).and_then(|idx| options.get(idx))
    {
        return Ok(option.clone());
    }
    options
        .iter()
        .find(|option| option.eq_ignore_ascii_case(raw))
        .cloned()
        .ok_or_else(|| {
            AnswerParseError::new(
                format!("'{}' is not one of the choices", raw),
                Some(format!("a number 1-{} or one of: {}", options.len(), options.join(", "))),
            )
        })
}

fn pick_many(options: &[String], raw: &str) -> Result<Vec<String>, AnswerParseError> {
    raw.split(',').map(|part| pick(options, part)).collect()
}

fn parse_number(raw: &str, min: f64, max: f64) -> Result<f64, AnswerParseError> {
    let value = raw.trim().parse::<f64>().map_err(|_| {
        AnswerParseError::new(
            format!("'{}' is not a number", raw.trim()),
            Some(format!("a number from {} to {}", min, max)),
        )
    })?;
    if !value.is_finite() || value < min || value > max {
        return Err(AnswerParseError::new(
            format!("{} is outside the scale", value),
            Some(format!("a number from {} to {}", min, max)),
        ));
    }
    Ok(value)
}

/// Turns one line of respondent input into an answer for `question`.
///
/// Choice questions take numbers or option text; multi-value questions take a
/// comma separated list in display order. An empty line clears the answer.
pub fn parse_answer(question: &Question, raw: &str) -> Result<Answer, AnswerParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Answer::empty_for(question));
    }

    let answer = match &question.config {
        QuestionConfig::MultipleChoice(config) if config.allow_multiple => {
            let mut picked = pick_many(&config.options, raw)?;
            picked.sort_by_key(|choice| config.options.iter().position(|option| option == choice));
            picked.dedup();
            Answer::List(picked)
        }
        QuestionConfig::MultipleChoice(config) => Answer::Text(pick(&config.options, raw)?),
        QuestionConfig::Dropdown(config) => Answer::Text(pick(&config.options, raw)?),
        QuestionConfig::Dichotomous(config) => {
            let label = match raw.to_lowercase().as_str() {
                "y" | "yes" | "1" => config.yes_label.clone(),
                "n" | "no" | "2" => config.no_label.clone(),
                _ => pick(&[config.yes_label.clone(), config.no_label.clone()], raw)?,
            };
            Answer::Text(label)
        }
        QuestionConfig::OpenEnded(config) => {
            let length = raw.chars().count();
            if length > config.max_length as usize {
                return Err(AnswerParseError::new(
                    format!("answer is {} characters long", length),
                    Some(format!("at most {} characters", config.max_length)),
                ));
            }
            Answer::Text(raw.to_string())
        }
        QuestionConfig::Rating(config) => Answer::Number(parse_number(raw, config.min, config.max)?),
        QuestionConfig::Slider(config) => Answer::Number(parse_number(raw, config.min, config.max)?),
        QuestionConfig::OpinionScale(config) => {
            let value = parse_number(raw, config.min as f64, config.max as f64)?;
            if value.fract() != 0.0 {
                return Err(AnswerParseError::new(
                    format!("{} is not a whole number", value),
                    Some(format!("a whole number from {} to {}", config.min, config.max)),
                ));
            }
            Answer::Number(value)
        }
        QuestionConfig::LikertScale(config) => {
            let ratings = split_per_key(&config.statements, raw)?;
            let mut values = BTreeMap::new();
            for (statement, rating) in config.statements.iter().zip(ratings) {
                let value = parse_number(rating, config.scale.min as f64, config.scale.max as f64)?;
                values.insert(statement.clone(), Scalar::Number(value.round()));
            }
            Answer::Keyed(values)
        }
        QuestionConfig::Matrix(config) => {
            let picks = split_per_key(&config.rows, raw)?;
            let mut values = BTreeMap::new();
            for (row, column) in config.rows.iter().zip(picks) {
                values.insert(row.clone(), Scalar::Text(pick(&config.columns, column)?));
            }
            Answer::Keyed(values)
        }
        QuestionConfig::RankOrder(config) => {
            let ranking = pick_many(&config.items, raw)?;
            let mut sorted = ranking.clone();
            sorted.sort();
            sorted.dedup();
            if sorted.len() != config.items.len() || ranking.len() != config.items.len() {
                return Err(AnswerParseError::new(
                    "rank every item exactly once",
                    Some(format!("an order of: {}", config.items.join(", "))),
                ));
            }
            Answer::List(ranking)
        }
    };
    Ok(answer)
}

fn split_per_key<'a>(keys: &[String], raw: &'a str) -> Result<Vec<&'a str>, AnswerParseError> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    if parts.len() != keys.len() {
        return Err(AnswerParseError::new(
            format!("expected {} comma separated values, got {}", keys.len(), parts.len()),
            Some(format!("one value each for: {}", keys.join(", "))),
        ));
    }
    Ok(parts)
}

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{:02x}", byte)).collect()
}
