mod builder;
mod config;
mod store;
mod wizard;

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use builder::BuilderSession;
use clap::{Parser, Subcommand};
use component_survey::{get_answer_schema, get_example_answers, list_kinds};
use serde_json::Value;
use survey_spec::{
    AnswerMap, BuilderController, ResponseRuntime, RuntimeError, StepOutcome, SubmitOutcome,
    Survey, ValidationResult, check_answers, definition_schema, runtime_payload,
};
use tracing::debug;
use wizard::{Presenter, RenderMode, Verbosity, parse_answer};

use crate::config::{init_tracing, resolve_output_root};
use crate::store::{FileSubmissionSink, FileSurveyStore, slugify};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Feedback survey builder and respondent shell",
    long_about = "Builds survey definitions interactively, walks respondents through them and validates answer files"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the supported question kinds.
    Kinds,
    /// Interactive builder that saves a survey definition.
    New {
        /// Directory for the saved definition (defaults to SURVEY_OUTPUT_DIR or the current directory).
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
        /// Overwrite an existing definition with the same name.
        #[arg(long)]
        force: bool,
    },
    /// Answer a survey one question at a time.
    Take {
        /// Path to the survey definition JSON.
        #[arg(long, value_name = "SURVEY")]
        survey: PathBuf,
        /// Survey id recorded in the submission (defaults to the file name).
        #[arg(long)]
        id: Option<String>,
        /// Submit without identifying the respondent.
        #[arg(long)]
        anonymous: bool,
        /// Render output mode for each question.
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
        /// Directory for the submission file (defaults to SURVEY_OUTPUT_DIR or the current directory).
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
        /// Show status and progress before each question.
        #[arg(long, alias = "debug")]
        verbose: bool,
        /// Also print the submission JSON.
        #[arg(long)]
        submission_json: bool,
    },
    /// Validate an answers file against a survey definition.
    Validate {
        /// Path to the survey definition JSON.
        #[arg(long, value_name = "SURVEY")]
        survey: PathBuf,
        /// Path to the answers JSON file.
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
    },
    /// Print the JSON Schema of a survey's answers.
    Schema {
        /// Path to the survey definition JSON.
        #[arg(long, value_name = "SURVEY", required_unless_present = "definition")]
        survey: Option<PathBuf>,
        /// Print example answers instead of the schema.
        #[arg(long, conflicts_with = "definition")]
        examples: bool,
        /// Print the schema of survey definition files instead.
        #[arg(long)]
        definition: bool,
    },
}

fn main() -> CliResult<()> {
    init_tracing()?;
    let cli = Cli::parse();
    match cli.command {
        Command::Kinds => run_kinds(),
        Command::New { out, force } => run_new(out, force),
        Command::Take {
            survey,
            id,
            anonymous,
            format,
            out,
            verbose,
            submission_json,
        } => {
            let presenter = Presenter::new(Verbosity::from_verbose(verbose), format, submission_json);
            run_take(&survey, id, anonymous, out, &presenter)
        }
        Command::Validate { survey, answers } => run_validate(&survey, &answers),
        Command::Schema {
            survey,
            examples,
            definition,
        } => run_schema(survey.as_deref(), examples, definition),
    }
}

fn run_kinds() -> CliResult<()> {
    let kinds = parse_component_result(&list_kinds())?;
    for kind in kinds.as_array().into_iter().flatten() {
        println!(
            "{:<16} {:<16} {}",
            kind["kind"].as_str().unwrap_or_default(),
            kind["displayName"].as_str().unwrap_or_default(),
            kind["description"].as_str().unwrap_or_default()
        );
    }
    Ok(())
}

fn run_new(out_dir: Option<PathBuf>, force: bool) -> CliResult<()> {
    println!("Interactive survey builder");
    let out_root = resolve_output_root(out_dir)?;
    let title = prompt_non_empty(&mark_required("Survey title"), Some("Untitled Survey"))?;
    let description = prompt_optional("Description (optional)")?.unwrap_or_default();

    let controller = BuilderController::new(title, description);
    let mut session = BuilderSession::new(controller, FileSurveyStore::new(out_root, force));
    println!("Type 'help' for commands.");
    session.run()
}

fn load_survey(path: &Path) -> CliResult<Survey> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    Ok(Survey::from_json(&contents)?)
}

fn run_take(
    survey_path: &Path,
    survey_id: Option<String>,
    anonymous: bool,
    out_dir: Option<PathBuf>,
    presenter: &Presenter,
) -> CliResult<()> {
    let survey = load_survey(survey_path)?;
    let survey_id = survey_id.unwrap_or_else(|| {
        let stem = survey_path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.trim_end_matches(".json").trim_end_matches(".survey"))
            .unwrap_or_default();
        slugify(stem)
    });
    let mut sink = FileSubmissionSink::new(resolve_output_root(out_dir)?);
    let mut runtime = ResponseRuntime::load(survey_id, survey)?;
    runtime.set_anonymous(anonymous);
    println!("Answer each question and press enter. Commands: :next :prev :submit :quit");

    loop {
        presenter.show_question(&runtime_payload(&runtime));
        let Some(line) = read_response()? else {
            return Err("input ended before the survey was submitted".into());
        };

        match line.as_str() {
            ":quit" => {
                println!("Response discarded.");
                return Ok(());
            }
            ":prev" => {
                runtime.previous()?;
            }
            ":next" => advance(&mut runtime)?,
            ":submit" => match runtime.submit(&mut sink) {
                Ok(SubmitOutcome::Completed(submission)) => {
                    presenter.show_completion(&submission);
                    if let Some(path) = sink.last_path() {
                        println!("Saved {}", path.display());
                    }
                    return Ok(());
                }
                Ok(SubmitOutcome::Invalid { errors, .. }) => presenter.show_errors(&errors),
                Err(RuntimeError::SubmissionFailed(err)) => {
                    eprintln!("Submission failed: {}. Type :submit to retry.", err);
                }
                Err(err) => return Err(err.into()),
            },
            raw => {
                let question = runtime.current_question();
                match parse_answer(question, raw) {
                    Ok(answer) => {
                        let question_id = question.id.clone();
                        runtime.answer(&question_id, answer)?;
                        advance(&mut runtime)?;
                    }
                    Err(err) => presenter.show_parse_error(&err),
                }
            }
        }
    }
}

fn advance(runtime: &mut ResponseRuntime) -> CliResult<()> {
    match runtime.next()? {
        StepOutcome::Moved(index) => debug!(index, "moved to next question"),
        StepOutcome::AtEnd => println!("That was the last question. Type :submit to finish."),
        // The error is shown with the question on the next render.
        StepOutcome::Blocked(_) => {}
    }
    Ok(())
}

fn read_response() -> CliResult<Option<String>> {
    print!("> ");
    io::stdout().flush()?;
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

fn run_validate(survey_path: &Path, answers_path: &Path) -> CliResult<()> {
    let survey = load_survey(survey_path)?;
    let answers_json = fs::read_to_string(answers_path)?;
    let answers: AnswerMap = serde_json::from_str(&answers_json)?;

    let result = check_answers(&survey, &answers);
    println!(
        "Validation result: {}",
        if result.valid { "valid" } else { "invalid" }
    );
    describe_validation(&result);

    if result.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_validation(result: &ValidationResult) {
    if !result.errors.is_empty() {
        println!("Errors:");
        for error in &result.errors {
            println!("  {} - {} ({})", error.question_id, error.message, error.code);
        }
    }
    if !result.unknown_fields.is_empty() {
        println!(
            "Unknown answer fields: {}",
            result.unknown_fields.join(", ")
        );
    }
}

fn run_schema(survey_path: Option<&Path>, examples: bool, definition: bool) -> CliResult<()> {
    let value = if definition {
        definition_schema()
    } else {
        let path = survey_path.ok_or("--survey is required")?;
        let survey_json = fs::read_to_string(path)?;
        if examples {
            parse_component_result(&get_example_answers(&survey_json))?
        } else {
            parse_component_result(&get_answer_schema(&survey_json))?
        }
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn parse_component_result(response: &str) -> CliResult<Value> {
    let value: Value = serde_json::from_str(response)?;
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        Err(error.into())
    } else {
        Ok(value)
    }
}

fn prompt_line(prompt: &str, default: Option<&str>) -> CliResult<String> {
    if let Some(default_value) = default {
        print!("{} [{}]: ", prompt, default_value);
    } else {
        print!("{}: ", prompt);
    }
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Ok(default.unwrap_or_default().to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

fn prompt_optional(prompt: &str) -> CliResult<Option<String>> {
    let value = prompt_line(prompt, None)?;
    if value.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(value))
    }
}

fn prompt_non_empty(prompt: &str, default: Option<&str>) -> CliResult<String> {
    loop {
        let value = prompt_line(prompt, default)?;
        if !value.trim().is_empty() {
            return Ok(value);
        }
        println!("Value cannot be empty.");
    }
}

fn mark_required(prompt: &str) -> String {
    let trimmed = prompt.trim();
    if trimmed.to_lowercase().contains("required") {
        trimmed.to_string()
    } else {
        format!("{} (required)", trimmed)
    }
}
