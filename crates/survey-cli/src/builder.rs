//! Line-oriented authoring shell over [`BuilderController`].

use std::{
    io::{self, Write},
    str::FromStr,
};

use serde_json::{Value, json};
use survey_spec::{
    BuilderController, ConfigPatch, ListField, QuestionKind, QuestionPatch, list_kinds,
};

use crate::CliResult;
use crate::store::FileSurveyStore;

pub const HELP: &str = "\
Commands (positions and item numbers start at 1):
  add <kind>                      append a question (see 'kinds')
  rm <id> | dup <id>              remove or duplicate a question
  mv <id> <position>              move a question
  prompt <id> <text>              change the question text
  required <id> <yes|no>          toggle the required flag
  set <id> <setting> <value>      e.g. 'set q1 max 10', 'set q2 options Red,Green'
  item add <id> <field>           append an item to options/statements/rows/columns/items
  item set <id> <field> <n> <text>
  item rm <id> <field> <n>
  title <text> | desc <text>
  focus <id> | collapse <id> | collapse-all | expand-all
  show | kinds | help | save | quit";

/// One parsed builder instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum BuilderCommand {
    Add(QuestionKind),
    Remove(String),
    Duplicate(String),
    Move {
        id: String,
        index: usize,
    },
    Prompt {
        id: String,
        text: String,
    },
    Required {
        id: String,
        required: bool,
    },
    Set {
        id: String,
        patch: ConfigPatch,
    },
    ItemAdd {
        id: String,
        field: ListField,
    },
    ItemSet {
        id: String,
        field: ListField,
        index: usize,
        value: String,
    },
    ItemRemove {
        id: String,
        field: ListField,
        index: usize,
    },
    Title(String),
    Description(String),
    Focus(String),
    Collapse(String),
    CollapseAll,
    ExpandAll,
    Show,
    Kinds,
    Help,
    Save,
    Quit,
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

fn required_word<'a>(input: &'a str, what: &str) -> Result<(&'a str, &'a str), String> {
    let (word, rest) = split_word(input);
    if word.is_empty() {
        Err(format!("missing {}", what))
    } else {
        Ok((word, rest))
    }
}

/// Parses a 1-based position into a 0-based index.
fn position(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(value) if value > 0 => Ok(value - 1),
        _ => Err(format!("'{}' is not a position (1, 2, ...)", raw)),
    }
}

fn yes_no(raw: &str) -> Result<bool, String> {
    match raw.to_lowercase().as_str() {
        "y" | "yes" | "true" => Ok(true),
        "n" | "no" | "false" => Ok(false),
        other => Err(format!("expected yes or no, got '{}'", other)),
    }
}

/// Builds a single-field patch from `set` arguments. List settings accept a
/// comma separated value; everything else is read as JSON, falling back to text.
pub fn config_patch(setting: &str, raw: &str) -> Result<ConfigPatch, String> {
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(value) => value,
        Err(_) if setting.parse::<ListField>().is_ok() => Value::Array(
            raw.split(',')
                .map(|item| Value::String(item.trim().to_string()))
                .collect(),
        ),
        Err(_) => Value::String(raw.to_string()),
    };
    let patch: ConfigPatch = serde_json::from_value(json!({ setting: value }))
        .map_err(|err| format!("invalid value for {}: {}", setting, err))?;
    if patch == ConfigPatch::default() {
        return Err(format!("unknown setting '{}'", setting));
    }
    Ok(patch)
}

impl FromStr for BuilderCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (verb, rest) = split_word(line);
        let command = match verb.to_lowercase().as_str() {
            "add" => {
                let (kind, _) = required_word(rest, "question kind")?;
                BuilderCommand::Add(kind.parse().map_err(|err| format!("{}", err))?)
            }
            "rm" | "remove" => BuilderCommand::Remove(required_word(rest, "question id")?.0.into()),
            "dup" | "duplicate" => {
                BuilderCommand::Duplicate(required_word(rest, "question id")?.0.into())
            }
            "mv" | "move" => {
                let (id, rest) = required_word(rest, "question id")?;
                let (target, _) = required_word(rest, "position")?;
                BuilderCommand::Move {
                    id: id.into(),
                    index: position(target)?,
                }
            }
            "prompt" => {
                let (id, text) = required_word(rest, "question id")?;
                if text.is_empty() {
                    return Err("missing question text".into());
                }
                BuilderCommand::Prompt {
                    id: id.into(),
                    text: text.into(),
                }
            }
            "required" => {
                let (id, flag) = required_word(rest, "question id")?;
                BuilderCommand::Required {
                    id: id.into(),
                    required: yes_no(flag)?,
                }
            }
            "set" => {
                let (id, rest) = required_word(rest, "question id")?;
                let (setting, value) = required_word(rest, "setting")?;
                BuilderCommand::Set {
                    id: id.into(),
                    patch: config_patch(setting, value)?,
                }
            }
            "item" => {
                let (action, rest) = required_word(rest, "item action")?;
                let (id, rest) = required_word(rest, "question id")?;
                let (field, rest) = required_word(rest, "list field")?;
                let field: ListField = field.parse()?;
                match action {
                    "add" => BuilderCommand::ItemAdd {
                        id: id.into(),
                        field,
                    },
                    "set" => {
                        let (index, value) = required_word(rest, "item number")?;
                        BuilderCommand::ItemSet {
                            id: id.into(),
                            field,
                            index: position(index)?,
                            value: value.into(),
                        }
                    }
                    "rm" | "remove" => BuilderCommand::ItemRemove {
                        id: id.into(),
                        field,
                        index: position(required_word(rest, "item number")?.0)?,
                    },
                    other => return Err(format!("unknown item action '{}'", other)),
                }
            }
            "title" => BuilderCommand::Title(rest.into()),
            "desc" | "description" => BuilderCommand::Description(rest.into()),
            "focus" => BuilderCommand::Focus(required_word(rest, "question id")?.0.into()),
            "collapse" => BuilderCommand::Collapse(required_word(rest, "question id")?.0.into()),
            "collapse-all" => BuilderCommand::CollapseAll,
            "expand-all" => BuilderCommand::ExpandAll,
            "show" | "ls" => BuilderCommand::Show,
            "kinds" => BuilderCommand::Kinds,
            "help" | "?" => BuilderCommand::Help,
            "save" => BuilderCommand::Save,
            "quit" | "exit" => BuilderCommand::Quit,
            other => return Err(format!("unknown command '{}'; type 'help'", other)),
        };
        Ok(command)
    }
}

pub enum Flow {
    Continue,
    Quit,
}

/// Authoring session bound to a file store.
pub struct BuilderSession {
    controller: BuilderController,
    store: FileSurveyStore,
    dirty: bool,
}

impl BuilderSession {
    pub fn new(controller: BuilderController, store: FileSurveyStore) -> Self {
        Self {
            controller,
            store,
            dirty: false,
        }
    }

    pub fn controller(&self) -> &BuilderController {
        &self.controller
    }

    /// Reads commands from stdin until `quit` or end of input.
    pub fn run(&mut self) -> CliResult<()> {
        loop {
            print!("builder> ");
            io::stdout().flush()?;
            let mut line = String::new();
            if io::stdin().read_line(&mut line)? == 0 {
                self.warn_unsaved();
                return Ok(());
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let command = match line.parse::<BuilderCommand>() {
                Ok(command) => command,
                Err(err) => {
                    println!("Error: {}", err);
                    continue;
                }
            };
            match self.execute(command) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => return Ok(()),
                Err(err) => println!("Error: {}", err),
            }
        }
    }

    pub fn execute(&mut self, command: BuilderCommand) -> CliResult<Flow> {
        let controller = &mut self.controller;
        let mut edited = true;
        match command {
            BuilderCommand::Add(kind) => {
                let question = controller.add_question(kind);
                println!("Added {} ({})", question.id, kind.display_name());
            }
            BuilderCommand::Remove(id) => {
                controller.remove_question(&id)?;
                println!("Removed {}", id);
            }
            BuilderCommand::Duplicate(id) => {
                let copy = controller.duplicate_question(&id)?;
                println!("Duplicated {} as {}", id, copy.id);
            }
            BuilderCommand::Move { id, index } => controller.reorder(&id, index)?,
            BuilderCommand::Prompt { id, text } => {
                controller.update_question(&id, QuestionPatch::prompt(text))?;
            }
            BuilderCommand::Required { id, required } => {
                controller.update_question(&id, QuestionPatch::required(required))?;
            }
            BuilderCommand::Set { id, patch } => {
                controller.update_question(&id, QuestionPatch::config(patch))?;
            }
            BuilderCommand::ItemAdd { id, field } => {
                let index = controller.add_item(&id, field)?;
                println!("Added {} {}", field, index + 1);
            }
            BuilderCommand::ItemSet {
                id,
                field,
                index,
                value,
            } => controller.update_item(&id, field, index, value)?,
            BuilderCommand::ItemRemove { id, field, index } => {
                let removed = controller.remove_item(&id, field, index)?;
                println!("Removed '{}'", removed);
            }
            BuilderCommand::Title(title) => controller.set_title(title),
            BuilderCommand::Description(description) => controller.set_description(description),
            BuilderCommand::Focus(id) => {
                controller.set_active(Some(&id))?;
                edited = false;
            }
            BuilderCommand::Collapse(id) => {
                let collapsed = controller.toggle_collapsed(&id)?;
                println!("{} {}", id, if collapsed { "collapsed" } else { "expanded" });
                edited = false;
            }
            BuilderCommand::CollapseAll => {
                controller.collapse_all();
                edited = false;
            }
            BuilderCommand::ExpandAll => {
                controller.expand_all();
                edited = false;
            }
            BuilderCommand::Show => {
                print!("{}", outline(controller));
                edited = false;
            }
            BuilderCommand::Kinds => {
                for info in list_kinds() {
                    println!("  {:<16} {}", info.kind.as_str(), info.description);
                }
                edited = false;
            }
            BuilderCommand::Help => {
                println!("{}", HELP);
                edited = false;
            }
            BuilderCommand::Save => {
                controller.save(&mut self.store)?;
                self.dirty = false;
                if let Some(path) = self.store.last_path() {
                    println!("Saved {}", path.display());
                }
                return Ok(Flow::Continue);
            }
            BuilderCommand::Quit => {
                self.warn_unsaved();
                return Ok(Flow::Quit);
            }
        }
        self.dirty |= edited;
        Ok(Flow::Continue)
    }

    fn warn_unsaved(&self) {
        if self.dirty {
            println!("Unsaved changes discarded.");
        }
    }
}

/// Numbered question list; `>` marks the focused question.
pub fn outline(controller: &BuilderController) -> String {
    let survey = controller.survey();
    let mut out = format!("Survey: {}\n", survey.title);
    if !survey.description.is_empty() {
        out.push_str(&format!("{}\n", survey.description));
    }
    if survey.is_empty() {
        out.push_str("  (no questions yet)\n");
    }
    for question in &survey.questions {
        let marker = if controller.active_question_id() == Some(question.id.as_str()) {
            '>'
        } else {
            ' '
        };
        let required = if question.required { " *" } else { "" };
        out.push_str(&format!(
            "{} {}. [{}] {}: {}{}\n",
            marker,
            question.order + 1,
            question.id,
            question.kind().display_name(),
            question.prompt,
            required
        ));
        if controller.is_collapsed(&question.id) {
            continue;
        }
        for field in question.kind().list_fields() {
            if let Ok(items) = question.items(*field) {
                out.push_str(&format!("      {}: {}\n", field, items.join(" | ")));
            }
        }
    }
    out
}
