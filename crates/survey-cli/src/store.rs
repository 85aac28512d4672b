//! File-backed implementations of the survey store and submission sink.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::info;

use survey_spec::{
    PersistenceError, Submission, SubmissionSink, Survey, SurveyStore, TransportError,
};

/// Writes `<root>/<slug>.survey.json`.
pub struct FileSurveyStore {
    root: PathBuf,
    force: bool,
    last_path: Option<PathBuf>,
}

impl FileSurveyStore {
    pub fn new(root: impl Into<PathBuf>, force: bool) -> Self {
        Self {
            root: root.into(),
            force,
            last_path: None,
        }
    }

    pub fn last_path(&self) -> Option<&Path> {
        self.last_path.as_deref()
    }
}

impl SurveyStore for FileSurveyStore {
    fn save(&mut self, survey: &Survey) -> Result<(), PersistenceError> {
        let path = self
            .root
            .join(format!("{}.survey.json", slugify(&survey.title)));
        // Rewriting the file this session created is always allowed.
        let ours = self.last_path.as_deref() == Some(path.as_path());
        if path.exists() && !self.force && !ours {
            return Err(PersistenceError::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} exists; pass --force to overwrite", path.display()),
            )));
        }
        let contents = serde_json::to_string_pretty(survey).map_err(PersistenceError::Encode)?;
        fs::create_dir_all(&self.root)?;
        fs::write(&path, contents)?;
        info!(path = %path.display(), "survey written");
        self.last_path = Some(path);
        Ok(())
    }
}

/// Writes `<root>/<survey id>.submission.json`, replacing earlier submissions.
pub struct FileSubmissionSink {
    root: PathBuf,
    last_path: Option<PathBuf>,
}

impl FileSubmissionSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            last_path: None,
        }
    }

    pub fn last_path(&self) -> Option<&Path> {
        self.last_path.as_deref()
    }
}

impl SubmissionSink for FileSubmissionSink {
    fn deliver(&mut self, submission: &Submission) -> Result<(), TransportError> {
        let contents = submission.to_json_pretty().map_err(TransportError::Encode)?;
        fs::create_dir_all(&self.root)?;
        let path = self
            .root
            .join(format!("{}.submission.json", slugify(&submission.survey_id)));
        fs::write(&path, contents)?;
        info!(path = %path.display(), "submission written");
        self.last_path = Some(path);
        Ok(())
    }
}

/// Lowercase file-name stem: ASCII alphanumerics separated by single dashes.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let trimmed = slug.trim_end_matches('-');
    if trimmed.is_empty() {
        "survey".into()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_spec::QuestionKind;
    use tempfile::TempDir;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Visit Feedback: 2026!"), "visit-feedback-2026");
        assert_eq!(slugify("  --  "), "survey");
    }

    #[test]
    fn store_refuses_foreign_file_without_force() {
        let temp = TempDir::new().expect("temp dir");
        let mut survey = Survey::new("Team Pulse", "");
        survey.add_question(QuestionKind::OpinionScale);
        fs::write(temp.path().join("team-pulse.survey.json"), "{}").expect("seed");

        let mut store = FileSurveyStore::new(temp.path(), false);
        assert!(matches!(
            store.save(&survey),
            Err(PersistenceError::Io(err)) if err.kind() == io::ErrorKind::AlreadyExists
        ));

        let mut forced = FileSurveyStore::new(temp.path(), true);
        forced.save(&survey).expect("forced save");
        forced.save(&survey).expect("second save of own file");
        let written = fs::read_to_string(forced.last_path().expect("path")).expect("read");
        assert_eq!(Survey::from_json(&written).expect("parse"), survey);
    }
}
