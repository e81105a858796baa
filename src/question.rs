use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::LoadError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    text: String,
    options: Vec<String>,
    #[serde(rename = "answer")]
    correct_answer: String,
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.text, self.options.join(" | "))
    }
}

impl Question {
    pub fn new(
        text: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        correct_answer: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            options: options.into_iter().map(Into::into).collect(),
            correct_answer: correct_answer.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    /// Exact string comparison. No trimming, no case folding.
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }
}

/// Source of the question set, consulted each time a quiz starts.
pub trait LoadQuestions {
    fn load_questions(&self) -> Result<Vec<Question>, LoadError>;
}

/// Reads a JSON array of `{"question", "options", "answer"}` objects.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LoadQuestions for JsonFileStore {
    fn load_questions(&self) -> Result<Vec<Question>, LoadError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| LoadError::Read {
            path: self.path.clone(),
            source,
        })?;
        let questions: Vec<Question> =
            serde_json::from_str(&raw).map_err(|source| LoadError::Parse {
                path: self.path.clone(),
                source,
            })?;

        if questions.is_empty() {
            return Err(LoadError::Empty(self.path.clone()));
        }
        tracing::debug!("loaded {} questions from {:?}", questions.len(), self.path);
        Ok(questions)
    }
}
