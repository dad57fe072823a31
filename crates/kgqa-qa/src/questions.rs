//! Question files for batch runs.
//!
//! Accepted shapes:
//! - `["question", ...]`
//! - `[{"question": "...", "answer": "..."}, ...]` (`answer` optional)
//! - `{"questions": <either of the above>}`

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::answer::normalize_answer;
use crate::error::QaError;

pub const DEFAULT_BATCH_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionItem {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Entry {
    Text(String),
    Item(QuestionItem),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionFile {
    List(Vec<Entry>),
    Wrapped { questions: Vec<Entry> },
}

pub fn parse_questions(json: &str) -> Result<Vec<QuestionItem>, QaError> {
    let file: QuestionFile = serde_json::from_str(json).map_err(|e| {
        QaError::QuestionFile(format!(
            "expected a list of questions or {{\"questions\": [...]}}: {e}"
        ))
    })?;
    let entries = match file {
        QuestionFile::List(entries) | QuestionFile::Wrapped { questions: entries } => entries,
    };
    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            Entry::Text(question) => QuestionItem {
                question,
                answer: None,
            },
            Entry::Item(item) => item,
        })
        .filter(|item| !item.question.trim().is_empty())
        .collect())
}

pub fn read_questions(path: &Path) -> anyhow::Result<Vec<QuestionItem>> {
    use anyhow::Context;
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question file {}", path.display()))?;
    parse_questions(&text).with_context(|| format!("in {}", path.display()))
}

/// Exact-match accuracy over normalized answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Accuracy {
    pub correct: usize,
    pub graded: usize,
}

impl Accuracy {
    pub fn record(&mut self, expected: &str, actual: &str) -> bool {
        let hit = normalize_answer(expected) == normalize_answer(actual);
        self.graded += 1;
        if hit {
            self.correct += 1;
        }
        hit
    }

    pub fn ratio(&self) -> Option<f64> {
        (self.graded > 0).then(|| self.correct as f64 / self.graded as f64)
    }
}
