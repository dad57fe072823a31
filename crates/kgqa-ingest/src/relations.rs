//! Whole-file parsing with per-line outcomes.

use anyhow::{Context, Result};
use std::borrow::Cow;
use std::path::Path;

use crate::triple::{Triple, TripleError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Triple(Triple),
    /// Not a relation line (blank, comment, prose). Skipped silently.
    NoMatch,
    /// Matched the pattern but a field collapsed during sanitization.
    Rejected(TripleError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// 1-based line number in the source text.
    pub line: usize,
    pub outcome: LineOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedRelations {
    pub lines: Vec<ParsedLine>,
}

impl ParsedRelations {
    /// Accepted triples, in file order. Duplicates are kept; stores dedupe.
    pub fn triples(&self) -> impl Iterator<Item = &Triple> {
        self.lines.iter().filter_map(|l| match &l.outcome {
            LineOutcome::Triple(t) => Some(t),
            _ => None,
        })
    }

    pub fn rejected(&self) -> impl Iterator<Item = (usize, &TripleError)> {
        self.lines.iter().filter_map(|l| match &l.outcome {
            LineOutcome::Rejected(e) => Some((l.line, e)),
            _ => None,
        })
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn triple_count(&self) -> usize {
        self.triples().count()
    }

    pub fn skipped_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l.outcome, LineOutcome::NoMatch))
            .count()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected().count()
    }
}

pub fn parse_relations(text: &str) -> ParsedRelations {
    let mut lines = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let outcome = match Triple::parse_line(line) {
            Ok(Some(triple)) => LineOutcome::Triple(triple),
            Ok(None) => {
                tracing::debug!(line = line_no, "skipping non-relation line");
                LineOutcome::NoMatch
            }
            Err(err) => {
                tracing::debug!(line = line_no, error = %err, "rejecting relation line");
                LineOutcome::Rejected(err)
            }
        };
        lines.push(ParsedLine {
            line: line_no,
            outcome,
        });
    }
    ParsedRelations { lines }
}

/// Parse raw file contents. Invalid UTF-8 is replaced with U+FFFD, which
/// sanitization then strips, so one badly encoded line never hides the rest.
pub fn parse_relations_bytes(bytes: &[u8]) -> ParsedRelations {
    let text = String::from_utf8_lossy(bytes);
    if let Cow::Owned(_) = &text {
        let lines: Vec<usize> = text
            .lines()
            .enumerate()
            .filter(|(_, line)| line.contains(char::REPLACEMENT_CHARACTER))
            .map(|(idx, _)| idx + 1)
            .collect();
        tracing::warn!(lines = ?lines, "relations file contains invalid UTF-8");
    }
    parse_relations(&text)
}

pub fn read_relations_file(path: &Path) -> Result<ParsedRelations> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read relations file {}", path.display()))?;
    Ok(parse_relations_bytes(&bytes))
}
