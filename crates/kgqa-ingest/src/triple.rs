//! The `(subject) -[:RELATION]-> (object)` line format.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::sanitize::{normalize_relation_type, sanitize_text};

fn relation_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\((.*?)\)\s*-\[:(.*?)\]->\s*\((.*?)\)").expect("static regex")
    })
}

/// Captured fields of a matching line, before sanitization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTriple {
    pub subject: String,
    pub relation: String,
    pub object: String,
}

/// A sanitized fact: two named nodes joined by a directed, typed edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    pub subject: String,
    pub relation: String,
    pub object: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    Subject,
    Relation,
    Object,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Subject => "subject",
            Field::Relation => "relation",
            Field::Object => "object",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TripleError {
    #[error("{field} is empty after sanitization (raw: {raw:?})")]
    EmptyField { field: Field, raw: String },
}

/// Match one line against the relation pattern.
///
/// The line is trimmed and the pattern is anchored at its start; anything
/// after the object's closing parenthesis is ignored. Returns `None` for lines
/// that are not relation lines.
pub fn parse_relation_line(line: &str) -> Option<RawTriple> {
    let caps = relation_line_re().captures(line.trim())?;
    Some(RawTriple {
        subject: caps[1].to_string(),
        relation: caps[2].to_string(),
        object: caps[3].to_string(),
    })
}

impl Triple {
    /// Build a triple from already-clean parts. Fields are still sanitized,
    /// so callers can't smuggle punctuation into node names.
    pub fn new(
        subject: impl AsRef<str>,
        relation: impl AsRef<str>,
        object: impl AsRef<str>,
    ) -> Result<Self, TripleError> {
        Self::from_raw(RawTriple {
            subject: subject.as_ref().to_string(),
            relation: relation.as_ref().to_string(),
            object: object.as_ref().to_string(),
        })
    }

    pub fn from_raw(raw: RawTriple) -> Result<Self, TripleError> {
        let subject = non_empty(Field::Subject, &raw.subject, sanitize_text(&raw.subject))?;
        let relation = non_empty(
            Field::Relation,
            &raw.relation,
            normalize_relation_type(&raw.relation),
        )?;
        let object = non_empty(Field::Object, &raw.object, sanitize_text(&raw.object))?;
        Ok(Self {
            subject,
            relation,
            object,
        })
    }

    /// Parse and sanitize in one step. `Ok(None)` means "not a relation line".
    pub fn parse_line(line: &str) -> Result<Option<Self>, TripleError> {
        match parse_relation_line(line) {
            Some(raw) => Self::from_raw(raw).map(Some),
            None => Ok(None),
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}) -[:{}]-> ({})",
            self.subject, self.relation, self.object
        )
    }
}

fn non_empty(field: Field, raw: &str, cleaned: String) -> Result<String, TripleError> {
    if cleaned.is_empty() {
        return Err(TripleError::EmptyField {
            field,
            raw: raw.to_string(),
        });
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_a_well_formed_line() {
        let raw = parse_relation_line("(Aspirin) -[:TREATS]-> (Headache)").unwrap();
        assert_eq!(raw.subject, "Aspirin");
        assert_eq!(raw.relation, "TREATS");
        assert_eq!(raw.object, "Headache");
    }

    #[test]
    fn whitespace_around_the_arrow_is_optional() {
        let raw = parse_relation_line("  (A)-[:R]->(B)  ").unwrap();
        assert_eq!((raw.subject.as_str(), raw.relation.as_str(), raw.object.as_str()), ("A", "R", "B"));
    }

    #[test]
    fn non_relation_lines_are_skipped() {
        assert!(parse_relation_line("not a valid relation line").is_none());
        assert!(parse_relation_line("").is_none());
        assert!(parse_relation_line("# (A) -[:R]-> (B)").is_none());
        assert!(parse_relation_line("(A) -[R]-> (B)").is_none());
        assert!(parse_relation_line("(A) <-[:R]- (B)").is_none());
    }

    #[test]
    fn trailing_text_after_the_object_is_ignored() {
        let raw = parse_relation_line("(A) -[:R]-> (B) // source: review 2021").unwrap();
        assert_eq!(raw.object, "B");
    }

    #[test]
    fn captures_are_lazy() {
        // The subject stops at the first `)`.
        let raw = parse_relation_line("(Vitamin D) -[:IMPROVES]-> (Bone (density))").unwrap();
        assert_eq!(raw.subject, "Vitamin D");
        assert_eq!(raw.object, "Bone (density");
    }

    #[test]
    fn from_raw_sanitizes_every_field() {
        let t = Triple::parse_line("( Alzheimer's ) -[: IS ASSOCIATED WITH ]-> (Type-2 diabetes!)")
            .unwrap()
            .unwrap();
        assert_eq!(t.subject, "Alzheimers");
        assert_eq!(t.relation, "IS_ASSOCIATED_WITH");
        assert_eq!(t.object, "Type2 diabetes");
    }

    #[test]
    fn empty_field_after_sanitization_is_rejected() {
        let err = Triple::parse_line("(!!!) -[:TREATS]-> (Headache)").unwrap_err();
        assert!(matches!(err, TripleError::EmptyField { field: Field::Subject, .. }));

        let err = Triple::parse_line("(A) -[:]-> (B)").unwrap_err();
        assert!(matches!(err, TripleError::EmptyField { field: Field::Relation, .. }));

        let err = Triple::parse_line("(A) -[:R]-> ()").unwrap_err();
        assert!(matches!(err, TripleError::EmptyField { field: Field::Object, .. }));
    }

    #[test]
    fn display_renders_the_input_format() {
        let t = Triple::new("Aspirin", "TREATS", "Headache").unwrap();
        assert_eq!(t.to_string(), "(Aspirin) -[:TREATS]-> (Headache)");
        assert_eq!(Triple::parse_line(&t.to_string()).unwrap(), Some(t));
    }

    proptest! {
        #[test]
        fn well_formed_lines_parse_exactly(
            a in "[A-Za-z0-9_][A-Za-z0-9_ ]{0,20}[A-Za-z0-9_]",
            r in "[A-Z_]{1,20}",
            b in "[A-Za-z0-9_][A-Za-z0-9_ ]{0,20}[A-Za-z0-9_]",
        ) {
            let line = format!("({a}) -[:{r}]-> ({b})");
            let raw = parse_relation_line(&line).unwrap();
            prop_assert_eq!(&raw.subject, &a);
            prop_assert_eq!(&raw.relation, &r);
            prop_assert_eq!(&raw.object, &b);

            let t = Triple::from_raw(raw).unwrap();
            prop_assert_eq!(t, Triple { subject: a, relation: r, object: b });
        }

        #[test]
        fn lines_without_an_opening_paren_never_match(s in "[^(\\s][^\n]{0,40}") {
            prop_assert!(parse_relation_line(&s).is_none());
        }
    }
}
