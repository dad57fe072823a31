//! Relation-triple ingestion for KGQA
//!
//! Turns plain-text relation files into sanitized triples:
//!
//! ```text
//! (Aspirin) -[:TREATS]-> (Headache)
//! ```
//!
//! - Each matching line becomes a `Triple` (subject, relation type, object)
//! - Lines that don't match the pattern are skipped (blank lines, comments, prose)
//! - Fields are sanitized before they ever reach a store
//!
//! This crate never talks to a graph store. Writing triples is the job of
//! `kgqa-store`, which consumes `ParsedRelations`.

pub mod relations;
pub mod sanitize;
pub mod triple;

pub use relations::{parse_relations, parse_relations_bytes, read_relations_file, LineOutcome, ParsedLine, ParsedRelations};
pub use sanitize::{is_valid_relation_type, normalize_relation_type, sanitize_text};
pub use triple::{parse_relation_line, Field, RawTriple, Triple, TripleError};
