//! KGQA question answering
//!
//! ```text
//! question ──► EntityExtractor ──► [e1, e2, ...]
//!          └─► QuestionClassifier ─► Category ──┐
//!                                               ▼
//!                            generate_query(entities, category)
//!                                               │ EdgeQuery | None
//!                                               ▼
//!                                   GraphStore::query_edges
//!                                               │ rows
//!                                               ▼
//!                                   format_row: "a - REL - b"
//! ```
//!
//! Extraction and classification are traits with an offline implementation
//! (`NounPhraseChunker`, `KeywordClassifier`) and a model-backed one
//! (`LlmEntityExtractor`, `LlmClassifier`). Model failures degrade the
//! question instead of failing it; see [`pipeline::QaOutcome::warnings`].

pub mod answer;
pub mod category;
pub mod classify;
pub mod error;
pub mod extract;
pub mod format;
pub mod llm;
pub mod pipeline;
pub mod questions;
pub mod template;

pub use answer::{normalize_answer, AnswerSynthesizer};
pub use category::Category;
pub use classify::{KeywordClassifier, LlmClassifier, QuestionClassifier};
pub use error::{LlmError, QaError};
pub use extract::{title_case, EntityExtractor, LlmEntityExtractor, NounPhraseChunker};
pub use format::{format_row, format_rows, render_facts, NO_FACTS};
#[cfg(feature = "llm-ollama")]
pub use llm::OllamaClient;
pub use llm::{ChatModel, ChatRequest, LlmConfig, ScriptedChat};
pub use pipeline::{KgQa, PipelineConfig, QaOutcome, UNABLE_TO_GENERATE};
pub use questions::{parse_questions, read_questions, Accuracy, QuestionItem, DEFAULT_BATCH_LIMIT};
pub use template::{generate_query, GENERIC_LIMIT};
