//! Free-text answers grounded in retrieved facts.

use std::sync::Arc;

use crate::error::LlmError;
use crate::format::render_facts;
use crate::llm::{ChatModel, ChatRequest};

const ANSWER_SYSTEM: &str = "\
You answer medical questions using ONLY the facts provided.
Each fact has the form `subject - RELATION - object`.
If the facts do not answer the question, say that the knowledge graph has no information about it.
Answer in one short sentence.";

pub struct AnswerSynthesizer {
    model: Arc<dyn ChatModel>,
}

impl AnswerSynthesizer {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub async fn answer(&self, question: &str, facts: &[String]) -> Result<String, LlmError> {
        let user = format!(
            "Facts:\n{}\n\nQuestion: {question}",
            render_facts(facts)
        );
        let request = ChatRequest::user(user).with_system(ANSWER_SYSTEM);
        Ok(self.model.chat(&request).await?.trim().to_string())
    }
}

/// Canonical form for comparing answers: lowercase, trimmed, trailing
/// periods removed.
pub fn normalize_answer(answer: &str) -> String {
    answer.trim().to_lowercase().trim_end_matches('.').to_string()
}
