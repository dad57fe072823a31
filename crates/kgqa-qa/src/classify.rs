//! Question classifiers.

use async_trait::async_trait;
use std::sync::Arc;

use crate::category::Category;
use crate::error::QaError;
use crate::llm::{ChatModel, ChatRequest};

#[async_trait]
pub trait QuestionClassifier: Send + Sync {
    async fn classify(&self, question: &str) -> Result<Category, QaError>;

    fn name(&self) -> &'static str;
}

const CLASSIFY_PROMPT: &str = "\
You are a helpful medical assistant that classifies user queries into one of the following categories:
- comparison: if the user is asking if something is a better or more suitable option
- causal: if the user is asking about the potential for a causal relationship
- effectiveness: if the user is asking if something is an effective option, treatment, or strategy
- association: if the user is asking if two things are in some way associated or related
- other: if the user's query cannot possibly fit into any of the above categories

Based on the meaning and intent of the query, assign the most appropriate category. Please return only
the string corresponding to the category name.

Query: {question}

Category:";

/// Asks a chat model for a single category label.
pub struct LlmClassifier {
    model: Arc<dyn ChatModel>,
}

impl LlmClassifier {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub fn prompt(question: &str) -> String {
        CLASSIFY_PROMPT.replace("{question}", question)
    }
}

#[async_trait]
impl QuestionClassifier for LlmClassifier {
    /// Unrecognized labels become `Other`. Service failures are returned so
    /// the pipeline can record them.
    async fn classify(&self, question: &str) -> Result<Category, QaError> {
        let raw = self.model.chat(&ChatRequest::user(Self::prompt(question))).await?;
        match Category::from_label(&raw) {
            Category::Unrecognized(label) => {
                tracing::warn!(label = %label, "model returned an unknown category, using other");
                Ok(Category::Other)
            }
            cat => Ok(cat),
        }
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}

/// Offline classifier driven by cue words. Checked in order; first hit wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordClassifier;

const CUES: [(Category, &[&str]); 4] = [
    (
        Category::Comparison,
        &["better", "worse", "best", "than", "compare", "versus", "vs", "superior", "inferior", "prefer"],
    ),
    (
        Category::Causal,
        &["cause", "causal", "risk", "lead", "result", "trigger", "predispose"],
    ),
    (
        Category::Effectiveness,
        &["effective", "efficac", "treat", "work", "help", "safe", "cure", "relieve"],
    ),
    (
        Category::Association,
        &["associat", "relat", "link", "correlat", "connect", "predict", "influenc"],
    ),
];

impl KeywordClassifier {
    pub fn classify_text(question: &str) -> Category {
        let lower = question.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        for (category, cues) in CUES.iter() {
            if words.iter().any(|w| cues.iter().any(|cue| w.starts_with(cue))) {
                return category.clone();
            }
        }
        Category::Other
    }
}

#[async_trait]
impl QuestionClassifier for KeywordClassifier {
    async fn classify(&self, question: &str) -> Result<Category, QaError> {
        Ok(Self::classify_text(question))
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedChat;

    #[tokio::test]
    async fn llm_labels_are_normalized() {
        let chat = Arc::new(ScriptedChat::new(vec![
            Ok(" Effectiveness\n".into()),
            Ok("I think this is causal.".into()),
            Ok("diagnostic".into()),
        ]));
        let c = LlmClassifier::new(chat.clone());
        assert_eq!(c.classify("q1").await.unwrap(), Category::Effectiveness);
        assert_eq!(c.classify("q2").await.unwrap(), Category::Causal);
        assert_eq!(c.classify("q3").await.unwrap(), Category::Other);

        let sent = chat.requests();
        assert!(sent[0].user.contains("Query: q1"));
        assert!(sent[0].user.trim_end().ends_with("Category:"));
    }

    #[tokio::test]
    async fn llm_failures_surface() {
        let c = LlmClassifier::new(Arc::new(ScriptedChat::failing("connection refused")));
        assert!(matches!(c.classify("q").await, Err(QaError::Llm(_))));
    }

    #[test]
    fn keyword_cues() {
        let cases = [
            ("Is exercise better than medication for depression?", Category::Comparison),
            ("Is metformin more effective than insulin?", Category::Comparison),
            ("Does smoking cause lung cancer?", Category::Causal),
            ("Does obesity increase the risk of diabetes?", Category::Causal),
            ("Is aspirin effective for headache?", Category::Effectiveness),
            ("Does aspirin treat headache?", Category::Effectiveness),
            ("Is sleep associated with memory?", Category::Association),
            ("Who discovered penicillin?", Category::Other),
        ];
        for (q, expected) in cases {
            assert_eq!(KeywordClassifier::classify_text(q), expected, "{q}");
        }
    }
}
