//! Per-question pipeline: extract, classify, dispatch, execute, format.

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use kgqa_store::{EdgeQuery, GraphStore};

use crate::category::Category;
use crate::classify::QuestionClassifier;
use crate::error::QaError;
use crate::extract::EntityExtractor;
use crate::format::{format_rows, render_facts};
use crate::llm::parse_timeout_secs;
use crate::template::generate_query;

pub const KGQA_QUESTION_TIMEOUT_SECS_ENV: &str = "KGQA_QUESTION_TIMEOUT_SECS";
pub const DEFAULT_QUESTION_TIMEOUT_SECS: u64 = 180;

/// Shown in place of facts when no query could be built.
pub const UNABLE_TO_GENERATE: &str = "Unable to generate query.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Upper bound on one question, model calls included. `None` disables it.
    pub question_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            question_timeout: Some(Duration::from_secs(DEFAULT_QUESTION_TIMEOUT_SECS)),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, QaError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, QaError> {
        let mut config = Self::default();
        if let Some(raw) = lookup(KGQA_QUESTION_TIMEOUT_SECS_ENV).filter(|v| !v.trim().is_empty()) {
            config.question_timeout = parse_timeout_secs(KGQA_QUESTION_TIMEOUT_SECS_ENV, &raw)?;
        }
        Ok(config)
    }
}

/// Everything known about one answered question.
#[derive(Debug, Clone, Serialize)]
pub struct QaOutcome {
    pub question: String,
    pub entities: Vec<String>,
    pub category: Category,
    /// `None` when fewer than two entities were found.
    pub query: Option<EdgeQuery>,
    pub facts: Vec<String>,
    /// Degraded steps (model unreachable, bad output) for this question.
    pub warnings: Vec<String>,
}

impl QaOutcome {
    pub fn has_query(&self) -> bool {
        self.query.is_some()
    }

    /// The context block shown to users and passed to answer synthesis.
    pub fn context(&self) -> String {
        if self.has_query() {
            render_facts(&self.facts)
        } else {
            UNABLE_TO_GENERATE.to_string()
        }
    }
}

pub struct KgQa {
    store: Arc<dyn GraphStore>,
    extractor: Arc<dyn EntityExtractor>,
    classifier: Arc<dyn QuestionClassifier>,
    config: PipelineConfig,
}

impl KgQa {
    pub fn new(
        store: Arc<dyn GraphStore>,
        extractor: Arc<dyn EntityExtractor>,
        classifier: Arc<dyn QuestionClassifier>,
    ) -> Self {
        Self {
            store,
            extractor,
            classifier,
            config: PipelineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    pub async fn answer(&self, question: &str) -> Result<QaOutcome, QaError> {
        self.bounded(self.run(question, None)).await
    }

    /// Like [`answer`](Self::answer) with a caller-chosen category.
    pub async fn answer_with_category(
        &self,
        question: &str,
        category: Category,
    ) -> Result<QaOutcome, QaError> {
        self.bounded(self.run(question, Some(category))).await
    }

    /// Answer questions one at a time. A failure stays with its question.
    pub async fn answer_batch(&self, questions: &[String]) -> Vec<Result<QaOutcome, QaError>> {
        let mut out = Vec::with_capacity(questions.len());
        for (idx, question) in questions.iter().enumerate() {
            let result = self.answer(question).await;
            if let Err(err) = &result {
                tracing::warn!(index = idx, error = %err, "question failed");
            }
            out.push(result);
        }
        out
    }

    async fn bounded<F>(&self, fut: F) -> Result<QaOutcome, QaError>
    where
        F: Future<Output = Result<QaOutcome, QaError>>,
    {
        match self.config.question_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| QaError::Timeout {
                    secs: limit.as_secs(),
                })?,
            None => fut.await,
        }
    }

    async fn run(&self, question: &str, forced: Option<Category>) -> Result<QaOutcome, QaError> {
        let mut warnings = Vec::new();

        let entities = match self.extractor.extract(question).await {
            Ok(entities) => entities,
            Err(QaError::Llm(err)) => {
                tracing::warn!(extractor = self.extractor.name(), error = %err, "entity extraction failed");
                warnings.push(format!("entity extraction failed: {err}"));
                Vec::new()
            }
            Err(err) => return Err(err),
        };

        let category = match forced {
            Some(category) => category,
            None => match self.classifier.classify(question).await {
                Ok(category) => category,
                Err(QaError::Llm(err)) => {
                    tracing::warn!(classifier = self.classifier.name(), error = %err, "classification failed, using other");
                    warnings.push(format!("classification failed: {err}"));
                    Category::Other
                }
                Err(err) => return Err(err),
            },
        };

        let query = generate_query(&entities, &category);
        let facts = match &query {
            Some(q) => format_rows(&self.store.query_edges(q).await?),
            None => {
                tracing::info!(entities = entities.len(), "not enough entities to build a query");
                Vec::new()
            }
        };
        tracing::debug!(%category, entities = ?entities, facts = facts.len(), "question processed");

        Ok(QaOutcome {
            question: question.to_string(),
            entities,
            category,
            query,
            facts,
            warnings,
        })
    }
}
