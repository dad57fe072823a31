//! Logging, store and model wiring from CLI flags and environment.

use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use kgqa_qa::{
    AnswerSynthesizer, ChatModel, EntityExtractor, KeywordClassifier, KgQa, LlmClassifier,
    LlmEntityExtractor, NounPhraseChunker, PipelineConfig, QuestionClassifier,
};
use kgqa_store::{GraphStore, MemoryGraph};

use crate::{ClassifierKind, ExtractorKind, GlobalArgs, StoreKind};

pub fn init_tracing(verbose: bool) -> Result<()> {
    let default = if verbose { "kgqa=debug" } else { "kgqa=info" };
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default)?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

pub async fn open_store(args: &GlobalArgs) -> Result<Arc<dyn GraphStore>> {
    match args.store {
        StoreKind::Memory => Ok(Arc::new(MemoryGraph::new())),
        StoreKind::Neo4j => open_neo4j(args).await,
    }
}

#[cfg(feature = "neo4j")]
async fn open_neo4j(args: &GlobalArgs) -> Result<Arc<dyn GraphStore>> {
    use anyhow::Context;
    use kgqa_store::{Neo4jGraph, StoreConfig};

    let mut config = StoreConfig::from_env()?;
    if let Some(uri) = &args.neo4j_uri {
        config.uri = uri.clone();
    }
    if let Some(user) = &args.neo4j_user {
        config.username = user.clone();
    }
    config.validate()?;
    if config.password.is_none() {
        config.password = Some(crate::prompt::read_secret("Please type your Neo4j password: ")?);
    }

    let graph = Neo4jGraph::connect(&config)
        .await
        .with_context(|| format!("could not open the graph store at {}", config.uri))?;
    Ok(Arc::new(graph))
}

#[cfg(not(feature = "neo4j"))]
async fn open_neo4j(_args: &GlobalArgs) -> Result<Arc<dyn GraphStore>> {
    Err(anyhow!(
        "this build has no Neo4j support (enable the `neo4j` feature or pass `--store memory`)"
    ))
}

#[cfg(feature = "llm-ollama")]
fn chat_model(args: &GlobalArgs) -> Result<Arc<dyn ChatModel>> {
    use kgqa_qa::llm::normalize_ollama_host;
    use kgqa_qa::{LlmConfig, OllamaClient};

    let mut config = LlmConfig::from_env()?;
    if let Some(host) = &args.ollama_host {
        config.host = normalize_ollama_host(host);
    }
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    let client = OllamaClient::new(&config)?;
    tracing::debug!(model = %client.describe(), "model client ready");
    Ok(Arc::new(client))
}

#[cfg(not(feature = "llm-ollama"))]
fn chat_model(_args: &GlobalArgs) -> Result<Arc<dyn ChatModel>> {
    Err(anyhow!(
        "this build has no model backend (enable `llm-ollama` or use `--classifier keyword --extractor chunker`)"
    ))
}

/// Everything a question-answering command needs.
pub struct Services {
    pub qa: KgQa,
    /// Present when answers were requested.
    pub synthesizer: Option<AnswerSynthesizer>,
}

impl Services {
    pub fn build(args: &GlobalArgs, store: Arc<dyn GraphStore>, want_answers: bool) -> Result<Self> {
        let needs_model = want_answers
            || args.classifier == ClassifierKind::Llm
            || args.extractor == ExtractorKind::Llm;
        let model = if needs_model {
            Some(chat_model(args)?)
        } else {
            None
        };
        let model_for = |what: &str| {
            model
                .clone()
                .ok_or_else(|| anyhow!("{what} needs a model backend"))
        };

        let classifier: Arc<dyn QuestionClassifier> = match args.classifier {
            ClassifierKind::Keyword => Arc::new(KeywordClassifier),
            ClassifierKind::Llm => Arc::new(LlmClassifier::new(model_for("llm classifier")?)),
        };
        let extractor: Arc<dyn EntityExtractor> = match args.extractor {
            ExtractorKind::Chunker => Arc::new(NounPhraseChunker),
            ExtractorKind::Llm => Arc::new(LlmEntityExtractor::new(model_for("llm extractor")?)),
        };
        let synthesizer = if want_answers {
            Some(AnswerSynthesizer::new(model_for("answer synthesis")?))
        } else {
            None
        };

        tracing::debug!(
            store = %store.describe(),
            classifier = classifier.name(),
            extractor = extractor.name(),
            "pipeline ready"
        );
        let qa = KgQa::new(store, extractor, classifier).with_config(PipelineConfig::from_env()?);
        Ok(Self { qa, synthesizer })
    }
}
