//! KGQA CLI
//!
//! - `ingest`: load a relations file into the graph store
//! - `ask`: answer one question from the graph
//! - `repl`: ask questions interactively
//! - `batch`: answer a JSON file of questions, optionally graded

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use kgqa_store::GraphStore;

mod ask;
mod ingest;
mod prompt;
mod repl;
mod setup;

#[derive(Parser)]
#[command(name = "kgqa")]
#[command(
    author,
    version,
    about = "Knowledge-graph question answering over relation triples"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Graph store backend
    #[arg(long, value_enum, default_value_t = StoreKind::Neo4j, global = true)]
    pub store: StoreKind,

    /// Relations file to load into the store before running the command
    #[arg(long, global = true)]
    pub preload: Option<PathBuf>,

    /// How questions are classified
    #[arg(long, value_enum, default_value_t = ClassifierKind::Llm, global = true)]
    pub classifier: ClassifierKind,

    /// How entities are extracted from questions
    #[arg(long, value_enum, default_value_t = ExtractorKind::Chunker, global = true)]
    pub extractor: ExtractorKind,

    /// Neo4j URI (overrides NEO4J_URI)
    #[arg(long, global = true)]
    pub neo4j_uri: Option<String>,

    /// Neo4j user (overrides NEO4J_USERNAME)
    #[arg(long, global = true)]
    pub neo4j_user: Option<String>,

    /// Ollama host (overrides OLLAMA_HOST)
    #[arg(long, global = true)]
    pub ollama_host: Option<String>,

    /// Model name (overrides KGQA_LLM_MODEL)
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Neo4j,
    Memory,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierKind {
    Llm,
    Keyword,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorKind {
    Chunker,
    Llm,
}

#[derive(Subcommand)]
enum Commands {
    /// Load `(subject)-[:RELATION]->(object)` lines into the graph
    Ingest {
        /// Relations file
        input: PathBuf,

        /// Triples per store transaction
        #[arg(long, default_value_t = kgqa_store::loader::DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Parse and report without touching the configured store
        #[arg(long)]
        dry_run: bool,
    },

    /// Answer a question (prompts for one when omitted)
    Ask {
        question: Option<String>,

        /// Skip classification and use this category
        #[arg(long)]
        category: Option<String>,

        /// Print the generated query
        #[arg(long)]
        show_query: bool,

        /// Ask the model for a free-text answer grounded in the facts
        #[arg(long)]
        answer: bool,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive question loop (`:quit` to exit)
    Repl {
        #[arg(long)]
        show_query: bool,
    },

    /// Answer every question in a JSON file
    Batch {
        input: PathBuf,

        /// Maximum number of questions to process
        #[arg(long, default_value_t = kgqa_qa::DEFAULT_BATCH_LIMIT)]
        limit: usize,

        /// Synthesize answers (and grade them when the file has expected answers)
        #[arg(long)]
        answer: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    setup::init_tracing(cli.global.verbose)?;

    if let Commands::Ingest {
        input,
        batch_size,
        dry_run: true,
    } = &cli.command
    {
        return ingest::cmd_ingest_dry_run(input, *batch_size).await;
    }

    let store = setup::open_store(&cli.global).await?;
    let result = run(&cli, store.clone()).await;
    if let Err(err) = store.close().await {
        tracing::warn!(error = %err, "failed to close store");
    }
    result
}

async fn run(cli: &Cli, store: Arc<dyn GraphStore>) -> Result<()> {
    if let Some(path) = &cli.global.preload {
        ingest::preload(store.as_ref(), path).await?;
    }

    match &cli.command {
        Commands::Ingest {
            input, batch_size, ..
        } => ingest::cmd_ingest(store.as_ref(), input, *batch_size).await,
        Commands::Ask {
            question,
            category,
            show_query,
            answer,
            json,
        } => {
            let services = setup::Services::build(&cli.global, store, *answer)?;
            let output = ask::AskOutput {
                show_query: *show_query,
                json: *json,
            };
            ask::cmd_ask(&services, question.as_deref(), category.as_deref(), output).await
        }
        Commands::Repl { show_query } => {
            let services = setup::Services::build(&cli.global, store, false)?;
            repl::cmd_repl(&services, *show_query).await
        }
        Commands::Batch {
            input,
            limit,
            answer,
        } => {
            let services = setup::Services::build(&cli.global, store, *answer)?;
            ask::cmd_batch(&services, input, *limit).await
        }
    }
}
