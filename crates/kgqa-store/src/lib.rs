//! KGQA graph store boundary
//!
//! ```text
//! ┌──────────────┐   Triple    ┌────────────────────┐
//! │ kgqa-ingest  │───────────►│                    │──► MemoryGraph (tests, demos)
//! └──────────────┘            │   dyn GraphStore   │
//! ┌──────────────┐  EdgeQuery │                    │──► Neo4jGraph  (bolt, MERGE)
//! │   kgqa-qa    │───────────►│                    │
//! └──────────────┘   Rows     └────────────────────┘
//! ```
//!
//! - **Writes** are idempotent triple upserts: the same triple any number of
//!   times leaves the store as if it was written once.
//! - **Reads** are structured `EdgeQuery` values, not query strings. Backends
//!   that speak Cypher render them with bound parameters.

pub mod config;
pub mod error;
pub mod loader;
pub mod memory;
#[cfg(feature = "neo4j")]
pub mod neo4j;
pub mod query;
pub mod retry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use config::StoreConfig;
pub use error::StoreError;
pub use kgqa_ingest::Triple;
pub use loader::{load_relations, IngestReport, LoadOptions};
pub use memory::MemoryGraph;
#[cfg(feature = "neo4j")]
pub use neo4j::Neo4jGraph;
pub use query::{CypherQuery, EdgeQuery, Endpoints, ParamValue, RelationFilter, Row, Value};
pub use retry::RetryPolicy;

/// Node and edge totals, used for reports and idempotence checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub nodes: u64,
    pub edges: u64,
}

/// The capability the pipelines need from a graph database.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Ensure both named nodes and the typed edge between them exist.
    async fn upsert_triple(&self, triple: &Triple) -> Result<(), StoreError>;

    /// Upsert many triples. Same observable result as upserting one by one.
    async fn upsert_batch(&self, triples: &[Triple]) -> Result<(), StoreError> {
        for triple in triples {
            self.upsert_triple(triple).await?;
        }
        Ok(())
    }

    /// Run a read query. Edge queries always yield `(source, relation, target)` rows.
    async fn query_edges(&self, query: &EdgeQuery) -> Result<Vec<Row>, StoreError>;

    async fn stats(&self) -> Result<StoreStats, StoreError>;

    /// Release the connection. Callers invoke this on every exit path.
    async fn close(&self) -> Result<(), StoreError>;

    /// Short human-readable description (backend + target).
    fn describe(&self) -> String;
}
