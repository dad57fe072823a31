//! Batch loading of parsed relation files into a store.

use serde::Serialize;
use std::fmt;

use kgqa_ingest::ParsedRelations;

use crate::error::StoreError;
use crate::{GraphStore, Triple};

pub const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub batch_size: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// What happened to each line of a relations file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub lines: usize,
    pub triples: usize,
    /// Lines that were not relation lines.
    pub skipped: usize,
    /// Relation lines with a field that sanitized to nothing.
    pub rejected: usize,
    pub upserted: usize,
    /// Triples the store refused, after falling back to one-by-one writes.
    pub failed: usize,
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lines: {} triples ({} upserted, {} failed), {} skipped, {} rejected",
            self.lines, self.triples, self.upserted, self.failed, self.skipped, self.rejected
        )
    }
}

/// Upsert every accepted triple in `parsed`, `batch_size` at a time.
///
/// A failed batch is retried triple by triple so one bad edge doesn't sink its
/// neighbours. Fatal errors (connection loss, closed store) abort the load.
pub async fn load_relations(
    store: &dyn GraphStore,
    parsed: &ParsedRelations,
    options: LoadOptions,
) -> Result<IngestReport, StoreError> {
    let mut report = IngestReport {
        lines: parsed.line_count(),
        triples: parsed.triple_count(),
        skipped: parsed.skipped_count(),
        rejected: parsed.rejected_count(),
        ..IngestReport::default()
    };
    for (line, err) in parsed.rejected() {
        tracing::warn!(line, error = %err, "rejected relation line");
    }

    let triples: Vec<Triple> = parsed.triples().cloned().collect();
    let batch_size = options.batch_size.max(1);
    for (idx, batch) in triples.chunks(batch_size).enumerate() {
        match store.upsert_batch(batch).await {
            Ok(()) => report.upserted += batch.len(),
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                tracing::warn!(batch = idx, size = batch.len(), error = %err, "batch upsert failed, retrying one by one");
                for triple in batch {
                    match store.upsert_triple(triple).await {
                        Ok(()) => report.upserted += 1,
                        Err(err) if err.is_fatal() => return Err(err),
                        Err(err) => {
                            tracing::warn!(triple = %triple, error = %err, "upsert failed");
                            report.failed += 1;
                        }
                    }
                }
            }
        }
    }

    tracing::info!(
        lines = report.lines,
        upserted = report.upserted,
        failed = report.failed,
        skipped = report.skipped,
        rejected = report.rejected,
        "relations loaded"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryGraph;
    use crate::query::{EdgeQuery, Row};
    use crate::StoreStats;
    use async_trait::async_trait;
    use kgqa_ingest::parse_relations;

    const SAMPLE: &str = "\
(Aspirin)-[:TREATS]->(Headache)
(\"Smoking\")-[:CAUSES]->(Lung Cancer)
this line is prose
(Aspirin)-[:TREATS]->(Headache)
(!!!)-[:CAUSES]->(Nothing)
";

    #[tokio::test]
    async fn loads_sample_and_counts_every_line() {
        let store = MemoryGraph::new();
        let parsed = parse_relations(SAMPLE);
        let report = load_relations(&store, &parsed, LoadOptions { batch_size: 2 })
            .await
            .unwrap();

        assert_eq!(
            report,
            IngestReport {
                lines: 5,
                triples: 3,
                skipped: 1,
                rejected: 1,
                upserted: 3,
                failed: 0,
            }
        );
        assert_eq!(store.stats().await.unwrap(), StoreStats { nodes: 4, edges: 2 });
        assert!(store.contains_node("Lung Cancer"));
    }

    #[tokio::test]
    async fn loading_twice_changes_nothing() {
        let store = MemoryGraph::new();
        let parsed = parse_relations(SAMPLE);
        load_relations(&store, &parsed, LoadOptions::default()).await.unwrap();
        let first = (store.stats().await.unwrap(), store.triples());
        load_relations(&store, &parsed, LoadOptions::default()).await.unwrap();
        assert_eq!((store.stats().await.unwrap(), store.triples()), first);
    }

    #[tokio::test]
    async fn garbage_only_input_writes_nothing() {
        let store = MemoryGraph::new();
        let parsed = parse_relations("not a relation\n\n-[:X]->\n(a)-[]->(b)\n");
        let report = load_relations(&store, &parsed, LoadOptions::default()).await.unwrap();
        assert_eq!(report.upserted, 0);
        assert_eq!(store.stats().await.unwrap(), StoreStats::default());
    }

    /// Rejects batches outright and one specific triple on the single path.
    struct PickyStore {
        inner: MemoryGraph,
    }

    #[async_trait]
    impl GraphStore for PickyStore {
        async fn upsert_triple(&self, triple: &Triple) -> Result<(), StoreError> {
            if triple.subject == "Bad" {
                return Err(StoreError::Query("constraint violation".into()));
            }
            self.inner.upsert_triple(triple).await
        }

        async fn upsert_batch(&self, _triples: &[Triple]) -> Result<(), StoreError> {
            Err(StoreError::Query("batch refused".into()))
        }

        async fn query_edges(&self, query: &EdgeQuery) -> Result<Vec<Row>, StoreError> {
            self.inner.query_edges(query).await
        }

        async fn stats(&self) -> Result<StoreStats, StoreError> {
            self.inner.stats().await
        }

        async fn close(&self) -> Result<(), StoreError> {
            self.inner.close().await
        }

        fn describe(&self) -> String {
            "picky".into()
        }
    }

    #[tokio::test]
    async fn failed_batches_fall_back_to_single_upserts() {
        let store = PickyStore {
            inner: MemoryGraph::new(),
        };
        let parsed = parse_relations("(A)-[:R]->(B)\n(Bad)-[:R]->(C)\n(D)-[:R]->(E)\n");
        let report = load_relations(&store, &parsed, LoadOptions::default()).await.unwrap();
        assert_eq!(report.upserted, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(store.stats().await.unwrap().edges, 2);
    }

    #[tokio::test]
    async fn fatal_errors_abort_the_load() {
        let store = MemoryGraph::new();
        store.close().await.unwrap();
        let parsed = parse_relations("(A)-[:R]->(B)\n");
        assert!(matches!(
            load_relations(&store, &parsed, LoadOptions::default()).await,
            Err(StoreError::Closed)
        ));
    }
}
