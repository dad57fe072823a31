//! In-process graph store.
//!
//! Node names are interned once; edges are `(source_id, relation, target_id)`
//! kept in insertion order and de-duplicated through a set. Used by tests,
//! `--store memory`, and dry runs.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

use crate::error::StoreError;
use crate::query::{EdgeQuery, Endpoints, Row};
use crate::{GraphStore, StoreStats, Triple};

type EdgeKey = (usize, String, usize);

#[derive(Debug, Default)]
struct GraphState {
    names: Vec<String>,
    ids: HashMap<String, usize>,
    edges: Vec<EdgeKey>,
    edge_set: HashSet<EdgeKey>,
    closed: bool,
}

impl GraphState {
    fn intern(&mut self, name: &str) -> usize {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        let id = self.names.len();
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        id
    }

    fn name(&self, id: usize) -> &str {
        &self.names[id]
    }

    fn row(&self, (src, rel, dst): &EdgeKey) -> Row {
        Row::edge(self.name(*src), rel, self.name(*dst))
    }
}

#[derive(Debug, Default)]
pub struct MemoryGraph {
    state: RwLock<GraphState>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_node(&self, name: &str) -> bool {
        self.state.read().ids.contains_key(name)
    }

    /// All edges as triples, in insertion order.
    pub fn triples(&self) -> Vec<Triple> {
        let state = self.state.read();
        state
            .edges
            .iter()
            .map(|(src, rel, dst)| Triple {
                subject: state.name(*src).to_string(),
                relation: rel.clone(),
                object: state.name(*dst).to_string(),
            })
            .collect()
    }

    fn ensure_open(state: &GraphState) -> Result<(), StoreError> {
        if state.closed {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    async fn upsert_triple(&self, triple: &Triple) -> Result<(), StoreError> {
        if !kgqa_ingest::is_valid_relation_type(&triple.relation) {
            return Err(StoreError::InvalidRelationType(triple.relation.clone()));
        }
        let mut state = self.state.write();
        Self::ensure_open(&state)?;
        let src = state.intern(&triple.subject);
        let dst = state.intern(&triple.object);
        let key = (src, triple.relation.clone(), dst);
        if state.edge_set.insert(key.clone()) {
            state.edges.push(key);
        }
        Ok(())
    }

    async fn query_edges(&self, query: &EdgeQuery) -> Result<Vec<Row>, StoreError> {
        let state = self.state.read();
        Self::ensure_open(&state)?;

        let allowed = |edge: &EdgeKey| query.relations.allows(&edge.1);
        let mut picked: Vec<usize> = Vec::new();
        match &query.endpoints {
            Endpoints::Between { first, second } => {
                let (Some(&a), Some(&b)) = (state.ids.get(first), state.ids.get(second)) else {
                    return Ok(Vec::new());
                };
                let mut seen = HashSet::new();
                for (from, to) in [(a, b), (b, a)] {
                    for (idx, edge) in state.edges.iter().enumerate() {
                        if edge.0 == from && edge.2 == to && allowed(edge) && seen.insert(idx) {
                            picked.push(idx);
                        }
                    }
                }
            }
            Endpoints::Touching { names } => {
                let ids: HashSet<usize> = names
                    .iter()
                    .filter_map(|n| state.ids.get(n).copied())
                    .collect();
                for (idx, edge) in state.edges.iter().enumerate() {
                    if (ids.contains(&edge.0) || ids.contains(&edge.2)) && allowed(edge) {
                        picked.push(idx);
                    }
                }
            }
        }

        let mut rows: Vec<Row> = picked.iter().map(|&i| state.row(&state.edges[i])).collect();
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let state = self.state.read();
        Self::ensure_open(&state)?;
        Ok(StoreStats {
            nodes: state.names.len() as u64,
            edges: state.edges.len() as u64,
        })
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.state.write().closed = true;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str, r: &str, o: &str) -> Triple {
        Triple::new(s, r, o).unwrap()
    }

    #[tokio::test]
    async fn repeated_upserts_are_idempotent() {
        let g = MemoryGraph::new();
        let triple = t("Aspirin", "TREATS", "Headache");
        g.upsert_triple(&triple).await.unwrap();
        let once = (g.stats().await.unwrap(), g.triples());
        for _ in 0..4 {
            g.upsert_triple(&triple).await.unwrap();
        }
        assert_eq!((g.stats().await.unwrap(), g.triples()), once);
        assert_eq!(once.0, StoreStats { nodes: 2, edges: 1 });
    }

    #[tokio::test]
    async fn parallel_edges_of_different_types_are_kept() {
        let g = MemoryGraph::new();
        g.upsert_batch(&[t("A", "TREATS", "B"), t("A", "IMPROVES", "B"), t("B", "CAUSES", "A")])
            .await
            .unwrap();
        assert_eq!(g.stats().await.unwrap(), StoreStats { nodes: 2, edges: 3 });
    }

    #[tokio::test]
    async fn between_unions_both_directions_and_filters_types() {
        let g = MemoryGraph::new();
        g.upsert_batch(&[
            t("Smoking", "CAUSES", "Cancer"),
            t("Cancer", "WORSENS", "Smoking"),
            t("Smoking", "TREATS", "Cancer"),
            t("Smoking", "CAUSES", "Cough"),
        ])
        .await
        .unwrap();

        let q = EdgeQuery::between("Cancer", "Smoking").with_relations(["CAUSES", "WORSENS"]);
        let rows = g.query_edges(&q).await.unwrap();
        assert_eq!(
            rows,
            vec![
                Row::edge("Cancer", "WORSENS", "Smoking"),
                Row::edge("Smoking", "CAUSES", "Cancer"),
            ]
        );
    }

    #[tokio::test]
    async fn self_loops_are_reported_once() {
        let g = MemoryGraph::new();
        g.upsert_triple(&t("Stress", "WORSENS", "Stress")).await.unwrap();
        let rows = g.query_edges(&EdgeQuery::between("Stress", "Stress")).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn touching_matches_either_endpoint_and_respects_limit() {
        let g = MemoryGraph::new();
        for i in 0..8 {
            g.upsert_triple(&t("Hub", "LINKS", &format!("Leaf{i}"))).await.unwrap();
        }
        g.upsert_triple(&t("Other", "LINKS", "Hub")).await.unwrap();
        g.upsert_triple(&t("Other", "LINKS", "Elsewhere")).await.unwrap();

        let rows = g
            .query_edges(&EdgeQuery::touching(vec!["Hub".into()]).with_limit(5))
            .await
            .unwrap();
        assert_eq!(rows.len(), 5);

        let rows = g
            .query_edges(&EdgeQuery::touching(vec!["Elsewhere".into(), "Missing".into()]))
            .await
            .unwrap();
        assert_eq!(rows, vec![Row::edge("Other", "LINKS", "Elsewhere")]);
    }

    #[tokio::test]
    async fn node_ids_stay_distinct_across_many_names() {
        let g = MemoryGraph::new();
        for i in 0..2_000 {
            g.upsert_triple(&t("Hub", "LINKS", &format!("Leaf{i}"))).await.unwrap();
        }
        assert_eq!(g.stats().await.unwrap(), StoreStats { nodes: 2_001, edges: 2_000 });
        let rows = g
            .query_edges(&EdgeQuery::between("Hub", "Leaf1999"))
            .await
            .unwrap();
        assert_eq!(rows, vec![Row::edge("Hub", "LINKS", "Leaf1999")]);
    }

    #[tokio::test]
    async fn unknown_names_yield_no_rows() {
        let g = MemoryGraph::new();
        g.upsert_triple(&t("A", "R", "B")).await.unwrap();
        assert!(g.query_edges(&EdgeQuery::between("A", "Z")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn closed_store_rejects_operations() {
        let g = MemoryGraph::new();
        g.close().await.unwrap();
        assert!(matches!(
            g.upsert_triple(&t("A", "R", "B")).await,
            Err(StoreError::Closed)
        ));
        assert!(matches!(g.stats().await, Err(StoreError::Closed)));
    }

    #[tokio::test]
    async fn rejects_relation_types_that_bypass_sanitization() {
        let g = MemoryGraph::new();
        let bad = Triple {
            subject: "A".into(),
            relation: "NOT VALID".into(),
            object: "B".into(),
        };
        assert!(matches!(
            g.upsert_triple(&bad).await,
            Err(StoreError::InvalidRelationType(_))
        ));
    }
}
