//! Neo4j backend over bolt.
//!
//! Writes are `MERGE` statements with bound names. Relationship types can't be
//! parameters in Cypher, so they are validated as word-character identifiers
//! and backtick-quoted before being spliced in.

use async_trait::async_trait;
use neo4rs::{query, Graph, Query};
use std::collections::BTreeMap;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::query::{EdgeQuery, ParamValue, Row, NODE_LABEL};
use crate::{GraphStore, StoreStats, Triple};

pub struct Neo4jGraph {
    graph: Graph,
    uri: String,
}

impl Neo4jGraph {
    /// Open a connection and verify it with a trivial query, retrying with
    /// backoff per `config.connect_retry`.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        config.validate()?;
        let password = config.require_password()?;
        let uri = config.uri.clone();

        let graph = config
            .connect_retry
            .run(
                "neo4j connect",
                |err: &StoreError| matches!(err, StoreError::Connection { .. }),
                || async move {
                    let graph = Graph::new(&config.uri, &config.username, password)
                        .await
                        .map_err(|e| connection_error(&config.uri, e))?;
                    graph
                        .run(query("RETURN 1"))
                        .await
                        .map_err(|e| connection_error(&config.uri, e))?;
                    Ok(graph)
                },
            )
            .await?;

        tracing::info!(uri = %uri, user = %config.username, "connected to neo4j");
        Ok(Self { graph, uri })
    }

    fn merge_statement(relation: &str) -> Result<String, StoreError> {
        if !kgqa_ingest::is_valid_relation_type(relation) {
            return Err(StoreError::InvalidRelationType(relation.to_string()));
        }
        Ok(format!(
            "MERGE (a:{NODE_LABEL} {{name: $subject}})\n\
             MERGE (b:{NODE_LABEL} {{name: $object}})\n\
             MERGE (a)-[:`{relation}`]->(b)"
        ))
    }

    fn merge_batch_statement(relation: &str) -> Result<String, StoreError> {
        if !kgqa_ingest::is_valid_relation_type(relation) {
            return Err(StoreError::InvalidRelationType(relation.to_string()));
        }
        Ok(format!(
            "UNWIND range(0, size($subjects) - 1) AS i\n\
             MERGE (a:{NODE_LABEL} {{name: $subjects[i]}})\n\
             MERGE (b:{NODE_LABEL} {{name: $objects[i]}})\n\
             MERGE (a)-[:`{relation}`]->(b)"
        ))
    }

    fn driver_error(&self, err: neo4rs::Error) -> StoreError {
        driver_error(&self.uri, err)
    }

    async fn count(&self, cypher: &str, column: &str) -> Result<u64, StoreError> {
        let mut stream = self
            .graph
            .execute(query(cypher))
            .await
            .map_err(|e| self.driver_error(e))?;
        let Some(row) = stream.next().await.map_err(|e| self.driver_error(e))? else {
            return Ok(0);
        };
        let n: i64 = row.get(column).map_err(query_error)?;
        Ok(n.max(0) as u64)
    }
}

fn bind(mut q: Query, params: &BTreeMap<String, ParamValue>) -> Query {
    for (name, value) in params {
        q = match value {
            ParamValue::String(s) => q.param(name, s.clone()),
            ParamValue::Int(n) => q.param(name, *n),
            ParamValue::List(items) => q.param(name, items.clone()),
        };
    }
    q
}

fn connection_error(uri: &str, err: neo4rs::Error) -> StoreError {
    StoreError::Connection {
        uri: uri.to_string(),
        message: err.to_string(),
    }
}

/// Lost sockets and refused credentials end the run; anything else is a
/// failure of the one statement.
fn driver_error(uri: &str, err: neo4rs::Error) -> StoreError {
    match err {
        neo4rs::Error::IOError { .. }
        | neo4rs::Error::ConnectionError
        | neo4rs::Error::AuthenticationError(_) => connection_error(uri, err),
        other => query_error(other),
    }
}

fn query_error(err: impl std::fmt::Display) -> StoreError {
    StoreError::Query(err.to_string())
}

#[async_trait]
impl GraphStore for Neo4jGraph {
    async fn upsert_triple(&self, triple: &Triple) -> Result<(), StoreError> {
        let cypher = Self::merge_statement(&triple.relation)?;
        let q = query(&cypher)
            .param("subject", triple.subject.clone())
            .param("object", triple.object.clone());
        self.graph.run(q).await.map_err(|e| self.driver_error(e))
    }

    /// One transaction per batch, one statement per relation type.
    async fn upsert_batch(&self, triples: &[Triple]) -> Result<(), StoreError> {
        if triples.is_empty() {
            return Ok(());
        }
        let mut by_relation: BTreeMap<&str, (Vec<String>, Vec<String>)> = BTreeMap::new();
        for t in triples {
            let entry = by_relation.entry(t.relation.as_str()).or_default();
            entry.0.push(t.subject.clone());
            entry.1.push(t.object.clone());
        }

        let mut queries = Vec::with_capacity(by_relation.len());
        for (relation, (subjects, objects)) in by_relation {
            let cypher = Self::merge_batch_statement(relation)?;
            queries.push(
                query(&cypher)
                    .param("subjects", subjects)
                    .param("objects", objects),
            );
        }

        let mut txn = self
            .graph
            .start_txn()
            .await
            .map_err(|e| self.driver_error(e))?;
        if let Err(err) = txn.run_queries(queries).await {
            let _ = txn.rollback().await;
            return Err(self.driver_error(err));
        }
        txn.commit().await.map_err(|e| self.driver_error(e))
    }

    async fn query_edges(&self, edge_query: &EdgeQuery) -> Result<Vec<Row>, StoreError> {
        let cypher = edge_query.to_cypher();
        tracing::debug!(cypher = %cypher.text, "running edge query");
        let q = bind(query(&cypher.text), &cypher.params);

        let [src, rel, dst] = &edge_query.columns;
        let mut stream = self
            .graph
            .execute(q)
            .await
            .map_err(|e| self.driver_error(e))?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await.map_err(|e| self.driver_error(e))? {
            let source: String = row.get(src).map_err(query_error)?;
            let relation: String = row.get(rel).map_err(query_error)?;
            let target: String = row.get(dst).map_err(query_error)?;
            rows.push(Row::edge(&source, &relation, &target));
        }
        Ok(rows)
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let nodes = self
            .count(&format!("MATCH (n:{NODE_LABEL}) RETURN count(n) AS c"), "c")
            .await?;
        let edges = self
            .count(
                &format!("MATCH (:{NODE_LABEL})-[r]->(:{NODE_LABEL}) RETURN count(r) AS c"),
                "c",
            )
            .await?;
        Ok(StoreStats { nodes, edges })
    }

    async fn close(&self) -> Result<(), StoreError> {
        // The driver's pool closes its connections when dropped.
        tracing::debug!(uri = %self.uri, "closing neo4j store");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("neo4j({})", self.uri)
    }
}
