//! Structured read queries and their Cypher rendering.
//!
//! The QA side builds `EdgeQuery` values; each backend decides how to run
//! them. `to_cypher` binds every user-derived value as a parameter, so names
//! with quotes or braces can't change the shape of the query.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Label shared by every node written by the loader.
pub const NODE_LABEL: &str = "Node";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endpoints {
    /// Edges `first -> second` unioned with edges `second -> first`.
    Between { first: String, second: String },
    /// Any edge whose source or target is one of `names`.
    Touching { names: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationFilter {
    Any,
    OneOf(Vec<String>),
}

impl RelationFilter {
    pub fn allows(&self, relation: &str) -> bool {
        match self {
            RelationFilter::Any => true,
            RelationFilter::OneOf(types) => types.iter().any(|t| t == relation),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeQuery {
    pub endpoints: Endpoints,
    pub relations: RelationFilter,
    pub limit: Option<usize>,
    /// Column aliases for `(source, relation, target)`. Cosmetic only.
    pub columns: [String; 3],
}

impl EdgeQuery {
    pub fn between(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            endpoints: Endpoints::Between {
                first: first.into(),
                second: second.into(),
            },
            relations: RelationFilter::Any,
            limit: None,
            columns: default_columns(),
        }
    }

    pub fn touching(names: Vec<String>) -> Self {
        Self {
            endpoints: Endpoints::Touching { names },
            relations: RelationFilter::Any,
            limit: None,
            columns: default_columns(),
        }
    }

    pub fn with_relations<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relations = RelationFilter::OneOf(relations.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_columns(mut self, source: &str, relation: &str, target: &str) -> Self {
        self.columns = [source.to_string(), relation.to_string(), target.to_string()];
        self
    }

    /// Render as parameterized Cypher.
    pub fn to_cypher(&self) -> CypherQuery {
        let mut params = BTreeMap::new();
        let [src, rel, dst] = &self.columns;
        let ret = format!("RETURN a.name AS {src}, type(r) AS {rel}, b.name AS {dst}");

        let rel_clause = match &self.relations {
            RelationFilter::Any => None,
            RelationFilter::OneOf(types) => {
                params.insert("relations".to_string(), ParamValue::List(types.clone()));
                Some("type(r) IN $relations")
            }
        };

        let mut text = match &self.endpoints {
            Endpoints::Between { first, second } => {
                params.insert("e1".to_string(), ParamValue::String(first.clone()));
                params.insert("e2".to_string(), ParamValue::String(second.clone()));
                let where_clause = rel_clause
                    .map(|c| format!(" WHERE {c}"))
                    .unwrap_or_default();
                let branch = |from: &str, to: &str| {
                    format!(
                        "MATCH (a:{NODE_LABEL} {{name: ${from}}})-[r]->(b:{NODE_LABEL} {{name: ${to}}}){where_clause}\n{ret}"
                    )
                };
                let union = format!("{}\nUNION\n{}", branch("e1", "e2"), branch("e2", "e1"));
                match self.limit {
                    // LIMIT after a UNION only binds the last branch.
                    Some(_) => format!("CALL {{\n{union}\n}}\nRETURN {src}, {rel}, {dst}"),
                    None => union,
                }
            }
            Endpoints::Touching { names } => {
                params.insert("names".to_string(), ParamValue::List(names.clone()));
                let mut conds = vec!["(a.name IN $names OR b.name IN $names)".to_string()];
                if let Some(c) = rel_clause {
                    conds.push(c.to_string());
                }
                format!(
                    "MATCH (a:{NODE_LABEL})-[r]->(b:{NODE_LABEL})\nWHERE {}\n{ret}",
                    conds.join(" AND ")
                )
            }
        };

        if let Some(limit) = self.limit {
            params.insert("limit".to_string(), ParamValue::Int(limit as i64));
            text.push_str(" LIMIT $limit");
        }

        CypherQuery { text, params }
    }
}

fn default_columns() -> [String; 3] {
    [
        "from_node".to_string(),
        "relation".to_string(),
        "to_node".to_string(),
    ]
}

/// A Cypher statement plus its bound parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CypherQuery {
    pub text: String,
    pub params: BTreeMap<String, ParamValue>,
}

impl fmt::Display for CypherQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.text)?;
        for (name, value) in &self.params {
            writeln!(f, "// ${name} = {value}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    String(String),
    Int(i64),
    List(Vec<String>),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::String(s) => write!(f, "{s:?}"),
            ParamValue::Int(n) => write!(f, "{n}"),
            ParamValue::List(items) => write!(f, "{items:?}"),
        }
    }
}

/// A single value in a result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("None"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// An ordered tuple of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row(pub Vec<Value>);

impl Row {
    pub fn edge(source: &str, relation: &str, target: &str) -> Self {
        Row(vec![source.into(), relation.into(), target.into()])
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }
}
