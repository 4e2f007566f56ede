//! `neo4rs` backed query executor

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use neo4j_sync_core::{
    float_value, non_finite_float, AccessMode, QueryExecutor, Row, Statement, SyncError,
    SyncResult,
};
use neo4rs::{query, BoltNull, BoltType, ConfigBuilder, Graph};
use secrecy::ExposeSecret;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Value};

use crate::config::Endpoint;

/// Rows pulled per round trip
const FETCH_SIZE: usize = 500;

/// A pooled connection to one Neo4j database
pub struct Neo4jExecutor {
    graph: Graph,
    uri: String,
    database: String,
}

impl Neo4jExecutor {
    /// Connect to `endpoint` and check the server answers
    ///
    /// The pool gets one connection per concurrent write plus one for reads.
    pub async fn connect(endpoint: &Endpoint, max_concurrency: usize) -> SyncResult<Self> {
        let connection_error =
            |e: neo4rs::Error| SyncError::Connection(format!("{}: {e}", endpoint.uri));

        let config = ConfigBuilder::default()
            .uri(endpoint.uri.as_str())
            .user(endpoint.user.as_str())
            .password(endpoint.password.expose_secret())
            .db(endpoint.database.as_str())
            .fetch_size(FETCH_SIZE)
            .max_connections(max_concurrency + 1)
            .build()
            .map_err(connection_error)?;
        let graph = Graph::connect(config).await.map_err(connection_error)?;
        graph
            .run(query("RETURN 1"))
            .await
            .map_err(connection_error)?;

        tracing::info!(uri = %endpoint.uri, database = %endpoint.database, "Connected");
        Ok(Self {
            graph,
            uri: endpoint.uri.clone(),
            database: endpoint.database.clone(),
        })
    }
}

#[async_trait]
impl QueryExecutor for Neo4jExecutor {
    async fn execute(
        &self,
        statement: &Statement,
        database: &str,
        mode: AccessMode,
    ) -> SyncResult<Vec<Row>> {
        // The database is fixed when the pool is built.
        if database != self.database {
            return Err(SyncError::Query(format!(
                "connection to {} is bound to database `{}`, not `{database}`",
                self.uri, self.database
            )));
        }

        let mut q = query(&statement.text);
        for (name, value) in &statement.params {
            q = q.param(name, to_bolt(value));
        }

        let query_error = |e: neo4rs::Error| SyncError::Query(format!("{mode} on {}: {e}", self.uri));
        let mut stream = self.graph.execute(q).await.map_err(query_error)?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await.map_err(query_error)? {
            let mut decoded = Row::with_capacity(statement.columns.len());
            for column in &statement.columns {
                let ColumnValue(value) = row
                    .get(column)
                    .map_err(|e| SyncError::Decode(format!("column `{column}`: {e}")))?;
                decoded.insert((*column).to_string(), value);
            }
            rows.push(decoded);
        }
        Ok(rows)
    }
}

/// A result column decoded into a property value
///
/// Decoding straight into `serde_json::Value` turns NaN and the infinities
/// into null; this keeps them through [`float_value`].
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnValue(pub Value);

impl<'de> Deserialize<'de> for ColumnValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ColumnVisitor).map(Self)
    }
}

struct ColumnVisitor;

impl<'de> Visitor<'de> for ColumnVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a Neo4j value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(float_value(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Value, E> {
        Ok(Value::from(v.to_vec()))
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(ColumnValue(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut object = Map::new();
        while let Some((key, ColumnValue(value))) = map.next_entry::<String, ColumnValue>()? {
            object.insert(key, value);
        }
        Ok(Value::Object(object))
    }
}

/// Convert a property value into its Bolt counterpart
///
/// Integers stay integers and floats stay floats, non-finite ones included.
pub fn to_bolt(value: &Value) -> BoltType {
    if let Some(float) = non_finite_float(value) {
        return BoltType::from(float);
    }
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Bool(b) => BoltType::from(*b),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => BoltType::from(i),
            (None, Some(f)) => BoltType::from(f),
            (None, None) => BoltType::Null(BoltNull),
        },
        Value::String(s) => BoltType::from(s.as_str()),
        Value::Array(items) => BoltType::from(items.iter().map(to_bolt).collect::<Vec<_>>()),
        Value::Object(map) => BoltType::from(
            map.iter()
                .map(|(key, value)| (key.clone(), to_bolt(value)))
                .collect::<HashMap<String, BoltType>>(),
        ),
    }
}
