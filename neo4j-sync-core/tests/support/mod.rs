//! In-memory graph store speaking the statement shapes the engine emits

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use neo4j_sync_core::{
    AccessMode, BoundedDispatcher, PhaseContext, QueryExecutor, Row, Statement, SyncError,
    SyncResult, WriteMode, MARKER_LABEL, MARKER_PROPERTY,
};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const DATABASE: &str = "neo4j";

#[derive(Debug, Clone, PartialEq)]
pub struct StoredNode {
    pub id: String,
    pub labels: Vec<String>,
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredRelationship {
    pub id: String,
    pub rel_type: String,
    pub start: String,
    pub end: String,
    pub properties: Map<String, Value>,
}

/// Counts writes in flight across every store sharing it
#[derive(Debug, Default)]
pub struct Gauge {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    reads_during_writes: AtomicUsize,
}

impl Gauge {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn reads_during_writes(&self) -> usize {
        self.reads_during_writes.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct GraphData {
    nodes: Vec<StoredNode>,
    relationships: Vec<StoredRelationship>,
    indexes: BTreeSet<String>,
}

pub struct MemoryGraph {
    name: &'static str,
    data: Mutex<GraphData>,
    log: Mutex<Vec<(AccessMode, String)>>,
    gauge: Arc<Gauge>,
    write_delay: Duration,
    fail_on_marker: Mutex<Option<String>>,
}

impl MemoryGraph {
    pub fn new(name: &'static str, gauge: Arc<Gauge>) -> Arc<Self> {
        Arc::new(Self {
            name,
            data: Mutex::new(GraphData::default()),
            log: Mutex::new(Vec::new()),
            gauge,
            write_delay: Duration::from_micros(200),
            fail_on_marker: Mutex::new(None),
        })
    }

    pub fn add_node(&self, labels: &[&str], properties: Value) -> String {
        let mut data = self.data.lock();
        let id = format!("4:{}:{}", self.name, data.nodes.len());
        data.nodes.push(StoredNode {
            id: id.clone(),
            labels: labels.iter().map(ToString::to_string).collect(),
            properties: object(properties),
        });
        id
    }

    pub fn add_relationship(
        &self,
        start: &str,
        rel_type: &str,
        end: &str,
        properties: Value,
    ) -> String {
        let mut data = self.data.lock();
        let id = format!("5:{}:{}", self.name, data.relationships.len());
        data.relationships.push(StoredRelationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            start: start.to_string(),
            end: end.to_string(),
            properties: object(properties),
        });
        id
    }

    /// Make any write whose correlation marker equals `marker` fail
    pub fn fail_writes_for(&self, marker: &str) {
        *self.fail_on_marker.lock() = Some(marker.to_string());
    }

    pub fn nodes(&self) -> Vec<StoredNode> {
        self.data.lock().nodes.clone()
    }

    pub fn relationships(&self) -> Vec<StoredRelationship> {
        self.data.lock().relationships.clone()
    }

    pub fn indexes(&self) -> BTreeSet<String> {
        self.data.lock().indexes.clone()
    }

    pub fn node_by_marker(&self, source_id: &str) -> Option<StoredNode> {
        let data = self.data.lock();
        find_marked(&data.nodes, source_id).map(|i| data.nodes[i].clone())
    }

    pub fn statements(&self) -> Vec<(AccessMode, String)> {
        self.log.lock().clone()
    }

    pub fn write_count(&self) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|(mode, _)| *mode == AccessMode::Write)
            .count()
    }

    fn read(&self, statement: &Statement) -> SyncResult<Vec<Row>> {
        let data = self.data.lock();
        let text = statement.text.as_str();
        let marked_label = format!("MATCH (n:`{MARKER_LABEL}`) RETURN count(n)");

        if text.starts_with("MATCH (n) RETURN count(n)") {
            Ok(vec![row(json!({ "count": data.nodes.len() }))])
        } else if text.starts_with("MATCH ()-[r]->() RETURN count(r)") {
            Ok(vec![row(json!({ "count": data.relationships.len() }))])
        } else if text.starts_with(&marked_label) {
            let count = data
                .nodes
                .iter()
                .filter(|n| n.labels.iter().any(|l| l == MARKER_LABEL))
                .count();
            Ok(vec![row(json!({ "count": count }))])
        } else if text.contains("IS NOT NULL RETURN count(r)") {
            let count = data
                .relationships
                .iter()
                .filter(|r| r.properties.contains_key(MARKER_PROPERTY))
                .count();
            Ok(vec![row(json!({ "count": count }))])
        } else if text.contains("labels(n) AS labels") {
            let (skip, limit) = page(statement);
            Ok(data
                .nodes
                .iter()
                .skip(skip)
                .take(limit)
                .map(|n| {
                    row(json!({
                        "id": n.id,
                        "labels": n.labels,
                        "properties": n.properties,
                    }))
                })
                .collect())
        } else if text.contains("type(r) AS type") {
            let (skip, limit) = page(statement);
            Ok(data
                .relationships
                .iter()
                .skip(skip)
                .take(limit)
                .map(|r| {
                    row(json!({
                        "id": r.id,
                        "type": r.rel_type,
                        "properties": r.properties,
                        "start_id": r.start,
                        "end_id": r.end,
                    }))
                })
                .collect())
        } else {
            Err(SyncError::Query(format!("unsupported read: {text}")))
        }
    }

    fn write(&self, statement: &Statement) -> SyncResult<Vec<Row>> {
        let text = statement.text.as_str();
        if let Some(marker) = self.fail_on_marker.lock().as_deref() {
            if statement.params.get("properties").and_then(|p| p.get(MARKER_PROPERTY))
                == Some(&Value::String(marker.to_string()))
            {
                return Err(SyncError::Query(format!("injected failure for {marker}")));
            }
        }

        let mut data = self.data.lock();
        if text.starts_with("CREATE RANGE INDEX") {
            let name = text.split_whitespace().nth(3).unwrap_or_default();
            data.indexes.insert(name.to_string());
            Ok(Vec::new())
        } else if let Some(rest) = text.strip_prefix("CREATE (n") {
            let labels = identifiers(rest.split(" $properties").next().unwrap_or_default());
            let id = format!("dst:{}", data.nodes.len());
            data.nodes.push(StoredNode {
                id,
                labels,
                properties: object(statement.params["properties"].clone()),
            });
            Ok(Vec::new())
        } else if text.starts_with("MERGE (n:") {
            let from_id = statement.params["from_id"].as_str().unwrap();
            let index = match find_marked(&data.nodes, from_id) {
                Some(index) => index,
                None => {
                    let id = format!("dst:{}", data.nodes.len());
                    data.nodes.push(StoredNode {
                        id,
                        labels: vec![MARKER_LABEL.to_string()],
                        properties: Map::new(),
                    });
                    data.nodes.len() - 1
                }
            };
            let node = &mut data.nodes[index];
            for (key, value) in object(statement.params["properties"].clone()) {
                node.properties.insert(key, value);
            }
            if let Some((_, labels)) = text.split_once(" SET n:") {
                for label in identifiers(&format!(":{labels}")) {
                    if !node.labels.contains(&label) {
                        node.labels.push(label);
                    }
                }
            }
            Ok(Vec::new())
        } else if text.starts_with("MATCH (a:") {
            let start_id = statement.params["start_id"].as_str().unwrap();
            let end_id = statement.params["end_id"].as_str().unwrap();
            let (Some(start), Some(end)) = (
                find_marked(&data.nodes, start_id),
                find_marked(&data.nodes, end_id),
            ) else {
                return Ok(vec![row(json!({ "created": 0 }))]);
            };
            let start = data.nodes[start].id.clone();
            let end = data.nodes[end].id.clone();
            let rel_type = text
                .split_once("[r:")
                .map(|(_, rest)| identifiers(rest).remove(0))
                .unwrap();
            let properties = object(statement.params["properties"].clone());

            if text.contains("MERGE (a)-[r:") {
                let from_id = statement.params["from_id"].as_str().unwrap();
                if let Some(existing) = data.relationships.iter_mut().find(|r| {
                    r.start == start
                        && r.end == end
                        && r.rel_type == rel_type
                        && r.properties.get(MARKER_PROPERTY) == Some(&json!(from_id))
                }) {
                    existing.properties.extend(properties);
                    return Ok(vec![row(json!({ "created": 1 }))]);
                }
            }
            let id = format!("dst-r:{}", data.relationships.len());
            data.relationships.push(StoredRelationship {
                id,
                rel_type,
                start,
                end,
                properties,
            });
            Ok(vec![row(json!({ "created": 1 }))])
        } else {
            Err(SyncError::Query(format!("unsupported write: {text}")))
        }
    }
}

#[async_trait]
impl QueryExecutor for MemoryGraph {
    async fn execute(
        &self,
        statement: &Statement,
        database: &str,
        mode: AccessMode,
    ) -> SyncResult<Vec<Row>> {
        if database != DATABASE {
            return Err(SyncError::Query(format!("database {database} does not exist")));
        }
        self.log.lock().push((mode, statement.text.clone()));
        match mode {
            AccessMode::Read => {
                if self.gauge.in_flight.load(Ordering::SeqCst) > 0 {
                    self.gauge.reads_during_writes.fetch_add(1, Ordering::SeqCst);
                }
                self.read(statement)
            }
            AccessMode::Write => {
                let now = self.gauge.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.gauge.peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(self.write_delay).await;
                let result = self.write(statement);
                self.gauge.in_flight.fetch_sub(1, Ordering::SeqCst);
                result
            }
        }
    }
}

pub fn context(
    source: &Arc<MemoryGraph>,
    destination: &Arc<MemoryGraph>,
    max_concurrency: usize,
    write_mode: WriteMode,
) -> PhaseContext {
    PhaseContext {
        source: Arc::clone(source) as Arc<dyn QueryExecutor>,
        source_database: DATABASE.to_string(),
        destination: Arc::clone(destination) as Arc<dyn QueryExecutor>,
        destination_database: DATABASE.to_string(),
        dispatcher: BoundedDispatcher::new(max_concurrency).unwrap(),
        write_mode,
        dry_run: false,
        progress_interval: Duration::from_secs(3600),
    }
}

/// Source and destination sharing one gauge
pub fn stores() -> (Arc<MemoryGraph>, Arc<MemoryGraph>, Arc<Gauge>) {
    let gauge = Arc::new(Gauge::default());
    (
        MemoryGraph::new("src", Arc::clone(&gauge)),
        MemoryGraph::new("dst", Arc::clone(&gauge)),
        gauge,
    )
}

fn find_marked(nodes: &[StoredNode], source_id: &str) -> Option<usize> {
    nodes.iter().position(|n| {
        n.labels.iter().any(|l| l == MARKER_LABEL)
            && n.properties.get(MARKER_PROPERTY) == Some(&Value::String(source_id.to_string()))
    })
}

fn page(statement: &Statement) -> (usize, usize) {
    let skip = statement.params["skip"].as_u64().unwrap();
    let limit = statement.params["limit"].as_u64().unwrap();
    (skip as usize, limit as usize)
}

fn row(value: Value) -> Row {
    serde_json::from_value(value).unwrap()
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => panic!("expected a map, got {other}"),
    }
}

/// Backtick-quoted identifiers in a `:`A`:`B`` label run, stopping at the
/// first character that is neither a colon nor a quoted identifier
fn identifiers(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ':' => {}
            '`' => {
                let mut name = String::new();
                while let Some(c) = chars.next() {
                    if c == '`' {
                        if chars.peek() == Some(&'`') {
                            chars.next();
                            name.push('`');
                        } else {
                            break;
                        }
                    } else {
                        name.push(c);
                    }
                }
                names.push(name);
            }
            _ => break,
        }
    }
    names
}
