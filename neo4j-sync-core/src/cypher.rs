//! Cypher statement builders
//!
//! Values always travel as parameters. Labels and relationship types cannot
//! be parameterised in Cypher, so they are embedded as backtick-quoted
//! identifiers.

use crate::correlation::{MARKER_LABEL, MARKER_PROPERTY};
use crate::executor::Statement;
use crate::model::{EntityKind, GraphNode, GraphRelationship, PropertyMap, Window};
use serde_json::Value;

/// How destination entities are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Plain `CREATE`; re-running a window duplicates it
    #[default]
    Create,
    /// `MERGE` on the correlation marker; re-running a window is a no-op
    Merge,
}

/// Quote an identifier, doubling embedded backticks
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// `:`A`:`B`` for the given labels, empty for none
fn label_clause<'a>(labels: impl IntoIterator<Item = &'a str>) -> String {
    labels
        .into_iter()
        .map(|label| format!(":{}", quote_identifier(label)))
        .collect()
}

fn marked_properties(properties: &PropertyMap, source_id: &str) -> Value {
    let mut properties = properties.clone();
    properties.insert(
        MARKER_PROPERTY.to_string(),
        Value::String(source_id.to_string()),
    );
    Value::Object(properties)
}

/// Count every entity of `kind` in the source
#[must_use]
pub fn count(kind: EntityKind) -> Statement {
    let text = match kind {
        EntityKind::Node => "MATCH (n) RETURN count(n) AS count",
        EntityKind::Relationship => "MATCH ()-[r]->() RETURN count(r) AS count",
    };
    Statement::new(text).returning(&["count"])
}

/// Count destination entities carrying the correlation marker
#[must_use]
pub fn count_migrated(kind: EntityKind) -> Statement {
    let marker = quote_identifier(MARKER_PROPERTY);
    let text = match kind {
        EntityKind::Node => format!(
            "MATCH (n:{}) RETURN count(n) AS count",
            quote_identifier(MARKER_LABEL)
        ),
        EntityKind::Relationship => {
            format!("MATCH ()-[r]->() WHERE r.{marker} IS NOT NULL RETURN count(r) AS count")
        }
    };
    Statement::new(text).returning(&["count"])
}

/// Read one window of source entities
#[must_use]
pub fn fetch_window(kind: EntityKind, window: Window) -> Statement {
    let statement = match kind {
        EntityKind::Node => Statement::new(
            "MATCH (n) \
             RETURN elementId(n) AS id, labels(n) AS labels, properties(n) AS properties \
             SKIP $skip LIMIT $limit",
        )
        .returning(&["id", "labels", "properties"]),
        EntityKind::Relationship => Statement::new(
            "MATCH (a)-[r]->(b) \
             RETURN elementId(r) AS id, type(r) AS type, properties(r) AS properties, \
             elementId(a) AS start_id, elementId(b) AS end_id \
             SKIP $skip LIMIT $limit",
        )
        .returning(&["id", "type", "properties", "start_id", "end_id"]),
    };
    statement
        .param("skip", window.offset)
        .param("limit", window.size)
}

/// Create (or merge) the destination counterpart of a source node
#[must_use]
pub fn create_node(node: &GraphNode, mode: WriteMode) -> Statement {
    let properties = marked_properties(&node.properties, &node.id);
    let text = match mode {
        WriteMode::Create => {
            let labels = label_clause(
                std::iter::once(MARKER_LABEL).chain(node.labels.iter().map(String::as_str)),
            );
            format!("CREATE (n{labels} $properties)")
        }
        WriteMode::Merge => {
            let mut text = format!(
                "MERGE (n:{} {{{}: $from_id}}) SET n += $properties",
                quote_identifier(MARKER_LABEL),
                quote_identifier(MARKER_PROPERTY)
            );
            if !node.labels.is_empty() {
                text.push_str(" SET n");
                text.push_str(&label_clause(node.labels.iter().map(String::as_str)));
            }
            text
        }
    };
    let statement = Statement::new(text).param("properties", properties);
    match mode {
        WriteMode::Create => statement,
        WriteMode::Merge => statement.param("from_id", node.id.as_str()),
    }
}

/// Resolve both endpoints by marker and create the edge between them
///
/// Returns a single `created` column; zero means an endpoint was missing.
#[must_use]
pub fn create_relationship(rel: &GraphRelationship, mode: WriteMode) -> Statement {
    let label = quote_identifier(MARKER_LABEL);
    let marker = quote_identifier(MARKER_PROPERTY);
    let rel_type = quote_identifier(&rel.rel_type);
    let write = match mode {
        WriteMode::Create => format!("CREATE (a)-[r:{rel_type} $properties]->(b)"),
        WriteMode::Merge => {
            format!("MERGE (a)-[r:{rel_type} {{{marker}: $from_id}}]->(b) SET r += $properties")
        }
    };
    let text = format!(
        "MATCH (a:{label} {{{marker}: $start_id}}) \
         MATCH (b:{label} {{{marker}: $end_id}}) \
         {write} \
         RETURN count(r) AS created"
    );
    let statement = Statement::new(text)
        .param("start_id", rel.start_id.as_str())
        .param("end_id", rel.end_id.as_str())
        .param("properties", marked_properties(&rel.properties, &rel.id))
        .returning(&["created"]);
    match mode {
        WriteMode::Create => statement,
        WriteMode::Merge => statement.param("from_id", rel.id.as_str()),
    }
}
