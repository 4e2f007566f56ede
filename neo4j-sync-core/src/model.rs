//! Graph entities read from the source store

use crate::error::{SyncError, SyncResult};
use crate::executor::Row;
use serde_json::{Map, Number, Value};
use std::fmt;

/// A single property value (null, bool, integer, float, string, list or map)
///
/// JSON has no NaN or infinity, so those floats travel as a single-entry map
/// `{"_neo4j_sync_float": "NaN" | "Infinity" | "-Infinity"}`. Graph property
/// values are never maps, so the encoding cannot collide with user data.
pub type PropertyValue = Value;

/// Property key to value mapping
pub type PropertyMap = Map<String, Value>;

/// Key of the map standing in for a non-finite float
pub const NON_FINITE_FLOAT_KEY: &str = "_neo4j_sync_float";

/// Property value for a float, including NaN and the infinities
#[must_use]
pub fn float_value(value: f64) -> PropertyValue {
    if let Some(number) = Number::from_f64(value) {
        return Value::Number(number);
    }
    let repr = if value.is_nan() {
        "NaN"
    } else if value.is_sign_positive() {
        "Infinity"
    } else {
        "-Infinity"
    };
    let mut map = Map::new();
    map.insert(NON_FINITE_FLOAT_KEY.to_string(), Value::from(repr));
    Value::Object(map)
}

/// The float `value` encodes, if it is a non-finite float produced by
/// [`float_value`]
#[must_use]
pub fn non_finite_float(value: &PropertyValue) -> Option<f64> {
    let map = value.as_object()?;
    if map.len() != 1 {
        return None;
    }
    match map.get(NON_FINITE_FLOAT_KEY)?.as_str()? {
        "NaN" => Some(f64::NAN),
        "Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

/// Which kind of entity a phase migrates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Graph nodes
    Node,
    /// Directed relationships
    Relationship,
}

impl EntityKind {
    /// Plural name used in log lines and reports
    #[must_use]
    pub const fn plural(self) -> &'static str {
        match self {
            Self::Node => "nodes",
            Self::Relationship => "relationships",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plural())
    }
}

/// A node as read from the source store
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    /// Source-assigned element id, meaningless in the destination
    pub id: String,
    /// Labels with duplicates removed, first occurrence wins
    pub labels: Vec<String>,
    /// Original properties
    pub properties: PropertyMap,
}

impl GraphNode {
    /// Decode a node window row (`id`, `labels`, `properties`)
    pub fn from_row(row: &Row) -> SyncResult<Self> {
        let id = string_column(row, "id")?;
        let mut labels: Vec<String> = Vec::new();
        for label in list_column(row, "labels")? {
            let label = label
                .as_str()
                .ok_or_else(|| SyncError::Decode(format!("node {id}: non-string label {label}")))?;
            if !labels.iter().any(|l| l == label) {
                labels.push(label.to_string());
            }
        }
        let properties = map_column(row, "properties")?;
        Ok(Self {
            id,
            labels,
            properties,
        })
    }
}

/// A relationship as read from the source store
#[derive(Debug, Clone, PartialEq)]
pub struct GraphRelationship {
    /// Source-assigned element id
    pub id: String,
    /// Relationship type
    pub rel_type: String,
    /// Original properties
    pub properties: PropertyMap,
    /// Source id of the start node
    pub start_id: String,
    /// Source id of the end node
    pub end_id: String,
}

impl GraphRelationship {
    /// Decode a relationship window row (`id`, `type`, `properties`, `start_id`, `end_id`)
    pub fn from_row(row: &Row) -> SyncResult<Self> {
        Ok(Self {
            id: string_column(row, "id")?,
            rel_type: string_column(row, "type")?,
            properties: map_column(row, "properties")?,
            start_id: string_column(row, "start_id")?,
            end_id: string_column(row, "end_id")?,
        })
    }
}

/// One page of source rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Rows to skip
    pub offset: u64,
    /// Rows to take
    pub size: u64,
}

impl Window {
    /// First offset after this window
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.offset + self.size
    }
}

/// Everything needed to resume a phase by hand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseProgress {
    /// Items the phase covers
    pub total: u64,
    /// Offset of the next window to drain
    pub offset: u64,
    /// Window size
    pub batch_size: u64,
}

fn column<'a>(row: &'a Row, name: &str) -> SyncResult<&'a Value> {
    row.get(name)
        .ok_or_else(|| SyncError::Decode(format!("missing column `{name}`")))
}

pub(crate) fn string_column(row: &Row, name: &str) -> SyncResult<String> {
    match column(row, name)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(SyncError::Decode(format!(
            "column `{name}` is not a string: {other}"
        ))),
    }
}

pub(crate) fn integer_column(row: &Row, name: &str) -> SyncResult<i64> {
    column(row, name)?
        .as_i64()
        .ok_or_else(|| SyncError::Decode(format!("column `{name}` is not an integer")))
}

fn list_column<'a>(row: &'a Row, name: &str) -> SyncResult<&'a Vec<Value>> {
    match column(row, name)? {
        Value::Array(items) => Ok(items),
        other => Err(SyncError::Decode(format!(
            "column `{name}` is not a list: {other}"
        ))),
    }
}

fn map_column(row: &Row, name: &str) -> SyncResult<PropertyMap> {
    match column(row, name)? {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(PropertyMap::new()),
        other => Err(SyncError::Decode(format!(
            "column `{name}` is not a map: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn duplicate_labels_collapse() {
        let node = GraphNode::from_row(&row(json!({
            "id": "4:abc:1",
            "labels": ["Person", "Admin", "Person"],
            "properties": {"name": "Alice"}
        })))
        .unwrap();

        assert_eq!(node.labels, vec!["Person", "Admin"]);
        assert_eq!(node.properties["name"], json!("Alice"));
    }

    #[test]
    fn label_less_node_decodes() {
        let node = GraphNode::from_row(&row(json!({
            "id": "4:abc:2",
            "labels": [],
            "properties": {}
        })))
        .unwrap();

        assert!(node.labels.is_empty());
        assert!(node.properties.is_empty());
    }

    #[test]
    fn non_finite_floats_survive_as_tagged_maps() {
        let nan = float_value(f64::NAN);
        assert_eq!(nan, json!({"_neo4j_sync_float": "NaN"}));
        assert!(non_finite_float(&nan).unwrap().is_nan());
        assert_eq!(
            non_finite_float(&float_value(f64::NEG_INFINITY)),
            Some(f64::NEG_INFINITY)
        );
        assert_eq!(
            non_finite_float(&float_value(f64::INFINITY)),
            Some(f64::INFINITY)
        );

        assert_eq!(float_value(2.5), json!(2.5));
        assert_eq!(non_finite_float(&json!(2.5)), None);
        assert_eq!(
            non_finite_float(&json!({"_neo4j_sync_float": "NaN", "other": 1})),
            None
        );
        assert_eq!(non_finite_float(&json!({"_neo4j_sync_float": "big"})), None);
    }

    #[test]
    fn missing_column_is_a_decode_error() {
        let err = GraphRelationship::from_row(&row(json!({
            "id": "5:abc:1",
            "type": "KNOWS",
            "properties": {}
        })))
        .unwrap_err();

        assert!(matches!(err, SyncError::Decode(msg) if msg.contains("start_id")));
    }
}
