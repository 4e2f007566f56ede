//! Node migration phase

use crate::cypher::{self, WriteMode};
use crate::error::SyncResult;
use crate::executor::{Row, Statement};
use crate::model::{EntityKind, GraphNode};
use crate::phase::{run_phase, EntityMigrator, PhaseContext, PhaseOptions, PhaseReport};

pub(crate) struct NodeMigrator;

impl EntityMigrator for NodeMigrator {
    type Item = GraphNode;

    const KIND: EntityKind = EntityKind::Node;

    fn decode(row: &Row) -> SyncResult<GraphNode> {
        GraphNode::from_row(row)
    }

    fn write_statement(node: &GraphNode, mode: WriteMode) -> Statement {
        cypher::create_node(node, mode)
    }

    fn written(_rows: &[Row]) -> SyncResult<bool> {
        Ok(true)
    }
}

/// Copy source nodes window by window into the destination
///
/// Each destination node gets the source labels, the marker label, the
/// source properties and the correlation marker. Nodes written by windows
/// that completed before a failure stay in the destination.
pub async fn migrate_nodes(ctx: &PhaseContext, options: PhaseOptions) -> SyncResult<PhaseReport> {
    run_phase::<NodeMigrator>(ctx, options).await
}
