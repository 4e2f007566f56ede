//! Relationship migration phase

use crate::cypher::{self, WriteMode};
use crate::error::{SyncError, SyncResult};
use crate::executor::{Row, Statement};
use crate::model::{EntityKind, GraphRelationship};
use crate::phase::{run_phase, EntityMigrator, PhaseContext, PhaseOptions, PhaseReport};

struct RelationshipMigrator;

impl EntityMigrator for RelationshipMigrator {
    type Item = GraphRelationship;

    const KIND: EntityKind = EntityKind::Relationship;

    fn decode(row: &Row) -> SyncResult<GraphRelationship> {
        GraphRelationship::from_row(row)
    }

    fn write_statement(rel: &GraphRelationship, mode: WriteMode) -> Statement {
        cypher::create_relationship(rel, mode)
    }

    fn written(rows: &[Row]) -> SyncResult<bool> {
        let Some(row) = rows.first() else {
            return Ok(false);
        };
        let created = row
            .get("created")
            .and_then(serde_json::Value::as_i64)
            .ok_or_else(|| {
                SyncError::Decode("relationship create returned no `created` count".to_string())
            })?;
        Ok(created > 0)
    }
}

/// Copy source relationships window by window into the destination
///
/// Both endpoints are looked up by correlation marker in the same statement
/// that creates the edge. When either endpoint is missing nothing is
/// created; that is counted in [`PhaseReport::unresolved`], not raised.
/// The node phase must have finished before this runs.
pub async fn migrate_relationships(
    ctx: &PhaseContext,
    options: PhaseOptions,
) -> SyncResult<PhaseReport> {
    run_phase::<RelationshipMigrator>(ctx, options).await
}
