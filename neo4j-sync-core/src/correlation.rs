//! Cross-store identifier correlation
//!
//! Every migrated node carries [`MARKER_LABEL`] and its source element id in
//! [`MARKER_PROPERTY`]. Relationship creates find their endpoints through a
//! range index on that pair. Nothing here ever removes the marker.

use crate::cypher::quote_identifier;
use crate::error::SyncResult;
use crate::executor::{execute_logged, AccessMode, QueryExecutor, Statement};

/// Property holding the source-side element id
pub const MARKER_PROPERTY: &str = "_neo4j_sync_from_id";

/// Label added to every migrated node so the marker can be indexed
pub const MARKER_LABEL: &str = "_neo4j_sync_node";

/// Name of the range index backing endpoint resolution
pub const INDEX_NAME: &str = "node_range_index__neo4j_sync_node__neo4j_sync_from_id";

/// The `CREATE RANGE INDEX ... IF NOT EXISTS` statement
#[must_use]
pub fn index_statement() -> Statement {
    Statement::new(format!(
        "CREATE RANGE INDEX {} IF NOT EXISTS FOR (n:{}) ON (n.{})",
        INDEX_NAME,
        quote_identifier(MARKER_LABEL),
        quote_identifier(MARKER_PROPERTY)
    ))
}

/// Create the marker index in `database` unless it already exists
pub async fn ensure_index(executor: &dyn QueryExecutor, database: &str) -> SyncResult<()> {
    execute_logged(executor, &index_statement(), database, AccessMode::Write).await?;
    tracing::debug!(index = INDEX_NAME, database = database, "Correlation index ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_statement_is_idempotent_ddl() {
        let statement = index_statement();
        assert_eq!(
            statement.text,
            "CREATE RANGE INDEX node_range_index__neo4j_sync_node__neo4j_sync_from_id IF NOT EXISTS \
             FOR (n:`_neo4j_sync_node`) ON (n.`_neo4j_sync_from_id`)"
        );
        assert!(statement.params.is_empty());
    }
}
