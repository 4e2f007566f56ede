//! Cardinality estimation

use crate::cypher;
use crate::error::{SyncError, SyncResult};
use crate::executor::{execute_logged, AccessMode, QueryExecutor};
use crate::model::{integer_column, EntityKind};

/// Count every entity of `kind` in `database`
///
/// An empty graph yields zero, which plans zero windows.
pub async fn estimate(
    executor: &dyn QueryExecutor,
    database: &str,
    kind: EntityKind,
) -> SyncResult<u64> {
    count_with(executor, database, &cypher::count(kind)).await
}

/// Count destination entities of `kind` that carry the correlation marker
pub async fn count_migrated(
    executor: &dyn QueryExecutor,
    database: &str,
    kind: EntityKind,
) -> SyncResult<u64> {
    count_with(executor, database, &cypher::count_migrated(kind)).await
}

/// Explicit limit when non-negative, otherwise the estimated count
pub async fn resolve_total(
    executor: &dyn QueryExecutor,
    database: &str,
    kind: EntityKind,
    limit: i64,
) -> SyncResult<u64> {
    match u64::try_from(limit) {
        Ok(limit) => Ok(limit),
        Err(_) => estimate(executor, database, kind).await,
    }
}

async fn count_with(
    executor: &dyn QueryExecutor,
    database: &str,
    statement: &crate::executor::Statement,
) -> SyncResult<u64> {
    let rows = execute_logged(executor, statement, database, AccessMode::Read).await?;
    let row = rows
        .first()
        .ok_or_else(|| SyncError::Decode("count query returned no rows".to_string()))?;
    let count = integer_column(row, "count")?;
    u64::try_from(count).map_err(|_| SyncError::Decode(format!("negative count {count}")))
}
