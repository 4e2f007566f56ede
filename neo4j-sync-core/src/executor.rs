//! Query executor contract
//!
//! The engine never talks to a driver directly. Everything it needs from a
//! graph store is "run this statement against that database and give me the
//! rows back", expressed by [`QueryExecutor`].

use crate::error::SyncResult;
use crate::model::PropertyValue;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Result row: column name to value
pub type Row = HashMap<String, PropertyValue>;

/// Declared intent of a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccessMode {
    /// No side effects
    Read,
    /// Mutates the store
    Write,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("READ"),
            Self::Write => f.write_str("WRITE"),
        }
    }
}

/// A Cypher statement with its parameters and expected result columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    /// Statement text
    pub text: String,
    /// Named parameters referenced as `$name` in the text
    pub params: BTreeMap<String, PropertyValue>,
    /// Columns the caller reads from each returned row
    pub columns: Vec<&'static str>,
}

impl Statement {
    /// Statement with no parameters and no result columns
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: BTreeMap::new(),
            columns: Vec::new(),
        }
    }

    /// Bind a parameter
    #[must_use]
    pub fn param(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    /// Declare the result columns
    #[must_use]
    pub fn returning(mut self, columns: &[&'static str]) -> Self {
        self.columns = columns.to_vec();
        self
    }
}

/// Executes statements against a named logical database
///
/// Implementations must be safe to share between concurrently dispatched
/// writes; the engine does not serialize access beyond its concurrency cap.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run `statement` against `database` and collect every result row
    async fn execute(
        &self,
        statement: &Statement,
        database: &str,
        mode: AccessMode,
    ) -> SyncResult<Vec<Row>>;
}

/// Execute a statement after recording it in the run log
pub async fn execute_logged(
    executor: &dyn QueryExecutor,
    statement: &Statement,
    database: &str,
    mode: AccessMode,
) -> SyncResult<Vec<Row>> {
    let params = serde_json::to_string(&statement.params)?;
    tracing::info!(
        database = database,
        mode = %mode,
        params = %params,
        "{}",
        statement.text
    );
    executor.execute(statement, database, mode).await
}
