//! neo4j-sync command-line front end: arguments, configuration, run log and
//! the Neo4j executor

pub mod cli;
pub mod config;
pub mod logging;
pub mod neo4j;

pub use cli::Args;
pub use config::{Endpoint, FileConfig, SyncSettings};
pub use neo4j::Neo4jExecutor;
