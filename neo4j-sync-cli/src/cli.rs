//! Command-line arguments

use clap::Parser;
use std::path::PathBuf;

/// Copy every node and relationship of one Neo4j database into another
#[derive(Parser, Debug)]
#[command(name = "neo4j-sync", version, about, long_about = None)]
pub struct Args {
    /// URI of the source Neo4j database (e.g., bolt://localhost:7687)
    #[arg(long)]
    pub from_uri: Option<String>,

    /// URI of the destination Neo4j database
    #[arg(long)]
    pub to_uri: Option<String>,

    /// Username of the source Neo4j database
    #[arg(long)]
    pub from_user: Option<String>,

    /// Password of the source Neo4j database
    #[arg(long, env = "NEO4J_SYNC_FROM_PASSWORD", hide_env_values = true)]
    pub from_password: Option<String>,

    /// Name of the source Neo4j database [default: neo4j]
    #[arg(long)]
    pub from_database: Option<String>,

    /// Username of the destination Neo4j database
    #[arg(long)]
    pub to_user: Option<String>,

    /// Password of the destination Neo4j database
    #[arg(long, env = "NEO4J_SYNC_TO_PASSWORD", hide_env_values = true)]
    pub to_password: Option<String>,

    /// Name of the destination Neo4j database [default: neo4j]
    #[arg(long)]
    pub to_database: Option<String>,

    /// Number of nodes to sync, -1 counts them in the source [default: -1]
    #[arg(long, allow_negative_numbers = true)]
    pub nodes_limit: Option<i64>,

    /// Number of relationships to sync, -1 counts them in the source [default: -1]
    #[arg(long, allow_negative_numbers = true)]
    pub relationships_limit: Option<i64>,

    /// Batch size for syncing nodes [default: 1000]
    #[arg(long)]
    pub nodes_batch_size: Option<u64>,

    /// Batch size for syncing relationships [default: 1000]
    #[arg(long)]
    pub relationships_batch_size: Option<u64>,

    /// Start index for syncing nodes [default: 0]
    #[arg(long)]
    pub nodes_start: Option<u64>,

    /// Start index for syncing relationships [default: 0]
    #[arg(long)]
    pub relationships_start: Option<u64>,

    /// Skip syncing nodes
    #[arg(long)]
    pub skip_nodes: bool,

    /// Skip syncing relationships
    #[arg(long)]
    pub skip_relationships: bool,

    /// TOML file providing defaults for any of these options
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Use MERGE on the correlation marker so reruns do not duplicate data
    #[arg(long)]
    pub merge: bool,

    /// Read the source and log every write without sending it
    #[arg(long)]
    pub dry_run: bool,

    /// Compare destination counts with the planned totals after the run
    #[arg(long)]
    pub validate: bool,

    /// Maximum concurrent writes per batch [default: number of CPUs]
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Directory receiving the per-run log file [default: logs]
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set [default: info]
    #[arg(long)]
    pub log_level: Option<String>,
}
