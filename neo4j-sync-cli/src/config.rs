//! Run configuration: built-in defaults, then an optional TOML file, then
//! the command line

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use neo4j_sync_core::{
    BoundedDispatcher, EntityKind, PhaseOptions, SyncPlan, WriteMode, DEFAULT_BATCH_SIZE,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::cli::Args;

const DEFAULT_DATABASE: &str = "neo4j";

/// Contents of a `--config` file; every section and key is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub source: EndpointConfig,
    pub destination: EndpointConfig,
    pub nodes: PhaseConfig,
    pub relationships: PhaseConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub uri: Option<String>,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            uri: None,
            user: String::new(),
            password: String::new(),
            database: DEFAULT_DATABASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseConfig {
    pub limit: i64,
    pub batch_size: u64,
    pub start: u64,
    pub skip: bool,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            limit: -1,
            batch_size: DEFAULT_BATCH_SIZE,
            start: 0,
            skip: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_concurrency: Option<usize>,
    pub merge: bool,
    pub dry_run: bool,
    pub validate: bool,
    pub progress_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            merge: false,
            dry_run: false,
            validate: false,
            progress_interval_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            level: "info".to_string(),
        }
    }
}

/// Connection details of one store
#[derive(Debug)]
pub struct Endpoint {
    pub uri: String,
    pub user: String,
    pub password: SecretString,
    pub database: String,
}

/// Fully resolved options for one run
#[derive(Debug)]
pub struct SyncSettings {
    pub source: Endpoint,
    pub destination: Endpoint,
    pub plan: SyncPlan,
    pub write_mode: WriteMode,
    pub dry_run: bool,
    pub validate: bool,
    pub max_concurrency: usize,
    pub progress_interval: Duration,
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl SyncSettings {
    /// Layer `args` over the file it names (if any) over the defaults
    pub fn resolve(args: Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(file, args)
    }

    fn merge(file: FileConfig, args: Args) -> Result<Self> {
        let source = endpoint(
            "source",
            file.source,
            args.from_uri,
            args.from_user,
            args.from_password,
            args.from_database,
        )?;
        let destination = endpoint(
            "destination",
            file.destination,
            args.to_uri,
            args.to_user,
            args.to_password,
            args.to_database,
        )?;

        let nodes = phase(
            EntityKind::Node,
            file.nodes,
            args.nodes_limit,
            args.nodes_batch_size,
            args.nodes_start,
            args.skip_nodes,
        )?;
        let relationships = phase(
            EntityKind::Relationship,
            file.relationships,
            args.relationships_limit,
            args.relationships_batch_size,
            args.relationships_start,
            args.skip_relationships,
        )?;

        let max_concurrency = args
            .max_concurrency
            .or(file.engine.max_concurrency)
            .unwrap_or_else(BoundedDispatcher::default_concurrency);
        if max_concurrency == 0 {
            bail!("max concurrency must be greater than zero");
        }

        let dry_run = args.dry_run || file.engine.dry_run;
        let validate = args.validate || file.engine.validate;
        if dry_run && validate {
            bail!("validation cannot be combined with a dry run, which writes nothing");
        }

        let write_mode = if args.merge || file.engine.merge {
            WriteMode::Merge
        } else {
            WriteMode::Create
        };

        Ok(Self {
            source,
            destination,
            plan: SyncPlan {
                nodes,
                relationships,
            },
            write_mode,
            dry_run,
            validate,
            max_concurrency,
            progress_interval: Duration::from_secs(file.engine.progress_interval_secs),
            log_dir: args.log_dir.unwrap_or(file.logging.directory),
            log_level: args.log_level.unwrap_or(file.logging.level),
        })
    }
}

fn endpoint(
    role: &str,
    file: EndpointConfig,
    uri: Option<String>,
    user: Option<String>,
    password: Option<String>,
    database: Option<String>,
) -> Result<Endpoint> {
    let Some(uri) = uri.or(file.uri) else {
        bail!("no {role} URI given; pass it on the command line or in the config file");
    };
    let password = password.unwrap_or(file.password);
    Ok(Endpoint {
        uri,
        user: user.unwrap_or(file.user),
        password: SecretString::new(password.into()),
        database: database.unwrap_or(file.database),
    })
}

fn phase(
    kind: EntityKind,
    file: PhaseConfig,
    limit: Option<i64>,
    batch_size: Option<u64>,
    start: Option<u64>,
    skip: bool,
) -> Result<Option<PhaseOptions>> {
    let options = PhaseOptions {
        limit: limit.unwrap_or(file.limit),
        batch_size: batch_size.unwrap_or(file.batch_size),
        start: start.unwrap_or(file.start),
    };
    options.validate(kind)?;
    Ok((!skip && !file.skip).then_some(options))
}
