//! Bulk copy of a property graph between two graph stores.
//!
//! Source and destination assign unrelated internal ids, so every migrated
//! node is stamped with its source id (the correlation marker) and
//! relationships find their endpoints through an index on that marker.
//! Nodes are copied in a phase that finishes before any relationship is
//! written.

#![warn(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::unimplemented,
    clippy::todo
)]
#![deny(clippy::unwrap_in_result)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod correlation;
pub mod cypher;
pub mod dispatcher;
pub mod error;
pub mod estimator;
pub mod executor;
pub mod model;
pub mod nodes;
pub mod orchestrator;
pub mod phase;
pub mod planner;
pub mod progress;
pub mod relationships;
pub mod validator;

pub use correlation::{ensure_index, INDEX_NAME, MARKER_LABEL, MARKER_PROPERTY};
pub use cypher::WriteMode;
pub use dispatcher::BoundedDispatcher;
pub use error::{SyncError, SyncResult};
pub use estimator::estimate;
pub use executor::{AccessMode, QueryExecutor, Row, Statement};
pub use model::{
    float_value, non_finite_float, EntityKind, GraphNode, GraphRelationship, PhaseProgress,
    PropertyMap, PropertyValue, Window, NON_FINITE_FLOAT_KEY,
};
pub use nodes::migrate_nodes;
pub use orchestrator::{SyncEngine, SyncPlan, SyncReport};
pub use phase::{PhaseContext, PhaseOptions, PhaseReport, PhaseState, DEFAULT_BATCH_SIZE};
pub use planner::plan;
pub use progress::ProgressTracker;
pub use relationships::migrate_relationships;
pub use validator::{CountReport, ValidationReport};
