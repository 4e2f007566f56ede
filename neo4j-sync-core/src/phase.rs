//! Windowed migration phase shared by nodes and relationships
//!
//! A phase moves through `Sized -> Windowing -> Draining -> Done`. Windows
//! are drained strictly one after another; inside a window every write goes
//! through the [`BoundedDispatcher`] and the window only ends once all of
//! them have finished.

use crate::cypher::{self, WriteMode};
use crate::dispatcher::BoundedDispatcher;
use crate::error::{SyncError, SyncResult};
use crate::estimator;
use crate::executor::{execute_logged, AccessMode, QueryExecutor, Row, Statement};
use crate::model::{EntityKind, PhaseProgress, Window};
use crate::planner;
use crate::progress::ProgressTracker;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default window size
pub const DEFAULT_BATCH_SIZE: u64 = 1000;

/// Per-phase options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseOptions {
    /// Items to migrate; negative means count them in the source
    pub limit: i64,
    /// Window size
    pub batch_size: u64,
    /// Offset of the first window, for manual resumption
    pub start: u64,
}

impl Default for PhaseOptions {
    fn default() -> Self {
        Self {
            limit: -1,
            batch_size: DEFAULT_BATCH_SIZE,
            start: 0,
        }
    }
}

impl PhaseOptions {
    /// Reject options that cannot produce a plan
    pub fn validate(&self, kind: EntityKind) -> SyncResult<()> {
        if self.batch_size == 0 {
            return Err(SyncError::Config(format!(
                "{kind} batch size must be greater than zero"
            )));
        }
        if self.limit < -1 {
            return Err(SyncError::Config(format!(
                "{kind} limit must be -1 (auto-detect) or a count, got {}",
                self.limit
            )));
        }
        Ok(())
    }
}

/// Where a phase is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseState {
    /// Total known
    Sized,
    /// Windows planned
    Windowing,
    /// Windows being read and written
    Draining,
    /// Every window drained
    Done,
}

impl fmt::Display for PhaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sized => "sized",
            Self::Windowing => "windowing",
            Self::Draining => "draining",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Outcome of one phase
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseReport {
    /// Entity kind migrated
    pub kind: EntityKind,
    /// Where the phase ended
    pub state: PhaseState,
    /// Items the phase covered, from offset zero
    pub total: u64,
    /// First offset drained
    pub start: u64,
    /// Window size used
    pub batch_size: u64,
    /// Windows drained
    pub windows: u64,
    /// Source rows read
    pub rows_read: u64,
    /// Write statements that completed
    pub writes: u64,
    /// Relationship writes whose endpoints did not resolve
    pub unresolved: u64,
    /// Wall-clock duration
    pub elapsed: Duration,
}

/// Everything a phase needs besides its own options
pub struct PhaseContext {
    /// Store read from
    pub source: Arc<dyn QueryExecutor>,
    /// Logical database in the source store
    pub source_database: String,
    /// Store written to
    pub destination: Arc<dyn QueryExecutor>,
    /// Logical database in the destination store
    pub destination_database: String,
    /// Concurrency budget for writes
    pub dispatcher: BoundedDispatcher,
    /// `CREATE` or `MERGE`
    pub write_mode: WriteMode,
    /// Build and log writes without sending them
    pub dry_run: bool,
    /// Minimum time between progress lines
    pub progress_interval: Duration,
}

/// Per-kind behaviour plugged into [`run_phase`]
pub(crate) trait EntityMigrator: 'static {
    /// Decoded source entity
    type Item;

    /// Kind handled by this migrator
    const KIND: EntityKind;

    /// Decode one source window row
    fn decode(row: &Row) -> SyncResult<Self::Item>;

    /// Write statement reproducing `item` in the destination
    fn write_statement(item: &Self::Item, mode: WriteMode) -> Statement;

    /// Whether the rows returned by a write show the entity was written
    fn written(rows: &[Row]) -> SyncResult<bool>;
}

/// Drive one phase from sizing to the last window
pub(crate) async fn run_phase<M: EntityMigrator>(
    ctx: &PhaseContext,
    options: PhaseOptions,
) -> SyncResult<PhaseReport> {
    options.validate(M::KIND)?;
    let started = Instant::now();

    let total = estimator::resolve_total(
        ctx.source.as_ref(),
        &ctx.source_database,
        M::KIND,
        options.limit,
    )
    .await?;
    let mut report = PhaseReport {
        kind: M::KIND,
        state: PhaseState::Sized,
        total,
        start: options.start,
        batch_size: options.batch_size,
        windows: 0,
        rows_read: 0,
        writes: 0,
        unresolved: 0,
        elapsed: Duration::ZERO,
    };
    tracing::info!("Number of {} to sync: {}", M::KIND, total);

    let windows = planner::plan(total, options.start, options.batch_size);
    report.state = PhaseState::Windowing;
    tracing::info!(
        kind = %M::KIND,
        windows = windows.len(),
        start = options.start,
        batch_size = options.batch_size,
        "Planned windows"
    );

    let progress = ProgressTracker::new(
        M::KIND,
        total.saturating_sub(options.start),
        ctx.progress_interval,
    );
    report.state = PhaseState::Draining;
    for window in windows {
        let resume_point = PhaseProgress {
            total,
            offset: window.offset,
            batch_size: options.batch_size,
        };
        let rows_read = match drain_window::<M>(ctx, window, &mut report).await {
            Ok(rows_read) => rows_read,
            Err(e) => {
                tracing::error!(
                    kind = %M::KIND,
                    error = %e,
                    offset = resume_point.offset,
                    total = resume_point.total,
                    batch_size = resume_point.batch_size,
                    "Window failed; rerun the phase with this start offset to resume"
                );
                return Err(e);
            }
        };
        report.windows += 1;
        progress.increment(rows_read);
        progress.maybe_report();
    }
    progress.report();

    report.state = PhaseState::Done;
    report.elapsed = started.elapsed();
    if report.unresolved > 0 {
        tracing::warn!(
            kind = %M::KIND,
            unresolved = report.unresolved,
            "Some relationships were not created because an endpoint node is missing in the destination"
        );
    }
    Ok(report)
}

async fn drain_window<M: EntityMigrator>(
    ctx: &PhaseContext,
    window: Window,
    report: &mut PhaseReport,
) -> SyncResult<u64> {
    let rows = execute_logged(
        ctx.source.as_ref(),
        &cypher::fetch_window(M::KIND, window),
        &ctx.source_database,
        AccessMode::Read,
    )
    .await?;
    let rows_read = rows.len() as u64;
    report.rows_read += rows_read;
    if rows_read < window.size {
        tracing::warn!(
            kind = %M::KIND,
            offset = window.offset,
            expected = window.size,
            received = rows.len(),
            "Source returned fewer rows than planned"
        );
    }

    let statements = rows
        .iter()
        .map(|row| M::decode(row).map(|item| M::write_statement(&item, ctx.write_mode)))
        .collect::<SyncResult<Vec<_>>>()?;

    if ctx.dry_run {
        for statement in &statements {
            let params = serde_json::to_string(&statement.params)?;
            tracing::info!(dry_run = true, params = %params, "{}", statement.text);
        }
        return Ok(rows_read);
    }

    let tasks: Vec<_> = statements
        .into_iter()
        .map(|statement| {
            let destination = Arc::clone(&ctx.destination);
            let database = ctx.destination_database.clone();
            async move {
                let rows = execute_logged(
                    destination.as_ref(),
                    &statement,
                    &database,
                    AccessMode::Write,
                )
                .await?;
                M::written(&rows)
            }
        })
        .collect();

    let outcomes = ctx.dispatcher.run_bounded(tasks).await?;
    report.writes += outcomes.len() as u64;
    report.unresolved += outcomes.iter().filter(|written| !**written).count() as u64;
    tracing::debug!(
        kind = %M::KIND,
        offset = window.offset,
        size = window.size,
        writes = outcomes.len(),
        "Window drained"
    );
    Ok(rows_read)
}
