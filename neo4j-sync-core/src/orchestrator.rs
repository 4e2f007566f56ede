//! Run orchestration: index, then nodes, then relationships

use crate::correlation;
use crate::error::SyncResult;
use crate::nodes::migrate_nodes;
use crate::phase::{PhaseContext, PhaseOptions, PhaseReport};
use crate::relationships::migrate_relationships;
use crate::validator::{self, ValidationReport};
use std::time::{Duration, Instant};

/// Which phases to run and with what options; `None` skips a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPlan {
    /// Node phase options
    pub nodes: Option<PhaseOptions>,
    /// Relationship phase options
    pub relationships: Option<PhaseOptions>,
}

impl Default for SyncPlan {
    fn default() -> Self {
        Self {
            nodes: Some(PhaseOptions::default()),
            relationships: Some(PhaseOptions::default()),
        }
    }
}

/// Outcome of a whole run
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    /// Node phase, if it ran
    pub nodes: Option<PhaseReport>,
    /// Relationship phase, if it ran
    pub relationships: Option<PhaseReport>,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl SyncReport {
    /// Phases that ran, nodes first
    #[must_use]
    pub fn phases(&self) -> Vec<&PhaseReport> {
        self.nodes.iter().chain(self.relationships.iter()).collect()
    }

    /// Print summary to console
    pub fn print_summary(&self) {
        println!("\nSync Complete!");
        println!("==============");
        for phase in self.phases() {
            println!("{}:", phase.kind);
            println!("  Planned: {} (from offset {})", phase.total, phase.start);
            println!("  Windows: {} x {}", phase.windows, phase.batch_size);
            println!("  Read: {}", phase.rows_read);
            println!("  Written: {}", phase.writes);
            if phase.unresolved > 0 {
                println!("  Unresolved endpoints: {}", phase.unresolved);
            }
            println!("  Elapsed: {:?}", phase.elapsed);
        }
        println!("Total elapsed: {:?}", self.elapsed);
    }
}

/// Sequences the phases of a sync run
pub struct SyncEngine {
    ctx: PhaseContext,
}

impl SyncEngine {
    /// Engine over an assembled context
    #[must_use]
    pub const fn new(ctx: PhaseContext) -> Self {
        Self { ctx }
    }

    /// Shared phase context
    #[must_use]
    pub const fn context(&self) -> &PhaseContext {
        &self.ctx
    }

    /// Ensure the correlation index, then run the planned phases in order
    ///
    /// A failure stops the run; nothing already written is rolled back.
    pub async fn run(&self, plan: &SyncPlan) -> SyncResult<SyncReport> {
        let started = Instant::now();

        if self.ctx.dry_run {
            tracing::info!("Dry run: skipping correlation index creation");
        } else {
            correlation::ensure_index(
                self.ctx.destination.as_ref(),
                &self.ctx.destination_database,
            )
            .await?;
        }

        let nodes = match plan.nodes {
            Some(options) => {
                tracing::info!(
                    from = %self.ctx.source_database,
                    to = %self.ctx.destination_database,
                    "Syncing nodes"
                );
                let report = migrate_nodes(&self.ctx, options).await?;
                tracing::info!("Time to sync nodes: {:?}", report.elapsed);
                Some(report)
            }
            None => {
                tracing::info!("Skipping node phase");
                None
            }
        };

        let relationships = match plan.relationships {
            Some(options) => {
                tracing::info!(
                    from = %self.ctx.source_database,
                    to = %self.ctx.destination_database,
                    "Syncing relationships"
                );
                let report = migrate_relationships(&self.ctx, options).await?;
                tracing::info!("Time to sync relationships: {:?}", report.elapsed);
                Some(report)
            }
            None => {
                tracing::info!("Skipping relationship phase");
                None
            }
        };

        Ok(SyncReport {
            nodes,
            relationships,
            elapsed: started.elapsed(),
        })
    }

    /// Compare destination counts with what `report` planned
    pub async fn validate(&self, report: &SyncReport) -> SyncResult<ValidationReport> {
        validator::validate_counts(
            self.ctx.destination.as_ref(),
            &self.ctx.destination_database,
            &report.phases(),
        )
        .await
    }
}
