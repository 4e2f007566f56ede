//! Post-run count validation

use crate::error::SyncResult;
use crate::estimator;
use crate::executor::QueryExecutor;
use crate::model::EntityKind;
use crate::phase::PhaseReport;

/// Destination count for one entity kind against what the run planned
#[derive(Debug, Clone, PartialEq)]
pub struct CountReport {
    /// Entity kind checked
    pub kind: EntityKind,
    /// Items the phase covered
    pub expected: u64,
    /// Marked items found in the destination
    pub target_count: u64,
    /// Fraction of expected items missing (0.0 to 1.0)
    pub loss_rate: f64,
    /// Counts match exactly
    pub passed: bool,
}

impl CountReport {
    /// Compare `target_count` with `expected`
    #[must_use]
    pub fn new(kind: EntityKind, expected: u64, target_count: u64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let loss_rate = if expected > 0 {
            expected.saturating_sub(target_count) as f64 / expected as f64
        } else {
            0.0
        };
        Self {
            kind,
            expected,
            target_count,
            loss_rate,
            passed: expected == target_count,
        }
    }

    /// Print report
    pub fn print(&self) {
        println!("\nCount Validation: {}", self.kind);
        println!("=====================");
        println!("Expected: {}", self.expected);
        println!("Destination: {}", self.target_count);
        println!("Loss rate: {:.2}%", self.loss_rate * 100.0);
        println!("Status: {}", if self.passed { "PASSED" } else { "FAILED" });
    }
}

/// Validation of every phase that ran
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    /// One entry per phase
    pub counts: Vec<CountReport>,
    /// Every count matched
    pub overall_passed: bool,
}

impl ValidationReport {
    /// Print full report
    pub fn print(&self) {
        for count in &self.counts {
            count.print();
        }
        println!("\n{}", "=".repeat(50));
        println!(
            "OVERALL VALIDATION: {}",
            if self.overall_passed { "PASSED" } else { "FAILED" }
        );
        println!("{}", "=".repeat(50));
    }
}

/// Count marked destination entities for each finished phase
pub async fn validate_counts(
    destination: &dyn QueryExecutor,
    database: &str,
    phases: &[&PhaseReport],
) -> SyncResult<ValidationReport> {
    let mut counts = Vec::with_capacity(phases.len());
    for phase in phases {
        let target = estimator::count_migrated(destination, database, phase.kind).await?;
        let count = CountReport::new(phase.kind, phase.total, target);
        if count.passed {
            tracing::info!(kind = %phase.kind, count = target, "Count validation passed");
        } else {
            tracing::warn!(
                kind = %phase.kind,
                expected = count.expected,
                found = count.target_count,
                "Count validation failed"
            );
        }
        counts.push(count);
    }
    let overall_passed = counts.iter().all(|c| c.passed);
    Ok(ValidationReport {
        counts,
        overall_passed,
    })
}
