//! Throttled batch scheduling
//!
//! Applications are migrated in consecutive batches. All members of a batch
//! run concurrently (one task each); the next batch only starts once every
//! task of the current one has finished. A failing member never affects its
//! siblings or later batches.

use crate::error::MigrationError;
use crate::migration::AppMigration;
use crate::state_machine::MigrationOutcome;
use crate::status::{StatusReporter, TransitionSink};
use crate::types::{AppId, Application, BatchSize};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Final result for one application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppOutcome {
    /// Application identifier
    pub id: AppId,
    /// Application name
    pub name: String,
    /// Terminal outcome
    pub outcome: MigrationOutcome,
}

/// Outcome of a whole run, in selection order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    /// Per-application results
    pub outcomes: Vec<AppOutcome>,
    /// Number of batches executed
    pub batches: usize,
}

impl MigrationSummary {
    /// Applications processed
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Applications that reached the desired end state
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_success()).count()
    }

    /// Applications that need operator attention
    #[must_use]
    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    /// Count of applications per outcome
    #[must_use]
    pub fn counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for o in &self.outcomes {
            *counts.entry(o.outcome.to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Outcome recorded for `app`
    #[must_use]
    pub fn outcome_of(&self, app: &AppId) -> Option<MigrationOutcome> {
        self.outcomes
            .iter()
            .find(|o| &o.id == app)
            .map(|o| o.outcome)
    }
}

impl fmt::Display for MigrationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed in {} batch(es): {} succeeded, {} need attention",
            self.total(),
            self.batches,
            self.succeeded(),
            self.failed()
        )
    }
}

/// Runs migrations batch by batch
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    migration: Arc<AppMigration>,
    reporter: Arc<StatusReporter>,
}

impl BatchScheduler {
    /// Create scheduler
    #[inline]
    #[must_use]
    pub fn new(migration: Arc<AppMigration>, reporter: Arc<StatusReporter>) -> Self {
        Self {
            migration,
            reporter,
        }
    }

    /// Migrate `apps` in batches of `batch_size`
    ///
    /// # Errors
    /// - `MigrationError::InvalidBatchSize` unless `1 <= batch_size <= 100`;
    ///   nothing is migrated in that case
    pub async fn run(
        &self,
        apps: Vec<Application>,
        batch_size: i64,
    ) -> Result<MigrationSummary, MigrationError> {
        let size = BatchSize::new(batch_size)?;
        Ok(self.run_batches(apps, size).await)
    }

    /// Migrate `apps` in batches of an already validated size
    pub async fn run_batches(&self, apps: Vec<Application>, size: BatchSize) -> MigrationSummary {
        let total = apps.len();
        let mut summary = MigrationSummary::default();
        let mut remaining = apps.into_iter();

        loop {
            let batch: Vec<Application> = remaining.by_ref().take(size.get()).collect();
            if batch.is_empty() {
                break;
            }

            self.reporter.line(&format!(
                "Total {total} found, {} processed. Batch processing {} at a time ...",
                summary.total(),
                batch.len()
            ));
            tracing::info!(batch = summary.batches + 1, members = batch.len(), "starting batch");

            let outcomes = self.run_batch(batch).await;
            summary.outcomes.extend(outcomes);
            summary.batches += 1;

            self.reporter.line("");
        }

        tracing::info!(
            total = summary.total(),
            succeeded = summary.succeeded(),
            batches = summary.batches,
            "all batches finished"
        );
        summary
    }

    async fn run_batch(&self, batch: Vec<Application>) -> Vec<AppOutcome> {
        self.reporter.render_initial(&batch);

        let mut members = Vec::with_capacity(batch.len());
        let mut handles = Vec::with_capacity(batch.len());

        for app in batch {
            members.push((app.id.clone(), app.name.clone()));

            let migration = Arc::clone(&self.migration);
            let events: Arc<dyn TransitionSink> = self.reporter.clone();
            handles.push(tokio::spawn(async move {
                migration.run(app, events.as_ref()).await
            }));
        }

        // Barrier: every member finishes before the next batch starts
        let joined = join_all(handles).await;

        members
            .into_iter()
            .zip(joined)
            .map(|((id, name), result)| {
                let outcome = result.unwrap_or_else(|e| {
                    tracing::error!(app = %name, guid = %id, error = %e, "migration task failed");
                    MigrationOutcome::Aborted
                });
                AppOutcome { id, name, outcome }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(id: &str, outcome: MigrationOutcome) -> AppOutcome {
        AppOutcome {
            id: AppId::new(id),
            name: format!("app-{id}"),
            outcome,
        }
    }

    #[test]
    fn summary_counts() {
        let summary = MigrationSummary {
            outcomes: vec![
                outcome("1", MigrationOutcome::Restarted),
                outcome("2", MigrationOutcome::UpdateFailed),
                outcome("3", MigrationOutcome::Updated),
                outcome("4", MigrationOutcome::Restarted),
            ],
            batches: 2,
        };

        assert_eq!(summary.total(), 4);
        assert_eq!(summary.succeeded(), 3);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.counts().get("Updated, Restarted"), Some(&2));
        assert_eq!(
            summary.outcome_of(&AppId::new("2")),
            Some(MigrationOutcome::UpdateFailed)
        );
        assert_eq!(
            summary.to_string(),
            "4 processed in 2 batch(es): 3 succeeded, 1 need attention"
        );
    }
}
