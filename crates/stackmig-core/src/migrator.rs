//! Stack migrator
//!
//! Entry point for the command layer. Owns the control-plane handle, the
//! configuration and the live status view, and wires selection, resolution
//! and batch scheduling together.

use crate::error::MigrationError;
use crate::health::HealthWait;
use crate::migration::AppMigration;
use crate::resolver::StackResolver;
use crate::scheduler::{BatchScheduler, MigrationSummary};
use crate::selector::ApplicationSelector;
use crate::status::{StatusReporter, TableSink};
use crate::types::{Application, BatchSize, MigrationConfig, Scope};
use stackmig_platform::ControlPlane;
use std::sync::Arc;

/// Orchestrates a stack migration run
pub struct StackMigrator {
    plane: Arc<dyn ControlPlane>,
    config: MigrationConfig,
    reporter: Arc<StatusReporter>,
}

impl StackMigrator {
    /// Create migrator rendering progress to `sink`
    ///
    /// # Errors
    /// - `MigrationError::Config` if the configuration is unusable
    pub fn new(
        plane: Arc<dyn ControlPlane>,
        config: MigrationConfig,
        sink: Box<dyn TableSink>,
    ) -> Result<Self, MigrationError> {
        config.validate()?;
        Ok(Self {
            plane,
            config,
            reporter: Arc::new(StatusReporter::new(sink)),
        })
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Live status view
    #[inline]
    #[must_use]
    pub fn reporter(&self) -> &Arc<StatusReporter> {
        &self.reporter
    }

    /// Applications in `scope` currently on the source stack
    ///
    /// Reads only; nothing on the platform is changed.
    ///
    /// # Errors
    /// - `MigrationError::StackNotFound` if the source stack does not exist
    /// - Any selection error (see [`ApplicationSelector::select`])
    pub async fn plan(&self, scope: &Scope) -> Result<Vec<Application>, MigrationError> {
        self.reporter.line(&format!(
            "Getting all apps with {} stack...",
            self.config.source_stack
        ));

        let resolver = StackResolver::new(Arc::clone(&self.plane));
        let source = resolver.resolve(&self.config.source_stack).await?;
        tracing::info!(stack = %self.config.source_stack, id = %source, "resolved source stack");

        let apps = ApplicationSelector::new(Arc::clone(&self.plane))
            .select(scope, &source)
            .await?;

        self.reporter.line("OK");
        self.reporter.line("");
        Ok(apps)
    }

    /// Migrate every application in `scope` from the source to the target stack
    ///
    /// All validation and resolution happens before the first application is
    /// touched. Per-application failures are reported in the summary, not as
    /// errors.
    ///
    /// # Errors
    /// - `MigrationError::InvalidBatchSize` unless `1 <= batch_size <= 100`
    /// - `MigrationError::StackNotFound` if either stack does not exist
    /// - Any selection error (see [`ApplicationSelector::select`])
    pub async fn migrate(
        &self,
        scope: &Scope,
        batch_size: i64,
    ) -> Result<MigrationSummary, MigrationError> {
        let size = BatchSize::new(batch_size)?;

        let target = StackResolver::new(Arc::clone(&self.plane))
            .resolve(&self.config.target_stack)
            .await?;
        tracing::info!(stack = %self.config.target_stack, id = %target, "resolved target stack");

        let apps = self.plan(scope).await?;

        let migration = AppMigration::new(
            Arc::clone(&self.plane),
            target,
            HealthWait::new(self.config.poll_interval(), self.config.restart_timeout()),
        );
        let scheduler = BatchScheduler::new(Arc::new(migration), Arc::clone(&self.reporter));

        Ok(scheduler.run_batches(apps, size).await)
    }
}

impl std::fmt::Debug for StackMigrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackMigrator")
            .field("config", &self.config)
            .field("reporter", &self.reporter)
            .finish_non_exhaustive()
    }
}
