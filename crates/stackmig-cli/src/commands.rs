//! Command execution.

use crate::settings::Settings;
use crate::{ChangeArgs, Cli, Commands, ScopeArgs};
use anyhow::Result;
use stackmig_core::{MigrationSummary, StackMigrator, TableSink};
use stackmig_platform::ControlPlane;
use std::sync::Arc;

/// Run the command selected on `cli`.
///
/// # Errors
///
/// Returns an error if settings, validation, resolution or selection fail.
/// Per-application failures are part of the printed summary instead.
pub async fn execute(cli: &Cli, settings: &Settings) -> Result<()> {
    let plane = settings.platform.connect()?;
    let sink = Box::new(crate::terminal::TerminalSink::stdout());

    match &cli.command {
        Commands::Change(args) => {
            let summary = change(args, settings, plane, sink).await?;
            println!("{summary}");
        }
        Commands::List(args) => list(args, settings, plane, sink).await?,
    }
    Ok(())
}

/// Migrate the applications selected by `args`.
///
/// # Errors
///
/// Returns any pre-flight failure (see [`StackMigrator::migrate`]).
pub async fn change(
    args: &ChangeArgs,
    settings: &Settings,
    plane: Arc<dyn ControlPlane>,
    sink: Box<dyn TableSink>,
) -> Result<MigrationSummary> {
    let scope = args.scope.scope()?;
    let batch_size = args.parallel.unwrap_or(settings.migration.batch_size);

    let migrator = StackMigrator::new(plane, settings.migration.clone(), sink)?;
    let summary = migrator.migrate(&scope, batch_size).await?;

    for (outcome, count) in summary.counts() {
        tracing::info!(outcome = %outcome, count, "migration outcome");
    }
    Ok(summary)
}

/// Show the applications `change` would migrate.
///
/// # Errors
///
/// Returns any resolution or selection failure.
pub async fn list(
    args: &ScopeArgs,
    settings: &Settings,
    plane: Arc<dyn ControlPlane>,
    sink: Box<dyn TableSink>,
) -> Result<()> {
    let scope = args.scope()?;

    let migrator = StackMigrator::new(plane, settings.migration.clone(), sink)?;
    let apps = migrator.plan(&scope).await?;

    let reporter = migrator.reporter();
    reporter.line(&format!("Total {} found ...", apps.len()));
    reporter.render_initial(&apps);
    Ok(())
}
