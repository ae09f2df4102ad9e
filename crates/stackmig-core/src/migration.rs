//! Per-application migration
//!
//! Drives one application through the state machine:
//! - Started apps: update stack + stop in one request, start, poll until healthy
//! - Anything else: update stack only
//!
//! Each transition is published before the next control-plane call is made.
//! Failures end the migration of this application only and are turned into a
//! terminal outcome plus a problem line for the operator; nothing here returns
//! an error to the caller.

use crate::health::HealthWait;
use crate::state_machine::{validate_transition, IllegalTransition, MigrationOutcome, MigrationState};
use crate::status::TransitionSink;
use crate::types::{AppId, Application, StackId};
use stackmig_platform::{endpoints, AppUpdate, ControlPlane};
use std::sync::Arc;

/// Tracks one application's state and publishes each transition
struct Progress<'a> {
    app: &'a AppId,
    state: MigrationState,
    events: &'a dyn TransitionSink,
}

impl<'a> Progress<'a> {
    fn new(app: &'a AppId, events: &'a dyn TransitionSink) -> Self {
        Self {
            app,
            state: MigrationState::Selected,
            events,
        }
    }

    fn advance(&mut self, to: MigrationState) -> Result<(), IllegalTransition> {
        validate_transition(self.state, to)?;
        self.state = to;
        self.events.apply_transition(self.app, to);
        Ok(())
    }

    /// Print `message` for the operator, then enter failure state `to`
    fn fail(
        &mut self,
        to: MigrationState,
        message: &str,
    ) -> Result<MigrationOutcome, IllegalTransition> {
        self.events.report_problem(self.app, message);
        self.finish(to)
    }

    fn finish(&mut self, to: MigrationState) -> Result<MigrationOutcome, IllegalTransition> {
        self.advance(to)?;
        MigrationOutcome::from_terminal(to).ok_or(IllegalTransition {
            from: self.state,
            to,
        })
    }
}

/// Migrates single applications to the target stack
#[derive(Clone)]
pub struct AppMigration {
    plane: Arc<dyn ControlPlane>,
    target_stack: StackId,
    health: HealthWait,
}

impl AppMigration {
    /// Create migration towards `target_stack`
    #[inline]
    #[must_use]
    pub fn new(plane: Arc<dyn ControlPlane>, target_stack: StackId, health: HealthWait) -> Self {
        Self {
            plane,
            target_stack,
            health,
        }
    }

    /// Target stack identifier
    #[inline]
    #[must_use]
    pub fn target_stack(&self) -> &StackId {
        &self.target_stack
    }

    /// Run the migration of `app` to completion
    #[tracing::instrument(skip_all, fields(app = %app.name, guid = %app.id))]
    pub async fn run(&self, app: Application, events: &dyn TransitionSink) -> MigrationOutcome {
        let mut progress = Progress::new(&app.id, events);

        match self.drive(&app, &mut progress).await {
            Ok(outcome) => {
                tracing::info!(outcome = %outcome, "migration finished");
                outcome
            }
            Err(e) => {
                tracing::error!(error = %e, "migration aborted");
                MigrationOutcome::Aborted
            }
        }
    }

    async fn drive(
        &self,
        app: &Application,
        progress: &mut Progress<'_>,
    ) -> Result<MigrationOutcome, IllegalTransition> {
        let path = endpoints::app(app.id.as_str());
        let restart = app.run_state.is_started();

        progress.advance(MigrationState::Updating)?;
        let update = if restart {
            AppUpdate::stack_and_stop(self.target_stack.as_str())
        } else {
            AppUpdate::stack(self.target_stack.as_str())
        };

        if let Err(e) = self.plane.update(&path, &update.to_payload()).await {
            tracing::info!(error = %e, "stack update rejected");
            return progress.fail(
                MigrationState::UpdateFailed,
                &format!("Error updating stack for app '{}' ({}): {e}", app.name, app.id),
            );
        }

        if !restart {
            return progress.finish(MigrationState::Updated);
        }

        progress.advance(MigrationState::Restarting)?;
        if let Err(e) = self.plane.update(&path, &AppUpdate::start().to_payload()).await {
            tracing::info!(error = %e, "start request rejected");
            return progress.fail(
                MigrationState::ErrorRestarting,
                &format!("Error restarting app '{}' ({}): {e}", app.name, app.id),
            );
        }

        match self
            .health
            .wait_until_healthy(self.plane.as_ref(), &app.id)
            .await
        {
            Ok(()) => progress.finish(MigrationState::Restarted),
            Err(e) => {
                tracing::info!(error = %e, "instances not healthy");
                progress.fail(
                    MigrationState::TimeoutRestarting,
                    &format!("App '{}' ({}) did not come back healthy: {e}", app.name, app.id),
                )
            }
        }
    }
}

impl std::fmt::Debug for AppMigration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppMigration")
            .field("target_stack", &self.target_stack)
            .field("health", &self.health)
            .finish_non_exhaustive()
    }
}
