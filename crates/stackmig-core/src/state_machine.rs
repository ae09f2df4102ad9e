//! Migration states and their legal transitions
//!
//! ```text
//! Selected -> Updating -> Updated                 (stopped apps)
//!                      -> UpdateFailed
//!                      -> Restarting -> Restarted (started apps)
//!                                    -> ErrorRestarting
//!                                    -> TimeoutRestarting
//! ```

use std::fmt;

/// Per-application migration state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MigrationState {
    /// Picked for migration, nothing done yet
    Selected,
    /// Stack update in flight
    Updating,
    /// Stack updated, no restart needed
    Updated,
    /// Stack update rejected
    UpdateFailed,
    /// Stack updated, start requested or pending
    Restarting,
    /// Restarted and reporting healthy instances
    Restarted,
    /// Start request failed
    ErrorRestarting,
    /// Instances never became healthy (or could not be checked)
    TimeoutRestarting,
}

impl MigrationState {
    /// Status label shown in the live table
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Selected => "Selected",
            Self::Updating => "Updating",
            Self::Updated => "Updated, Done",
            Self::UpdateFailed => "Update Failed",
            Self::Restarting => "Updated, Restarting",
            Self::Restarted => "Updated, Restarted",
            Self::ErrorRestarting => "Updated, Error Restarting",
            Self::TimeoutRestarting => "Updated, Timeout Restarting",
        }
    }

    /// Check if no further transition is possible
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        allowed_transitions(self).is_empty()
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Attempted transition outside the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal migration transition: {from:?} -> {to:?}")]
pub struct IllegalTransition {
    /// State before
    pub from: MigrationState,
    /// Requested state
    pub to: MigrationState,
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: MigrationState) -> &'static [MigrationState] {
    use MigrationState as S;
    match from {
        S::Selected => &[S::Updating],
        S::Updating => &[S::Updated, S::UpdateFailed, S::Restarting],
        S::Restarting => &[S::Restarted, S::ErrorRestarting, S::TimeoutRestarting],
        S::Updated | S::UpdateFailed | S::Restarted | S::ErrorRestarting | S::TimeoutRestarting => {
            &[]
        }
    }
}

/// Validate a state transition
///
/// # Errors
/// Returns `IllegalTransition` if `to` is not reachable from `from` in one step.
pub fn validate_transition(from: MigrationState, to: MigrationState) -> Result<(), IllegalTransition> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(IllegalTransition { from, to })
    }
}

/// Terminal result of one application's migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MigrationOutcome {
    /// Stack updated; application was not running
    Updated,
    /// Stack updated and application restarted healthy
    Restarted,
    /// Stack updated but the start request failed
    ErrorRestarting,
    /// Stack updated but instances did not become healthy in time
    TimeoutRestarting,
    /// Stack update failed; nothing else attempted
    UpdateFailed,
    /// Migration task ended without reaching a terminal state
    Aborted,
}

impl MigrationOutcome {
    /// Outcome for a terminal state
    #[must_use]
    pub fn from_terminal(state: MigrationState) -> Option<Self> {
        match state {
            MigrationState::Updated => Some(Self::Updated),
            MigrationState::Restarted => Some(Self::Restarted),
            MigrationState::ErrorRestarting => Some(Self::ErrorRestarting),
            MigrationState::TimeoutRestarting => Some(Self::TimeoutRestarting),
            MigrationState::UpdateFailed => Some(Self::UpdateFailed),
            MigrationState::Selected | MigrationState::Updating | MigrationState::Restarting => {
                None
            }
        }
    }

    /// Check if the application reached the desired end state
    #[inline]
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Updated | Self::Restarted)
    }

    /// Check if the stack itself was changed
    #[inline]
    #[must_use]
    pub fn stack_changed(self) -> bool {
        !matches!(self, Self::UpdateFailed | Self::Aborted)
    }
}

impl fmt::Display for MigrationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Updated => MigrationState::Updated.label(),
            Self::Restarted => MigrationState::Restarted.label(),
            Self::ErrorRestarting => MigrationState::ErrorRestarting.label(),
            Self::TimeoutRestarting => MigrationState::TimeoutRestarting.label(),
            Self::UpdateFailed => MigrationState::UpdateFailed.label(),
            Self::Aborted => "Aborted",
        };
        f.write_str(label)
    }
}
