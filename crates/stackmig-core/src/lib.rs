//! stackmig Core - Stack Migration Orchestrator
//!
//! Moves platform applications from one runtime stack to another:
//! - Selects applications by organization / space on the source stack
//! - Migrates them in throttled concurrent batches
//! - Restarts applications that were running and waits for healthy instances
//! - Renders a live per-application status table
//!
//! # Example
//!
//! ```rust,ignore
//! use stackmig_core::{MigrationConfig, Scope, StackMigrator};
//!
//! # async fn example(plane: std::sync::Arc<dyn stackmig_platform::ControlPlane>,
//! #                  sink: Box<dyn stackmig_core::TableSink>) -> Result<(), stackmig_core::MigrationError> {
//! let migrator = StackMigrator::new(plane, MigrationConfig::new(), sink)?;
//!
//! let summary = migrator.migrate(&Scope::ByOrganization("acme".into()), 10).await?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod directory;
pub mod error;
pub mod health;
pub mod migration;
pub mod migrator;
pub mod resolver;
pub mod scheduler;
pub mod selector;
pub mod state_machine;
pub mod status;
pub mod types;

// Re-exports for convenience
pub use directory::Directory;
pub use error::MigrationError;
pub use health::{HealthWait, WaitError};
pub use migration::AppMigration;
pub use migrator::StackMigrator;
pub use resolver::StackResolver;
pub use scheduler::{AppOutcome, BatchScheduler, MigrationSummary};
pub use selector::ApplicationSelector;
pub use state_machine::{
    allowed_transitions, validate_transition, IllegalTransition, MigrationOutcome, MigrationState,
};
pub use status::{StatusReporter, StatusRow, TableSink, TransitionSink};
pub use types::{
    AppId, Application, BatchSize, MigrationConfig, OrgId, Organization, RunState, Scope, Space,
    SpaceId, Stack, StackId,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with stackmig Core
    pub use crate::{
        Application, BatchSize, MigrationConfig, MigrationError, MigrationOutcome,
        MigrationSummary, Scope, StackMigrator, TableSink,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
