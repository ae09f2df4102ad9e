//! Core types for stackmig
//!
//! Defines the fundamental types for the orchestrator:
//! - Platform identifiers
//! - Applications, stacks, organizations and spaces
//! - Selection scope and batch size
//! - Migration configuration

use crate::error::MigrationError;
use serde::{Deserialize, Serialize};
use stackmig_platform::{AppEntity, AppUpdate, OrganizationEntity, Resource, SpaceEntity, StackEntity};
use std::fmt;
use std::time::Duration;

macro_rules! platform_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap a raw platform identifier
            #[inline]
            #[must_use]
            pub fn new(guid: impl Into<String>) -> Self {
                Self(guid.into())
            }

            /// Raw identifier
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

platform_id!(
    /// Application identifier
    AppId
);
platform_id!(
    /// Stack identifier
    StackId
);
platform_id!(
    /// Organization identifier
    OrgId
);
platform_id!(
    /// Space identifier
    SpaceId
);

/// Platform run state, captured once at selection time
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Application is started
    Started,
    /// Application is stopped
    Stopped,
    /// Any state this tool does not act on
    Other(String),
}

impl RunState {
    /// Parse the platform's `state` field
    #[must_use]
    pub fn from_platform(state: &str) -> Self {
        if state.eq_ignore_ascii_case(AppUpdate::STARTED) {
            Self::Started
        } else if state.eq_ignore_ascii_case(AppUpdate::STOPPED) {
            Self::Stopped
        } else {
            Self::Other(state.to_string())
        }
    }

    /// Check if the application was running
    #[inline]
    #[must_use]
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => f.write_str(AppUpdate::STARTED),
            Self::Stopped => f.write_str(AppUpdate::STOPPED),
            Self::Other(state) => f.write_str(state),
        }
    }
}

/// Application under consideration for migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    /// Identifier (unique within a run)
    pub id: AppId,
    /// Application name
    pub name: String,
    /// Current stack
    pub stack_id: StackId,
    /// Run state at selection time
    pub run_state: RunState,
    /// Status label shown to the operator
    pub display_status: String,
}

impl Application {
    /// Create application; the display status starts as the run state
    #[must_use]
    pub fn new(id: AppId, name: impl Into<String>, stack_id: StackId, run_state: RunState) -> Self {
        let display_status = run_state.to_string();
        Self {
            id,
            name: name.into(),
            stack_id,
            run_state,
            display_status,
        }
    }
}

impl From<Resource<AppEntity>> for Application {
    fn from(resource: Resource<AppEntity>) -> Self {
        Self::new(
            AppId(resource.metadata.guid),
            resource.entity.name,
            StackId(resource.entity.stack_guid),
            RunState::from_platform(&resource.entity.state),
        )
    }
}

/// Runtime stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    /// Identifier
    pub id: StackId,
    /// Name, e.g. `cflinuxfs2`
    pub name: String,
}

impl From<Resource<StackEntity>> for Stack {
    fn from(resource: Resource<StackEntity>) -> Self {
        Self {
            id: StackId(resource.metadata.guid),
            name: resource.entity.name,
        }
    }
}

/// Organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    /// Identifier
    pub id: OrgId,
    /// Name
    pub name: String,
}

impl From<Resource<OrganizationEntity>> for Organization {
    fn from(resource: Resource<OrganizationEntity>) -> Self {
        Self {
            id: OrgId(resource.metadata.guid),
            name: resource.entity.name,
        }
    }
}

/// Space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Space {
    /// Identifier
    pub id: SpaceId,
    /// Name
    pub name: String,
    /// Owning organization
    pub organization_id: OrgId,
}

impl From<Resource<SpaceEntity>> for Space {
    fn from(resource: Resource<SpaceEntity>) -> Self {
        Self {
            id: SpaceId(resource.metadata.guid),
            name: resource.entity.name,
            organization_id: OrgId(resource.entity.organization_guid),
        }
    }
}

/// Which applications a run considers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every application visible to the caller
    AllApplications,
    /// Applications in one organization
    ByOrganization(String),
    /// Applications in one space of one organization
    BySpace {
        /// Organization name
        organization: String,
        /// Space name
        space: String,
    },
}

impl Scope {
    /// Build scope from optional organization/space flags
    ///
    /// # Errors
    /// - `MigrationError::SpaceRequiresOrganization` if a space is given without an organization
    pub fn from_flags(
        organization: Option<String>,
        space: Option<String>,
    ) -> Result<Self, MigrationError> {
        match (organization, space) {
            (Some(organization), Some(space)) => Ok(Self::BySpace {
                organization,
                space,
            }),
            (None, Some(space)) => Err(MigrationError::SpaceRequiresOrganization(space)),
            (Some(organization), None) => Ok(Self::ByOrganization(organization)),
            (None, None) => Ok(Self::AllApplications),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllApplications => f.write_str("all applications"),
            Self::ByOrganization(org) => write!(f, "organization '{org}'"),
            Self::BySpace {
                organization,
                space,
            } => write!(f, "space '{space}' of organization '{organization}'"),
        }
    }
}

/// Number of applications migrated concurrently
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BatchSize(usize);

impl BatchSize {
    /// Smallest accepted batch
    pub const MIN: usize = 1;
    /// Largest accepted batch
    pub const MAX: usize = 100;
    /// Batch size when none is requested
    pub const DEFAULT: usize = 10;

    /// Validate a requested batch size
    ///
    /// # Errors
    /// - `MigrationError::InvalidBatchSize` unless `1 <= requested <= 100`
    pub fn new(requested: i64) -> Result<Self, MigrationError> {
        usize::try_from(requested)
            .ok()
            .filter(|size| (Self::MIN..=Self::MAX).contains(size))
            .map(Self)
            .ok_or(MigrationError::InvalidBatchSize(requested))
    }

    /// Validated size
    #[inline]
    #[must_use]
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<i64> for BatchSize {
    type Error = MigrationError;

    fn try_from(requested: i64) -> Result<Self, Self::Error> {
        Self::new(requested)
    }
}

/// Migration configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Stack applications are moved away from
    pub source_stack: String,
    /// Stack applications are moved to
    pub target_stack: String,
    /// Batch size used when the caller requests none
    pub batch_size: i64,
    /// Delay between instance report polls in seconds
    pub poll_interval_secs: u64,
    /// Restart health wait in seconds
    pub restart_timeout_secs: u64,
}

impl MigrationConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With stacks to migrate between
    #[inline]
    #[must_use]
    pub fn with_stacks(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.source_stack = source.into();
        self.target_stack = target.into();
        self
    }

    /// With default batch size
    #[inline]
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// With instance poll interval, rounded up to whole seconds
    #[inline]
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_secs = whole_secs(interval);
        self
    }

    /// With restart timeout, rounded up to whole seconds
    #[inline]
    #[must_use]
    pub fn with_restart_timeout(mut self, timeout: Duration) -> Self {
        self.restart_timeout_secs = whole_secs(timeout);
        self
    }

    /// Delay between instance report polls
    #[inline]
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// How long a restarted application may take to become healthy
    #[inline]
    #[must_use]
    pub fn restart_timeout(&self) -> Duration {
        Duration::from_secs(self.restart_timeout_secs)
    }

    /// Check the configuration is usable
    ///
    /// # Errors
    /// - `MigrationError::Config` for empty stack names or a zero poll interval
    pub fn validate(&self) -> Result<(), MigrationError> {
        if self.source_stack.trim().is_empty() || self.target_stack.trim().is_empty() {
            return Err(MigrationError::Config(
                "source and target stack names must not be empty".to_string(),
            ));
        }
        if self.source_stack == self.target_stack {
            return Err(MigrationError::Config(format!(
                "source and target stack are both '{}'",
                self.source_stack
            )));
        }
        if self.poll_interval_secs == 0 {
            return Err(MigrationError::Config(
                "poll interval must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

fn whole_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            source_stack: "lucid64".to_string(),
            target_stack: "cflinuxfs2".to_string(),
            batch_size: BatchSize::DEFAULT as i64,
            poll_interval_secs: 5,
            restart_timeout_secs: 600,
        }
    }
}
