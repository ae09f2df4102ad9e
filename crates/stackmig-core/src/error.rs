//! Error types for stackmig Core
//!
//! Everything in `MigrationError` is a pre-flight failure: it can only surface
//! from validation, resolution or selection, before any application has been
//! touched. Failures while migrating an individual application are recorded
//! as a `MigrationOutcome` instead and never propagate.

use stackmig_platform::PlatformError;

/// Main stackmig error type
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Control plane could not be read (transport or decode)
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// Stack name did not resolve
    #[error("no stack named '{0}' was found")]
    StackNotFound(String),

    /// Organization name did not resolve
    #[error("organization '{0}' does not exist")]
    OrganizationNotFound(String),

    /// Space name did not resolve anywhere
    #[error("space '{0}' does not exist")]
    SpaceNotFound(String),

    /// Space exists, but only under other organizations
    #[error("space '{space}' does not belong to organization '{organization}'")]
    SpaceNotInOrganization {
        /// Space name
        space: String,
        /// Organization name
        organization: String,
    },

    /// Space scoping requested without an organization
    #[error("please provide the organization which space '{0}' belongs to")]
    SpaceRequiresOrganization(String),

    /// Batch size outside the accepted range
    #[error("batch size {0} is out of range, it has to be in the range of {min} - {max}", min = crate::types::BatchSize::MIN, max = crate::types::BatchSize::MAX)]
    InvalidBatchSize(i64),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl MigrationError {
    /// Check if a name lookup failed
    #[inline]
    #[must_use]
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            Self::StackNotFound(_)
                | Self::OrganizationNotFound(_)
                | Self::SpaceNotFound(_)
                | Self::SpaceNotInOrganization { .. }
        )
    }

    /// Check if the control plane itself failed
    #[inline]
    #[must_use]
    pub fn is_platform(&self) -> bool {
        matches!(self, Self::Platform(_))
    }

    /// Check if the caller supplied invalid input
    #[inline]
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::SpaceRequiresOrganization(_) | Self::InvalidBatchSize(_) | Self::Config(_)
        )
    }
}
