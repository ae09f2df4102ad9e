//! Stack name resolution
//!
//! Stack collections are small, but they are still fetched through the paged
//! fetcher so a paginating platform is handled. Nothing is cached: every
//! resolution reads the collection again.

use crate::error::MigrationError;
use crate::types::{Stack, StackId};
use stackmig_platform::{endpoints, ControlPlane, PagedFetcher, ResourceQuery, StackEntity};
use std::sync::Arc;

/// Resolves stack names to identifiers
#[derive(Clone)]
pub struct StackResolver {
    plane: Arc<dyn ControlPlane>,
}

impl StackResolver {
    /// Create resolver
    #[inline]
    #[must_use]
    pub fn new(plane: Arc<dyn ControlPlane>) -> Self {
        Self { plane }
    }

    /// Fetch every stack
    ///
    /// # Errors
    /// - `MigrationError::Platform` if the stack collection cannot be read
    pub async fn stacks(&self) -> Result<Vec<Stack>, MigrationError> {
        let resources = PagedFetcher::new(self.plane.as_ref())
            .fetch_all::<StackEntity>(&ResourceQuery::new(endpoints::STACKS))
            .await?;

        Ok(resources.into_iter().map(Stack::from).collect())
    }

    /// Resolve `name` (case-sensitive, exact) to its identifier
    ///
    /// # Errors
    /// - `MigrationError::StackNotFound` if no stack carries that name
    /// - `MigrationError::Platform` if the stack collection cannot be read
    pub async fn resolve(&self, name: &str) -> Result<StackId, MigrationError> {
        let stacks = self.stacks().await?;
        let id = find_stack(&stacks, name)
            .ok_or_else(|| MigrationError::StackNotFound(name.to_string()))?;

        tracing::debug!(stack = name, id = %id, "resolved stack");
        Ok(id)
    }
}

/// Exact-name lookup over an already fetched collection
#[must_use]
pub fn find_stack(stacks: &[Stack], name: &str) -> Option<StackId> {
    stacks.iter().find(|s| s.name == name).map(|s| s.id.clone())
}
