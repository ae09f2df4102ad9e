//! Application selection
//!
//! Turns a `Scope` into the working set of a run:
//! 1. Resolve organization / space names to identifiers
//! 2. Fetch every candidate application (all pages)
//! 3. Keep only applications currently on the source stack

use crate::directory::Directory;
use crate::error::MigrationError;
use crate::types::{Application, Scope, StackId};
use stackmig_platform::{endpoints, AppEntity, ControlPlane, PagedFetcher, ResourceQuery};
use std::sync::Arc;

/// Selects the applications a run will migrate
#[derive(Clone)]
pub struct ApplicationSelector {
    plane: Arc<dyn ControlPlane>,
    directory: Directory,
}

impl ApplicationSelector {
    /// Create selector
    #[inline]
    #[must_use]
    pub fn new(plane: Arc<dyn ControlPlane>) -> Self {
        Self {
            directory: Directory::new(Arc::clone(&plane)),
            plane,
        }
    }

    /// Select applications in `scope` running on `source_stack`
    ///
    /// Platform order is preserved.
    ///
    /// # Errors
    /// - `MigrationError::OrganizationNotFound`, `SpaceNotFound`, `SpaceNotInOrganization`
    ///   if the scope does not resolve
    /// - `MigrationError::Platform` if any collection cannot be read
    pub async fn select(
        &self,
        scope: &Scope,
        source_stack: &StackId,
    ) -> Result<Vec<Application>, MigrationError> {
        let candidates = self.candidates(scope).await?;
        let total = candidates.len();
        let selected = filter_on_stack(candidates, source_stack);

        tracing::info!(
            scope = %scope,
            candidates = total,
            selected = selected.len(),
            "selected applications"
        );
        Ok(selected)
    }

    /// Every application in `scope`, regardless of stack
    ///
    /// # Errors
    /// Same as [`ApplicationSelector::select`].
    pub async fn candidates(&self, scope: &Scope) -> Result<Vec<Application>, MigrationError> {
        let query = self.query_for(scope).await?;
        let resources = PagedFetcher::new(self.plane.as_ref())
            .fetch_all::<AppEntity>(&query)
            .await?;

        Ok(resources.into_iter().map(Application::from).collect())
    }

    async fn query_for(&self, scope: &Scope) -> Result<ResourceQuery, MigrationError> {
        let apps = ResourceQuery::new(endpoints::APPS);

        match scope {
            Scope::AllApplications => Ok(apps),
            Scope::ByOrganization(name) => {
                let org = self.directory.organization(name).await?;
                Ok(apps.with_filter("organization_guid", org.id.as_str()))
            }
            Scope::BySpace {
                organization,
                space,
            } => {
                let org = self.directory.organization(organization).await?;
                let space = self.directory.space(&org, space).await?;
                Ok(apps.with_filter("space_guid", space.id.as_str()))
            }
        }
    }
}

/// Keep applications on `stack`, preserving order
#[must_use]
pub fn filter_on_stack(apps: Vec<Application>, stack: &StackId) -> Vec<Application> {
    apps.into_iter().filter(|a| &a.stack_id == stack).collect()
}
