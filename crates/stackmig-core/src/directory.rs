//! Organization and space lookups used to scope application queries

use crate::error::MigrationError;
use crate::types::{Organization, Space};
use stackmig_platform::{
    endpoints, ControlPlane, OrganizationEntity, PagedFetcher, ResourceQuery, SpaceEntity,
};
use std::sync::Arc;

/// Resolves organization and space names
#[derive(Clone)]
pub struct Directory {
    plane: Arc<dyn ControlPlane>,
}

impl Directory {
    /// Create directory
    #[inline]
    #[must_use]
    pub fn new(plane: Arc<dyn ControlPlane>) -> Self {
        Self { plane }
    }

    /// Find an organization by name (case-insensitive)
    ///
    /// # Errors
    /// - `MigrationError::OrganizationNotFound` if no organization matches
    /// - `MigrationError::Platform` if the collection cannot be read
    pub async fn organization(&self, name: &str) -> Result<Organization, MigrationError> {
        let orgs: Vec<Organization> = PagedFetcher::new(self.plane.as_ref())
            .fetch_all::<OrganizationEntity>(&ResourceQuery::new(endpoints::ORGANIZATIONS))
            .await?
            .into_iter()
            .map(Organization::from)
            .collect();

        orgs.into_iter()
            .find(|o| o.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| MigrationError::OrganizationNotFound(name.to_string()))
    }

    /// Find a space by name (case-insensitive) within `organization`
    ///
    /// # Errors
    /// - `MigrationError::SpaceNotFound` if no space carries that name
    /// - `MigrationError::SpaceNotInOrganization` if it only exists elsewhere
    /// - `MigrationError::Platform` if the collection cannot be read
    pub async fn space(
        &self,
        organization: &Organization,
        name: &str,
    ) -> Result<Space, MigrationError> {
        let spaces: Vec<Space> = PagedFetcher::new(self.plane.as_ref())
            .fetch_all::<SpaceEntity>(&ResourceQuery::new(endpoints::SPACES))
            .await?
            .into_iter()
            .map(Space::from)
            .collect();

        match_space(spaces, organization, name)
    }
}

/// Pick the space named `name` that belongs to `organization`
///
/// Space names are only unique within an organization, so a same-named space
/// elsewhere does not shadow the one being asked for.
pub fn match_space(
    spaces: Vec<Space>,
    organization: &Organization,
    name: &str,
) -> Result<Space, MigrationError> {
    let mut named = spaces
        .into_iter()
        .filter(|s| s.name.eq_ignore_ascii_case(name))
        .peekable();

    if named.peek().is_none() {
        return Err(MigrationError::SpaceNotFound(name.to_string()));
    }

    named
        .find(|s| s.organization_id == organization.id)
        .ok_or_else(|| MigrationError::SpaceNotInOrganization {
            space: name.to_string(),
            organization: organization.name.clone(),
        })
}
