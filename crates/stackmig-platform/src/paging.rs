//! Paged resource fetching
//!
//! Collections are traversed by following `next_url` until the platform stops
//! handing one out. The fetch is all-or-nothing: a single failed or malformed
//! page aborts the whole traversal and nothing collected so far is returned.

use crate::error::PlatformError;
use crate::models::{Page, Resource};
use crate::transport::{fetch_json, ControlPlane};
use serde::de::DeserializeOwned;
use std::fmt;

/// Starting point of a collection traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceQuery {
    base: String,
    filter: Option<String>,
}

impl ResourceQuery {
    /// Query the whole collection at `base`
    #[inline]
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            filter: None,
        }
    }

    /// Restrict the collection with a `field:value` predicate
    #[inline]
    #[must_use]
    pub fn with_filter(mut self, field: &str, value: &str) -> Self {
        self.filter = Some(format!("{field}:{value}"));
        self
    }

    /// Request path of the first page
    #[must_use]
    pub fn to_path(&self) -> String {
        match &self.filter {
            Some(filter) => format!("{}?q={}", self.base, urlencoding::encode(filter)),
            None => self.base.clone(),
        }
    }
}

impl fmt::Display for ResourceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path())
    }
}

/// Fetches every page of a collection
#[derive(Clone, Copy)]
pub struct PagedFetcher<'a> {
    plane: &'a dyn ControlPlane,
}

impl<'a> PagedFetcher<'a> {
    /// Create fetcher over a control plane
    #[inline]
    #[must_use]
    pub fn new(plane: &'a dyn ControlPlane) -> Self {
        Self { plane }
    }

    /// Fetch all resources matching `query`, in platform order
    ///
    /// # Errors
    /// - `PlatformError::Transport` (or `Status`) if any page request fails
    /// - `PlatformError::Decode` if any page is not a valid collection page
    pub async fn fetch_all<E: DeserializeOwned>(
        &self,
        query: &ResourceQuery,
    ) -> Result<Vec<Resource<E>>, PlatformError> {
        let mut items = Vec::new();
        let mut next = Some(query.to_path());
        let mut pages = 0usize;

        while let Some(path) = next.take() {
            let page: Page<E> = fetch_json(self.plane, &path).await?;
            pages += 1;
            tracing::debug!(path = %path, items = page.resources.len(), "fetched page");

            next = page.next_page().map(str::to_owned);
            items.extend(page.resources);
        }

        tracing::debug!(query = %query, pages, total = items.len(), "collection fetched");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StackEntity;
    use crate::transport::MockControlPlane;
    use mockall::Sequence;
    use serde_json::json;

    fn stack(guid: &str, name: &str) -> serde_json::Value {
        json!({"metadata": {"guid": guid}, "entity": {"name": name}})
    }

    #[test]
    fn query_paths() {
        assert_eq!(ResourceQuery::new("/v2/apps").to_path(), "/v2/apps");
        assert_eq!(
            ResourceQuery::new("/v2/apps")
                .with_filter("space_guid", "abc-123")
                .to_path(),
            "/v2/apps?q=space_guid%3Aabc-123"
        );
    }

    #[tokio::test]
    async fn follows_next_url() {
        let mut plane = MockControlPlane::new();
        let mut seq = Sequence::new();

        plane
            .expect_get()
            .withf(|path| path == "/v2/stacks")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(json!({"next_url": "/v2/stacks?page=2", "resources": [stack("s-1", "lucid64")]})
                    .to_string()
                    .into_bytes())
            });
        plane
            .expect_get()
            .withf(|path| path == "/v2/stacks?page=2")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(json!({"next_url": null, "resources": [stack("s-2", "cflinuxfs2")]})
                    .to_string()
                    .into_bytes())
            });

        let stacks = PagedFetcher::new(&plane)
            .fetch_all::<StackEntity>(&ResourceQuery::new("/v2/stacks"))
            .await
            .unwrap();

        let names: Vec<_> = stacks.iter().map(|s| s.entity.name.as_str()).collect();
        assert_eq!(names, vec!["lucid64", "cflinuxfs2"]);
    }

    #[tokio::test]
    async fn transport_failure_discards_partial_result() {
        let mut plane = MockControlPlane::new();
        plane
            .expect_get()
            .withf(|path| path == "/v2/stacks")
            .returning(|_| {
                Ok(json!({"next_url": "/v2/stacks?page=2", "resources": [stack("s-1", "lucid64")]})
                    .to_string()
                    .into_bytes())
            });
        plane
            .expect_get()
            .withf(|path| path == "/v2/stacks?page=2")
            .returning(|path| Err(PlatformError::transport(path, "connection reset")));

        let result = PagedFetcher::new(&plane)
            .fetch_all::<StackEntity>(&ResourceQuery::new("/v2/stacks"))
            .await;

        assert!(result.unwrap_err().is_transport());
    }

    #[tokio::test]
    async fn malformed_page_is_decode_error() {
        let mut plane = MockControlPlane::new();
        plane
            .expect_get()
            .returning(|_| Ok(br#"{"description":"not a page"}"#.to_vec()));

        let result = PagedFetcher::new(&plane)
            .fetch_all::<StackEntity>(&ResourceQuery::new("/v2/stacks"))
            .await;

        let err = result.unwrap_err();
        assert!(err.is_decode());
        assert_eq!(err.path(), "/v2/stacks");
    }
}
