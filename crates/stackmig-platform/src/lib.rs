//! stackmig Platform - control-plane access
//!
//! Thin I/O layer between the migration orchestrator and the platform API:
//! - `ControlPlane` trait (read / update) with HTTP and `cf curl` transports
//! - Wire models for the v2 collection envelope
//! - Paged collection traversal
//!
//! # Example
//!
//! ```rust,ignore
//! use stackmig_platform::{CfCliControlPlane, PagedFetcher, ResourceQuery, StackEntity};
//!
//! # async fn example() -> Result<(), stackmig_platform::PlatformError> {
//! let plane = CfCliControlPlane::default();
//! let stacks = PagedFetcher::new(&plane)
//!     .fetch_all::<StackEntity>(&ResourceQuery::new("/v2/stacks"))
//!     .await?;
//! println!("{} stacks", stacks.len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod cf_cli;
pub mod error;
pub mod http;
pub mod models;
pub mod paging;
pub mod transport;

pub use cf_cli::CfCliControlPlane;
pub use error::PlatformError;
pub use http::HttpControlPlane;
pub use models::{
    AppEntity, AppUpdate, InstanceReport, Metadata, OrganizationEntity, Page, Resource,
    SpaceEntity, StackEntity,
};
pub use paging::{PagedFetcher, ResourceQuery};
pub use transport::{fetch_json, ControlPlane};

/// Well-known collection endpoints
pub mod endpoints {
    /// Stack collection
    pub const STACKS: &str = "/v2/stacks";
    /// Organization collection
    pub const ORGANIZATIONS: &str = "/v2/organizations";
    /// Space collection
    pub const SPACES: &str = "/v2/spaces";
    /// Application collection
    pub const APPS: &str = "/v2/apps";

    /// Single application resource
    #[must_use]
    pub fn app(guid: &str) -> String {
        format!("{APPS}/{guid}")
    }

    /// Instance report of an application
    #[must_use]
    pub fn app_instances(guid: &str) -> String {
        format!("{APPS}/{guid}/instances")
    }
}
