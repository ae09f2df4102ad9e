//! Wire models for the v2 control-plane API
//!
//! Every collection endpoint answers with the same envelope:
//! `{"next_url": ..., "resources": [{"metadata": {...}, "entity": {...}}]}`.

use serde::{Deserialize, Serialize};

/// One page of a paginated collection
#[derive(Debug, Clone, Deserialize)]
pub struct Page<E> {
    /// Link to the next page, absent/null/empty on the last page
    #[serde(default)]
    pub next_url: Option<String>,
    /// Items on this page
    pub resources: Vec<Resource<E>>,
}

impl<E> Page<E> {
    /// Next page link, if any
    #[inline]
    #[must_use]
    pub fn next_page(&self) -> Option<&str> {
        self.next_url.as_deref().filter(|url| !url.is_empty())
    }
}

/// Resource metadata
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Metadata {
    /// Opaque platform identifier
    pub guid: String,
}

/// A single resource: metadata plus entity body
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Resource<E> {
    /// Resource metadata
    pub metadata: Metadata,
    /// Resource-specific fields
    pub entity: E,
}

/// Application entity
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppEntity {
    /// Application name
    pub name: String,
    /// Stack the application runs on
    #[serde(default)]
    pub stack_guid: String,
    /// Desired run state (`STARTED` / `STOPPED`)
    #[serde(default)]
    pub state: String,
}

/// Stack entity
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StackEntity {
    /// Stack name, e.g. `cflinuxfs2`
    pub name: String,
}

/// Organization entity
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrganizationEntity {
    /// Organization name
    pub name: String,
}

/// Space entity
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpaceEntity {
    /// Space name
    pub name: String,
    /// Owning organization
    #[serde(default)]
    pub organization_guid: String,
}

/// Instance report for a running application
///
/// The endpoint answers either with a map of instance index to instance
/// details, or with an error envelope while instances are still staging.
/// Only the envelope fields matter for health detection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InstanceReport {
    /// Platform error code, e.g. `CF-NotStaged`
    #[serde(default)]
    pub error_code: Option<String>,
    /// Error description
    #[serde(default)]
    pub description: Option<String>,
}

impl InstanceReport {
    /// Healthy when neither an error code nor a description is reported
    #[inline]
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        is_blank(self.error_code.as_deref()) && is_blank(self.description.as_deref())
    }

    /// Description of the last reported problem, if any
    #[inline]
    #[must_use]
    pub fn problem(&self) -> Option<&str> {
        self.description
            .as_deref()
            .filter(|d| !d.is_empty())
            .or_else(|| self.error_code.as_deref().filter(|c| !c.is_empty()))
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, str::is_empty)
}

/// Body of an application update (`PUT /v2/apps/<guid>`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppUpdate {
    /// New stack
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_guid: Option<String>,
    /// New desired run state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl AppUpdate {
    /// Desired state for a running application
    pub const STARTED: &'static str = "STARTED";
    /// Desired state for a stopped application
    pub const STOPPED: &'static str = "STOPPED";

    /// Move to `stack_guid`, leaving the run state untouched
    #[must_use]
    pub fn stack(stack_guid: impl Into<String>) -> Self {
        Self {
            stack_guid: Some(stack_guid.into()),
            state: None,
        }
    }

    /// Move to `stack_guid` and stop in the same request
    #[must_use]
    pub fn stack_and_stop(stack_guid: impl Into<String>) -> Self {
        Self {
            stack_guid: Some(stack_guid.into()),
            state: Some(Self::STOPPED.to_string()),
        }
    }

    /// Request a start
    #[must_use]
    pub fn start() -> Self {
        Self {
            stack_guid: None,
            state: Some(Self::STARTED.to_string()),
        }
    }

    /// JSON payload for `ControlPlane::update`
    #[must_use]
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
