//! Control-plane transport seam
//!
//! The orchestrator only ever needs two verbs against the platform API:
//! read a resource and update a resource. Everything else (authentication,
//! connection reuse, process spawning) lives behind this trait.

use crate::error::PlatformError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Narrow interface to the platform control plane
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Read the raw body at `path`
    async fn get(&self, path: &str) -> Result<Vec<u8>, PlatformError>;

    /// Apply `payload` to the resource at `path`
    async fn update(&self, path: &str, payload: &serde_json::Value) -> Result<(), PlatformError>;
}

/// Read `path` and decode the body as `T`
///
/// # Errors
/// - `PlatformError::Transport` (or `Status`) if the read fails
/// - `PlatformError::Decode` if the body is not a valid `T`
pub async fn fetch_json<T: DeserializeOwned>(
    plane: &dyn ControlPlane,
    path: &str,
) -> Result<T, PlatformError> {
    let body = plane.get(path).await?;
    serde_json::from_slice(&body).map_err(|e| PlatformError::decode(path, e))
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Detect a platform error envelope in a write response body
///
/// The v2 API reports rejected writes as `{"error_code": ..., "description": ...}`.
/// Transports that cannot rely on HTTP status (e.g. `cf curl`) use this to
/// turn such bodies into `PlatformError::Api`.
pub(crate) fn rejected_write(path: &str, body: &[u8]) -> Option<PlatformError> {
    let envelope: ErrorEnvelope = serde_json::from_slice(body).ok()?;
    let error_code = envelope.error_code.filter(|c| !c.is_empty())?;

    Some(PlatformError::Api {
        path: path.to_string(),
        error_code,
        description: envelope.description.unwrap_or_default(),
    })
}
