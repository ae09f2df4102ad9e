//! Transport that delegates to an installed `cf` CLI
//!
//! `cf curl` signs requests with the operator's existing login, so no token
//! handling is needed here. It exits zero for most API-level rejections, which
//! is why write bodies are inspected for an error envelope.

use crate::error::PlatformError;
use crate::transport::{rejected_write, ControlPlane};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Output;
use tokio::process::Command;

/// Control plane reached through `cf curl`
#[derive(Debug, Clone)]
pub struct CfCliControlPlane {
    binary: PathBuf,
}

impl CfCliControlPlane {
    /// Use the `cf` binary at `binary` (a bare name is resolved through `PATH`)
    #[inline]
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn curl(&self, path: &str, extra: &[&str]) -> Result<Vec<u8>, PlatformError> {
        let output = Command::new(&self.binary)
            .arg("curl")
            .arg(path)
            .args(extra)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| PlatformError::transport(path, e))?;

        check_exit(path, output)
    }
}

fn check_exit(path: &str, output: Output) -> Result<Vec<u8>, PlatformError> {
    if output.status.success() {
        return Ok(output.stdout);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let detail = [stderr.trim(), stdout.trim()]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or("no output");

    Err(PlatformError::transport(
        path,
        format!("cf curl exited with {}: {detail}", output.status),
    ))
}

impl Default for CfCliControlPlane {
    fn default() -> Self {
        Self::new("cf")
    }
}

#[async_trait]
impl ControlPlane for CfCliControlPlane {
    async fn get(&self, path: &str) -> Result<Vec<u8>, PlatformError> {
        self.curl(path, &[]).await
    }

    async fn update(&self, path: &str, payload: &serde_json::Value) -> Result<(), PlatformError> {
        let body = payload.to_string();
        let answer = self.curl(path, &["-X", "PUT", "-d", &body]).await?;

        match rejected_write(path, &answer) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    fn output(code: i32, stdout: &str, stderr: &str) -> Output {
        Output {
            status: ExitStatus::from_raw(code << 8),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[test]
    fn successful_exit_returns_stdout() {
        let body = check_exit("/v2/apps", output(0, "{}", "")).unwrap();
        assert_eq!(body, b"{}");
    }

    #[test]
    fn failed_exit_prefers_stderr() {
        let err = check_exit("/v2/apps", output(1, "", "Not logged in")).unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("Not logged in"));
    }

    #[tokio::test]
    async fn missing_binary_is_transport_error() {
        let plane = CfCliControlPlane::new("/nonexistent/cf-binary");
        let err = plane.get("/v2/apps").await.unwrap_err();
        assert!(err.is_transport());
    }
}
