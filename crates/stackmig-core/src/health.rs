//! Instance health polling after a restart

use crate::types::AppId;
use stackmig_platform::{endpoints, fetch_json, ControlPlane, InstanceReport, PlatformError};
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

/// Why an application was not confirmed healthy
#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    /// Instances kept reporting an error until the deadline
    #[error("instances not healthy after {}s: {}", elapsed.as_secs(), last_problem.as_deref().unwrap_or("no report"))]
    TimedOut {
        /// Time spent waiting
        elapsed: Duration,
        /// Last problem reported by the platform
        last_problem: Option<String>,
    },

    /// Instance report could not be read; polling stops immediately
    #[error("instance report unavailable: {0}")]
    Probe(#[from] PlatformError),
}

/// Polls an application's instance report until it is clean
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthWait {
    interval: Duration,
    timeout: Duration,
}

impl HealthWait {
    /// Create with poll `interval` and overall `timeout`
    #[inline]
    #[must_use]
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Overall timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wait until `app` reports no error code and no description
    ///
    /// # Errors
    /// - `WaitError::TimedOut` once `timeout` has elapsed without a clean report,
    ///   including while a report request is still outstanding
    /// - `WaitError::Probe` on the first failed or malformed report
    pub async fn wait_until_healthy(
        &self,
        plane: &dyn ControlPlane,
        app: &AppId,
    ) -> Result<(), WaitError> {
        let path = endpoints::app_instances(app.as_str());
        let started = Instant::now();
        let deadline = started + self.timeout;
        let mut last_problem = None;
        let mut polls = 0u32;

        while started.elapsed() < self.timeout {
            // A single hung request must not outlive the deadline
            let Ok(report) = timeout_at(deadline, fetch_json::<InstanceReport>(plane, &path)).await
            else {
                tracing::debug!(app = %app, polls, "instance report still pending at deadline");
                break;
            };
            let report = report?;
            polls += 1;

            if report.is_healthy() {
                tracing::debug!(app = %app, polls, "instances healthy");
                return Ok(());
            }

            last_problem = report.problem().map(str::to_owned);
            tracing::debug!(app = %app, polls, problem = ?last_problem, "instances not ready");
            tokio::time::sleep(self.interval).await;
        }

        Err(WaitError::TimedOut {
            elapsed: started.elapsed(),
            last_problem,
        })
    }
}

impl Default for HealthWait {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_secs(600))
    }
}
