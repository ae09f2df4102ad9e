//! Layered settings: defaults, TOML file, then environment and flags.

use crate::{Cli, TransportKind};
use anyhow::{Context, Result};
use serde::Deserialize;
use stackmig_core::MigrationConfig;
use stackmig_platform::{CfCliControlPlane, ControlPlane, HttpControlPlane};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// How to reach the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Transport used for every request.
    pub transport: TransportKind,
    /// API server URL (http transport).
    pub api_url: Option<String>,
    /// Bearer token (http transport).
    pub token: Option<String>,
    /// Per-request timeout in seconds (http transport).
    pub request_timeout_secs: u64,
    /// `cf` executable (cf-cli transport).
    pub cf_binary: PathBuf,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::CfCli,
            api_url: None,
            token: None,
            request_timeout_secs: 30,
            cf_binary: PathBuf::from("cf"),
        }
    }
}

impl PlatformConfig {
    /// Build the configured control plane.
    ///
    /// # Errors
    ///
    /// Returns an error if the http transport has no API URL or its client
    /// cannot be built.
    pub fn connect(&self) -> Result<Arc<dyn ControlPlane>> {
        match self.transport {
            TransportKind::CfCli => Ok(Arc::new(CfCliControlPlane::new(&self.cf_binary))),
            TransportKind::Http => {
                let api_url = self
                    .api_url
                    .as_deref()
                    .context("API URL is required. Set STACKMIG_API_URL or use --api-url")?;
                let plane = HttpControlPlane::new(
                    api_url,
                    self.token.clone(),
                    Duration::from_secs(self.request_timeout_secs),
                )
                .with_context(|| format!("failed to create API client for {api_url}"))?;
                Ok(Arc::new(plane))
            }
        }
    }
}

/// Effective settings of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Migration behaviour.
    pub migration: MigrationConfig,
    /// Control-plane access.
    pub platform: PlatformConfig,
}

impl Settings {
    /// Resolve settings for `cli`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed.
    pub fn load(cli: &Cli) -> Result<Self> {
        let base = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_overrides(cli))
    }

    /// Read settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Apply flags and environment on top of these settings.
    #[must_use]
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(from) = &cli.from {
            self.migration.source_stack.clone_from(from);
        }
        if let Some(to) = &cli.to {
            self.migration.target_stack.clone_from(to);
        }
        if let Some(transport) = cli.transport {
            self.platform.transport = transport;
        }
        if cli.api_url.is_some() {
            self.platform.api_url.clone_from(&cli.api_url);
        }
        if cli.token.is_some() {
            self.platform.token.clone_from(&cli.token);
        }
        if let Some(binary) = &cli.cf_binary {
            self.platform.cf_binary.clone_from(binary);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.migration.source_stack, "lucid64");
        assert_eq!(settings.migration.target_stack, "cflinuxfs2");
        assert_eq!(settings.platform.transport, TransportKind::CfCli);
        assert_eq!(settings.platform.cf_binary, PathBuf::from("cf"));
        assert_eq!(settings.platform.request_timeout_secs, 30);
    }

    #[test]
    fn test_file_then_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[migration]
target_stack = "cflinuxfs3"
batch_size = 20

[platform]
transport = "http"
api_url = "https://api.file.example.com"
"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        let cli = Cli::parse_from([
            "stackmig",
            "--config",
            path,
            "--api-url",
            "https://api.flag.example.com",
            "--from",
            "cflinuxfs2",
            "list",
        ]);
        let settings = Settings::load(&cli).unwrap();

        assert_eq!(settings.migration.source_stack, "cflinuxfs2");
        assert_eq!(settings.migration.target_stack, "cflinuxfs3");
        assert_eq!(settings.migration.batch_size, 20);
        assert_eq!(settings.platform.transport, TransportKind::Http);
        assert_eq!(
            settings.platform.api_url.as_deref(),
            Some("https://api.flag.example.com")
        );
    }

    #[test]
    fn test_missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let err = Settings::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn test_http_without_url_cannot_connect() {
        let platform = PlatformConfig {
            transport: TransportKind::Http,
            ..PlatformConfig::default()
        };

        let err = platform.connect().err().unwrap();
        assert!(err.to_string().contains("STACKMIG_API_URL"));
    }
}
