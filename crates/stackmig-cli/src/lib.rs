//! # stackmig-cli
//!
//! Command-line interface for moving applications between stacks.
//!
//! ## Commands
//!
//! - `stackmig change` - Migrate applications to the target stack
//! - `stackmig list` - Show applications still on the source stack
//!
//! ## Configuration
//!
//! Flags override environment variables, which override the optional TOML
//! file given with `--config` (or `STACKMIG_CONFIG`):
//!
//! - `STACKMIG_API_URL` - API endpoint for the `http` transport
//! - `STACKMIG_TOKEN` - bearer token for the `http` transport

#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

pub mod commands;
pub mod logging;
pub mod settings;
pub mod terminal;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use stackmig_core::{MigrationError, Scope};
use std::path::PathBuf;

/// stackmig - change the stack of platform applications
#[derive(Debug, Parser)]
#[command(name = "stackmig")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true, env = "STACKMIG_CONFIG")]
    pub config: Option<PathBuf>,

    /// How to reach the control plane.
    #[arg(long, global = true, value_enum)]
    pub transport: Option<TransportKind>,

    /// API server URL (http transport).
    #[arg(long, global = true, env = "STACKMIG_API_URL")]
    pub api_url: Option<String>,

    /// API bearer token (http transport).
    #[arg(long, global = true, env = "STACKMIG_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Path of the `cf` executable (cf-cli transport).
    #[arg(long, global = true)]
    pub cf_binary: Option<PathBuf>,

    /// Stack to migrate away from.
    #[arg(long, global = true)]
    pub from: Option<String>,

    /// Stack to migrate to.
    #[arg(long, global = true)]
    pub to: Option<String>,

    /// Log run milestones.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Change the stack of applications from the source to the target stack.
    Change(ChangeArgs),
    /// List applications on the source stack.
    List(ScopeArgs),
}

impl Commands {
    /// Scope flags of the selected command.
    #[must_use]
    pub fn scope_args(&self) -> &ScopeArgs {
        match self {
            Self::Change(args) => &args.scope,
            Self::List(args) => args,
        }
    }
}

/// Organization / space selection.
#[derive(Debug, Clone, Default, Args)]
pub struct ScopeArgs {
    /// Organization name (case-insensitive).
    #[arg(short = 'o', long = "org")]
    pub organization: Option<String>,

    /// Space name (case-insensitive); requires an organization.
    #[arg(short = 's', long)]
    pub space: Option<String>,
}

impl ScopeArgs {
    /// Build the selection scope.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::SpaceRequiresOrganization` if a space is given alone.
    pub fn scope(&self) -> Result<Scope, MigrationError> {
        Scope::from_flags(self.organization.clone(), self.space.clone())
    }
}

/// Arguments for the change command.
#[derive(Debug, Clone, Args)]
pub struct ChangeArgs {
    /// Organization / space selection.
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Applications migrated concurrently (1 - 100).
    #[arg(short = 'p', long, allow_negative_numbers = true)]
    pub parallel: Option<i64>,
}

/// Control-plane transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
    /// Shell out to `cf curl`, reusing the current `cf` login.
    #[default]
    CfCli,
    /// Talk to the API directly with a bearer token.
    Http,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_flags() {
        let cli = Cli::parse_from([
            "stackmig", "change", "-o", "acme", "-s", "dev", "-p", "25", "--to", "cflinuxfs3",
        ]);

        let Commands::Change(args) = &cli.command else {
            panic!("expected change command");
        };
        assert_eq!(args.parallel, Some(25));
        assert_eq!(cli.to.as_deref(), Some("cflinuxfs3"));
        assert_eq!(
            args.scope.scope().unwrap(),
            Scope::BySpace {
                organization: "acme".into(),
                space: "dev".into()
            }
        );
    }

    #[test]
    fn test_negative_parallel_reaches_validation() {
        let cli = Cli::parse_from(["stackmig", "change", "--parallel", "-1"]);

        let Commands::Change(args) = &cli.command else {
            panic!("expected change command");
        };
        assert_eq!(args.parallel, Some(-1));
    }

    #[test]
    fn test_list_with_global_flags() {
        let cli = Cli::parse_from([
            "stackmig",
            "list",
            "--org",
            "acme",
            "--transport",
            "http",
            "--api-url",
            "https://api.example.com",
            "--log-format",
            "json",
        ]);

        assert!(matches!(cli.command, Commands::List(_)));
        assert_eq!(cli.transport, Some(TransportKind::Http));
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(
            cli.command.scope_args().scope().unwrap(),
            Scope::ByOrganization("acme".into())
        );
    }

    #[test]
    fn test_space_alone_is_rejected() {
        let cli = Cli::parse_from(["stackmig", "list", "-s", "dev"]);
        assert!(cli.command.scope_args().scope().is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
