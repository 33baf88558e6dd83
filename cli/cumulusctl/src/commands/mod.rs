//! CLI commands.

mod auth;
mod context;
mod domains;
mod envs;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cumulus_client::ApiClient;

use crate::config::{Config, Credentials};
use crate::error::CliError;
use crate::output::OutputFormat;
use crate::prompt::{AssumeYes, Prompt, StdinPrompt};

/// Cumulus CLI - manage environments and domains on the platform.
#[derive(Debug, Parser)]
#[command(name = "cumulus")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json).
    #[arg(long, global = true, default_value = "table")]
    format: String,

    /// Project ID.
    #[arg(long, short = 'p', global = true, env = "CUMULUS_PROJECT")]
    project: Option<String>,

    /// Environment ID.
    #[arg(long, short = 'e', global = true, env = "CUMULUS_ENVIRONMENT")]
    environment: Option<String>,

    /// Answer yes to every confirmation prompt.
    #[arg(long, short = 'y', global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Authenticate with the platform.
    Auth(auth::AuthCommand),

    /// Show or change saved CLI context.
    Context(context::ContextCommand),

    /// Manage environments.
    Envs(envs::EnvsCommand),

    /// Manage project domains.
    Domains(domains::DomainsCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    /// Run the CLI command.
    pub async fn run(self) -> Result<ExitCode> {
        let format = match self.format.as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Table,
        };

        let config = Config::load()?;
        let credentials = Credentials::load()?;

        let ctx = CommandContext {
            config,
            credentials,
            format,
            project: self.project,
            environment: self.environment,
            assume_yes: self.yes,
        };

        match self.command {
            Commands::Auth(cmd) => cmd.run(ctx).await,
            Commands::Context(cmd) => cmd.run(ctx).await,
            Commands::Envs(cmd) => cmd.run(ctx).await,
            Commands::Domains(cmd) => cmd.run(ctx).await,
            Commands::Version => {
                println!("cumulus {}", env!("CARGO_PKG_VERSION"));
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

/// Shared command context.
pub struct CommandContext {
    pub config: Config,
    pub credentials: Option<Credentials>,
    pub format: OutputFormat,
    pub project: Option<String>,
    pub environment: Option<String>,
    pub assume_yes: bool,
}

impl CommandContext {
    /// Get an API client for the configured endpoint.
    pub fn client(&self) -> Result<ApiClient> {
        let token = self.credentials.as_ref().map(|creds| creds.token.as_str());
        Ok(ApiClient::new(&self.config.api_url, token)?)
    }

    /// Confirmation prompt honoring the global `--yes` flag.
    pub fn prompt(&self) -> Box<dyn Prompt> {
        if self.assume_yes {
            Box::new(AssumeYes)
        } else {
            Box::new(StdinPrompt)
        }
    }

    /// Resolve the current project, preferring flag over saved context.
    pub fn resolve_project(&self) -> Option<&str> {
        self.project
            .as_deref()
            .or(self.config.context.project.as_deref())
    }

    /// Resolve the current environment, preferring flag over saved context.
    pub fn resolve_environment(&self) -> Option<&str> {
        self.environment
            .as_deref()
            .or(self.config.context.environment.as_deref())
    }

    /// Require a project to be specified.
    pub fn require_project(&self) -> Result<String> {
        self.resolve_project().map(str::to_string).ok_or_else(|| {
            CliError::Validation(
                "No project specified. Use --project or set a default context.".to_string(),
            )
            .into()
        })
    }

    /// Require an environment to be specified.
    pub fn require_environment(&self) -> Result<String> {
        self.resolve_environment()
            .map(str::to_string)
            .ok_or_else(|| {
                CliError::Validation(
                    "No environment specified. Use --environment or set a default context."
                        .to_string(),
                )
                .into()
            })
    }
}
