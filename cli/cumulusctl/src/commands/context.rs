//! Context commands (saved defaults for project/environment).

use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::error::CliError;
use crate::output::{print_single, print_success, OutputFormat};

use super::CommandContext;

/// Manage saved CLI context (defaults for project/environment).
#[derive(Debug, Args)]
pub struct ContextCommand {
    #[command(subcommand)]
    command: ContextSubcommand,
}

#[derive(Debug, Subcommand)]
enum ContextSubcommand {
    /// Show the saved context.
    Show,

    /// Set saved defaults.
    Set(SetArgs),

    /// Clear the saved context.
    Clear,
}

#[derive(Debug, Args)]
struct SetArgs {
    /// Default project ID.
    #[arg(long)]
    project: Option<String>,

    /// Default environment ID.
    #[arg(long)]
    environment: Option<String>,
}

#[derive(Debug, Serialize)]
struct ContextView {
    api_url: String,
    project: Option<String>,
    environment: Option<String>,
}

impl ContextCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<ExitCode> {
        match self.command {
            ContextSubcommand::Show => show(ctx).await,
            ContextSubcommand::Set(args) => set(ctx, args).await,
            ContextSubcommand::Clear => clear(ctx).await,
        }
    }
}

async fn show(ctx: CommandContext) -> Result<ExitCode> {
    let view = ContextView {
        api_url: ctx.config.api_url.clone(),
        project: ctx.config.context.project.clone(),
        environment: ctx.config.context.environment.clone(),
    };

    match ctx.format {
        OutputFormat::Json => print_single(&view, ctx.format),
        OutputFormat::Table => {
            println!("api_url: {}", view.api_url);
            println!("project: {}", view.project.as_deref().unwrap_or("-"));
            println!("environment: {}", view.environment.as_deref().unwrap_or("-"));
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn set(mut ctx: CommandContext, args: SetArgs) -> Result<ExitCode> {
    if args.project.is_none() && args.environment.is_none() {
        return Err(
            CliError::Validation("Specify --project and/or --environment.".to_string()).into(),
        );
    }

    if let Some(project) = args.project {
        ctx.config.context.project = Some(project);
    }
    if let Some(environment) = args.environment {
        ctx.config.context.environment = Some(environment);
    }
    ctx.config.save()?;

    print_success("Saved context");
    Ok(ExitCode::SUCCESS)
}

async fn clear(mut ctx: CommandContext) -> Result<ExitCode> {
    ctx.config.context.project = None;
    ctx.config.context.environment = None;
    ctx.config.save()?;

    print_success("Cleared saved context");
    Ok(ExitCode::SUCCESS)
}
