//! Authentication commands.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Subcommand};
use cumulus_client::ApiClient;

use crate::config::Credentials;
use crate::output::{print_info, print_success};

use super::CommandContext;

/// Authentication commands.
#[derive(Debug, Args)]
pub struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Debug, Subcommand)]
enum AuthSubcommand {
    /// Log in to the platform.
    Login(LoginArgs),

    /// Log out from the platform.
    Logout,

    /// Show current authentication status.
    Status,
}

#[derive(Debug, Args)]
struct LoginArgs {
    /// API token (for non-interactive login).
    #[arg(long, env = "CUMULUS_TOKEN")]
    token: Option<String>,
}

impl AuthCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<ExitCode> {
        match self.command {
            AuthSubcommand::Login(args) => login(ctx, args).await,
            AuthSubcommand::Logout => logout(ctx).await,
            AuthSubcommand::Status => status(ctx).await,
        }
    }
}

/// Log in to the platform.
async fn login(ctx: CommandContext, args: LoginArgs) -> Result<ExitCode> {
    let Some(token) = args.token else {
        print_info("Use --token or set the CUMULUS_TOKEN environment variable.");
        return Ok(ExitCode::FAILURE);
    };

    let mut creds = Credentials::new(token);

    // Validate the token and fetch the identity.
    let client = ApiClient::new(&ctx.config.api_url, Some(&creds.token))?;
    let identity = client.whoami().await?;
    creds.user_id = Some(identity.subject_id);
    creds.email = identity.email;

    creds.save()?;

    print_success("Logged in successfully.");
    Ok(ExitCode::SUCCESS)
}

/// Log out from the platform.
async fn logout(_ctx: CommandContext) -> Result<ExitCode> {
    Credentials::delete()?;
    print_success("Logged out successfully.");
    Ok(ExitCode::SUCCESS)
}

/// Show authentication status.
async fn status(ctx: CommandContext) -> Result<ExitCode> {
    match &ctx.credentials {
        Some(creds) => {
            println!("user: {}", creds.user_id.as_deref().unwrap_or("-"));
            println!("email: {}", creds.email.as_deref().unwrap_or("-"));
            Ok(ExitCode::SUCCESS)
        }
        None => {
            print_info("Not logged in.");
            Ok(ExitCode::FAILURE)
        }
    }
}
