//! Environment commands.
//!
//! `envs delete` is the batch orchestrator: select targets, confirm each
//! one, submit deactivations, wait for the whole activity set, delete
//! branches, and derive the exit status from the aggregated outcomes.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use cumulus_client::{Activity, ApiClient, ApiError, Environment, Project};
use serde::Serialize;
use tabled::Tabled;

use crate::activity::{self, WaitOptions};
use crate::batch::{BatchReport, OperationKind, Outcome};
use crate::error::CliError;
use crate::gate::{plan_removal, RemovalPlan};
use crate::git;
use crate::output::{
    print_info, print_output, print_single, print_success, print_warning, OutputFormat,
};
use crate::prompt::Prompt;
use crate::select::{select_targets, Selection, SelectionOutcome};

use super::CommandContext;

/// Environment commands.
#[derive(Debug, Args)]
pub struct EnvsCommand {
    #[command(subcommand)]
    command: EnvsSubcommand,
}

#[derive(Debug, Subcommand)]
enum EnvsSubcommand {
    /// List environments in the project.
    List,

    /// Deactivate environments and delete their branches.
    Delete(DeleteArgs),

    /// Create a backup of the selected environment.
    Backup(BackupArgs),

    /// Restore an environment backup.
    Restore(RestoreArgs),

    /// Synchronize code and/or data from the parent environment.
    #[command(alias = "sync")]
    Synchronize(SynchronizeArgs),
}

#[derive(Debug, Args)]
struct DeleteArgs {
    /// The environment(s) to delete.
    environments: Vec<String>,

    /// Delete all inactive environments.
    #[arg(long, conflicts_with = "merged")]
    inactive: bool,

    /// Delete all environments merged into the selected environment.
    #[arg(long)]
    merged: bool,

    /// Local repository used to resolve merged branches.
    #[arg(long, default_value = ".")]
    repo: PathBuf,
}

#[derive(Debug, Args)]
struct BackupArgs {
    /// Do not wait for the operation to complete.
    #[arg(long)]
    no_wait: bool,
}

#[derive(Debug, Args)]
struct RestoreArgs {
    /// The name of the backup. Defaults to the most recent one.
    backup: Option<String>,

    /// Do not wait for the operation to complete.
    #[arg(long)]
    no_wait: bool,
}

#[derive(Debug, Args)]
struct SynchronizeArgs {
    /// What to synchronize: code, data or both.
    synchronize: Vec<String>,

    /// Do not wait for the operation to complete.
    #[arg(long)]
    no_wait: bool,
}

impl EnvsCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<ExitCode> {
        match self.command {
            EnvsSubcommand::List => list(ctx).await,
            EnvsSubcommand::Delete(args) => delete(ctx, args).await,
            EnvsSubcommand::Backup(args) => backup(ctx, args).await,
            EnvsSubcommand::Restore(args) => restore(ctx, args).await,
            EnvsSubcommand::Synchronize(args) => synchronize(ctx, args).await,
        }
    }
}

/// Table row for environment listings.
#[derive(Debug, Serialize, Tabled)]
struct EnvRow {
    #[tabled(rename = "ID")]
    id: String,

    #[tabled(rename = "Status")]
    status: String,

    #[tabled(rename = "Parent")]
    parent: String,

    #[tabled(rename = "Created")]
    created_at: String,
}

impl From<&Environment> for EnvRow {
    fn from(env: &Environment) -> Self {
        Self {
            id: env.id.clone(),
            status: env.status.to_string(),
            parent: env.parent.clone().unwrap_or_else(|| "-".to_string()),
            created_at: env.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// List all environments in the current project.
async fn list(ctx: CommandContext) -> Result<ExitCode> {
    let project = ctx.require_project()?;
    let client = ctx.client()?;

    let environments = client.environments(&project).await?;

    match ctx.format {
        OutputFormat::Table => {
            let rows: Vec<EnvRow> = environments.iter().map(EnvRow::from).collect();
            print_output(&rows, ctx.format);
        }
        OutputFormat::Json => print_single(&environments, ctx.format),
    }

    Ok(ExitCode::SUCCESS)
}

/// Delete (and where needed, first deactivate) environments.
async fn delete(ctx: CommandContext, args: DeleteArgs) -> Result<ExitCode> {
    let project_id = ctx.require_project()?;
    let client = ctx.client()?;
    let project = client.project(&project_id).await?;
    let snapshot = client.environments(&project_id).await?;

    let mut single_mode = false;
    let mut empty_msg = None;

    let selection = if args.inactive {
        empty_msg = Some("No inactive environments found");
        Selection::Inactive
    } else if args.merged {
        let base = ctx
            .resolve_environment()
            .ok_or_else(|| {
                CliError::Validation("No base environment specified.".to_string())
            })?
            .to_string();
        println!("Finding environments merged with {}", base.cyan());
        git::fetch_origin(&args.repo).await?;
        let merged_branches = git::merged_branches(&args.repo, &base).await?;
        empty_msg = Some("No merged environments found");
        Selection::Merged {
            base,
            merged_branches,
            default_branch: project.default_branch.clone(),
        }
    } else if !args.environments.is_empty() {
        Selection::Explicit(args.environments.clone())
    } else if let Some(env) = ctx.resolve_environment() {
        single_mode = true;
        Selection::Single(env.to_string())
    } else {
        return Err(CliError::Validation(
            "No environments specified. Pass environment IDs, --inactive, or --merged."
                .to_string(),
        )
        .into());
    };

    let SelectionOutcome { targets, not_found } = select_targets(&snapshot, selection);

    if single_mode {
        if let Some(id) = not_found.first() {
            return Err(CliError::NotFound(format!("Environment '{id}' not found")).into());
        }
    }
    for id in &not_found {
        print_warning(&format!("Environment not found: {id}"));
    }

    if targets.is_empty() {
        if let Some(msg) = empty_msg {
            print_info(msg);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut prompt = ctx.prompt();
    let report = delete_multiple(
        &client,
        &project,
        &snapshot,
        &targets,
        prompt.as_mut(),
        &WaitOptions::default(),
    )
    .await?;

    Ok(report.exit_code())
}

/// Confirm and remove a batch of environments.
///
/// Deactivation and branch deletion are independent operations: every
/// deactivation is submitted before any is awaited, the whole activity
/// set is then tracked together, and branch deletions run last against
/// refreshed state. A failure on one target never aborts the rest.
async fn delete_multiple(
    client: &ApiClient,
    project: &Project,
    snapshot: &[Environment],
    targets: &[Environment],
    prompt: &mut dyn Prompt,
    wait: &WaitOptions,
) -> Result<BatchReport> {
    let mut report = BatchReport::new();
    let mut to_deactivate: Vec<Environment> = Vec::new();
    let mut to_delete: Vec<Environment> = Vec::new();

    for env in targets {
        match plan_removal(env, snapshot, &project.default_branch, prompt)? {
            RemovalPlan::SkipProtected => {
                print_warning(&format!(
                    "The {} environment cannot be deactivated or deleted.",
                    env.id.cyan()
                ));
                report.record(&env.id, None, Outcome::SkippedProtected);
            }
            RemovalPlan::SkipHasChildren => {
                print_warning(&format!(
                    "The environment {} has children and cannot be deleted.",
                    env.id.cyan()
                ));
                println!("Delete the environment's children first.");
                report.record(&env.id, None, Outcome::SkippedHasChildren);
            }
            RemovalPlan::Declined => {
                report.record(&env.id, None, Outcome::Declined);
            }
            RemovalPlan::DeactivateOnly => to_deactivate.push(env.clone()),
            RemovalPlan::DeactivateAndDelete => {
                to_deactivate.push(env.clone());
                to_delete.push(env.clone());
            }
            RemovalPlan::DeleteOnly => to_delete.push(env.clone()),
        }
    }

    let mut submitted: Vec<(String, Activity)> = Vec::new();
    for env in &to_deactivate {
        print_info(&format!("Deleting environment {}", env.id.cyan()));
        match client.deactivate_environment(&project.id, &env.id).await {
            Ok(activity) => {
                report.record(&env.id, Some(OperationKind::Deactivate), Outcome::Submitted);
                submitted.push((env.id.clone(), activity));
            }
            Err(e) => {
                print_warning(&e.to_string());
                report.record(
                    &env.id,
                    Some(OperationKind::Deactivate),
                    Outcome::Failed(e.to_string()),
                );
            }
        }
    }

    if !submitted.is_empty() {
        let activities: Vec<Activity> = submitted
            .iter()
            .map(|(_, activity)| activity.clone())
            .collect();
        let results = activity::wait_for_many(client, &project.id, &activities, wait).await;
        for ((env_id, _), success) in submitted.iter().zip(results) {
            let outcome = if success {
                Outcome::Succeeded
            } else {
                Outcome::Failed("deactivation did not complete".to_string())
            };
            report.record(env_id, Some(OperationKind::Deactivate), outcome);
        }
    }

    for env in &to_delete {
        match delete_branch(client, &project.id, env).await {
            Ok(()) => {
                print_success(&format!("Deleted remote branch {}", env.id.cyan()));
                report.record(&env.id, Some(OperationKind::Delete), Outcome::Succeeded);
            }
            Err(e) => {
                print_warning(&e.to_string());
                report.record(
                    &env.id,
                    Some(OperationKind::Delete),
                    Outcome::Failed(e.to_string()),
                );
            }
        }
    }

    Ok(report)
}

/// Delete one environment's branch, refreshing stale active state first.
/// A delete against a still-active environment is rejected server-side.
async fn delete_branch(
    client: &ApiClient,
    project: &str,
    env: &Environment,
) -> Result<(), ApiError> {
    if env.is_active() {
        client.environment(project, &env.id).await?;
    }
    client.delete_environment(project, &env.id).await
}

/// Create a backup of the selected environment.
async fn backup(ctx: CommandContext, args: BackupArgs) -> Result<ExitCode> {
    let project = ctx.require_project()?;
    let env_id = ctx.require_environment()?;
    let client = ctx.client()?;

    let ok = backup_flow(
        &client,
        &project,
        &env_id,
        args.no_wait,
        &WaitOptions::default(),
    )
    .await?;
    Ok(exit_code(ok))
}

async fn backup_flow(
    client: &ApiClient,
    project: &str,
    env_id: &str,
    no_wait: bool,
    wait: &WaitOptions,
) -> Result<bool> {
    let env = client.environment(project, env_id).await?;
    if !env.operation_available("backup") {
        print_warning(&format!(
            "Operation not available: the environment {} cannot be backed up.",
            env_id.cyan()
        ));
        return Ok(false);
    }

    print_info(&format!("Creating a backup of {}", env_id.cyan()));
    let activity = client.backup_environment(project, env_id).await?;

    if no_wait {
        if let Some(name) = activity.backup_name() {
            print_info(&format!("Backup name: {name}"));
        }
        return Ok(true);
    }

    let final_activity = activity::wait_for(client, project, activity, wait).await?;
    if final_activity.is_complete() {
        match final_activity.backup_name() {
            Some(name) => print_success(&format!("Backup {name} created")),
            None => print_success("Backup created"),
        }
        Ok(true)
    } else {
        print_warning("The backup failed");
        Ok(false)
    }
}

/// Restore an environment backup.
async fn restore(ctx: CommandContext, args: RestoreArgs) -> Result<ExitCode> {
    let project = ctx.require_project()?;
    let env_id = ctx.require_environment()?;
    let client = ctx.client()?;
    let mut prompt = ctx.prompt();

    let ok = restore_flow(
        &client,
        &project,
        &env_id,
        args.backup,
        args.no_wait,
        prompt.as_mut(),
        &WaitOptions::default(),
    )
    .await?;
    Ok(exit_code(ok))
}

async fn restore_flow(
    client: &ApiClient,
    project: &str,
    env_id: &str,
    backup_arg: Option<String>,
    no_wait: bool,
    prompt: &mut dyn Prompt,
    wait: &WaitOptions,
) -> Result<bool> {
    let selected = match backup_arg {
        Some(name) => {
            // Find the named backup.
            let activities = client
                .environment_activities(project, env_id, 0, Some("environment.backup"))
                .await?;
            activities
                .into_iter()
                .find(|activity| activity.backup_name() == Some(name.as_str()))
                .ok_or_else(|| CliError::NotFound(format!("Backup '{name}' not found")))?
        }
        None => {
            // Find the most recent backup.
            print_info(&format!(
                "Finding the most recent backup for the environment {}",
                env_id.cyan()
            ));
            let mut activities = client
                .environment_activities(project, env_id, 1, Some("environment.backup"))
                .await?;
            if activities.is_empty() {
                return Err(CliError::NotFound("No backups found".to_string()).into());
            }
            activities.remove(0)
        }
    };

    if !selected.operation_available("restore") {
        if !selected.is_complete() {
            print_warning("The backup is not complete, so it cannot be restored");
        } else {
            print_warning("The backup cannot be restored");
        }
        return Ok(false);
    }

    let name = selected.backup_name().unwrap_or(&selected.id).to_string();
    let date = selected.created_at.format("%Y-%m-%d %H:%M");
    if !prompt.confirm(
        &format!("Are you sure you want to restore the backup {name} from {date}?"),
        true,
    )? {
        println!("{}", "Cancelled.".yellow());
        return Ok(false);
    }

    print_info(&format!("Restoring backup {}", name.cyan()));
    let activity = client.restore_backup(project, &selected.id).await?;

    if no_wait {
        return Ok(true);
    }
    activity::wait_and_report(
        client,
        project,
        activity,
        "The backup was successfully restored",
        "Restoring failed",
        wait,
    )
    .await
}

/// Synchronize an environment from its parent.
async fn synchronize(ctx: CommandContext, args: SynchronizeArgs) -> Result<ExitCode> {
    let project = ctx.require_project()?;
    let env_id = ctx.require_environment()?;
    let client = ctx.client()?;
    let mut prompt = ctx.prompt();

    let ok = synchronize_flow(
        &client,
        &project,
        &env_id,
        &args.synchronize,
        args.no_wait,
        prompt.as_mut(),
        &WaitOptions::default(),
    )
    .await?;
    Ok(exit_code(ok))
}

async fn synchronize_flow(
    client: &ApiClient,
    project: &str,
    env_id: &str,
    what: &[String],
    no_wait: bool,
    prompt: &mut dyn Prompt,
    wait: &WaitOptions,
) -> Result<bool> {
    let env = client.environment(project, env_id).await?;

    if !env.operation_available("synchronize") {
        print_warning(&format!(
            "Operation not available: the environment {} cannot be synchronized.",
            env_id.cyan()
        ));
        return Ok(false);
    }

    let Some(parent) = env.parent.as_deref() else {
        print_warning(&format!(
            "The environment {} has no parent to synchronize from.",
            env_id.cyan()
        ));
        return Ok(false);
    };

    let (sync_code, sync_data) = if !what.is_empty() {
        if what
            .iter()
            .any(|token| !matches!(token.as_str(), "code" | "data" | "both"))
        {
            return Err(
                CliError::Validation("Specify 'code', 'data', or 'both'.".to_string()).into(),
            );
        }
        let sync_code = what.iter().any(|t| t == "code" || t == "both");
        let sync_data = what.iter().any(|t| t == "data" || t == "both");

        if !prompt.confirm(
            &format!(
                "Are you sure you want to synchronize {} to {}?",
                parent.cyan(),
                env_id.cyan()
            ),
            false,
        )? {
            println!("{}", "Cancelled.".yellow());
            return Ok(false);
        }
        (sync_code, sync_data)
    } else {
        let sync_code = prompt.confirm(
            &format!("Synchronize code from {} to {}?", parent.cyan(), env_id.cyan()),
            false,
        )?;
        let sync_data = prompt.confirm(
            &format!("Synchronize data from {} to {}?", parent.cyan(), env_id.cyan()),
            false,
        )?;
        (sync_code, sync_data)
    };

    if !sync_code && !sync_data {
        return Err(CliError::Validation(
            "You must synchronize at least code or data.".to_string(),
        )
        .into());
    }

    print_info(&format!("Synchronizing environment {}", env_id.cyan()));
    let activity = client
        .synchronize_environment(project, env_id, sync_code, sync_data)
        .await?;

    if no_wait {
        return Ok(true);
    }
    activity::wait_and_report(
        client,
        project,
        activity,
        "Synchronization complete",
        "Synchronization failed",
        wait,
    )
    .await
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
