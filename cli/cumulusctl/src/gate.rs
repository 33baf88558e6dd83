//! Confirmation gate for environment removal.
//!
//! Classifies each candidate into exactly one removal plan before any
//! remote mutation happens. Deactivation (the environment and its data)
//! and deletion (the underlying branch) are independent operations with
//! independent confirmations, and both may apply to one target.

use anyhow::Result;
use colored::Colorize;
use cumulus_client::Environment;

use crate::output::print_warning;
use crate::prompt::Prompt;

/// The decision for one candidate environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalPlan {
    /// The project default branch is never deactivated or deleted.
    SkipProtected,
    /// Environments with children must have the children removed first.
    SkipHasChildren,
    /// The operator declined every confirmation.
    Declined,
    /// Deactivate the environment, keep the branch.
    DeactivateOnly,
    /// Deactivate the environment, then delete the branch.
    DeactivateAndDelete,
    /// Delete the branch of an already-inactive environment.
    DeleteOnly,
}

/// Decide what to do with `env`.
///
/// The children check runs against the full current snapshot, not the
/// filtered batch, so a parent selected alongside its children is still
/// skipped.
pub fn plan_removal(
    env: &Environment,
    snapshot: &[Environment],
    protected: &str,
    prompt: &mut dyn Prompt,
) -> Result<RemovalPlan> {
    if env.id == protected {
        return Ok(RemovalPlan::SkipProtected);
    }

    if snapshot
        .iter()
        .any(|other| other.parent.as_deref() == Some(env.id.as_str()))
    {
        return Ok(RemovalPlan::SkipHasChildren);
    }

    if env.is_active() {
        print_warning(&format!(
            "The environment {} is currently active: deleting it will delete all associated data.",
            env.id.cyan()
        ));
        if !prompt.confirm(
            &format!("Are you sure you want to delete the environment {}?", env.id),
            true,
        )? {
            return Ok(RemovalPlan::Declined);
        }
        if prompt.confirm("Delete the remote branch too?", true)? {
            Ok(RemovalPlan::DeactivateAndDelete)
        } else {
            Ok(RemovalPlan::DeactivateOnly)
        }
    } else if prompt.confirm(
        &format!(
            "Are you sure you want to delete the remote branch {}?",
            env.id
        ),
        true,
    )? {
        Ok(RemovalPlan::DeleteOnly)
    } else {
        Ok(RemovalPlan::Declined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompt;
    use chrono::Utc;
    use cumulus_client::EnvironmentStatus;

    fn env(id: &str, status: EnvironmentStatus, parent: Option<&str>) -> Environment {
        Environment {
            id: id.to_string(),
            status,
            parent: parent.map(str::to_string),
            created_at: Utc::now(),
            operations: Vec::new(),
        }
    }

    #[test]
    fn protected_environment_is_never_prompted() {
        let main = env("main", EnvironmentStatus::Active, None);
        let snapshot = vec![main.clone()];
        // No scripted answers: any prompt would error the test.
        let mut prompt = ScriptedPrompt::new([]);
        let plan = plan_removal(&main, &snapshot, "main", &mut prompt).unwrap();
        assert_eq!(plan, RemovalPlan::SkipProtected);
    }

    #[test]
    fn environment_with_children_is_skipped_regardless_of_answers() {
        let parent = env("staging", EnvironmentStatus::Active, Some("main"));
        let snapshot = vec![
            parent.clone(),
            env("feature-a", EnvironmentStatus::Active, Some("staging")),
        ];
        let mut prompt = ScriptedPrompt::new([]);
        let plan = plan_removal(&parent, &snapshot, "main", &mut prompt).unwrap();
        assert_eq!(plan, RemovalPlan::SkipHasChildren);
    }

    #[test]
    fn active_environment_confirmed_twice_is_deactivated_and_deleted() {
        let target = env("feature-a", EnvironmentStatus::Active, Some("main"));
        let snapshot = vec![target.clone()];
        let mut prompt = ScriptedPrompt::new([true, true]);
        let plan = plan_removal(&target, &snapshot, "main", &mut prompt).unwrap();
        assert_eq!(plan, RemovalPlan::DeactivateAndDelete);
    }

    #[test]
    fn active_environment_keeping_branch_is_deactivate_only() {
        let target = env("feature-a", EnvironmentStatus::Active, Some("main"));
        let snapshot = vec![target.clone()];
        let mut prompt = ScriptedPrompt::new([true, false]);
        let plan = plan_removal(&target, &snapshot, "main", &mut prompt).unwrap();
        assert_eq!(plan, RemovalPlan::DeactivateOnly);
    }

    #[test]
    fn active_environment_declined_at_first_question_is_skipped() {
        let target = env("feature-a", EnvironmentStatus::Active, Some("main"));
        let snapshot = vec![target.clone()];
        // The branch question must not even be asked.
        let mut prompt = ScriptedPrompt::new([false]);
        let plan = plan_removal(&target, &snapshot, "main", &mut prompt).unwrap();
        assert_eq!(plan, RemovalPlan::Declined);
    }

    #[test]
    fn inactive_environment_gets_single_branch_question() {
        let target = env("feature-b", EnvironmentStatus::Inactive, Some("main"));
        let snapshot = vec![target.clone()];
        let mut prompt = ScriptedPrompt::new([true]);
        let plan = plan_removal(&target, &snapshot, "main", &mut prompt).unwrap();
        assert_eq!(plan, RemovalPlan::DeleteOnly);

        let mut prompt = ScriptedPrompt::new([false]);
        let plan = plan_removal(&target, &snapshot, "main", &mut prompt).unwrap();
        assert_eq!(plan, RemovalPlan::Declined);
    }
}
