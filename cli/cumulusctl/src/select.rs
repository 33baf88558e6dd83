//! Target selection for batch environment commands.
//!
//! Resolves which environments a command should act on from the current
//! snapshot. Pure logic; callers fetch the snapshot and (for merged mode)
//! the merged branch list up front.

use std::collections::HashSet;

use cumulus_client::{Environment, EnvironmentStatus};

/// How the operator selected the targets.
#[derive(Debug)]
pub enum Selection {
    /// Explicitly listed environment IDs.
    Explicit(Vec<String>),
    /// All inactive environments.
    Inactive,
    /// All environments whose branches are merged into `base`, excluding
    /// the base itself, the project default branch, and the base's parent.
    Merged {
        base: String,
        merged_branches: Vec<String>,
        default_branch: String,
    },
    /// The single pre-selected environment.
    Single(String),
}

/// Selected targets plus per-item diagnostics for requested IDs that do
/// not exist in the snapshot.
#[derive(Debug)]
pub struct SelectionOutcome {
    pub targets: Vec<Environment>,
    pub not_found: Vec<String>,
}

/// Resolve `selection` against the snapshot. Targets are deduplicated by
/// ID; snapshot order is preserved for filter modes, request order for
/// explicit mode.
pub fn select_targets(snapshot: &[Environment], selection: Selection) -> SelectionOutcome {
    let mut targets: Vec<Environment> = Vec::new();
    let mut not_found: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    match selection {
        Selection::Explicit(ids) => {
            for id in ids {
                if !seen.insert(id.clone()) {
                    continue;
                }
                match snapshot.iter().find(|env| env.id == id) {
                    Some(env) => targets.push(env.clone()),
                    None => not_found.push(id),
                }
            }
        }
        Selection::Inactive => {
            for env in snapshot {
                if env.status == EnvironmentStatus::Inactive && seen.insert(env.id.clone()) {
                    targets.push(env.clone());
                }
            }
        }
        Selection::Merged {
            base,
            merged_branches,
            default_branch,
        } => {
            let merged: HashSet<&str> = merged_branches.iter().map(String::as_str).collect();
            // No parent recorded means no additional exclusion.
            let base_parent = snapshot
                .iter()
                .find(|env| env.id == base)
                .and_then(|env| env.parent.clone());

            for env in snapshot {
                if !merged.contains(env.id.as_str()) {
                    continue;
                }
                if env.id == base || env.id == default_branch {
                    continue;
                }
                if base_parent.as_deref() == Some(env.id.as_str()) {
                    continue;
                }
                if seen.insert(env.id.clone()) {
                    targets.push(env.clone());
                }
            }
        }
        Selection::Single(id) => match snapshot.iter().find(|env| env.id == id) {
            Some(env) => targets.push(env.clone()),
            None => not_found.push(id),
        },
    }

    SelectionOutcome { targets, not_found }
}
