//! Per-target outcome tracking for batch commands.

use std::process::ExitCode;

/// The two independent remote operations a removal batch performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Deactivate,
    Delete,
}

/// What happened to one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    SkippedProtected,
    SkippedHasChildren,
    Declined,
    /// The remote call was accepted; completion not yet known.
    Submitted,
    Succeeded,
    Failed(String),
}

#[derive(Debug)]
struct BatchEntry {
    target: String,
    kind: Option<OperationKind>,
    outcome: Outcome,
}

/// Collects per-target outcomes during a batch command and derives the
/// overall success flag and process exit status.
#[derive(Debug, Default)]
pub struct BatchReport {
    entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome for `target`. Re-recording with the same target
    /// and kind replaces the previous outcome (submitted → succeeded).
    pub fn record(&mut self, target: &str, kind: Option<OperationKind>, outcome: Outcome) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| entry.target == target && entry.kind == kind)
        {
            entry.outcome = outcome;
        } else {
            self.entries.push(BatchEntry {
                target: target.to_string(),
                kind,
                outcome,
            });
        }
    }

    /// Targets for which the operation was attempted (confirmed and
    /// submitted, whatever the result).
    pub fn attempted(&self, kind: OperationKind) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.kind == Some(kind))
            .filter(|entry| {
                matches!(
                    entry.outcome,
                    Outcome::Submitted | Outcome::Succeeded | Outcome::Failed(_)
                )
            })
            .count()
    }

    pub fn succeeded(&self, kind: OperationKind) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.kind == Some(kind))
            .filter(|entry| entry.outcome == Outcome::Succeeded)
            .count()
    }

    /// Overall success: every attempted operation of both kinds succeeded.
    pub fn success(&self) -> bool {
        self.succeeded(OperationKind::Deactivate) >= self.attempted(OperationKind::Deactivate)
            && self.succeeded(OperationKind::Delete) >= self.attempted(OperationKind::Delete)
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}
