//! Applies a reconciliation decision against the backend.
//!
//! The applier is best-effort: a failed mutation for one user is logged,
//! recorded in the report, and skipped; the remaining users and issues are
//! still processed. In dry-run mode no backend call is made at all, but the
//! report is built exactly as a fully successful real run would build it.

pub mod report;

use tracing::warn;

use crate::engine::{Decision, FallbackDecision};
use crate::github::IssueBackend;
use crate::types::{IssueNumber, IssueSnapshot, RepoId};

/// What was (or would be) done with one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssigneeAction {
    Add,
    Remove,
    Keep,
}

impl AssigneeAction {
    /// The report marker for this action.
    pub fn sign(&self) -> &'static str {
        match self {
            AssigneeAction::Add => "+",
            AssigneeAction::Remove => "-",
            AssigneeAction::Keep => "=",
        }
    }
}

/// The outcome of one per-user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssigneeOutcome {
    pub action: AssigneeAction,
    pub username: String,
    /// False when the backend rejected the mutation; the user was skipped.
    pub applied: bool,
}

/// The outcome of the fallback-label decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackOutcome {
    None,
    AlreadyPresent { label: String },
    Applied { label: String, ok: bool },
}

/// The record of everything done (or simulated) for one issue.
///
/// Outcomes are ordered keeps, then removes, then adds; each list in the
/// decision's (case-insensitively sorted) order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    pub repo: RepoId,
    pub number: IssueNumber,
    pub url: String,
    pub outcomes: Vec<AssigneeOutcome>,
    pub fallback: FallbackOutcome,
}

/// Executes a decision against the backend and reports what happened.
///
/// In dry-run mode every outcome is reported as applied without touching the
/// backend. In a real run, each add/remove is one mutation; failures are
/// warned about and skipped. The fallback label, when due, is set by
/// re-sending the issue's current labels with the fallback appended; its
/// failure is non-fatal.
pub async fn apply<B: IssueBackend>(
    backend: &B,
    repo: &RepoId,
    issue: &IssueSnapshot,
    decision: &Decision,
    dry_run: bool,
) -> ApplyReport {
    let mut outcomes = Vec::with_capacity(
        decision.to_keep.len() + decision.to_remove.len() + decision.to_add.len(),
    );

    for username in &decision.to_keep {
        outcomes.push(AssigneeOutcome {
            action: AssigneeAction::Keep,
            username: username.clone(),
            applied: true,
        });
    }

    for username in &decision.to_remove {
        let applied = if dry_run {
            true
        } else {
            match backend.remove_assignee(issue.number, username).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(
                        repo = %repo,
                        issue = %issue.number,
                        username = %username,
                        error = %e,
                        "skipping failed assignee removal"
                    );
                    false
                }
            }
        };
        outcomes.push(AssigneeOutcome {
            action: AssigneeAction::Remove,
            username: username.clone(),
            applied,
        });
    }

    for username in &decision.to_add {
        let applied = if dry_run {
            true
        } else {
            match backend.add_assignee(issue.number, username).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(
                        repo = %repo,
                        issue = %issue.number,
                        username = %username,
                        error = %e,
                        "skipping failed assignee addition"
                    );
                    false
                }
            }
        };
        outcomes.push(AssigneeOutcome {
            action: AssigneeAction::Add,
            username: username.clone(),
            applied,
        });
    }

    let fallback = match &decision.fallback {
        FallbackDecision::None => FallbackOutcome::None,
        FallbackDecision::AlreadyPresent { label } => FallbackOutcome::AlreadyPresent {
            label: label.clone(),
        },
        FallbackDecision::Apply { label } => {
            let ok = if dry_run {
                true
            } else {
                let mut labels = issue.labels.clone();
                labels.push(label.clone());
                match backend.set_labels(issue.number, &labels).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(
                            repo = %repo,
                            issue = %issue.number,
                            label = %label,
                            error = %e,
                            "fallback label update failed"
                        );
                        false
                    }
                }
            };
            FallbackOutcome::Applied {
                label: label.clone(),
                ok,
            }
        }
    };

    ApplyReport {
        repo: repo.clone(),
        number: issue.number,
        url: issue.url.clone(),
        outcomes,
        fallback,
    }
}
