//! Assignment reconciliation engine.
//!
//! Given an issue snapshot and the compiled rules, [`decide`] computes which
//! users to add, remove, or leave alone, and whether the fallback label
//! applies. It is a pure function of its arguments; all mutation happens in
//! the applier.

use std::collections::BTreeSet;
use std::fmt;

use clap::ValueEnum;

use crate::rules::RuleSet;
use crate::types::IssueSnapshot;

/// Policy governing how rule-matched and currently-assigned user sets merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Add matched users; never remove anyone.
    Append,
    /// Add matched users only when the issue has no assignees at all.
    Set,
    /// Make assignees exactly the matched set: add missing, remove stale.
    Change,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Append => "append",
            Strategy::Set => "set",
            Strategy::Change => "change",
        };
        write!(f, "{}", name)
    }
}

/// What to do about the fallback label, decided independently of assignees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackDecision {
    /// No label configured, or the issue has matches/assignees.
    None,
    /// The configured label is already on the issue.
    AlreadyPresent { label: String },
    /// The configured label should be applied.
    Apply { label: String },
}

/// The computed reconciliation for one issue.
///
/// All three lists are sorted case-insensitively by username; that ordering
/// is part of the reporting contract. Set membership itself is
/// case-sensitive: logins differing only in case are distinct identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub to_add: Vec<String>,
    pub to_remove: Vec<String>,
    pub to_keep: Vec<String>,
    pub fallback: FallbackDecision,
}

/// Computes the reconciliation decision for one issue.
///
/// A user is assignable as soon as any of their patterns matches the issue's
/// title, body, or a label (see [`crate::rules::UserRules::matches`]). The
/// strategy then governs the merge:
///
/// - `append`: add `assignable − assigned`, keep everyone currently assigned.
/// - `set`: like `append`, but additions are suppressed entirely when the
///   issue already has assignees.
/// - `change`: add `assignable − assigned`, remove `assigned − assignable`,
///   keep the intersection.
///
/// The fallback label is proposed only when nobody matched AND nobody is
/// assigned, regardless of strategy.
pub fn decide(
    issue: &IssueSnapshot,
    rules: &RuleSet,
    fallback: Option<&str>,
    strategy: Strategy,
) -> Decision {
    let assigned: BTreeSet<&str> = issue.assignees.iter().map(String::as_str).collect();

    let assignable: BTreeSet<&str> = rules
        .users()
        .filter(|(_, user_rules)| user_rules.matches(issue))
        .map(|(name, _)| name)
        .collect();

    let mut to_add: Vec<String> = assignable
        .difference(&assigned)
        .map(|u| u.to_string())
        .collect();
    if strategy == Strategy::Set && !assigned.is_empty() {
        to_add.clear();
    }

    let to_remove: Vec<String> = match strategy {
        Strategy::Change => assigned
            .difference(&assignable)
            .map(|u| u.to_string())
            .collect(),
        Strategy::Append | Strategy::Set => Vec::new(),
    };

    let to_keep: Vec<String> = match strategy {
        Strategy::Change => assignable
            .intersection(&assigned)
            .map(|u| u.to_string())
            .collect(),
        // Everyone currently assigned is left alone, matched or not.
        Strategy::Append | Strategy::Set => {
            issue.assignees.iter().cloned().collect()
        }
    };

    let fallback = if assignable.is_empty() && assigned.is_empty() {
        match fallback {
            None => FallbackDecision::None,
            Some(label) if issue.labels.iter().any(|l| l == label) => {
                FallbackDecision::AlreadyPresent {
                    label: label.to_string(),
                }
            }
            Some(label) => FallbackDecision::Apply {
                label: label.to_string(),
            },
        }
    } else {
        FallbackDecision::None
    };

    Decision {
        to_add: sorted_case_insensitive(to_add),
        to_remove: sorted_case_insensitive(to_remove),
        to_keep: sorted_case_insensitive(to_keep),
        fallback,
    }
}

/// Sorts usernames by a lowercase key for deterministic display ordering.
///
/// Only the ordering folds case; the strings themselves stay exact, so two
/// logins differing only in case sort adjacently yet remain distinct.
fn sorted_case_insensitive(mut users: Vec<String>) -> Vec<String> {
    users.sort_by_key(|u| u.to_lowercase());
    users
}
