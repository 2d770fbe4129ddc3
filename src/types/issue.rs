//! Read-only issue projection used by the reconciliation engine.

use crate::types::IssueNumber;

/// A snapshot of an issue at decision time.
///
/// Produced fresh per decision, either from the REST listing (batch mode) or
/// from a webhook event payload, and never mutated. Assignee and label order
/// is whatever the backend provided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueSnapshot {
    pub number: IssueNumber,
    pub title: String,
    /// Issue body; GitHub omits it for issues with no description.
    pub body: Option<String>,
    pub url: String,
    /// Logins of currently assigned users.
    pub assignees: Vec<String>,
    /// Names of labels currently on the issue.
    pub labels: Vec<String>,
}

impl IssueSnapshot {
    /// The issue body, with an absent body treated as the empty string.
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }
}
