//! GitHub `issues` webhook event payloads.
//!
//! Deserializes the relevant subset of the event body and decides whether a
//! delivery should reach the engine: only a fixed set of issue actions on
//! issues that are still open are processed, everything else is acknowledged
//! and ignored.

use serde::Deserialize;

use crate::types::{IssueNumber, IssueSnapshot, RepoId};

/// Issue actions that trigger reconciliation.
pub const HANDLED_ACTIONS: [&str; 8] = [
    "opened",
    "edited",
    "transferred",
    "reopened",
    "assigned",
    "unassigned",
    "labeled",
    "unlabeled",
];

/// An `issues` event payload, reduced to the fields this system reads.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuesEvent {
    pub action: String,
    pub issue: EventIssue,
    pub repository: EventRepository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventIssue {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub html_url: String,
    pub state: String,
    #[serde(default)]
    pub assignees: Vec<EventUser>,
    #[serde(default)]
    pub labels: Vec<EventLabel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventRepository {
    pub name: String,
    pub owner: EventUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventUser {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventLabel {
    pub name: String,
}

impl IssuesEvent {
    /// Whether this delivery should be reconciled: the action is one we
    /// react to and the issue is still open.
    pub fn should_process(&self) -> bool {
        HANDLED_ACTIONS.contains(&self.action.as_str()) && self.issue.state == "open"
    }

    /// The repository the event belongs to.
    pub fn repo(&self) -> RepoId {
        RepoId::new(&self.repository.owner.login, &self.repository.name)
    }

    /// Projects the event's issue onto the engine's snapshot type.
    pub fn snapshot(&self) -> IssueSnapshot {
        IssueSnapshot {
            number: IssueNumber(self.issue.number),
            title: self.issue.title.clone(),
            body: self.issue.body.clone(),
            url: self.issue.html_url.clone(),
            assignees: self.issue.assignees.iter().map(|a| a.login.clone()).collect(),
            labels: self.issue.labels.iter().map(|l| l.name.clone()).collect(),
        }
    }
}
