//! GitHub backend: the mutation/query seam and its octocrab implementation.
//!
//! The engine never talks to the network directly; it goes through
//! [`IssueBackend`], which the real [`GitHubClient`] implements and tests
//! replace with an in-memory fake.

pub mod client;
pub mod error;
pub mod issues;

pub use client::GitHubClient;
pub use error::ApiError;
pub use issues::authenticated_login;

use crate::types::{IssueNumber, IssueSnapshot};

/// The issue-tracking backend operations this system consumes.
///
/// Implementations are repo-scoped: every method targets the repository the
/// backend was constructed for. Each method is a single blocking-to-complete
/// network call; there is no retry layer, so an `Err` means that call failed
/// and the caller decides whether to stop (listing) or skip (a mutation).
pub trait IssueBackend {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetches every open issue, draining all pages before returning.
    /// Backend-provided order is preserved.
    async fn list_open_issues(&self) -> Result<Vec<IssueSnapshot>, Self::Error>;

    /// Assigns a user to an issue.
    async fn add_assignee(&self, number: IssueNumber, username: &str)
        -> Result<(), Self::Error>;

    /// Unassigns a user from an issue.
    async fn remove_assignee(
        &self,
        number: IssueNumber,
        username: &str,
    ) -> Result<(), Self::Error>;

    /// Replaces the issue's labels with the given list.
    async fn set_labels(
        &self,
        number: IssueNumber,
        labels: &[String],
    ) -> Result<(), Self::Error>;
}
