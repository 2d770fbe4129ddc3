//! `IssueBackend` implementation against the real GitHub API.
//!
//! Listing uses octocrab's typed issue builder with a per-page loop; the
//! assignee and label mutations go through octocrab's raw verbs because the
//! high-level handler doesn't cover removal with a JSON body.

use serde::Serialize;

use crate::types::{IssueNumber, IssueSnapshot};

use super::client::GitHubClient;
use super::error::ApiError;
use super::IssueBackend;

/// Page size for issue listing; a short page terminates the loop.
const PER_PAGE: u8 = 100;

#[derive(Serialize)]
struct AssigneesBody<'a> {
    assignees: [&'a str; 1],
}

#[derive(Serialize)]
struct LabelsBody<'a> {
    labels: &'a [String],
}

impl IssueBackend for GitHubClient {
    type Error = ApiError;

    async fn list_open_issues(&self) -> Result<Vec<IssueSnapshot>, ApiError> {
        let mut page = 1u32;
        let mut all_issues = Vec::new();

        loop {
            let result = self
                .inner()
                .issues(self.owner(), self.repo_name())
                .list()
                .state(octocrab::params::State::Open)
                .per_page(PER_PAGE)
                .page(page)
                .send()
                .await;

            match result {
                Ok(page_result) => {
                    let items = page_result.items;
                    let is_last_page = items.len() < usize::from(PER_PAGE);

                    all_issues.extend(items.into_iter().map(snapshot_from_issue));

                    if is_last_page {
                        break;
                    }
                    page += 1;
                }
                Err(e) => {
                    return Err(ApiError::api(
                        format!("could not list issues for repository {}", self.repo()),
                        e,
                    ));
                }
            }
        }

        Ok(all_issues)
    }

    async fn add_assignee(
        &self,
        number: IssueNumber,
        username: &str,
    ) -> Result<(), ApiError> {
        let route = format!(
            "/repos/{}/{}/issues/{}/assignees",
            self.owner(),
            self.repo_name(),
            number.0
        );
        let body = AssigneesBody {
            assignees: [username],
        };

        let result: Result<serde_json::Value, _> = self.inner().post(&route, Some(&body)).await;

        result.map(|_| ()).map_err(|e| {
            ApiError::api(
                format!("could not add assignee {} on {}{}", username, self.repo(), number),
                e,
            )
        })
    }

    async fn remove_assignee(
        &self,
        number: IssueNumber,
        username: &str,
    ) -> Result<(), ApiError> {
        let route = format!(
            "/repos/{}/{}/issues/{}/assignees",
            self.owner(),
            self.repo_name(),
            number.0
        );
        let body = AssigneesBody {
            assignees: [username],
        };

        let result: Result<serde_json::Value, _> = self.inner().delete(&route, Some(&body)).await;

        result.map(|_| ()).map_err(|e| {
            ApiError::api(
                format!(
                    "could not remove assignee {} on {}{}",
                    username,
                    self.repo(),
                    number
                ),
                e,
            )
        })
    }

    async fn set_labels(
        &self,
        number: IssueNumber,
        labels: &[String],
    ) -> Result<(), ApiError> {
        let route = format!(
            "/repos/{}/{}/issues/{}/labels",
            self.owner(),
            self.repo_name(),
            number.0
        );
        let body = LabelsBody { labels };

        let result: Result<serde_json::Value, _> = self.inner().post(&route, Some(&body)).await;

        result.map(|_| ()).map_err(|e| {
            ApiError::api(
                format!("could not set labels on {}{}", self.repo(), number),
                e,
            )
        })
    }
}

/// The login of the authenticated user. Display only; not repo-scoped, so it
/// lives outside [`IssueBackend`].
pub async fn authenticated_login(client: &octocrab::Octocrab) -> Result<String, ApiError> {
    client
        .current()
        .user()
        .await
        .map(|user| user.login)
        .map_err(|e| ApiError::api("could not fetch the authenticated user", e))
}

/// Projects an octocrab issue model onto the engine's snapshot type.
fn snapshot_from_issue(issue: octocrab::models::issues::Issue) -> IssueSnapshot {
    IssueSnapshot {
        number: IssueNumber(issue.number),
        title: issue.title,
        body: issue.body,
        url: issue.html_url.to_string(),
        assignees: issue.assignees.into_iter().map(|a| a.login).collect(),
        labels: issue.labels.into_iter().map(|l| l.name).collect(),
    }
}
