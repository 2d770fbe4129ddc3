//! Webhook endpoint handler.
//!
//! Accepts GitHub webhook deliveries, verifies the signature before touching
//! the payload, filters down to the issue events worth reacting to, and runs
//! one decide/apply cycle for the event's issue. One delivery is processed
//! per request; there is no queue.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::AppState;
use crate::apply::{self, report};
use crate::engine::decide;
use crate::events::IssuesEvent;
use crate::github::GitHubClient;
use crate::webhooks::verify_signature;

/// Header name for the GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for the GitHub signature.
const HEADER_SIGNATURE: &str = "x-hub-signature-256";

/// Errors that reject a webhook delivery.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing required header.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// Signature did not verify against the shared secret.
    #[error("invalid signature")]
    InvalidSignature,

    /// Body is not a valid event payload.
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::MissingHeader(_) => StatusCode::BAD_REQUEST,
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::InvalidJson(_) => StatusCode::BAD_REQUEST,
        };
        (status, self.to_string()).into_response()
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Headers: `X-GitHub-Event` (required), `X-Hub-Signature-256` (required
///   except for unsigned pings)
/// - Body: JSON event payload
///
/// # Response
///
/// - 200 OK: delivery handled (including deliveries filtered out as
///   irrelevant — non-`issues` events, unhandled actions, closed issues)
/// - 400 Bad Request: missing header or malformed payload
/// - 401 Unauthorized: signature verification failed
pub async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError> {
    let event_type = get_header(&headers, HEADER_EVENT)?;
    let signature = headers
        .get(HEADER_SIGNATURE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    // GitHub delivers an unsigned ping when a hook is registered without a
    // secret; acknowledge it without verification.
    if event_type == "ping" && signature.is_none() {
        debug!("acknowledging unsigned ping");
        return Ok((StatusCode::OK, "pong"));
    }

    // Verify the signature before any parsing.
    let signature = signature.ok_or(WebhookError::MissingHeader(HEADER_SIGNATURE))?;
    if !verify_signature(&body, &signature, state.secret()) {
        warn!(event_type = %event_type, "invalid webhook signature");
        return Err(WebhookError::InvalidSignature);
    }

    if event_type != "issues" {
        debug!(event_type = %event_type, "ignoring non-issue event");
        return Ok((StatusCode::OK, "ignored"));
    }

    let event: IssuesEvent = serde_json::from_slice(&body)?;
    if !event.should_process() {
        debug!(
            action = %event.action,
            state = %event.issue.state,
            "ignoring issue event"
        );
        return Ok((StatusCode::OK, "ignored"));
    }

    let repo = event.repo();
    let issue = event.snapshot();
    let policy = state.policy();

    let decision = decide(
        &issue,
        &policy.rules,
        policy.fallback_label.as_deref(),
        policy.strategy,
    );

    let client = GitHubClient::new(state.octocrab().clone(), repo.clone());
    let applied = apply::apply(&client, &repo, &issue, &decision, policy.dry_run).await;
    report::print(&applied);

    info!(
        repo = %repo,
        issue = %issue.number,
        action = %event.action,
        "issue reconciled"
    );
    Ok((StatusCode::OK, "OK"))
}

/// Extracts a required header value as a string.
fn get_header(headers: &HeaderMap, name: &'static str) -> Result<String, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .ok_or(WebhookError::MissingHeader(name))
}
