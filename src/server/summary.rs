//! Configuration summary endpoint.
//!
//! A read-only view of what the server was started with: the authenticated
//! login, the configured usernames, and the fallback label.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::AppState;

/// The summary body returned by `GET /`.
#[derive(Debug, Serialize)]
pub struct Summary {
    /// Login of the authenticated user, when the startup lookup succeeded.
    pub login: Option<String>,
    /// Usernames with configured rules, in order.
    pub users: Vec<String>,
    pub fallback_label: Option<String>,
}

/// Summary handler.
pub async fn summary_handler(State(state): State<AppState>) -> Json<Summary> {
    let policy = state.policy();
    Json(Summary {
        login: state.login().map(String::from),
        users: policy.rules.usernames().map(String::from).collect(),
        fallback_label: policy.fallback_label.clone(),
    })
}
