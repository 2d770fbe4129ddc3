//! HTTP server for webhook mode.
//!
//! # Endpoints
//!
//! - `POST /webhook` - Accepts GitHub webhook deliveries
//! - `GET /health` - Returns 200 while the server is running
//! - `GET /` - Returns a JSON summary of the running configuration

use std::sync::Arc;

use octocrab::Octocrab;

pub mod health;
pub mod summary;
pub mod webhook;

pub use health::health_handler;
pub use summary::summary_handler;
pub use webhook::webhook_handler;

use crate::config::Policy;

/// Shared application state, passed to handlers via axum's `State`.
///
/// Everything inside is immutable for the lifetime of the server, so
/// concurrent deliveries only ever share read-only data.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Base octocrab handle; scoped per-request to the event's repository.
    octocrab: Octocrab,

    /// Webhook secret for HMAC-SHA256 signature verification.
    secret: Vec<u8>,

    /// Rules, fallback label, strategy, and dry-run flag.
    policy: Policy,

    /// Authenticated login fetched at startup, for display only.
    login: Option<String>,
}

impl AppState {
    pub fn new(
        octocrab: Octocrab,
        secret: impl Into<Vec<u8>>,
        policy: Policy,
        login: Option<String>,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                octocrab,
                secret: secret.into(),
                policy,
                login,
            }),
        }
    }

    pub fn octocrab(&self) -> &Octocrab {
        &self.inner.octocrab
    }

    pub fn secret(&self) -> &[u8] {
        &self.inner.secret
    }

    pub fn policy(&self) -> &Policy {
        &self.inner.policy
    }

    pub fn login(&self) -> Option<&str> {
        self.inner.login.as_deref()
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/health", get(health_handler))
        .route("/", get(summary_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;
    use crate::engine::Strategy;

    fn test_policy() -> Policy {
        let rules: RulesConfig = toml::from_str(
            "[patterns]\nalice = \"title:bug\"\n\n[fallback]\nlabel = \"need-triage\"\n",
        )
        .unwrap();
        // Dry run: handlers must not reach for the network in tests.
        Policy::new(&rules, Strategy::Append, true).unwrap()
    }

    fn test_state(secret: &[u8]) -> AppState {
        let octocrab = Octocrab::builder()
            .personal_token("test-token".to_string())
            .build()
            .unwrap();
        AppState::new(octocrab, secret.to_vec(), test_policy(), Some("bot".into()))
    }

    #[tokio::test]
    async fn app_state_accessors_work() {
        let state = test_state(b"secret");
        assert_eq!(state.secret(), b"secret");
        assert_eq!(state.login(), Some("bot"));
        assert_eq!(state.policy().strategy, Strategy::Append);
        assert!(state.policy().dry_run);
    }

    mod integration {
        use super::*;
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use http_body_util::BodyExt;
        use tower::ServiceExt;

        use crate::webhooks::{compute_signature, format_signature_header};

        fn issues_payload(action: &str, state: &str) -> serde_json::Value {
            serde_json::json!({
                "action": action,
                "issue": {
                    "number": 42,
                    "title": "Found a bug",
                    "body": "it crashes",
                    "html_url": "https://github.com/octocat/hello-world/issues/42",
                    "state": state,
                    "assignees": [],
                    "labels": []
                },
                "repository": {
                    "name": "hello-world",
                    "owner": {"login": "octocat"}
                }
            })
        }

        fn signed_request(
            secret: &[u8],
            event_type: &str,
            body: &serde_json::Value,
        ) -> Request<Body> {
            let body_bytes = serde_json::to_vec(body).unwrap();
            let header = format_signature_header(&compute_signature(&body_bytes, secret));

            Request::builder()
                .method("POST")
                .uri("/webhook")
                .header("content-type", "application/json")
                .header("x-github-event", event_type)
                .header("x-hub-signature-256", header)
                .body(Body::from(body_bytes))
                .unwrap()
        }

        #[tokio::test]
        async fn health_returns_200() {
            let app = build_router(test_state(b"secret"));

            let request = Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap();
            let response = app.oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::OK);
        }

        #[tokio::test]
        async fn summary_reports_configuration() {
            let app = build_router(test_state(b"secret"));

            let request = Request::builder().uri("/").body(Body::empty()).unwrap();
            let response = app.oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let body = response.into_body().collect().await.unwrap().to_bytes();
            let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(parsed["login"], "bot");
            assert_eq!(parsed["users"], serde_json::json!(["alice"]));
            assert_eq!(parsed["fallback_label"], "need-triage");
        }

        #[tokio::test]
        async fn valid_issues_event_returns_200() {
            let secret = b"test-secret";
            let app = build_router(test_state(secret));

            let request = signed_request(secret, "issues", &issues_payload("opened", "open"));
            let response = app.oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::OK);
        }

        #[tokio::test]
        async fn invalid_signature_returns_401() {
            let app = build_router(test_state(b"correct-secret"));

            let request = signed_request(
                b"wrong-secret",
                "issues",
                &issues_payload("opened", "open"),
            );
            let response = app.oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        #[tokio::test]
        async fn unsigned_ping_returns_200() {
            let app = build_router(test_state(b"secret"));

            let request = Request::builder()
                .method("POST")
                .uri("/webhook")
                .header("x-github-event", "ping")
                .body(Body::from("{\"zen\":\"Design for failure.\"}"))
                .unwrap();
            let response = app.oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::OK);
        }

        #[tokio::test]
        async fn signed_ping_with_bad_signature_returns_401() {
            let app = build_router(test_state(b"secret"));

            let request = Request::builder()
                .method("POST")
                .uri("/webhook")
                .header("x-github-event", "ping")
                .header("x-hub-signature-256", "sha256=00ff")
                .body(Body::from("{}"))
                .unwrap();
            let response = app.oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        #[tokio::test]
        async fn missing_event_header_returns_400() {
            let secret = b"secret";
            let app = build_router(test_state(secret));

            let body = serde_json::to_vec(&issues_payload("opened", "open")).unwrap();
            let header = format_signature_header(&compute_signature(&body, secret));
            let request = Request::builder()
                .method("POST")
                .uri("/webhook")
                .header("x-hub-signature-256", header)
                .body(Body::from(body))
                .unwrap();
            let response = app.oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        #[tokio::test]
        async fn non_issue_event_is_ignored() {
            let secret = b"secret";
            let app = build_router(test_state(secret));

            let request = signed_request(
                secret,
                "pull_request",
                &serde_json::json!({"action": "opened"}),
            );
            let response = app.oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let body = response.into_body().collect().await.unwrap().to_bytes();
            assert_eq!(&body[..], b"ignored");
        }

        #[tokio::test]
        async fn unhandled_action_is_ignored() {
            let secret = b"secret";
            let app = build_router(test_state(secret));

            let request = signed_request(secret, "issues", &issues_payload("deleted", "open"));
            let response = app.oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let body = response.into_body().collect().await.unwrap().to_bytes();
            assert_eq!(&body[..], b"ignored");
        }

        #[tokio::test]
        async fn closed_issue_is_ignored() {
            let secret = b"secret";
            let app = build_router(test_state(secret));

            let request = signed_request(secret, "issues", &issues_payload("edited", "closed"));
            let response = app.oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let body = response.into_body().collect().await.unwrap().to_bytes();
            assert_eq!(&body[..], b"ignored");
        }

        #[tokio::test]
        async fn malformed_issues_payload_returns_400() {
            let secret = b"secret";
            let app = build_router(test_state(secret));

            let request = signed_request(secret, "issues", &serde_json::json!({"action": 1}));
            let response = app.oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }
}
