//! Binary entry point: batch reconciliation (`run`) and webhook serving
//! (`serve`).

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use autoassign::apply::{self, report};
use autoassign::cli::{Cli, Command, RunArgs, ServeArgs};
use autoassign::config::{AuthConfig, ConfigError, Policy, RulesConfig};
use autoassign::engine::{decide, Strategy};
use autoassign::github::{authenticated_login, GitHubClient, IssueBackend};
use autoassign::server::{build_router, AppState};

/// Exit status for configuration problems.
const EXIT_CONFIG: u8 = 2;
/// Exit status when the issue listing fails.
const EXIT_LIST: u8 = 10;

#[tokio::main]
async fn main() -> ExitCode {
    // Diagnostics go to stderr; stdout carries only the report lines.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autoassign=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => run(args).await,
        Command::Serve(args) => serve(args).await,
    }
}

/// Loads both configuration files and compiles the policy.
fn load_config(
    auth_path: &Path,
    rules_path: &Path,
    strategy: Strategy,
    dry_run: bool,
) -> Result<(AuthConfig, Policy), ConfigError> {
    let auth = AuthConfig::load(auth_path)?;
    let rules = RulesConfig::load(rules_path)?;
    let policy = Policy::new(&rules, strategy, dry_run)?;
    Ok((auth, policy))
}

/// One-shot reconciliation of every open issue in the repository.
async fn run(args: RunArgs) -> ExitCode {
    let (auth, policy) =
        match load_config(&args.config_auth, &args.config_rules, args.strategy, args.dry_run) {
            Ok(loaded) => loaded,
            Err(e) => {
                eprintln!("ERROR: {}", e);
                return ExitCode::from(EXIT_CONFIG);
            }
        };

    let client = match GitHubClient::from_token(auth.github.token, args.reposlug.clone()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("ERROR: could not build the GitHub client: {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    // A listing failure is fatal; mutation failures later are per-user.
    let issues = match client.list_open_issues().await {
        Ok(issues) => issues,
        Err(e) => {
            tracing::debug!(error = %e, "issue listing failed");
            eprintln!(
                "ERROR: Could not list issues for repository {}",
                args.reposlug
            );
            return ExitCode::from(EXIT_LIST);
        }
    };

    tracing::info!(
        repo = %args.reposlug,
        issues = issues.len(),
        strategy = %policy.strategy,
        dry_run = policy.dry_run,
        "reconciling open issues"
    );

    for issue in &issues {
        let decision = decide(
            issue,
            &policy.rules,
            policy.fallback_label.as_deref(),
            policy.strategy,
        );
        let applied = apply::apply(&client, &args.reposlug, issue, &decision, policy.dry_run).await;
        report::print(&applied);
    }

    ExitCode::SUCCESS
}

/// Long-running webhook server.
async fn serve(args: ServeArgs) -> ExitCode {
    let (auth, policy) =
        match load_config(&args.config_auth, &args.config_rules, args.strategy, args.dry_run) {
            Ok(loaded) => loaded,
            Err(e) => {
                eprintln!("ERROR: {}", e);
                return ExitCode::from(EXIT_CONFIG);
            }
        };

    let secret = match auth.webhook_secret() {
        Ok(secret) => secret.to_string(),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let octocrab = match octocrab::Octocrab::builder()
        .personal_token(auth.github.token.clone())
        .build()
    {
        Ok(octocrab) => octocrab,
        Err(e) => {
            eprintln!("ERROR: could not build the GitHub client: {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    // Display only; the server still works if the lookup fails.
    let login = match authenticated_login(&octocrab).await {
        Ok(login) => {
            tracing::info!(login = %login, "authenticated");
            Some(login)
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not fetch the authenticated user");
            None
        }
    };

    let state = AppState::new(octocrab, secret.into_bytes(), policy, login);
    let app = build_router(state);

    let listener = match tokio::net::TcpListener::bind(args.addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("ERROR: could not bind {}: {}", args.addr, e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    tracing::info!(addr = %args.addr, "listening");
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("ERROR: server failed: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
