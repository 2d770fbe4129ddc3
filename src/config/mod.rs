//! Configuration loading and the per-session policy object.
//!
//! Two TOML files configure the system: an auth file with the GitHub token
//! (and, for webhook serving, the shared secret) and a rules file with the
//! per-user pattern text and the optional fallback label. Everything is
//! validated at startup; the compiled [`Policy`] is immutable afterwards and
//! shared read-only across all decisions.
//!
//! Auth file:
//!
//! ```toml
//! [github]
//! token = "ghp_..."
//! secret = "webhook-secret"   # required by `serve`
//! ```
//!
//! Rules file:
//!
//! ```toml
//! [patterns]
//! alice = """
//! title:network
//! any:protocol
//! """
//!
//! [fallback]
//! label = "need-triage"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::engine::Strategy;
use crate::rules::{RuleError, RuleSet};

/// Errors raised while loading configuration. All are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: Box<toml::de::Error>,
    },

    /// The auth file has no webhook secret but serving requires one.
    #[error("auth configuration has no webhook secret under [github]")]
    MissingSecret,

    #[error(transparent)]
    Rules(#[from] RuleError),
}

/// The `[github]` auth section.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub github: GithubAuth,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubAuth {
    /// Personal access token used for all API calls.
    pub token: String,
    /// Webhook shared secret; only the server needs it.
    #[serde(default)]
    pub secret: Option<String>,
}

impl AuthConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        parse_file(path)
    }

    /// The webhook secret, required when serving.
    pub fn webhook_secret(&self) -> Result<&str, ConfigError> {
        self.github
            .secret
            .as_deref()
            .ok_or(ConfigError::MissingSecret)
    }
}

/// The raw rules file: per-user pattern text plus the optional fallback.
#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    #[serde(default)]
    pub patterns: BTreeMap<String, String>,
    #[serde(default)]
    pub fallback: Option<FallbackSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FallbackSection {
    pub label: String,
}

impl RulesConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        parse_file(path)
    }
}

/// The immutable per-session configuration driving every decision.
///
/// Constructed once at startup (rule compilation happens here, so malformed
/// rules fail before any issue is touched) and never mutated.
#[derive(Debug, Clone)]
pub struct Policy {
    pub rules: RuleSet,
    pub fallback_label: Option<String>,
    pub strategy: Strategy,
    pub dry_run: bool,
}

impl Policy {
    /// Compiles a loaded rules file into a policy.
    pub fn new(
        rules_config: &RulesConfig,
        strategy: Strategy,
        dry_run: bool,
    ) -> Result<Policy, ConfigError> {
        Ok(Policy {
            rules: RuleSet::compile(&rules_config.patterns)?,
            fallback_label: rules_config.fallback.as_ref().map(|f| f.label.clone()),
            strategy,
            dry_run,
        })
    }
}

fn parse_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source: Box::new(source),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_auth_with_secret() {
        let file = write_temp("[github]\ntoken = \"ghp_x\"\nsecret = \"s3cret\"\n");
        let auth = AuthConfig::load(file.path()).unwrap();
        assert_eq!(auth.github.token, "ghp_x");
        assert_eq!(auth.webhook_secret().unwrap(), "s3cret");
    }

    #[test]
    fn secret_is_optional_until_requested() {
        let file = write_temp("[github]\ntoken = \"ghp_x\"\n");
        let auth = AuthConfig::load(file.path()).unwrap();
        assert!(matches!(
            auth.webhook_secret(),
            Err(ConfigError::MissingSecret)
        ));
    }

    #[test]
    fn missing_token_is_a_parse_error() {
        let file = write_temp("[github]\nsecret = \"s\"\n");
        assert!(matches!(
            AuthConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = AuthConfig::load(Path::new("/nonexistent/auth.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn loads_rules_with_multiline_patterns() {
        let file = write_temp(
            "[patterns]\nalice = \"\"\"\ntitle:network\nany:protocol\n\"\"\"\n\n[fallback]\nlabel = \"need-triage\"\n",
        );
        let rules = RulesConfig::load(file.path()).unwrap();
        assert_eq!(rules.patterns["alice"], "title:network\nany:protocol\n");
        assert_eq!(rules.fallback.unwrap().label, "need-triage");
    }

    #[test]
    fn empty_rules_file_loads() {
        let file = write_temp("");
        let rules = RulesConfig::load(file.path()).unwrap();
        assert!(rules.patterns.is_empty());
        assert!(rules.fallback.is_none());
    }

    #[test]
    fn policy_compiles_rules_once() {
        let file = write_temp("[patterns]\nalice = \"title:bug\"\n");
        let rules = RulesConfig::load(file.path()).unwrap();
        let policy = Policy::new(&rules, Strategy::Append, false).unwrap();
        assert_eq!(policy.rules.usernames().collect::<Vec<_>>(), vec!["alice"]);
        assert_eq!(policy.fallback_label, None);
    }

    #[test]
    fn policy_rejects_malformed_rules() {
        let file = write_temp("[patterns]\nalice = \"title:[unclosed\"\n");
        let rules = RulesConfig::load(file.path()).unwrap();
        assert!(matches!(
            Policy::new(&rules, Strategy::Append, false),
            Err(ConfigError::Rules(RuleError::InvalidPattern { .. }))
        ));
    }
}
