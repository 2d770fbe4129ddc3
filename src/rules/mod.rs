//! Assignment rule compilation and matching.
//!
//! Rules are written per user as newline-separated `category:pattern` lines,
//! where the category is one of `title`, `text`, `label`, `any` and the
//! pattern is a case-insensitive regular expression. Compilation validates
//! everything up front so a malformed rule is a startup failure, never a
//! match-time surprise.

use std::collections::BTreeMap;
use std::fmt;

use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::types::IssueSnapshot;

/// The field of an issue a pattern applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Matches against the issue title.
    Title,
    /// Matches against the issue body.
    Text,
    /// Matches against each label name.
    Label,
    /// Matches against title, body, and each label name.
    Any,
}

impl Category {
    fn parse(s: &str) -> Option<Category> {
        match s {
            "title" => Some(Category::Title),
            "text" => Some(Category::Text),
            "label" => Some(Category::Label),
            "any" => Some(Category::Any),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Title => "title",
            Category::Text => "text",
            Category::Label => "label",
            Category::Any => "any",
        };
        write!(f, "{}", name)
    }
}

/// Errors raised while compiling rule text. All are configuration errors
/// surfaced at load time.
#[derive(Debug, Error)]
pub enum RuleError {
    /// A rule line had no `category:` prefix.
    #[error("rule for user '{user}' has no category separator: '{line}'")]
    MissingCategory { user: String, line: String },

    /// The category on a rule line is not one of the four known ones.
    #[error("rule for user '{user}' has unknown category '{category}'")]
    UnknownCategory { user: String, category: String },

    /// The pattern failed to compile as a regular expression.
    #[error("rule for user '{user}' has invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        user: String,
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },
}

/// The compiled patterns of a single user, one list per category.
#[derive(Debug, Clone, Default)]
pub struct UserRules {
    title: Vec<Regex>,
    text: Vec<Regex>,
    label: Vec<Regex>,
    any: Vec<Regex>,
}

impl UserRules {
    fn push(&mut self, category: Category, pattern: Regex) {
        match category {
            Category::Title => self.title.push(pattern),
            Category::Text => self.text.push(pattern),
            Category::Label => self.label.push(pattern),
            Category::Any => self.any.push(pattern),
        }
    }

    /// Returns true if any of this user's patterns match the issue.
    ///
    /// Matching is existential: the first hit wins. Title and body are
    /// checked by the `title`/`text`/`any` lists, each label name by the
    /// `label`/`any` lists. An absent body is treated as the empty string.
    pub fn matches(&self, issue: &IssueSnapshot) -> bool {
        let body = issue.body_text();

        if any_match(&self.title, &issue.title)
            || any_match(&self.text, body)
            || any_match(&self.any, &issue.title)
            || any_match(&self.any, body)
        {
            return true;
        }

        issue
            .labels
            .iter()
            .any(|label| any_match(&self.label, label) || any_match(&self.any, label))
    }
}

fn any_match(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|p| p.is_match(text))
}

/// All users' compiled rules. Built once from configuration and immutable
/// thereafter.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    users: BTreeMap<String, UserRules>,
}

impl RuleSet {
    /// Compiles raw per-user rule text into a `RuleSet`.
    ///
    /// Each user's text is split into lines; empty lines are skipped; every
    /// other line must be `category:pattern`, split on the first colon.
    pub fn compile(raw: &BTreeMap<String, String>) -> Result<RuleSet, RuleError> {
        let mut users = BTreeMap::new();

        for (user, text) in raw {
            let mut rules = UserRules::default();

            for line in text.lines() {
                if line.is_empty() {
                    continue;
                }

                let (category, pattern) =
                    line.split_once(':')
                        .ok_or_else(|| RuleError::MissingCategory {
                            user: user.clone(),
                            line: line.to_string(),
                        })?;

                let category =
                    Category::parse(category).ok_or_else(|| RuleError::UnknownCategory {
                        user: user.clone(),
                        category: category.to_string(),
                    })?;

                let compiled = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| RuleError::InvalidPattern {
                        user: user.clone(),
                        pattern: pattern.to_string(),
                        source: Box::new(e),
                    })?;

                rules.push(category, compiled);
            }

            users.insert(user.clone(), rules);
        }

        Ok(RuleSet { users })
    }

    /// Iterates over `(username, rules)` pairs in username order.
    pub fn users(&self) -> impl Iterator<Item = (&str, &UserRules)> {
        self.users.iter().map(|(name, rules)| (name.as_str(), rules))
    }

    /// The configured usernames, in order.
    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.users.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IssueNumber;

    fn ruleset(user: &str, text: &str) -> RuleSet {
        let mut raw = BTreeMap::new();
        raw.insert(user.to_string(), text.to_string());
        RuleSet::compile(&raw).unwrap()
    }

    fn issue(title: &str, body: Option<&str>, labels: &[&str]) -> IssueSnapshot {
        IssueSnapshot {
            number: IssueNumber(1),
            title: title.to_string(),
            body: body.map(String::from),
            url: "https://example.com/1".to_string(),
            assignees: vec![],
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    fn matches(rules: &RuleSet, issue: &IssueSnapshot) -> bool {
        rules.users().next().unwrap().1.matches(issue)
    }

    #[test]
    fn title_pattern_matches_title() {
        let rules = ruleset("alice", "title:bug");
        assert!(matches(&rules, &issue("Found a bug", None, &[])));
        assert!(!matches(&rules, &issue("All fine", None, &[])));
    }

    #[test]
    fn title_pattern_is_case_insensitive() {
        let rules = ruleset("alice", "title:NetWork");
        assert!(matches(&rules, &issue("network is down", None, &[])));
    }

    #[test]
    fn text_pattern_matches_body_only() {
        let rules = ruleset("alice", "text:segfault");
        assert!(matches(&rules, &issue("crash", Some("got a segfault"), &[])));
        assert!(!matches(&rules, &issue("segfault", None, &[])));
    }

    #[test]
    fn text_pattern_treats_missing_body_as_empty() {
        let rules = ruleset("alice", "text:.+");
        assert!(!matches(&rules, &issue("title", None, &[])));
        assert!(matches(&rules, &issue("title", Some("x"), &[])));
    }

    #[test]
    fn label_pattern_matches_each_label() {
        let rules = ruleset("alice", "label:^critical$");
        assert!(matches(&rules, &issue("t", None, &["minor", "critical"])));
        assert!(!matches(&rules, &issue("t", None, &["non-critical-ish"])));
    }

    #[test]
    fn any_pattern_matches_title_body_and_labels() {
        let rules = ruleset("alice", "any:database");
        assert!(matches(&rules, &issue("database is slow", None, &[])));
        assert!(matches(&rules, &issue("t", Some("the database"), &[])));
        assert!(matches(&rules, &issue("t", None, &["database"])));
        assert!(!matches(&rules, &issue("t", Some("disk"), &["net"])));
    }

    #[test]
    fn pattern_splits_on_first_colon_only() {
        // The pattern itself may contain colons.
        let rules = ruleset("alice", "title:error: .*");
        assert!(matches(&rules, &issue("error: out of memory", None, &[])));
    }

    #[test]
    fn empty_lines_are_skipped() {
        let rules = ruleset("alice", "\ntitle:bug\n\ntext:crash\n");
        assert!(matches(&rules, &issue("bug", None, &[])));
        assert!(matches(&rules, &issue("t", Some("crash"), &[])));
    }

    #[test]
    fn unknown_category_is_rejected() {
        let mut raw = BTreeMap::new();
        raw.insert("alice".to_string(), "body:bug".to_string());
        let err = RuleSet::compile(&raw).unwrap_err();
        assert!(matches!(err, RuleError::UnknownCategory { .. }));
    }

    #[test]
    fn line_without_colon_is_rejected() {
        let mut raw = BTreeMap::new();
        raw.insert("alice".to_string(), "just some text".to_string());
        let err = RuleSet::compile(&raw).unwrap_err();
        assert!(matches!(err, RuleError::MissingCategory { .. }));
    }

    #[test]
    fn invalid_regex_is_rejected_at_compile_time() {
        let mut raw = BTreeMap::new();
        raw.insert("alice".to_string(), "title:[unclosed".to_string());
        let err = RuleSet::compile(&raw).unwrap_err();
        assert!(matches!(err, RuleError::InvalidPattern { .. }));
    }

    #[test]
    fn user_with_empty_text_has_all_categories_empty() {
        let rules = ruleset("alice", "");
        assert!(!matches(&rules, &issue("anything", Some("at all"), &["x"])));
    }

    #[test]
    fn users_iterate_in_name_order() {
        let mut raw = BTreeMap::new();
        raw.insert("zoe".to_string(), "title:a".to_string());
        raw.insert("adam".to_string(), "title:b".to_string());
        let rules = RuleSet::compile(&raw).unwrap();
        let names: Vec<_> = rules.usernames().collect();
        assert_eq!(names, vec!["adam", "zoe"]);
    }
}
