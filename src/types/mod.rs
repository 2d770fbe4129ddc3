//! Core domain types.

pub mod ids;
pub mod issue;

pub use ids::{IssueNumber, RepoId, RepoSlugError};
pub use issue::IssueSnapshot;
