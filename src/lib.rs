//! Automatic GitHub issue assignment.
//!
//! Assigns issues to users whose configured regex rules match the issue's
//! title, body, or labels, and optionally applies a fallback label when
//! nothing matches. Runs either as a one-shot batch over all open issues of a
//! repository or as a webhook server reacting to individual issue events.

pub mod apply;
pub mod cli;
pub mod config;
pub mod engine;
pub mod events;
pub mod github;
pub mod rules;
pub mod server;
pub mod types;
pub mod webhooks;
