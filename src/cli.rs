//! Command-line interface definitions.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::engine::Strategy;
use crate::types::RepoId;

#[derive(Debug, Parser)]
#[command(
    name = "autoassign",
    about = "Automatically assigns GitHub issues to users based on pattern rules",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reconcile all open issues of a repository once.
    Run(RunArgs),
    /// Serve a webhook endpoint that reconciles issues as events arrive.
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// How to handle assignment collisions.
    #[arg(short, long, value_enum, default_value_t = Strategy::Append)]
    pub strategy: Strategy,

    /// Compute and report changes without applying them.
    #[arg(short, long)]
    pub dry_run: bool,

    /// File with authorization configuration.
    #[arg(short = 'a', long, value_name = "FILE")]
    pub config_auth: PathBuf,

    /// File with assignment rules configuration.
    #[arg(short = 'r', long, value_name = "FILE")]
    pub config_rules: PathBuf,

    /// Repository to reconcile, in owner/repository format.
    pub reposlug: RepoId,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// How to handle assignment collisions.
    #[arg(short, long, value_enum, default_value_t = Strategy::Append)]
    pub strategy: Strategy,

    /// Compute and report changes without applying them.
    #[arg(short, long)]
    pub dry_run: bool,

    /// File with authorization configuration (must include the webhook secret).
    #[arg(short = 'a', long, value_name = "FILE")]
    pub config_auth: PathBuf,

    /// File with assignment rules configuration.
    #[arg(short = 'r', long, value_name = "FILE")]
    pub config_rules: PathBuf,

    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:3000")]
    pub addr: SocketAddr,
}
