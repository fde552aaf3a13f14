//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Scaffold - create configured projects from templates.
#[derive(Debug, Parser)]
#[command(name = "scaffold")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a settings file (endpoints, timeouts, template conventions)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List bundled templates
    List,

    /// Create a project from a repository template
    Remote(RemoteArgs),

    /// Create a project from a bundled template or template directory
    Local(LocalArgs),
}

/// Values shared by both project-creating commands.
#[derive(Debug, Clone, clap::Args)]
pub struct ProjectArgs {
    /// Directory to create the project in
    #[arg(short, long)]
    pub output: PathBuf,

    /// Project ID written into config and env files
    #[arg(long)]
    pub project_id: String,

    /// Dataset name written into config and env files
    #[arg(long, default_value = "production")]
    pub dataset: String,

    /// Name for package.json (defaults to the template's own)
    #[arg(long)]
    pub package_name: Option<String>,

    /// Initialize a git repository with an initial commit
    #[arg(long)]
    pub git: bool,
}

/// Arguments for the `remote` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RemoteArgs {
    /// Repository reference: owner/repo[/path] or a repository URL
    pub reference: String,

    #[command(flatten)]
    pub project: ProjectArgs,

    /// API version for env files (defaults to today's date)
    #[arg(long)]
    pub api_version: Option<String>,

    /// Token for private repositories
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Read token for templates that ask for one
    #[arg(long, env = "SCAFFOLD_READ_TOKEN", hide_env_values = true)]
    pub read_token: Option<String>,
}

/// Arguments for the `local` command.
#[derive(Debug, Clone, clap::Args)]
pub struct LocalArgs {
    /// Bundled template name or path to a template directory
    pub template: String,

    #[command(flatten)]
    pub project: ProjectArgs,

    /// Display name of the project (defaults to the output directory name)
    #[arg(long)]
    pub project_name: Option<String>,

    /// Generate TypeScript files
    #[arg(long)]
    pub typescript: bool,

    /// URL of a schema to use in place of the template's
    #[arg(long)]
    pub schema_url: Option<String>,

    /// Enable auto-updates in the generated CLI config
    #[arg(long)]
    pub auto_updates: bool,
}
