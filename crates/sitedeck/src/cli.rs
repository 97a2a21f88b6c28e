//! Clap derive structures for the `sitedeck` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

use sitedeck_core::{SortField, SortOrder};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// sitedeck -- console for a fleet of hosted sites
#[derive(Debug, Parser)]
#[command(
    name = "sitedeck",
    version,
    about = "Manage a fleet of hosted sites from the command line",
    long_about = "List sites with their latest deploy, create sites from a preset template,\n\
        trigger and cancel deploys, watch in-flight builds across every site,\n\
        and manage per-site environment variables.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "SITEDECK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Platform API base URL (overrides profile)
    #[arg(long, env = "SITEDECK_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Platform API token
    #[arg(long, env = "NETLIFY_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Account slug used for environment variables
    #[arg(long, env = "NETLIFY_ACCOUNT_SLUG", global = true)]
    pub account_slug: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SITEDECK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "SITEDECK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List, create, delete and redeploy sites
    #[command(alias = "s")]
    Sites(SitesArgs),

    /// Inspect and cancel a site's deploys
    #[command(alias = "d")]
    Deploys(DeploysArgs),

    /// Show in-flight builds across all sites
    #[command(alias = "b")]
    Builds(BuildsArgs),

    /// Read and write a site's environment variables
    Env(EnvArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SITES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SitesArgs {
    #[command(subcommand)]
    pub command: SitesCommand,
}

#[derive(Debug, Subcommand)]
pub enum SitesCommand {
    /// List sites with their most recent deploy
    #[command(alias = "ls")]
    List(SiteListArgs),

    /// Show one site
    Get {
        /// Site ID
        site_id: String,
    },

    /// Create a site from the profile's template
    Create {
        /// Site name (becomes the default subdomain)
        name: String,

        /// Environment variable to set on the new site (KEY=VALUE, repeatable)
        #[arg(long = "env", short = 'e', value_parser = parse_key_value)]
        env: Vec<(String, String)>,
    },

    /// Delete a site
    Delete {
        /// Site ID
        site_id: String,
    },

    /// Trigger a new build of a site
    Redeploy {
        /// Site ID
        site_id: String,
    },
}

#[derive(Debug, Args)]
pub struct SiteListArgs {
    /// Page number (1-based)
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Sites per page (1-100)
    #[arg(long, short = 'l', default_value = "100", value_parser = clap::value_parser!(u32).range(1..=100))]
    pub per_page: u32,

    /// Sort key
    #[arg(long, default_value = "last-deploy")]
    pub sort: SortArg,

    /// Sort direction
    #[arg(long, default_value = "desc")]
    pub order: OrderArg,

    /// Only sites whose name contains this text
    #[arg(long, short = 'n')]
    pub search: Option<String>,
}

/// Sort keys offered on the sites list.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortArg {
    Name,
    Created,
    /// Most recent deploy (sorted upstream by last update)
    LastDeploy,
}

impl From<SortArg> for SortField {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => Self::Name,
            SortArg::Created => Self::CreatedAt,
            SortArg::LastDeploy => Self::UpdatedAt,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OrderArg {
    Asc,
    Desc,
}

impl From<OrderArg> for SortOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Asc => Self::Asc,
            OrderArg::Desc => Self::Desc,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEPLOYS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DeploysArgs {
    #[command(subcommand)]
    pub command: DeploysCommand,
}

#[derive(Debug, Subcommand)]
pub enum DeploysCommand {
    /// List a site's deploys, newest first
    #[command(alias = "ls")]
    List {
        /// Site ID
        site_id: String,

        /// Page number (1-based)
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,

        /// Deploys per page
        #[arg(long, short = 'l', default_value = "5", value_parser = clap::value_parser!(u32).range(1..=100))]
        per_page: u32,

        /// Only production deploys
        #[arg(long)]
        production: bool,

        /// Only deploys in this state (e.g. ready, error, building)
        #[arg(long)]
        state: Option<String>,

        /// Only deploys of this branch
        #[arg(long)]
        branch: Option<String>,
    },

    /// Cancel an in-progress deploy
    Cancel {
        /// Site ID
        site_id: String,

        /// Deploy ID
        deploy_id: String,

        /// Skip the local state check and ask the platform directly
        #[arg(long)]
        force: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  BUILDS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct BuildsArgs {
    #[command(subcommand)]
    pub command: BuildsCommand,
}

#[derive(Debug, Subcommand)]
pub enum BuildsCommand {
    /// List in-flight builds once
    #[command(alias = "ls")]
    List,

    /// Keep refreshing the build list until interrupted
    Watch {
        /// Seconds between refreshes
        #[arg(long, short = 'i', default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ENV
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct EnvArgs {
    #[command(subcommand)]
    pub command: EnvCommand,
}

#[derive(Debug, Subcommand)]
pub enum EnvCommand {
    /// Show a site's environment variables
    Get {
        /// Site ID
        site_id: String,
    },

    /// Set environment variables on a site, keeping the others
    Set {
        /// Site ID
        site_id: String,

        /// Variable to set (KEY=VALUE, repeatable). An empty value removes the key.
        #[arg(long = "env", short = 'e', value_parser = parse_key_value, required = true)]
        env: Vec<(String, String)>,

        /// Publish only the given variables, dropping every other one
        #[arg(long)]
        replace: bool,

        /// Trigger a rebuild once the variables are saved
        #[arg(long)]
        redeploy: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the resolved configuration of the active profile
    Show,

    /// Print the config file location
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the API token for the active profile in the system keyring
    SetToken,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

// ── Value parsers ────────────────────────────────────────────────────

/// Parse `KEY=VALUE`. The value may be empty or contain further `=`.
fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing variable name in '{raw}'"));
    }
    Ok((key.to_owned(), value.to_owned()))
}
