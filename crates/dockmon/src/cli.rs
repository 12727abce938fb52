//! Clap derive structures for the `dockmon` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use clap::{Args, Parser, Subcommand, ValueEnum};
use dockmon_core::Language;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// dockmon -- watch containers, their resources and pending image updates
#[derive(Debug, Parser)]
#[command(
    name = "dockmon",
    version,
    about = "Watch Docker containers and pending image updates from the terminal",
    long_about = "A client for the dockmon container monitor.\n\n\
        Shows update status and smoothed CPU/RAM/network figures per container,\n\
        triggers container updates and prunes unused images.",
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
    /// Monitor profile to use
    #[arg(long, short = 'p', env = "DOCKMON_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Monitor URL (overrides profile)
    #[arg(long, short = 'u', env = "DOCKMON_URL", global = true)]
    pub url: Option<String>,

    /// API key (overrides profile and keyring)
    #[arg(long, env = "DOCKMON_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "DOCKMON_OUTPUT",
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

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "DOCKMON_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "DOCKMON_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LangArg {
    Fr,
    En,
}

impl From<LangArg> for Language {
    fn from(lang: LangArg) -> Self {
        match lang {
            LangArg::Fr => Language::Fr,
            LangArg::En => Language::En,
        }
    }
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Live dashboard: polls the monitor and redraws on every change
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// One-shot container table
    #[command(alias = "ls", alias = "st")]
    Status(StatusArgs),

    /// Force-refresh a single container
    Refresh {
        /// Container name
        name: String,
    },

    /// Pull and recreate a container with its newest image
    Update {
        /// Container name
        name: String,
    },

    /// Remove unused images
    Prune,

    /// List unused images
    Unused,

    /// Probe the monitor
    Health,

    /// Show or change the monitor's authentication settings
    Settings(SettingsArgs),

    /// Show or set the display language
    Lang {
        /// New language; omit to print the current one
        language: Option<LangArg>,
    },

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Per-command arguments ────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Fast poll interval in seconds (overrides config)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Number of containers fetched concurrently by the metrics pass (1-6)
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..=6))]
    pub batch: Option<usize>,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Bypass the monitor's registry cache
    #[arg(long, short = 'f')]
    pub force: bool,

    /// Request per-container stats in the snapshot itself
    #[arg(long)]
    pub full: bool,

    /// Skip the per-container metrics pass
    #[arg(long)]
    pub no_metrics: bool,
}

#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Show the current settings (the key is never printed)
    Show,

    /// Change settings; omitted flags keep their current value
    Set {
        /// Enable API key authentication
        #[arg(long, conflicts_with = "disable")]
        enable: bool,

        /// Disable authentication
        #[arg(long)]
        disable: bool,

        /// New API key
        #[arg(long)]
        key: Option<String>,

        /// Allowed CIDR (repeatable, or comma separated)
        #[arg(long = "cidr", value_name = "CIDR")]
        cidrs: Vec<String>,
    },

    /// Have the monitor generate a new API key and enable authentication
    GenerateKey {
        /// Allowed CIDR (repeatable, or comma separated)
        #[arg(long = "cidr", value_name = "CIDR")]
        cidrs: Vec<String>,

        /// Store the new key in the system keyring for this profile
        #[arg(long)]
        save: bool,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
