use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "m365dsc")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Desired state configuration for Microsoft 365 tenant settings", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ~/.config/m365dsc/config.toml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Tenant to connect to, overriding the config file
    #[arg(long, global = true)]
    pub tenant: Option<String>,

    /// Bearer token for Microsoft Graph
    #[arg(
        long,
        global = true,
        env = "M365DSC_ACCESS_TOKEN",
        hide_env_values = true
    )]
    pub access_token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Read the current state of the resources in a document
    Get(StateArgs),

    /// Check whether the tenant matches a document (exits 1 on drift)
    Test(StateArgs),

    /// Converge the tenant to a document
    Set(SetArgs),

    /// Export existing tenant objects as configuration
    Export(ExportArgs),

    /// List supported resource types
    Resources,

    /// Inspect the configuration file
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Get / Test / Set
// ============================================================================

#[derive(Parser)]
pub struct StateArgs {
    /// Desired-state document (TOML)
    #[arg(short, long)]
    pub file: PathBuf,

    /// Only entries of this resource type
    #[arg(short, long)]
    pub resource: Option<String>,

    /// Only the entry with this natural key
    #[arg(short, long)]
    pub key: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct SetArgs {
    #[command(flatten)]
    pub state: StateArgs,

    /// Dry run - show what would be done
    #[arg(short, long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

// ============================================================================
// Export
// ============================================================================

#[derive(Parser)]
pub struct ExportArgs {
    /// Resource types to export (default: all)
    #[arg(short, long = "resource")]
    pub resources: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "dsc")]
    pub format: ExportFormat,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Configuration name for DSC output
    #[arg(long, default_value = "M365TenantConfig")]
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// PowerShell DSC configuration script
    Dsc,
    /// Desired-state document, readable by get/test/set
    Toml,
}

// ============================================================================
// Config Commands
// ============================================================================

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration and where it came from
    Show,

    /// Validate the configuration file
    Validate,
}
