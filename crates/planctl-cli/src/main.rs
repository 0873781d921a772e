mod config;
mod plan_cmds;
mod prompt;
mod status_cmd;
mod tui;

use std::io;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use planctl_client::http::ManagementClient;
use planctl_client::models::PlanStatus;
use planctl_core::wizard::PlanKind;

use config::PlanctlConfig;

#[derive(Parser)]
#[command(name = "planctl", about = "Plan lifecycle console for the management API")]
struct Cli {
    /// Management API base URL (overrides PLANCTL_API_URL env var)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Bearer token (overrides PLANCTL_TOKEN env var)
    #[arg(long, global = true)]
    token: Option<String>,

    /// API to operate on (overrides PLANCTL_API env var)
    #[arg(long, global = true)]
    api: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a planctl config file (no connection required)
    Init {
        /// Management API base URL
        #[arg(long, default_value = "http://localhost:8083/management/v2")]
        url: String,
        /// Bearer token to store
        #[arg(long)]
        token: Option<String>,
        /// Default API to operate on
        #[arg(long)]
        api: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Plan management
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Show the API and its plan counts per status
    Status,
    /// Launch the interactive plan dashboard
    Dashboard,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// List plans (published tab by default)
    List {
        /// Filter to one status: STAGING, PUBLISHED, DEPRECATED or CLOSED
        #[arg(long)]
        status: Option<PlanStatus>,
    },
    /// Show plan details
    Show {
        /// Plan ID to show
        plan_id: String,
    },
    /// Create a plan
    Create {
        /// Plan kind: OAUTH2, JWT, API_KEY, KEY_LESS, PUSH or MTLS
        kind: PlanKind,
        /// Plan name
        #[arg(long)]
        name: String,
        /// Plan description
        #[arg(long)]
        description: Option<String>,
        /// Security configuration as a JSON object
        #[arg(long)]
        security_config: Option<String>,
        /// Accept subscriptions automatically instead of manually
        #[arg(long)]
        auto_validation: bool,
        /// Require a comment on subscription requests
        #[arg(long)]
        comment_required: bool,
        /// Message shown to subscribers asked for a comment
        #[arg(long)]
        comment_message: Option<String>,
        /// General-conditions page reference
        #[arg(long)]
        general_conditions: Option<String>,
        /// Sharding tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Group excluded from the plan (repeatable)
        #[arg(long = "excluded-group")]
        excluded_groups: Vec<String>,
        /// Rate-limit policy configuration as JSON
        #[arg(long)]
        rate_limit: Option<String>,
        /// Quota policy configuration as JSON
        #[arg(long)]
        quota: Option<String>,
        /// Resource-filtering policy configuration as JSON
        #[arg(long)]
        resource_filtering: Option<String>,
    },
    /// Edit a plan (unset flags keep their current value)
    Edit {
        /// Plan ID to edit
        plan_id: String,
        /// New plan name
        #[arg(long)]
        name: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New security configuration as a JSON object
        #[arg(long)]
        security_config: Option<String>,
        /// Accept subscriptions automatically (true) or manually (false)
        #[arg(long)]
        auto_validation: Option<bool>,
        /// Require a comment on subscription requests
        #[arg(long)]
        comment_required: Option<bool>,
        /// Message shown to subscribers asked for a comment
        #[arg(long)]
        comment_message: Option<String>,
        /// General-conditions page reference
        #[arg(long)]
        general_conditions: Option<String>,
    },
    /// Publish a staging plan
    Publish {
        /// Plan ID to publish
        plan_id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Deprecate a published plan
    Deprecate {
        /// Plan ID to deprecate
        plan_id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Close a plan and its subscriptions
    Close {
        /// Plan ID to close
        plan_id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Move a plan to a new position within its status tab
    Reorder {
        /// Plan ID to move
        plan_id: String,
        /// New 1-based position
        position: usize,
    },
    /// List subscriptions bound to a plan
    Subscriptions {
        /// Plan ID to list subscriptions for
        plan_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            url,
            token,
            api,
            force,
        } => {
            config::cmd_init(&url, token.as_deref(), api.as_deref(), force)?;
        }
        Commands::Plan { command } => {
            let resolved = PlanctlConfig::resolve(
                cli.api_url.as_deref(),
                cli.token.as_deref(),
                cli.api.as_deref(),
            )?;
            let client = ManagementClient::new(&resolved.client)?;
            let api_id = resolved.require_api()?;
            plan_cmds::run_plan_command(command, &client, api_id).await?;
        }
        Commands::Status => {
            let resolved = PlanctlConfig::resolve(
                cli.api_url.as_deref(),
                cli.token.as_deref(),
                cli.api.as_deref(),
            )?;
            let client = ManagementClient::new(&resolved.client)?;
            let api_id = resolved.require_api()?;
            status_cmd::run_status(&client, api_id).await?;
        }
        Commands::Dashboard => {
            let resolved = PlanctlConfig::resolve(
                cli.api_url.as_deref(),
                cli.token.as_deref(),
                cli.api.as_deref(),
            )?;
            let client = ManagementClient::new(&resolved.client)?;
            let api_id = resolved.require_api()?.to_owned();
            tui::run_dashboard(client, api_id).await?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "planctl", &mut io::stdout());
        }
    }

    Ok(())
}
