//! stackrun CLI tool.

use clap::{Args, Parser, Subcommand};
use stackrun_config::run::{
    DEFAULT_REPO, DEFAULT_STACK_TYPE, DEFAULT_TAG, DEFAULT_TEAM, DEFAULT_TFC_ADDRESS,
};
use stackrun_config::store::DEFAULT_STATE_FILE;
use stackrun_core::Environment;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "stackrun")]
#[command(about = "Deploy infrastructure stacks and publish their outputs", long_about = None)]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision workspaces, deploy every stack and publish the merged outputs
    Deploy {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        tfc: TfcArgs,

        /// Deploy tool settings file
        #[arg(long, env = "STACKRUN_CONFIG")]
        config: Option<PathBuf>,

        /// File backing the config store
        #[arg(long, env = "STACKRUN_STATE_FILE", default_value = DEFAULT_STATE_FILE)]
        state_file: PathBuf,
    },
    /// Show the stacks and state key a deploy would use
    Stacks {
        #[command(flatten)]
        target: TargetArgs,

        /// Deploy tool settings file
        #[arg(long, env = "STACKRUN_CONFIG")]
        config: Option<PathBuf>,
    },
}

/// Which stacks to deploy.
#[derive(Args)]
pub struct TargetArgs {
    /// Target environment <dev|stg|prd|all>
    #[arg(long = "env", env = "STACK_ENV")]
    pub environment: Environment,

    /// Stack type
    #[arg(long, env = "STACK_TYPE", default_value = DEFAULT_STACK_TYPE)]
    pub stack_type: String,

    /// Operations team
    #[arg(long, env = "OPS_TEAM_NAME", default_value = DEFAULT_TEAM)]
    pub team: String,

    /// Application repository
    #[arg(long, env = "STACK_REPO", default_value = DEFAULT_REPO)]
    pub repo: String,

    /// Application tag
    #[arg(long, env = "STACK_TAG", default_value = DEFAULT_TAG)]
    pub tag: String,
}

/// Terraform Cloud connection.
#[derive(Args)]
pub struct TfcArgs {
    /// Terraform Cloud organization
    #[arg(long, env = "TFC_ORG")]
    pub org: String,

    /// Terraform Cloud API token
    #[arg(long, env = "TFC_TOKEN", hide_env_values = true, default_value = "")]
    pub token: String,

    /// Terraform Cloud address
    #[arg(long, env = "TFC_ADDRESS", default_value = DEFAULT_TFC_ADDRESS)]
    pub tfc_address: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Commands::Deploy {
            target,
            tfc,
            config,
            state_file,
        } => {
            commands::deploy::run(target, tfc, config.as_deref(), &state_file).await?;
        }
        Commands::Stacks { target, config } => {
            commands::stacks(target, config.as_deref())?;
        }
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
