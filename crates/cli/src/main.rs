// Agentdesk CLI
//
// Design Decision: Use clap derive for ergonomic argument parsing.
// Design Decision: Support text/json/yaml output formats for scripting.
// Design Decision: Logs go to stderr so stdout stays machine-readable.
// Design Decision: Destructive actions are gated by an interactive prompt unless --yes is given.

mod client;
mod commands;
mod output;

use agentdesk_core::ConsoleConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "agentdesk")]
#[command(about = "Agentdesk CLI - Browse, create and manage agents")]
#[command(version)]
pub struct Cli {
    /// API base URL
    #[arg(long, env = "AGENTDESK_API_URL")]
    pub api_url: Option<String>,

    /// API key sent as bearer token
    #[arg(long, env = "AGENTDESK_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "text", value_parser = ["text", "json", "yaml"])]
    pub output: String,

    /// Suppress non-essential output
    #[arg(long, short)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage agents
    Agents {
        #[command(subcommand)]
        command: commands::agents::AgentsCommand,
    },

    /// List known base models
    Models,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "agentdesk=debug" } else { "agentdesk=warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap reads env-backed arguments
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = ConsoleConfig::from_env();
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    if let Some(api_key) = cli.api_key {
        config.api_key = api_key;
    }
    tracing::debug!(api_url = %config.api_url, page_size = config.page_size.get(), "configuration loaded");

    let output_format = output::OutputFormat::from_str(&cli.output);

    match cli.command {
        Commands::Agents { command } => {
            let api = client::HttpAgentApi::new(&config.api_url, &config.api_key);
            commands::agents::run(command, api, config, output_format, cli.quiet).await
        }
        Commands::Models => commands::models::run(output_format),
    }
}
