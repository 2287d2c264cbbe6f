//! wsx — workspace terminal client.
//!
//! Browser-style management of containerized dev workspaces from the
//! command line: list/create/delete/reset workspaces, label exposed ports,
//! and open a resilient interactive shell that survives disconnects.

mod commands;
mod config;
mod term;

use clap::{Parser, Subcommand};
use tracing::error;

/// wsx — workspace terminal client
#[derive(Parser)]
#[command(
    name = "wsx",
    version = "0.1.0",
    about = "Workspace terminal client — manage containerized dev workspaces and their shells"
)]
struct Cli {
    /// Server base URL (overrides config)
    #[arg(short, long, global = true)]
    server: Option<String>,

    /// Config file path
    #[arg(long = "config", global = true)]
    config: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store an API token for the server
    Login,

    /// Forget the stored token and end the server session
    Logout,

    /// List workspaces
    List,

    /// Create a workspace
    Create {
        /// Workspace name
        name: String,

        /// Container image
        #[arg(long)]
        image: Option<String>,
    },

    /// Delete a workspace and its terminal session
    Delete {
        /// Workspace ID
        id: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Recreate a workspace's container from its config
    Reset {
        /// Workspace ID
        id: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Show or relabel a workspace's exposed ports
    Ports {
        /// Workspace ID
        id: String,

        /// Port labels as PORT=LABEL pairs; replaces the current set
        #[arg(value_name = "PORT=LABEL")]
        labels: Vec<String>,
    },

    /// Open an interactive terminal in a workspace
    Terminal {
        /// Workspace ID
        id: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing.
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("wsx=debug,wsx_cli=debug,wsx_client=debug,wsx_core=debug")
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("wsx=warn,wsx_cli=warn")
            .with_target(false)
            .init();
    }

    // Load config; CLI flags override file values.
    let config_path = cli.config.clone().unwrap_or_else(config::default_path);
    let cfg = config::Config::load(&config_path).unwrap_or_default();

    let server = cli.server.clone().unwrap_or_else(|| cfg.server.url.clone());
    let tokens = wsx_client::TokenStore::new();
    if !cfg.server.token.is_empty() {
        tokens.set(Some(cfg.server.token.clone()));
    }
    let api = wsx_client::WorkspaceApi::new(server, tokens);

    let result = match cli.command {
        Command::Login => commands::login::run(&api, &config_path).await,
        Command::Logout => commands::login::run_logout(&api, &config_path).await,
        Command::List => commands::list::run(&api).await,
        Command::Create { name, image } => {
            commands::create::run(&api, &name, image.as_deref()).await
        }
        Command::Delete { id, yes } => commands::delete::run(&api, &id, yes).await,
        Command::Reset { id, yes } => commands::reset::run(&api, &id, yes).await,
        Command::Ports { id, labels } => commands::ports::run(&api, &id, &labels).await,
        Command::Terminal { id } => commands::terminal::run(&api, &id).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        eprintln!("wsx: {e:#}");
        std::process::exit(1);
    }
}
