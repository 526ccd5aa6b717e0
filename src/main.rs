//! CemtrAS AI - role-aware chat CLI
//!
#![doc = "CemtrAS AI - role-aware chat CLI"]
#![doc = "Main entry point for the CemtrAS application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cemtras::cli::{Cli, Commands};
use cemtras::commands;
use cemtras::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { role, resume } => {
            tracing::info!("Starting interactive chat mode");
            if let Some(r) = &role {
                tracing::debug!("Using role override: {}", r.as_str());
            }
            if let Some(r) = &resume {
                tracing::debug!("Resuming conversation: {}", r);
            }
            commands::chat::run_chat(config, role, resume).await?;
            Ok(())
        }
        Commands::Ask {
            role,
            files,
            prompt,
        } => {
            tracing::debug!(files = files.len(), "Asking a single question");
            commands::ask::run_ask(config, role, files, prompt).await?;
            Ok(())
        }
        Commands::Login { name } => {
            commands::auth::login(&config, &name)?;
            Ok(())
        }
        Commands::Logout => {
            commands::auth::logout(&config)?;
            Ok(())
        }
        Commands::Whoami => {
            commands::auth::whoami(&config)?;
            Ok(())
        }
        Commands::Roles => {
            commands::roles::print_roles();
            Ok(())
        }
        Commands::History { command } => {
            tracing::debug!("Starting history command");
            let store = commands::open_store(&config)?;
            let history = commands::history_store(&config, store);
            commands::history::handle_history(command, &history)?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "cemtras=debug" } else { "cemtras=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
