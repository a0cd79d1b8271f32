//! hookrun entrypoint.

use clap::Parser;
use std::path::PathBuf;

mod app;
mod commands;
mod config;
mod handlers;

use commands::Commands;
use config::AppConfig;

#[derive(Parser)]
#[command(name = "hookrun")]
#[command(author, version, about = "Runs repository workflows on signed webhooks", long_about = None)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true, env = "HOOKRUN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    hookrun_trace::init_tracer(&config.tracing)?;

    let result = match cli.command {
        Commands::Serve { with_worker } => handlers::serve(&config, with_worker).await,
        Commands::Worker => handlers::worker(&config).await,
        Commands::Migrate => handlers::migrate(&config).await,
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "hookrun exited with an error");
    }
    hookrun_trace::shutdown_tracer();
    result
}
