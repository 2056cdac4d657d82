// src/main.rs — flowcast entry point

use clap::Parser;

use flowcast::cli::{self, Cli, Commands};
use flowcast::infra::config::Config;
use flowcast::infra::logger;

#[tokio::main]
async fn main() {
    // Respects RUST_LOG
    logger::init_logging("warn");

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config (falls back to defaults if no config.toml)
    let config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };

    let storage = cli::open_storage(&cli, &config)?;

    match &cli.command {
        Commands::Replay { file, accept } => {
            cli::replay::run_replay(storage, &config, file, *accept).await
        }
        Commands::Workflows => cli::workflows::list_workflows(storage.as_ref()),
        Commands::Run { id } => cli::workflows::run_workflow(storage, &config, id).await,
        Commands::Patterns { limit } => cli::patterns::show_patterns(&storage, *limit),
        Commands::Rebuild => cli::patterns::rebuild(storage, &config),
        Commands::Status => cli::status::show_status(storage, &config),
    }
}
