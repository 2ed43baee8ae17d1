mod cli;

use clap::Parser;
use cli::{Cli, Commands};

use aid_dispatch::api;
use aid_dispatch::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let Cli { command } = Cli::parse();

    match command {
        Commands::Start => {
            let config = Config::load()?;
            api::run(config).await?;
        }
    }

    Ok(())
}
