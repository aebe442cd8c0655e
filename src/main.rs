mod cli;

use canoegate::{api, config::Config, observability};
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    observability::init_tracing();

    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Server(args) => {
            if let Some(address) = args.address {
                config.server.bind_addr = address;
            }
            if args.cache {
                config.cache.enabled = true;
            }
            config.validate()?;
            api::run(config).await?
        }
        Commands::CheckConfig => {
            let registry = config.component_registry()?;
            println!("origin: {}", config.upstream.base_url);
            println!(
                "cache: {}",
                if config.cache.enabled { "enabled" } else { "disabled" }
            );
            for (code, path) in registry.iter() {
                println!("  {code:>3} -> {path}");
            }
        }
    }

    Ok(())
}
