use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "canoegate")]
#[command(about = "Edge proxy for emulator component manifests", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $CANOEGATE_CONFIG or config/canoegate.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the proxy server
    Server(ServerArgs),
    /// Load and validate the configuration, then print the component registry
    CheckConfig,
}

#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Address to bind the HTTP server to (overrides server.bind_addr)
    #[arg(long)]
    pub address: Option<SocketAddr>,

    /// Enable the response cache (overrides cache.enabled)
    #[arg(long)]
    pub cache: bool,
}
