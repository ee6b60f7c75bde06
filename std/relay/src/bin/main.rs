//! Binary entry point for the wmcp-relay MCP server.

use clap::Parser;
use rmcp::ServiceExt;
use rmcp_upstream::ServerRegistry;
use std::path::PathBuf;
use wmcp_relay::{RelayServer, validate::AllowedDirs};

/// Walrus MCP Relay Server — calls upstream MCP tools and stores their results.
#[derive(Parser)]
#[command(name = "wmcp-relay", version, about)]
struct Cli {
    /// JSON config file with an `mcpServers` table of upstream servers.
    #[arg(long, short, value_name = "FILE")]
    config: PathBuf,

    /// Allowed directories; the first is where results are stored by default.
    #[arg(required = true, num_args = 1..)]
    allowed_dirs: Vec<PathBuf>,
}

#[tokio::main]
async fn main() {
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    }
    let cli = Cli::parse();
    let registry = ServerRegistry::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
    let allowed_dirs = AllowedDirs::new(cli.allowed_dirs).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
    tracing::info!(servers = ?registry.names(), allowed = %allowed_dirs, "starting relay");

    let server = RelayServer::new(registry, allowed_dirs);
    let transport = rmcp::transport::stdio();
    server
        .serve(transport)
        .await
        .expect("failed to start server")
        .waiting()
        .await
        .expect("server error");
}
