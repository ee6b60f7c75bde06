//! Command-line interface for calling configured upstream servers.

use crate::{error::Error, registry::ServerRegistry};
use clap::{Parser, Subcommand};
use std::{collections::BTreeMap, path::PathBuf};
pub mod call;

/// Call tools on MCP servers declared in a server config file.
#[derive(Parser, Debug)]
#[command(name = "rmcp-upstream", version, about)]
pub struct App {
    /// JSON config file with an `mcpServers` table.
    #[arg(long, short, value_name = "FILE")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the configured servers.
    Servers,
    /// Call a tool with arguments.
    Call {
        /// Logical name of the server in the config file.
        server: String,

        /// Name of the tool to call.
        tool: String,

        /// Tool arguments as JSON key=value pairs (e.g. key1=value1 key2=value2).
        /// Values are parsed as JSON; plain strings are treated as JSON strings.
        #[arg(value_name = "KEY=VALUE")]
        args: Vec<String>,
    },
}

impl App {
    /// Parse CLI arguments and execute the corresponding command.
    pub async fn run() -> Result<(), Error> {
        let app = App::parse();
        let registry = ServerRegistry::load(&app.config)?;

        match app.command {
            Command::Servers => {
                let servers: BTreeMap<_, _> = registry.iter().collect();
                println!("{}", serde_json::to_string_pretty(&servers)?);
            }
            Command::Call { server, tool, args } => {
                let result = call::call(&registry, &server, &tool, &args).await?;
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
        }

        Ok(())
    }
}
