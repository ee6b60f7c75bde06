//! MCP server that relays tool calls to other MCP servers.
//!
//! Upstream results can be written to files inside a set of allowed
//! directories, with only a pointer returned to the caller, and data files
//! can be read from those directories and passed to upstream tools as
//! arguments.

use rmcp::{
    ServerHandler,
    handler::server::router::tool::ToolRouter,
    model::{Implementation, ServerCapabilities, ServerInfo},
    tool_handler,
};
use rmcp_upstream::ServerRegistry;
use std::sync::Arc;
pub mod envelope;
pub mod error;
pub mod format;
pub mod ingest;
pub mod materialize;
pub mod tools;
pub mod validate;

#[cfg(test)]
mod testing;

pub use error::Error;
use validate::AllowedDirs;

/// MCP relay server over a fixed set of upstream servers and allowed
/// directories.
#[derive(Debug, Clone)]
pub struct RelayServer {
    pub(crate) registry: Arc<ServerRegistry>,
    pub(crate) allowed_dirs: Arc<AllowedDirs>,
    pub(crate) tool_router: ToolRouter<Self>,
}

#[tool_handler]
impl ServerHandler for RelayServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "wmcp-relay".into(),
                title: Some("Walrus MCP Relay Server".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Relay server that calls tools on upstream MCP servers, storing large results in files and feeding data files into tool calls."
                    .into(),
            ),
        }
    }
}
