use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown server '{name}', available servers: [{}]", .available.join(", "))]
    UnknownServer { name: String, available: Vec<String> },

    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("MCP client initialization error: {0}")]
    ClientInit(#[from] Box<rmcp::service::ClientInitializeError>),

    #[error("MCP client error: {0}")]
    Service(#[from] rmcp::ServiceError),

    #[error("tool arguments must be a JSON object, got {0}")]
    InvalidArguments(&'static str),

    #[error("failed to read config {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid argument '{0}', expected KEY=VALUE")]
    InvalidArg(String),
}
