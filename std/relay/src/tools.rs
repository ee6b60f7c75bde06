//! Tool implementations for the relay MCP server.

use crate::{
    RelayServer,
    format::FormatTarget,
    ingest::{OutputMode, ingest_and_call, render_result},
    materialize::{StoreOptions, materialize},
    validate::AllowedDirs,
};
use rmcp::{
    handler::server::wrapper::Parameters,
    model::JsonObject,
    schemars::{self, JsonSchema},
    tool, tool_router,
};
use rmcp_upstream::ServerRegistry;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Parameters for calling a tool and storing its result.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CallToolAndStoreParams {
    /// Logical name of the upstream server.
    pub server: String,
    /// Name of the tool on the upstream server.
    pub tool: String,
    /// Arguments for the upstream tool.
    pub arguments: Option<JsonObject>,
    /// Directory to store the result in. Must be an allowed directory or
    /// inside one. Defaults to the first allowed directory.
    pub directory: Option<String>,
    /// File name for the result. The format's extension is appended.
    pub filename: Option<String>,
    /// Output format: json, csv, tsv, yaml, xml, html, txt or md. Defaults to json.
    pub format: Option<String>,
    /// Description to attach to the stored result.
    pub description: Option<String>,
}

/// Parameters for calling a tool with data read from a file.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CallToolWithFileDataParams {
    /// Logical name of the upstream server.
    pub server: String,
    /// Name of the tool on the upstream server.
    pub tool: String,
    /// Path of the data file (json, csv, tsv, yaml, xml or text).
    pub input_file: String,
    /// Argument name to pass the file data under. When omitted the file data
    /// is the whole argument object.
    pub data_key: Option<String>,
    /// Further arguments for the upstream tool. Must not contain `data_key`.
    pub tool_args: Option<JsonObject>,
    /// `full` for the complete response, `text` for the content only.
    pub output_format: Option<OutputMode>,
}

#[tool_router]
impl RelayServer {
    /// Create a relay over the given upstream servers and allowed directories.
    pub fn new(registry: ServerRegistry, allowed_dirs: AllowedDirs) -> Self {
        Self {
            registry: Arc::new(registry),
            allowed_dirs: Arc::new(allowed_dirs),
            tool_router: Self::tool_router(),
        }
    }

    /// Call an upstream tool and store its result in a file.
    #[tool(
        description = "Call a tool on an upstream MCP server and save the result to a file in an allowed directory. Returns the file URI, the result size and a description instead of the result itself"
    )]
    async fn call_tool_and_store(
        &self,
        Parameters(params): Parameters<CallToolAndStoreParams>,
    ) -> Result<String, String> {
        let options = StoreOptions {
            directory: params.directory,
            filename: params.filename,
            format: params
                .format
                .as_deref()
                .map(FormatTarget::from_name_or_json)
                .unwrap_or_default(),
            description: params.description,
        };
        let arguments = params.arguments.map_or(Value::Null, Value::Object);
        let pointer = materialize(
            self.registry.as_ref(),
            &self.allowed_dirs,
            &params.server,
            &params.tool,
            arguments,
            &options,
        )
        .await
        .map_err(|e| e.to_string())?;
        serde_json::to_string_pretty(&pointer).map_err(|e| e.to_string())
    }

    /// Call an upstream tool with arguments read from a data file.
    #[tool(
        description = "Read a data file from an allowed directory, parse it by extension and pass it as arguments to a tool on an upstream MCP server"
    )]
    async fn call_tool_with_file_data(
        &self,
        Parameters(params): Parameters<CallToolWithFileDataParams>,
    ) -> Result<String, String> {
        let result = ingest_and_call(
            self.registry.as_ref(),
            &self.allowed_dirs,
            &params.server,
            &params.tool,
            &params.input_file,
            params.data_key.as_deref(),
            params.tool_args,
        )
        .await
        .map_err(|e| e.to_string())?;
        render_result(&result, params.output_format.unwrap_or_default()).map_err(|e| e.to_string())
    }

    /// List the allowed directories.
    #[tool(description = "List the directories this server may read files from and store results in")]
    async fn list_allowed_directories(&self) -> String {
        self.allowed_dirs
            .iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// List the configured upstream servers.
    #[tool(description = "List the upstream MCP servers this server can call, with their launch commands")]
    async fn list_servers(&self) -> String {
        self.registry
            .iter()
            .map(|(name, descriptor)| {
                let mut line = format!("{name}: {}", descriptor.command);
                for arg in &descriptor.args {
                    line.push(' ');
                    line.push_str(arg);
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
