//! Command for calling a tool on a configured upstream server.

use crate::{client::Upstream, error::Error, registry::ServerRegistry};
use rmcp::model::{CallToolResult, JsonObject};
use serde_json::Value;

/// Parse `key=value` pairs into a JSON object.
///
/// Each value is first attempted as JSON. If parsing fails, it is
/// treated as a plain string.
fn parse_args(args: &[String]) -> Result<Option<JsonObject>, Error> {
    if args.is_empty() {
        return Ok(None);
    }

    let mut map = serde_json::Map::new();
    for arg in args {
        let (key, raw_value) = arg
            .split_once('=')
            .ok_or_else(|| Error::InvalidArg(arg.clone()))?;

        let value = serde_json::from_str(raw_value)
            .unwrap_or_else(|_| Value::String(raw_value.to_string()));

        map.insert(key.to_string(), value);
    }

    Ok(Some(map))
}

/// Call `tool` on `server` through a one-shot session.
pub async fn call(
    registry: &ServerRegistry,
    server: &str,
    tool: &str,
    args: &[String],
) -> Result<CallToolResult, Error> {
    let arguments = parse_args(args)?.map_or(Value::Null, Value::Object);
    registry.invoke(server, tool, arguments).await
}
