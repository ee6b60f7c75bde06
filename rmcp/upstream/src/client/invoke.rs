//! [`Upstream`] trait: one `tools/call` against a named upstream server.

use crate::{error::Error, registry::ServerRegistry};
use rmcp::model::{CallToolRequestParams, CallToolResult};
use serde_json::Value;
use std::borrow::Cow;

/// Something that can call a tool on a logical upstream server.
pub trait Upstream: Send + Sync {
    /// Call `tool` on `server` with `arguments` and return the raw response
    /// envelope.
    fn invoke(
        &self,
        server: &str,
        tool: &str,
        arguments: Value,
    ) -> impl Future<Output = Result<CallToolResult, Error>> + Send;
}

/// Build `tools/call` parameters. `null` means no arguments; any other
/// non-object value is rejected.
pub fn call_params(tool: &str, arguments: Value) -> Result<CallToolRequestParams, Error> {
    let arguments = match arguments {
        Value::Null => None,
        Value::Object(map) => Some(map),
        Value::Array(_) => return Err(Error::InvalidArguments("an array")),
        Value::String(_) => return Err(Error::InvalidArguments("a string")),
        Value::Number(_) => return Err(Error::InvalidArguments("a number")),
        Value::Bool(_) => return Err(Error::InvalidArguments("a boolean")),
    };
    Ok(CallToolRequestParams {
        meta: None,
        name: Cow::Owned(tool.to_string()),
        arguments,
        task: None,
    })
}

/// A fresh session per call: spawn, initialize, send exactly one request,
/// then tear the session down whether or not the call succeeded.
impl Upstream for ServerRegistry {
    async fn invoke(
        &self,
        server: &str,
        tool: &str,
        arguments: Value,
    ) -> Result<CallToolResult, Error> {
        let descriptor = self.resolve(server)?;
        let params = call_params(tool, arguments)?;

        tracing::debug!(server, tool, command = %descriptor.command, "starting upstream session");
        let service = super::connect(descriptor).await?;

        let result = service.peer().call_tool(params).await;

        // The service also cancels itself on drop; this makes the teardown
        // observable and waits for the child transport to close.
        if let Err(e) = service.cancel().await {
            tracing::warn!(server, tool, error = %e, "upstream session teardown failed");
        }

        let result = result?;
        tracing::debug!(
            server,
            tool,
            items = result.content.len(),
            is_error = result.is_error.unwrap_or(false),
            "upstream call completed"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Error, ServerDescriptor, ServerRegistry, Upstream, client::call_params};
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn params_accept_objects_and_null() {
        let params = call_params("search", json!({ "query": "x" })).unwrap();
        assert_eq!(params.name, "search");
        assert_eq!(params.arguments.unwrap()["query"], "x");

        let params = call_params("ping", json!(null)).unwrap();
        assert!(params.arguments.is_none());
    }

    #[test]
    fn params_reject_non_objects() {
        let err = call_params("bulk", json!([{ "a": 1 }])).unwrap_err();
        assert!(matches!(err, Error::InvalidArguments("an array")));
        assert!(err.to_string().contains("must be a JSON object"));
    }

    #[tokio::test]
    async fn invoke_unknown_server_fails_before_spawning() {
        let registry = ServerRegistry::default();
        let err = registry.invoke("nope", "tool", json!({})).await.unwrap_err();
        assert!(matches!(err, Error::UnknownServer { .. }));
    }

    #[tokio::test]
    async fn invoke_reports_spawn_failure() {
        let registry = ServerRegistry::new([(
            "broken".to_string(),
            ServerDescriptor {
                command: "/nonexistent/wmcp-upstream-test-binary".into(),
                args: Vec::new(),
                env: HashMap::new(),
            },
        )]);
        let err = registry.invoke("broken", "tool", json!({})).await.unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
        assert!(err.to_string().contains("wmcp-upstream-test-binary"));
    }
}
