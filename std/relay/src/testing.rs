//! Canned upstream for tests.

use rmcp::model::{CallToolResult, Content};
use rmcp_upstream::{Error, Upstream};
use serde_json::Value;
use std::sync::Mutex;

/// Returns the same result for every call and records what it was asked.
pub struct StubUpstream {
    result: CallToolResult,
    calls: Mutex<Vec<(String, String, Value)>>,
}

impl StubUpstream {
    pub fn new(result: CallToolResult) -> Self {
        Self {
            result,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn text(text: &str) -> Self {
        Self::new(CallToolResult::success(vec![Content::text(text)]))
    }

    pub fn error(text: &str) -> Self {
        Self::new(CallToolResult::error(vec![Content::text(text)]))
    }

    pub fn calls(&self) -> Vec<(String, String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Upstream for StubUpstream {
    async fn invoke(&self, server: &str, tool: &str, arguments: Value) -> Result<CallToolResult, Error> {
        self.calls
            .lock()
            .unwrap()
            .push((server.to_string(), tool.to_string(), arguments));
        Ok(self.result.clone())
    }
}
