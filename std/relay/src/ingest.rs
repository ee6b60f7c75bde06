//! Feeding a data file into an upstream tool call.

use crate::{
    envelope::extract_value,
    error::Error,
    format::{detect_format, parse},
    validate::{AllowedDirs, validate_path},
};
use rmcp::{
    model::{CallToolResult, JsonObject},
    schemars::{self, JsonSchema},
};
use rmcp_upstream::Upstream;
use serde::Deserialize;
use serde_json::Value;

/// Largest input file the relay will read.
pub const MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

/// How an upstream result is handed back to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// The whole response envelope as pretty JSON, metadata included.
    #[default]
    Full,
    /// Only the extracted content.
    Text,
}

/// The data key is already one of the caller's arguments.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("data key '{0}' is already present in the tool arguments")]
pub struct KeyConflict(pub String);

/// Combine parsed file data with the caller's own arguments.
///
/// Without a data key the file data is the whole argument value. With one,
/// the data is added under that key, which must not already be present.
pub fn merge_file_data_with_args(
    data: Value,
    data_key: Option<&str>,
    extra_args: Option<JsonObject>,
) -> Result<Value, KeyConflict> {
    let Some(key) = data_key else {
        if extra_args.as_ref().is_some_and(|args| !args.is_empty()) {
            tracing::warn!("tool arguments ignored: no data key given, file data is the whole argument");
        }
        return Ok(data);
    };

    let mut args = extra_args.unwrap_or_default();
    if args.contains_key(key) {
        return Err(KeyConflict(key.to_string()));
    }
    args.insert(key.to_string(), data);
    Ok(Value::Object(args))
}

/// Read and parse `file_path`, merge it into the arguments and call `tool` on
/// `server`. Returns the upstream's response unchanged.
pub async fn ingest_and_call<U: Upstream>(
    upstream: &U,
    allowed: &AllowedDirs,
    server: &str,
    tool: &str,
    file_path: &str,
    data_key: Option<&str>,
    extra_args: Option<JsonObject>,
) -> Result<CallToolResult, Error> {
    let path = validate_path(file_path, allowed)?;
    let io_err = |source| Error::Io {
        path: path.clone(),
        source,
    };

    let size = tokio::fs::metadata(&path).await.map_err(io_err)?.len();
    if size > MAX_INPUT_BYTES {
        return Err(Error::FileTooLarge {
            path: path.clone(),
            size,
            limit: MAX_INPUT_BYTES,
        });
    }

    let content = tokio::fs::read_to_string(&path).await.map_err(io_err)?;
    let format = detect_format(&path);
    let data = parse(&content, format).map_err(|source| Error::Parse {
        path: path.clone(),
        source,
    })?;
    tracing::debug!(path = %path.display(), %format, size, "parsed input file");

    let data_key = data_key.filter(|key| !key.is_empty());
    let arguments = merge_file_data_with_args(data, data_key, extra_args).map_err(|KeyConflict(key)| {
        Error::DataKeyConflict {
            key,
            path: path.clone(),
        }
    })?;

    let context = format!("{server}:{tool}");
    let result = upstream
        .invoke(server, tool, arguments)
        .await
        .map_err(|source| Error::Upstream {
            context: context.clone(),
            source,
        })?;
    tracing::info!(context = %context, path = %path.display(), "called tool with file data");
    Ok(result)
}

/// Render a response for the caller.
pub fn render_result(result: &CallToolResult, mode: OutputMode) -> Result<String, Error> {
    match mode {
        OutputMode::Full => Ok(serde_json::to_string_pretty(result)?),
        OutputMode::Text => match extract_value(&serde_json::to_value(result)?) {
            Value::String(text) => Ok(text),
            other => Ok(serde_json::to_string_pretty(&other)?),
        },
    }
}
