//! Storing upstream tool results on disk and returning a pointer to them.

use crate::{
    envelope::{self, extract_value},
    error::Error,
    format::{FormatTarget, encode},
    validate::{AllowedDirs, is_writable_directory, validate_path},
};
use chrono::{SecondsFormat, Utc};
use rmcp_upstream::Upstream;
use serde::Serialize;
use serde_json::Value;
use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

/// Distinguishes default file names generated within the same millisecond.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Where and how to store a result.
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    /// Target directory; must be inside the allowed directories. Defaults to
    /// the first allowed directory.
    pub directory: Option<String>,
    /// File name without extension. Defaults to
    /// `<server>-<tool>-<timestamp>-<sequence>`.
    pub filename: Option<String>,
    pub format: FormatTarget,
    pub description: Option<String>,
}

/// A file written by [`materialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedArtifact {
    pub path: PathBuf,
    /// Size of the file on disk.
    pub byte_length: u64,
    pub description: String,
}

/// What the caller gets back instead of the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointerRecord {
    pub uri: String,
    /// Size of the result as it would have appeared in the conversation,
    /// before format conversion.
    pub bytes: u64,
    pub description: String,
}

/// Call `tool` on `server`, convert the result and write it to a file inside
/// the allowed directories.
///
/// The target location is validated before the upstream is called, so an
/// invalid location never costs an upstream round trip. A missing target
/// directory is only created once the upstream has answered successfully.
/// Existing files are never replaced.
pub async fn materialize<U: Upstream>(
    upstream: &U,
    allowed: &AllowedDirs,
    server: &str,
    tool: &str,
    arguments: Value,
    options: &StoreOptions,
) -> Result<PointerRecord, Error> {
    let context = format!("{server}:{tool}");
    let directory = match options.directory.as_deref() {
        Some(dir) => validate_path(dir, allowed)?,
        None => allowed.primary().to_path_buf(),
    };
    let exists = tokio::fs::try_exists(&directory).await.unwrap_or(false);
    if exists && !is_writable_directory(&directory).await {
        return Err(Error::NotWritable(directory));
    }
    let filename = file_name(server, tool, options.filename.as_deref(), options.format);
    let path = validate_path(&directory.join(&filename).to_string_lossy(), allowed)?;

    let result = upstream
        .invoke(server, tool, arguments)
        .await
        .map_err(|source| Error::Upstream {
            context: context.clone(),
            source,
        })?;
    let raw = serde_json::to_value(&result)?;
    if envelope::is_error(&raw) {
        return Err(Error::ToolFailed {
            context,
            message: envelope::text_content(&raw),
        });
    }

    let value = extract_value(&raw);
    let bytes = payload_len(&value)?;
    let content = encode(&value, options.format);

    if !exists {
        tokio::fs::create_dir_all(&directory)
            .await
            .map_err(|source| Error::Io {
                path: directory.clone(),
                source,
            })?;
        if !is_writable_directory(&directory).await {
            return Err(Error::NotWritable(directory));
        }
    }

    let description = options.description.clone().unwrap_or_else(|| {
        format!(
            "{context} result ({})",
            options.format.extension().to_uppercase()
        )
    });
    let artifact = write_artifact(&path, content, description).await?;
    tracing::info!(
        context = %context,
        path = %artifact.path.display(),
        file_bytes = artifact.byte_length,
        result_bytes = bytes,
        "stored tool result"
    );

    Ok(PointerRecord {
        uri: format!("file://{}", artifact.path.display()),
        bytes,
        description: artifact.description,
    })
}

fn file_name(server: &str, tool: &str, requested: Option<&str>, format: FormatTarget) -> String {
    let stem = match requested.filter(|name| !name.is_empty()) {
        Some(name) => name.to_string(),
        None => {
            let timestamp = Utc::now()
                .to_rfc3339_opts(SecondsFormat::Millis, true)
                .replace([':', '.'], "-");
            let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
            format!("{server}-{tool}-{timestamp}-{sequence}").replace(['/', '\\'], "_")
        }
    };
    let extension = format!(".{}", format.extension());
    if stem.ends_with(&extension) {
        stem
    } else {
        stem + &extension
    }
}

/// Length of the unconverted result: strings by their text, everything else
/// by its compact JSON.
fn payload_len(value: &Value) -> Result<u64, serde_json::Error> {
    let len = match value {
        Value::String(s) => s.len(),
        other => serde_json::to_string(other)?.len(),
    };
    Ok(len as u64)
}

/// Write `content` to a uniquely named temp file beside `path`, then link it
/// into place without replacing anything. The target path only ever holds a
/// complete file, and an existing file at `path` fails the write.
pub async fn write_artifact(
    path: &Path,
    content: String,
    description: String,
) -> Result<MaterializedArtifact, Error> {
    let io_err = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = path
        .parent()
        .ok_or_else(|| io_err(std::io::Error::new(std::io::ErrorKind::InvalidInput, "no parent directory")))?
        .to_path_buf();
    let target = path.to_path_buf();

    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let mut staging = tempfile::Builder::new()
            .prefix(".wmcp-relay-")
            .suffix(".tmp")
            .tempfile_in(&dir)?;
        staging.write_all(content.as_bytes())?;
        staging.as_file().sync_all()?;
        staging.persist_noclobber(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| io_err(std::io::Error::other(e)))?
    .map_err(io_err)?;

    let byte_length = tokio::fs::metadata(path).await.map_err(io_err)?.len();
    Ok(MaterializedArtifact {
        path: path.to_path_buf(),
        byte_length,
        description,
    })
}
