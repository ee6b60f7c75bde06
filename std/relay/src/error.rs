use crate::{format::ParseError, validate::ValidateError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validate(#[from] ValidateError),

    #[error("directory {} is not writable", .0.display())]
    NotWritable(PathBuf),

    #[error("{}: data key '{key}' is already present in the tool arguments", .path.display())]
    DataKeyConflict { key: String, path: PathBuf },

    #[error("file {} is {size} bytes, larger than the {limit} byte limit", .path.display())]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("{context} failed: {source}")]
    Upstream {
        context: String,
        #[source]
        source: rmcp_upstream::Error,
    },

    #[error("{context} returned an error: {message}")]
    ToolFailed { context: String, message: String },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
