//! Conversions between JSON values and the textual formats the relay reads
//! and writes.
//!
//! Conversions are deliberately shallow: CSV/TSV handle flat records only,
//! YAML and XML cover a small subset, and nothing is schema-validated.

use std::{fmt, path::Path, str::FromStr};

mod encode;
mod parse;

pub use encode::encode;
pub use parse::{ParseError, parse};

/// Serialization format for an artifact or an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatTarget {
    #[default]
    Json,
    Csv,
    Tsv,
    Yaml,
    Xml,
    Html,
    Txt,
    Md,
}

impl FormatTarget {
    /// File extension written for this format, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Yaml => "yaml",
            Self::Xml => "xml",
            Self::Html => "html",
            Self::Txt => "txt",
            Self::Md => "md",
        }
    }

    /// Resolve a caller-supplied format name, falling back to JSON with a
    /// warning when the name is not recognized.
    pub fn from_name_or_json(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!(format = name, "unknown format, writing JSON instead");
            Self::Json
        })
    }
}

impl fmt::Display for FormatTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Error for an unrecognized format name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown format: {0}")]
pub struct UnknownFormat(pub String);

impl FromStr for FormatTarget {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            "yaml" | "yml" => Ok(Self::Yaml),
            "xml" => Ok(Self::Xml),
            "html" | "htm" => Ok(Self::Html),
            "txt" | "text" => Ok(Self::Txt),
            "md" | "markdown" => Ok(Self::Md),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// Pick a format from a file name's extension (case-insensitive).
/// Unknown or missing extensions read as plain text.
pub fn detect_format(filename: impl AsRef<Path>) -> FormatTarget {
    filename
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| ext.parse().ok())
        .unwrap_or(FormatTarget::Txt)
}

#[cfg(test)]
mod tests {
    use super::{FormatTarget, detect_format};

    #[test]
    fn detects_by_extension_case_insensitively() {
        assert_eq!(detect_format("data.json"), FormatTarget::Json);
        assert_eq!(detect_format("/tmp/DATA.CSV"), FormatTarget::Csv);
        assert_eq!(detect_format("rows.tsv"), FormatTarget::Tsv);
        assert_eq!(detect_format("config.yml"), FormatTarget::Yaml);
        assert_eq!(detect_format("feed.Xml"), FormatTarget::Xml);
        assert_eq!(detect_format("page.htm"), FormatTarget::Html);
        assert_eq!(detect_format("notes.md"), FormatTarget::Md);
    }

    #[test]
    fn unknown_or_missing_extension_is_text() {
        assert_eq!(detect_format("archive.tar.gz"), FormatTarget::Txt);
        assert_eq!(detect_format("README"), FormatTarget::Txt);
        assert_eq!(detect_format(".hidden"), FormatTarget::Txt);
    }

    #[test]
    fn unknown_name_falls_back_to_json() {
        assert_eq!(FormatTarget::from_name_or_json("YAML"), FormatTarget::Yaml);
        assert_eq!(FormatTarget::from_name_or_json("parquet"), FormatTarget::Json);
    }
}
