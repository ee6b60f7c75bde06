//! Text to value, for files fed into upstream tool calls.

use super::FormatTarget;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from parsing an input file.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("file is empty")]
    Empty,

    #[error("file has a header row but no data rows")]
    NoDataRows,

    #[error("row {row} has {found} fields, expected {expected}")]
    FieldCount {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("row {row} has an unterminated quoted field")]
    UnterminatedQuote { row: usize },

    #[error("line {line}: expected `key: value`")]
    Yaml { line: usize },
}

/// Parse `content` as `format`.
///
/// CSV and TSV produce an array of objects keyed by the header row, all
/// values strings. YAML is read as flat `key: value` lines only. XML is not
/// parsed and comes back as a string. Other text is read as JSON when it
/// parses, otherwise as a string.
pub fn parse(content: &str, format: FormatTarget) -> Result<Value, ParseError> {
    match format {
        FormatTarget::Json => Ok(serde_json::from_str(content)?),
        FormatTarget::Csv => tabular(content, split_csv),
        FormatTarget::Tsv => tabular(content, |line, _| Ok(line.split('\t').map(String::from).collect())),
        FormatTarget::Yaml => yaml(content),
        FormatTarget::Xml => Ok(Value::String(content.to_string())),
        FormatTarget::Txt | FormatTarget::Md | FormatTarget::Html => {
            Ok(serde_json::from_str(content).unwrap_or_else(|_| Value::String(content.to_string())))
        }
    }
}

/// Rows are numbered from 1 over non-blank lines, header included.
fn tabular<F>(content: &str, split: F) -> Result<Value, ParseError>
where
    F: Fn(&str, usize) -> Result<Vec<String>, ParseError>,
{
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.lines().filter(|line| !line.trim().is_empty());

    let header_line = lines.next().ok_or(ParseError::Empty)?;
    let headers = split(header_line, 1)?;

    let mut records = Vec::new();
    for (index, line) in lines.enumerate() {
        let row = index + 2;
        let fields = split(line, row)?;
        if fields.len() != headers.len() {
            return Err(ParseError::FieldCount {
                row,
                found: fields.len(),
                expected: headers.len(),
            });
        }
        let record: Map<String, Value> = headers
            .iter()
            .cloned()
            .zip(fields.into_iter().map(Value::String))
            .collect();
        records.push(Value::Object(record));
    }

    if records.is_empty() {
        return Err(ParseError::NoDataRows);
    }
    Ok(Value::Array(records))
}

/// Split one CSV line, honouring quoted fields and `""` escapes.
fn split_csv(line: &str, row: usize) -> Result<Vec<String>, ParseError> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut field)),
                _ => field.push(c),
            }
        }
    }

    if in_quotes {
        return Err(ParseError::UnterminatedQuote { row });
    }
    fields.push(field);
    Ok(fields)
}

fn unquote(text: &str) -> Option<&str> {
    ['"', '\'']
        .into_iter()
        .find_map(|q| text.strip_prefix(q).and_then(|rest| rest.strip_suffix(q)))
}

fn yaml_scalar(raw: &str) -> Value {
    if raw.is_empty() || raw == "~" {
        return Value::Null;
    }
    if let Some(inner) = unquote(raw) {
        return Value::String(inner.to_string());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(v @ (Value::Null | Value::Bool(_) | Value::Number(_))) => v,
        _ => Value::String(raw.to_string()),
    }
}

/// Flat `key: value` lines. No nesting, no lists.
fn yaml(content: &str) -> Result<Value, ParseError> {
    let mut map = Map::new();
    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed == "---" {
            continue;
        }
        let (key, raw) = trimmed
            .split_once(':')
            .ok_or(ParseError::Yaml { line: index + 1 })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ParseError::Yaml { line: index + 1 });
        }
        let key = unquote(key).unwrap_or(key);
        map.insert(key.to_string(), yaml_scalar(raw.trim()));
    }
    Ok(Value::Object(map))
}
