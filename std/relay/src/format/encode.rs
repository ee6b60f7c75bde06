//! Value to text.

use super::FormatTarget;
use serde_json::{Map, Value};
use std::borrow::Cow;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Serialize `value` in `format`.
///
/// CSV and TSV need an array of objects. Anything else is written as pretty
/// JSON with a warning rather than failing the call.
pub fn encode(value: &Value, format: FormatTarget) -> String {
    match format {
        FormatTarget::Json => pretty(value),
        FormatTarget::Csv => tabular(value, format, ',').unwrap_or_else(|| tabular_fallback(value, format)),
        FormatTarget::Tsv => tabular(value, format, '\t').unwrap_or_else(|| tabular_fallback(value, format)),
        FormatTarget::Yaml => {
            let mut lines = Vec::new();
            yaml_lines(value, 0, &mut lines);
            lines.join("\n")
        }
        FormatTarget::Xml => xml(value),
        FormatTarget::Html => html(value),
        FormatTarget::Txt | FormatTarget::Md => text(value).into_owned(),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Strings as-is, everything else as pretty JSON.
fn text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(pretty(other)),
    }
}

fn tabular_fallback(value: &Value, format: FormatTarget) -> String {
    tracing::warn!(%format, "data is not an array of objects, writing JSON instead");
    pretty(value)
}

/// Header row from the first record's keys, then one row per record.
/// Returns `None` when `value` is not an array of objects.
fn tabular(value: &Value, format: FormatTarget, delimiter: char) -> Option<String> {
    let Value::Array(items) = value else {
        return None;
    };
    let records: Vec<&Map<String, Value>> = items.iter().map(Value::as_object).collect::<Option<_>>()?;
    let Some(first) = records.first() else {
        return Some(String::new());
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    let escape = |field: &str| -> String {
        if format == FormatTarget::Csv {
            csv_escape(field).into_owned()
        } else {
            field.to_string()
        }
    };
    let join = |fields: Vec<String>| fields.join(&delimiter.to_string());

    let mut rows = Vec::with_capacity(records.len() + 1);
    rows.push(join(headers.iter().map(|h| escape(*h)).collect()));
    for record in records {
        rows.push(join(
            headers
                .iter()
                .map(|h| escape(field_text(record.get(*h)).as_ref()))
                .collect(),
        ));
    }
    Some(rows.join("\n"))
}

fn field_text(value: Option<&Value>) -> Cow<'_, str> {
    match value {
        None | Some(Value::Null) => Cow::Borrowed(""),
        Some(Value::String(s)) => Cow::Borrowed(s),
        Some(other) => Cow::Owned(other.to_string()),
    }
}

/// Quote fields holding a comma or quote, doubling embedded quotes.
fn csv_escape(field: &str) -> Cow<'_, str> {
    if field.contains(',') || field.contains('"') {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

fn yaml_scalar(value: &Value) -> String {
    match value {
        Value::String(s) if s.is_empty() => "\"\"".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) => "[]".to_string(),
        Value::Object(_) => "{}".to_string(),
        other => other.to_string(),
    }
}

fn is_nested(value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => false,
    }
}

fn yaml_lines(value: &Value, depth: usize, lines: &mut Vec<String>) {
    let pad = "  ".repeat(depth);
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                if is_nested(child) {
                    lines.push(format!("{pad}{key}:"));
                    yaml_lines(child, depth + 1, lines);
                } else {
                    lines.push(format!("{pad}{key}: {}", yaml_scalar(child)));
                }
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for item in items {
                if is_nested(item) {
                    lines.push(format!("{pad}-"));
                    yaml_lines(item, depth + 1, lines);
                } else {
                    lines.push(format!("{pad}- {}", yaml_scalar(item)));
                }
            }
        }
        scalar => lines.push(format!("{pad}{}", yaml_scalar(scalar))),
    }
}

fn looks_like_xml(text: &str) -> bool {
    let text = text.trim();
    text.starts_with("<?xml") || (text.starts_with('<') && text.ends_with('>'))
}

fn xml(value: &Value) -> String {
    if let Value::String(s) = value {
        if looks_like_xml(s) {
            return s.clone();
        }
    }
    let mut lines = vec![XML_DECLARATION.to_string()];
    xml_element("root", value, 0, &mut lines);
    lines.join("\n")
}

fn xml_element(name: &str, value: &Value, depth: usize, lines: &mut Vec<String>) {
    let pad = "  ".repeat(depth);
    match value {
        Value::Object(map) if !map.is_empty() => {
            lines.push(format!("{pad}<{name}>"));
            for (key, child) in map {
                xml_element(&tag_name(key), child, depth + 1, lines);
            }
            lines.push(format!("{pad}</{name}>"));
        }
        Value::Array(items) if !items.is_empty() => {
            lines.push(format!("{pad}<{name}>"));
            for item in items {
                xml_element("item", item, depth + 1, lines);
            }
            lines.push(format!("{pad}</{name}>"));
        }
        Value::Object(_) | Value::Array(_) | Value::Null => lines.push(format!("{pad}<{name}/>")),
        Value::String(s) => lines.push(format!("{pad}<{name}>{}</{name}>", escape_markup(s))),
        other => lines.push(format!("{pad}<{name}>{other}</{name}>")),
    }
}

/// Turn an arbitrary key into a usable element name.
fn tag_name(key: &str) -> String {
    let mut name: String = key
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !name.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        name.insert(0, '_');
    }
    name
}

fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn looks_like_markup(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.to_ascii_lowercase().contains("<!doctype")
        || (trimmed.starts_with('<') && trimmed.ends_with('>'))
}

fn html(value: &Value) -> String {
    let content = text(value);
    if looks_like_markup(&content) {
        return content.into_owned();
    }
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"utf-8\">\n  <title>Tool Result</title>\n</head>\n<body>\n<pre>{}</pre>\n</body>\n</html>",
        escape_markup(&content)
    )
}

#[cfg(test)]
mod tests {
    use super::encode;
    use crate::format::FormatTarget;
    use serde_json::json;

    #[test]
    fn json_is_pretty_printed() {
        let value = json!({ "a": 1 });
        assert_eq!(encode(&value, FormatTarget::Json), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn csv_writes_header_and_rows() {
        let value = json!([{ "name": "A" }, { "name": "B" }]);
        assert_eq!(encode(&value, FormatTarget::Csv), "name\nA\nB");
    }

    #[test]
    fn csv_keeps_first_record_key_order() {
        let value = json!([
            { "zeta": 1, "alpha": true, "note": null },
            { "zeta": 2.5, "alpha": false }
        ]);
        assert_eq!(
            encode(&value, FormatTarget::Csv),
            "zeta,alpha,note\n1,true,\n2.5,false,"
        );
    }

    #[test]
    fn csv_escapes_commas_and_quotes() {
        let value = json!([{ "name": "John, Jr.", "note": "He said \"hi\"" }]);
        assert_eq!(
            encode(&value, FormatTarget::Csv),
            "name,note\n\"John, Jr.\",\"He said \"\"hi\"\"\""
        );
    }

    #[test]
    fn tsv_joins_with_tabs_without_escaping() {
        let value = json!([{ "a": "x,\"y\"", "b": 2 }]);
        assert_eq!(encode(&value, FormatTarget::Tsv), "a\tb\nx,\"y\"\t2");
    }

    #[test]
    fn tabular_of_empty_array_is_empty() {
        assert_eq!(encode(&json!([]), FormatTarget::Csv), "");
        assert_eq!(encode(&json!([]), FormatTarget::Tsv), "");
    }

    #[test]
    fn non_tabular_csv_falls_back_to_json() {
        let value = json!({ "rows": 3 });
        assert_eq!(encode(&value, FormatTarget::Csv), "{\n  \"rows\": 3\n}");
        let mixed = json!([{ "a": 1 }, 2]);
        assert_eq!(encode(&mixed, FormatTarget::Tsv), serde_json::to_string_pretty(&mixed).unwrap());
    }

    #[test]
    fn yaml_renders_nested_structures() {
        let value = json!({
            "name": "relay",
            "tags": ["a", "b"],
            "owner": { "id": 7, "active": true },
            "items": [{ "k": 1 }],
            "empty": []
        });
        let expected = "\
name: relay
tags:
  - a
  - b
owner:
  id: 7
  active: true
items:
  -
    k: 1
empty: []";
        assert_eq!(encode(&value, FormatTarget::Yaml), expected);
    }

    #[test]
    fn xml_wraps_in_root_with_items() {
        let value = json!({ "user": { "name": "A & B" }, "ids": [1, 2], "bad key": null });
        let expected = "\
<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<root>
  <user>
    <name>A &amp; B</name>
  </user>
  <ids>
    <item>1</item>
    <item>2</item>
  </ids>
  <bad_key/>
</root>";
        assert_eq!(encode(&value, FormatTarget::Xml), expected);
    }

    #[test]
    fn xml_text_passes_through() {
        let value = json!("<feed><entry/></feed>");
        assert_eq!(encode(&value, FormatTarget::Xml), "<feed><entry/></feed>");
    }

    #[test]
    fn html_passes_markup_and_wraps_text() {
        let page = json!("<!DOCTYPE html><html><body>hi</body></html>");
        assert_eq!(encode(&page, FormatTarget::Html), page.as_str().unwrap());

        let wrapped = encode(&json!("a < b"), FormatTarget::Html);
        assert!(wrapped.starts_with("<!DOCTYPE html>"));
        assert!(wrapped.contains("<pre>a &lt; b</pre>"));
    }

    #[test]
    fn text_formats_keep_strings() {
        assert_eq!(encode(&json!("plain"), FormatTarget::Txt), "plain");
        assert_eq!(encode(&json!("# Title"), FormatTarget::Md), "# Title");
        assert_eq!(encode(&json!([1]), FormatTarget::Txt), "[\n  1\n]");
    }
}
