//! Output formatting for funnel commands.
//!
//! Command results are serialized once and then rendered as pretty JSON, a
//! compact one-line-per-record text form, or an aligned table.

use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Machine-readable JSON
    Json,
    /// Compact `key:value` lines
    #[default]
    Text,
    /// Column-aligned table for lists
    Pretty,
}

/// Renders serializable command results in the selected format.
#[derive(Debug, Clone)]
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render a single value.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let value = serde_json::to_value(data)?;
        Ok(match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&value)?,
            OutputFormat::Text => render_text(&value),
            OutputFormat::Pretty => render_pretty(&value),
        })
    }

    /// Render and print to stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails
    pub fn print<T: Serialize>(&self, data: &T) -> Result<()> {
        let output = self.format(data)?;
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{output}")?;
        Ok(())
    }

    /// Print a list, or `empty_message` when there is nothing to show.
    ///
    /// JSON output wraps the items in `{ <collection_name>: [...], count }`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails
    pub fn print_list<T: Serialize>(
        &self,
        data: &[T],
        empty_message: &str,
        collection_name: &str,
    ) -> Result<()> {
        let mut stdout = io::stdout().lock();
        match self.format {
            OutputFormat::Json => {
                let mut envelope = serde_json::Map::new();
                envelope.insert(collection_name.to_string(), serde_json::to_value(data)?);
                envelope.insert("count".to_string(), serde_json::json!(data.len()));
                let output = serde_json::to_string_pretty(&Value::Object(envelope))?;
                writeln!(stdout, "{output}")?;
            }
            OutputFormat::Text | OutputFormat::Pretty if data.is_empty() => {
                writeln!(stdout, "{empty_message}")?;
            }
            OutputFormat::Text | OutputFormat::Pretty => {
                drop(stdout);
                self.print(&data)?;
            }
        }
        Ok(())
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputFormat::default())
    }
}

const ID_KEYS: [&str; 2] = ["id", "investor_id"];

/// Render a JSON value as concise text. Arrays become one line per element.
fn render_text(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut parts = Vec::new();
            for key in ID_KEYS {
                if let Some(val) = map.get(key) {
                    parts.push(render_field_value(val));
                }
            }
            for (key, val) in map {
                if ID_KEYS.contains(&key.as_str()) || val.is_null() {
                    continue;
                }
                parts.push(format!("{key}:{}", render_field_value(val)));
            }
            parts.join("  ")
        }
        Value::Array(items) => items.iter().map(render_text).collect::<Vec<_>>().join("\n"),
        _ => render_field_value(value),
    }
}

/// Arrays of objects become a table whose columns are the union of keys in
/// first-seen order; anything else falls back to text.
fn render_pretty(value: &Value) -> String {
    let Value::Array(items) = value else {
        return render_text(value);
    };

    let mut columns: Vec<&str> = Vec::new();
    for item in items {
        let Value::Object(map) = item else {
            return render_text(value);
        };
        for key in map.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|item| {
            columns
                .iter()
                .map(|col| item.get(*col).map_or_else(String::new, render_cell))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(col.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(pad_row(columns.iter().map(|c| (*c).to_string()), &widths));
    for row in rows {
        lines.push(pad_row(row.into_iter(), &widths));
    }
    lines.join("\n")
}

fn pad_row(cells: impl Iterator<Item = String>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.replace('\n', " "),
        other => render_field_value(other),
    }
}

/// Render a single field value as concise text
fn render_field_value(value: &Value) -> String {
    match value {
        Value::String(s) => {
            if s.contains(' ') || s.contains('\n') {
                format!("\"{}\"", s.replace('\n', "\\n"))
            } else {
                s.clone()
            }
        }
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(render_field_value).collect();
            format!("[{}]", items.join(","))
        }
        Value::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| format!("{k}:{}", render_field_value(v)))
                .collect();
            format!("{{{}}}", parts.join(","))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Text);
    }

    #[test]
    fn test_json_output_is_valid() {
        let output = Formatter::new(OutputFormat::Json)
            .format(&json!({ "inserted": 3, "skipped": 1, "total": 3 }))
            .unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["inserted"], 3);
    }

    #[test]
    fn test_text_puts_id_first_and_drops_nulls() {
        let output = Formatter::new(OutputFormat::Text)
            .format(&json!({
                "action_type": "NOTE_UPDATE",
                "id": 12,
                "user_agent": null,
                "action_data": { "investor_id": 4, "note_text": "call back" }
            }))
            .unwrap();
        assert!(output.starts_with("12  "));
        assert!(output.contains("action_type:NOTE_UPDATE"));
        assert!(!output.contains("user_agent"));
        assert!(output.contains("investor_id:4"));
    }

    #[test]
    fn test_text_array_one_line_per_item() {
        let output = Formatter::new(OutputFormat::Text)
            .format(&json!([{ "id": 1 }, { "id": 2 }]))
            .unwrap();
        assert_eq!(output, "1\n2");
    }

    #[test]
    fn test_pretty_table_alignment() {
        let output = Formatter::new(OutputFormat::Pretty)
            .format(&json!([
                { "id": 1, "action_type": "NOTE_UPDATE" },
                { "id": 20, "action_type": "X", "ip_address": "10.0.0.1" }
            ]))
            .unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        // serde_json maps iterate in key order
        assert_eq!(lines[0], "action_type  id  ip_address");
        assert_eq!(lines[1], "NOTE_UPDATE  1");
        assert_eq!(lines[2], "X            20  10.0.0.1");
    }

    #[test]
    fn test_pretty_falls_back_for_scalars() {
        let output = Formatter::new(OutputFormat::Pretty)
            .format(&json!({ "total": 5 }))
            .unwrap();
        assert_eq!(output, "total:5");
    }
}
