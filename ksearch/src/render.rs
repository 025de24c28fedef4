//! Output rendering for search results.
//!
//! Interchange formats (json, yaml) print `{results, rows}` in one document.
//! Human formats (summary, text) print a count line to the log stream and each
//! record to the output stream followed by a blank line.

use std::io::{self, Write};

use clap::ValueEnum;
use serde_json::{Map, Value};
use sift::SearchResults;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Node summaries, text layout for everything else
    Summary,
    /// Aligned key/value text
    Text,
    /// JSON document
    Json,
    /// YAML document
    Yaml,
}

impl OutputFormat {
    /// Parse a format name from configuration.
    pub fn parse(name: &str) -> Result<Self, String> {
        <Self as ValueEnum>::from_str(name, true)
            .map_err(|_| format!("unknown output format '{}' (expected summary, text, json or yaml)", name))
    }
}

/// Write results in the given format.
pub fn write_results<O: Write, L: Write>(
    out: &mut O,
    log: &mut L,
    results: &SearchResults,
    format: OutputFormat,
    id_only: bool,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(results).map_err(io::Error::other)?;
            writeln!(out, "{}", text)
        }
        OutputFormat::Yaml => {
            let text = serde_yaml::to_string(results).map_err(io::Error::other)?;
            write!(out, "{}", text)
        }
        OutputFormat::Summary | OutputFormat::Text => {
            writeln!(log, "{} items found", results.results)?;
            writeln!(log)?;
            for row in &results.rows {
                let text = if format == OutputFormat::Summary {
                    summarize(row)
                } else {
                    text_format(row)
                };
                write!(out, "{}", text)?;
                if !id_only {
                    writeln!(out)?;
                }
            }
            Ok(())
        }
    }
}

/// Summary layout: node objects get the node presenter.
pub fn summarize(value: &Value) -> String {
    match value.as_object() {
        Some(map) if map.get("chef_type").and_then(Value::as_str) == Some("node") => summarize_node(map),
        _ => text_format(value),
    }
}

fn summarize_node(node: &Map<String, Value>) -> String {
    let policy_name = node.get("policy_name").filter(|v| !v.is_null());
    let policy_group = node.get("policy_group").filter(|v| !v.is_null());
    let show_policy = policy_name.is_some() || policy_group.is_some();

    let mut lines = vec![line("Node Name:", scalar(node.get("name")))];
    if show_policy {
        lines.push(line("Policy Name:", scalar(policy_name)));
        lines.push(line("Policy Group:", scalar(policy_group)));
    } else {
        lines.push(line("Environment:", scalar(node.get("chef_environment"))));
    }
    lines.push(line("FQDN:", scalar(node.get("fqdn"))));
    lines.push(line("IP:", scalar(node.get("ipaddress"))));
    lines.push(line("Run List:", joined(node.get("run_list"))));
    if !show_policy {
        lines.push(line("Roles:", joined(node.get("roles"))));
    }
    lines.push(line("Recipes:", joined(node.get("recipes"))));
    let platform = format!(
        "{} {}",
        scalar(node.get("platform")),
        scalar(node.get("platform_version"))
    );
    lines.push(line("Platform:", platform.trim().to_string()));
    lines.push(line("Tags:", joined(node.get("tags"))));

    lines.concat()
}

fn line(label: &str, value: String) -> String {
    format!("{}\n", format!("{:<13} {}", label, value).trim_end())
}

fn scalar(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn joined(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| scalar(Some(item)))
            .collect::<Vec<_>>()
            .join(", "),
        other => scalar(other),
    }
}

/// Text layout: sorted keys aligned on `key:`, nested values indented.
pub fn text_format(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let width = map.keys().map(|k| k.chars().count()).max().unwrap_or(0) + 1;
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            let mut buffer = String::new();
            for key in keys {
                let value = &map[key.as_str()];
                let justified = format!("{:<width$}", format!("{}:", key), width = width);
                if should_enumerate(value) {
                    buffer.push_str(justified.trim_end());
                    buffer.push('\n');
                    buffer.push_str(&indent(&text_format(value)));
                } else {
                    let inline = format!("{} {}", justified, text_format(value));
                    buffer.push_str(inline.trim());
                    buffer.push('\n');
                }
            }
            buffer
        }
        Value::Array(items) => {
            let mut buffer = String::new();
            for (i, item) in items.iter().enumerate() {
                buffer.push_str(&text_format(item));
                if !is_singleton(item) && i + 1 != items.len() {
                    buffer.push('\n');
                }
            }
            buffer
        }
        other => format!("{}\n", scalar(Some(other))),
    }
}

fn should_enumerate(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => items.len() > 1 || items.first().is_some_and(should_enumerate),
        _ => false,
    }
}

fn is_singleton(value: &Value) -> bool {
    !(value.is_array() || value.is_object())
}

fn indent(text: &str) -> String {
    text.lines().map(|l| format!("  {}\n", l)).collect()
}
