use crate::collection::Operation;
use crate::managers::curated::CuratedTool;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

const CURATED_CATEGORY: &str = "Curated";

/// One line of the tool listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolEntry {
    pub name: String,
    pub category: String,
    pub method: String,
    pub url: String,
    pub description: String,
}

impl ToolEntry {
    pub fn from_operation(op: &Operation) -> Self {
        Self {
            name: op.name.clone(),
            category: op.category.clone(),
            method: op.method.clone(),
            url: op.raw_url_template.clone(),
            description: op.description.clone(),
        }
    }

    pub fn from_curated(tool: &CuratedTool) -> Self {
        Self {
            name: tool.name.to_string(),
            category: CURATED_CATEGORY.to_string(),
            method: tool.method.to_string(),
            url: tool.url_template.to_string(),
            description: tool.description.to_string(),
        }
    }
}

pub fn render_list_text(entries: &[ToolEntry]) -> String {
    let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!(
            "{:<width$}  {:<6} {}\n",
            entry.name,
            entry.method,
            entry.url,
            width = width
        ));
    }
    out.push_str(&format!("{} tools\n", entries.len()));
    out
}

pub fn render_list_json(entries: &[ToolEntry]) -> Value {
    serde_json::to_value(entries).unwrap_or(Value::Null)
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Markdown reference grouped by category, curated tools last.
pub fn render_markdown(entries: &[ToolEntry]) -> String {
    let mut groups: BTreeMap<&str, Vec<&ToolEntry>> = BTreeMap::new();
    for entry in entries {
        if entry.category != CURATED_CATEGORY {
            groups.entry(entry.category.as_str()).or_default().push(entry);
        }
    }
    let curated: Vec<&ToolEntry> = entries
        .iter()
        .filter(|e| e.category == CURATED_CATEGORY)
        .collect();

    let mut out = String::from("# Datadog MCP tools\n\n");
    out.push_str(&format!("{} tools in total.\n", entries.len()));
    let sections = groups
        .into_iter()
        .chain((!curated.is_empty()).then_some((CURATED_CATEGORY, curated)));
    for (category, mut items) in sections {
        items.sort_by(|a, b| a.name.cmp(&b.name));
        out.push_str(&format!("\n## {} ({})\n\n", category, items.len()));
        out.push_str("| Tool | Method | URL | Description |\n|---|---|---|---|\n");
        for item in items {
            out.push_str(&format!(
                "| `{}` | {} | `{}` | {} |\n",
                item.name,
                item.method,
                item.url,
                escape_cell(&item.description)
            ));
        }
    }
    out
}
