use crate::collection::document::{Collection, RequestTemplate};
use crate::collection::naming::NamingRules;
use crate::collection::schema::{project_tool, ToolDescriptor};
use crate::constants::limits::LARGE_TOOL_COUNT;
use crate::services::logger::Logger;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

static API_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/api/(v\d+)").expect("api version regex"));
static BARE_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|/)v(\d+)(?:/|$)").expect("bare version regex"));
static COLON_VARIABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/:([A-Za-z_][A-Za-z0-9_]*)").expect("colon variable regex"));
static BRACE_VARIABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("brace variable regex")
});

const SYMBOLIC_TOKENS: &[&str] = &["site", "subdomain", "baseUrl"];

/// One uniquely named callable endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    pub name: String,
    pub category: String,
    pub description: String,
    pub method: String,
    pub raw_url_template: String,
    pub path_variables: Vec<String>,
}

/// Which top-level folders of the collection become tools.
///
/// `Only(vec![])` is a deliberate "nothing" and is not the same as `All`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Vec<String>),
}

impl CategoryFilter {
    pub fn only<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CategoryFilter::Only(categories.into_iter().map(Into::into).collect())
    }

    pub fn allows(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(list) => list.iter().any(|c| c == category),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            CategoryFilter::All => "(all)".to_string(),
            CategoryFilter::Only(list) if list.is_empty() => "(none)".to_string(),
            CategoryFilter::Only(list) => list.join(","),
        }
    }
}

/// The built, read-only set of operations and their advertised tools.
#[derive(Debug, Clone, Default)]
pub struct OperationIndex {
    tools: Vec<ToolDescriptor>,
    operations: Vec<Operation>,
    by_name: HashMap<String, usize>,
    top_level_folders: Vec<String>,
}

impl OperationIndex {
    pub fn from_operations(operations: Vec<Operation>, top_level_folders: Vec<String>) -> Self {
        let tools = operations.iter().map(project_tool).collect();
        let by_name = operations
            .iter()
            .enumerate()
            .map(|(idx, op)| (op.name.clone(), idx))
            .collect();
        Self {
            tools,
            operations,
            by_name,
            top_level_folders,
        }
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.by_name.get(name).map(|idx| &self.operations[*idx])
    }

    pub fn top_level_folders(&self) -> &[String] {
        &self.top_level_folders
    }

    pub fn names(&self) -> Vec<String> {
        self.operations.iter().map(|op| op.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Builds an [`OperationIndex`] from a collection. Building is a pure
/// function of the collection, the filter and the naming rules; the logger
/// only reports on the result.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    logger: Logger,
    rules: NamingRules,
    large_tool_count: usize,
}

impl IndexBuilder {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger: logger.child("index"),
            rules: NamingRules::default(),
            large_tool_count: LARGE_TOOL_COUNT,
        }
    }

    pub fn with_rules(mut self, rules: NamingRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn build(&self, collection: &Collection, filter: &CategoryFilter) -> OperationIndex {
        let mut operations = derive_operations(&collection.requests(), filter, &self.rules);
        disambiguate(&mut operations);
        let index = OperationIndex::from_operations(operations, collection.top_level_folders());
        self.report(&index, filter);
        index
    }

    fn report(&self, index: &OperationIndex, filter: &CategoryFilter) {
        if index.len() > self.large_tool_count {
            self.logger.warn_once(&format!(
                "Loaded {} tools. Consider filtering with MCP_DD_FOLDERS or --folders to reduce the set.",
                index.len()
            ));
        }
        if index.is_empty() {
            self.logger.warn_once(&format!(
                "No tools loaded from schema (folders: {}). Top-level folders available: {}. Adjust MCP_DD_FOLDERS or --folders to include the folders you need.",
                filter.describe(),
                index.top_level_folders().join(", ")
            ));
        }
        self.logger.debug(
            "Operation index built",
            Some(&serde_json::json!({
                "operations": index.len(),
                "folders": filter.describe(),
            })),
        );
    }
}

/// Names every request that passes the filter; names may still collide.
pub fn derive_operations(
    requests: &[RequestTemplate],
    filter: &CategoryFilter,
    rules: &NamingRules,
) -> Vec<Operation> {
    let mut out = Vec::new();
    for request in requests {
        let category = request.category();
        if !filter.allows(category) {
            continue;
        }
        let raw_url_template = strip_query(&request.raw_url);
        if raw_url_template.trim().is_empty() {
            continue;
        }
        let path_variables = if request.variables.is_empty() {
            extract_path_variables(&raw_url_template)
        } else {
            request.variables.clone()
        };
        let description = if request.description.trim().is_empty() {
            format!("{} {}", request.method, raw_url_template)
        } else {
            request.description.clone()
        };
        out.push(Operation {
            name: rules.tool_name(&request.method, &request.raw_url),
            category: category.to_string(),
            description,
            method: request.method.clone(),
            raw_url_template,
            path_variables,
        });
    }
    out
}

/// Makes names unique in two passes: API-version suffixes for colliding
/// groups, then running numeric suffixes in input order.
pub fn disambiguate(operations: &mut [Operation]) {
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, op) in operations.iter().enumerate() {
        groups.entry(op.name.clone()).or_default().push(idx);
    }
    for members in groups.values().filter(|members| members.len() > 1) {
        for idx in members {
            let op = &mut operations[*idx];
            if let Some(version) = version_marker(&op.raw_url_template) {
                let suffix = format!("_{}", version.to_lowercase());
                if !op.name.ends_with(&suffix) {
                    op.name.push_str(&suffix);
                }
            }
        }
    }

    let mut taken: HashSet<String> = HashSet::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for op in operations.iter_mut() {
        let count = counts.entry(op.name.clone()).or_insert(0);
        *count += 1;
        if *count == 1 && !taken.contains(&op.name) {
            taken.insert(op.name.clone());
            continue;
        }
        let mut n = (*count).max(2);
        let mut candidate = format!("{}_{}", op.name, n);
        while taken.contains(&candidate) {
            n += 1;
            candidate = format!("{}_{}", op.name, n);
        }
        *count = n;
        taken.insert(candidate.clone());
        op.name = candidate;
    }
}

pub fn strip_query(raw: &str) -> String {
    raw.split('?').next().unwrap_or("").to_string()
}

fn version_marker(template: &str) -> Option<String> {
    if let Some(caps) = API_VERSION.captures(template) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }
    BARE_VERSION
        .captures(template)
        .and_then(|caps| caps.get(1))
        .map(|m| format!("v{}", m.as_str()))
}

/// Variable names in declaration order, `:name` and `{{name}}` forms,
/// skipping the symbolic host tokens.
pub fn extract_path_variables(template: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = Vec::new();
    for caps in COLON_VARIABLE.captures_iter(template) {
        if let Some(m) = caps.get(1) {
            found.push((m.start(), m.as_str().to_string()));
        }
    }
    for caps in BRACE_VARIABLE.captures_iter(template) {
        if let Some(m) = caps.get(1) {
            if !SYMBOLIC_TOKENS.contains(&m.as_str()) {
                found.push((m.start(), m.as_str().to_string()));
            }
        }
    }
    found.sort_by_key(|(pos, _)| *pos);
    let mut out: Vec<String> = Vec::new();
    for (_, name) in found {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(name: &str, template: &str) -> Operation {
        Operation {
            name: name.to_string(),
            category: "Metrics".to_string(),
            description: String::new(),
            method: "GET".to_string(),
            raw_url_template: template.to_string(),
            path_variables: Vec::new(),
        }
    }

    fn names(ops: &[Operation]) -> Vec<&str> {
        ops.iter().map(|op| op.name.as_str()).collect()
    }

    #[test]
    fn version_suffix_resolves_cross_version_collisions() {
        let mut ops = vec![
            op("get_metrics", "{{baseUrl}}/api/v1/metrics"),
            op("get_metrics", "{{baseUrl}}/api/v2/metrics"),
            op("get_hosts", "{{baseUrl}}/api/v1/hosts"),
        ];
        disambiguate(&mut ops);
        assert_eq!(names(&ops), vec!["get_metrics_v1", "get_metrics_v2", "get_hosts"]);
    }

    #[test]
    fn numeric_suffix_when_versions_match() {
        let mut ops = vec![
            op("get_tags", "{{baseUrl}}/api/v1/tags/hosts"),
            op("get_tags", "{{baseUrl}}/api/v1/tags/hosts"),
            op("get_tags", "{{baseUrl}}/api/v1/tags/hosts"),
        ];
        disambiguate(&mut ops);
        assert_eq!(names(&ops), vec!["get_tags_v1", "get_tags_v1_2", "get_tags_v1_3"]);
    }

    #[test]
    fn numeric_suffix_without_version_marker() {
        let mut ops = vec![
            op("create_logs", "https://http-intake.logs.{{site}}/logs"),
            op("create_logs", "https://http-intake.logs.{{site}}/logs"),
        ];
        disambiguate(&mut ops);
        assert_eq!(names(&ops), vec!["create_logs", "create_logs_2"]);
    }

    #[test]
    fn numeric_suffix_skips_names_already_taken() {
        let mut ops = vec![
            op("x", "/a"),
            op("x", "/b"),
            op("x_2", "/c"),
        ];
        disambiguate(&mut ops);
        let unique: HashSet<&str> = names(&ops).into_iter().collect();
        assert_eq!(unique.len(), 3);
        assert_eq!(ops[0].name, "x");
        assert_eq!(ops[1].name, "x_2");
    }

    #[test]
    fn bare_version_segment_is_recognized() {
        assert_eq!(version_marker("https://intake.{{site}}/v1/input"), Some("v1".to_string()));
        assert_eq!(version_marker("{{baseUrl}}/API/V2/x"), Some("V2".to_string()));
        assert_eq!(version_marker("{{baseUrl}}/vault/x"), None);
    }

    #[test]
    fn path_variables_are_extracted_in_order() {
        assert_eq!(
            extract_path_variables("{{baseUrl}}/api/v2/team/:team_id/links/{{link_id}}"),
            vec!["team_id", "link_id"]
        );
        assert!(extract_path_variables("https://{{subdomain}}.{{site}}/api/v1/x").is_empty());
    }

    #[test]
    fn category_filter_semantics() {
        assert!(CategoryFilter::All.allows("Logs"));
        assert!(CategoryFilter::only(["Logs"]).allows("Logs"));
        assert!(!CategoryFilter::only(["Logs"]).allows("Monitors"));
        assert!(!CategoryFilter::Only(Vec::new()).allows("Logs"));
        assert_eq!(CategoryFilter::Only(Vec::new()).describe(), "(none)");
    }

    #[test]
    fn strip_query_drops_baked_in_examples() {
        assert_eq!(
            strip_query("{{baseUrl}}/api/v1/monitor?group_states=alert"),
            "{{baseUrl}}/api/v1/monitor"
        );
    }
}
