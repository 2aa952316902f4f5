use crate::collection::ToolDescriptor;
use crate::errors::ToolError;
use crate::http::{ApiCall, HttpExecutor, RequestOutcome};
use crate::services::tool_executor::{ToolHandler, ToolOutput};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Text,
    Integer { min: Option<i64>, max: Option<i64> },
    Flag,
    /// Identifier accepted as a string or a number.
    Id,
    TextList,
    Object,
    ObjectOrArray,
    Choice(&'static [&'static str]),
}

/// Where an argument ends up in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Path,
    Query(&'static str),
    Body,
    /// Consumed by the tool itself, never sent.
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    Int(i64),
    Flag(bool),
    EmptyObject,
}

impl Fallback {
    fn to_value(self) -> Value {
        match self {
            Fallback::Int(n) => json!(n),
            Fallback::Flag(flag) => json!(flag),
            Fallback::EmptyObject => json!({}),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
    pub target: Target,
    pub required: bool,
    pub fallback: Option<Fallback>,
    pub description: &'static str,
}

impl Param {
    const fn or(self, fallback: Fallback) -> Self {
        Param {
            fallback: Some(fallback),
            required: false,
            ..self
        }
    }
}

const fn path(name: &'static str, kind: ParamKind, description: &'static str) -> Param {
    Param {
        name,
        kind,
        target: Target::Path,
        required: true,
        fallback: None,
        description,
    }
}

const fn query(
    name: &'static str,
    wire: &'static str,
    kind: ParamKind,
    description: &'static str,
) -> Param {
    Param {
        name,
        kind,
        target: Target::Query(wire),
        required: false,
        fallback: None,
        description,
    }
}

const fn local(name: &'static str, kind: ParamKind, description: &'static str) -> Param {
    Param {
        name,
        kind,
        target: Target::Local,
        required: false,
        fallback: None,
        description,
    }
}

const fn body(kind: ParamKind, description: &'static str) -> Param {
    Param {
        name: "body",
        kind,
        target: Target::Body,
        required: true,
        fallback: None,
        description,
    }
}

const fn int(min: Option<i64>, max: Option<i64>) -> ParamKind {
    ParamKind::Integer { min, max }
}

const INT: ParamKind = ParamKind::Integer {
    min: None,
    max: None,
};

/// Post-processing applied to a successful response, or body defaults
/// applied before sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Raw,
    DashboardList,
    MonitorSummary,
    LogsSearch,
    LogsAggregate,
}

#[derive(Debug, Clone, Copy)]
pub struct CuratedTool {
    pub name: &'static str,
    pub description: &'static str,
    pub method: &'static str,
    pub url_template: &'static str,
    pub params: &'static [Param],
    pub shape: Shape,
}

/// Table row: name, description, method, URL template, parameters and an
/// optional response shape.
macro_rules! curated {
    (@shape) => {
        Shape::Raw
    };
    (@shape $shape:ident) => {
        Shape::$shape
    };
    (
        $name:literal,
        $description:literal,
        $method:literal,
        $url:literal,
        [$($param:expr),* $(,)?]
        $(, $shape:ident)? $(,)?
    ) => {
        CuratedTool {
            name: $name,
            description: $description,
            method: $method,
            url_template: $url,
            params: &[$($param),*],
            shape: curated!(@shape $($shape)?),
        }
    };
}

impl CuratedTool {
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in self.params {
            properties.insert(param.name.to_string(), param_schema(param));
            if param.required {
                required.push(Value::String(param.name.to_string()));
            }
        }
        let mut schema = json!({
            "type": "object",
            "properties": properties,
            "additionalProperties": false,
        });
        if !required.is_empty() {
            schema["required"] = Value::Array(required);
        }
        schema
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name.to_string(),
            description: self.description.to_string(),
            input_schema: self.input_schema(),
        }
    }

    /// Maps validated arguments onto a call. Returns the call and the
    /// arguments the tool keeps for itself.
    pub fn build_call(&self, args: &Value) -> Result<(ApiCall, Map<String, Value>), ToolError> {
        let empty = Map::new();
        let obj = match args {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => return Err(ToolError::invalid_params("Arguments must be an object")),
        };
        let mut call = ApiCall::new(self.method, self.url_template);
        let mut locals = Map::new();
        for param in self.params {
            let value = obj
                .get(param.name)
                .filter(|v| !v.is_null())
                .cloned()
                .or_else(|| param.fallback.map(Fallback::to_value));
            let Some(value) = value else {
                if param.required {
                    return Err(ToolError::invalid_params(format!(
                        "{}: missing required field '{}'",
                        self.name, param.name
                    )));
                }
                continue;
            };
            match param.target {
                Target::Path => {
                    call.path.insert(param.name.to_string(), value);
                }
                Target::Query(wire) => {
                    call.query.insert(wire.to_string(), value);
                }
                Target::Body => call.body = Some(value),
                Target::Local => {
                    locals.insert(param.name.to_string(), value);
                }
            }
        }
        match self.shape {
            Shape::LogsSearch => {
                let body = call.body.get_or_insert_with(|| json!({}));
                default_field(body, "page", json!({"limit": 25}));
                default_field(body, "filter", json!({"from": "now-15m"}));
            }
            Shape::LogsAggregate => {
                let body = call.body.get_or_insert_with(|| json!({}));
                default_field(body, "filter", json!({"from": "now-15m"}));
            }
            _ => {}
        }
        Ok((call, locals))
    }
}

fn default_field(body: &mut Value, key: &str, fallback: Value) {
    if let Value::Object(map) = body {
        let missing = map
            .get(key)
            .map(|v| v.is_null() || v == &json!({}))
            .unwrap_or(true);
        if missing {
            map.insert(key.to_string(), fallback);
        }
    }
}

fn param_schema(param: &Param) -> Value {
    let mut schema = match param.kind {
        ParamKind::Text => json!({"type": "string"}),
        ParamKind::Integer { min, max } => {
            let mut out = json!({"type": "integer"});
            if let Some(min) = min {
                out["minimum"] = json!(min);
            }
            if let Some(max) = max {
                out["maximum"] = json!(max);
            }
            out
        }
        ParamKind::Flag => json!({"type": "boolean"}),
        ParamKind::Id => json!({"type": ["string", "integer"]}),
        ParamKind::TextList => json!({"type": "array", "items": {"type": "string"}}),
        ParamKind::Object => json!({"type": "object"}),
        ParamKind::ObjectOrArray => json!({"type": ["object", "array"]}),
        ParamKind::Choice(options) => json!({"type": "string", "enum": options}),
    };
    if !param.description.is_empty() {
        schema["description"] = json!(param.description);
    }
    if let Some(fallback) = param.fallback {
        schema["default"] = fallback.to_value();
    }
    schema
}

pub static CURATED_TOOLS: &[CuratedTool] = &[
    // Dashboards
    curated!(
        "list_dashboards",
        "List dashboards with optional name/tags filters",
        "GET",
        "{{baseUrl}}/api/v1/dashboard",
        [
            local("name", ParamKind::Text, "Filter dashboards by name (substring match)"),
            local(
                "tags",
                ParamKind::TextList,
                "Filter dashboards by tags (client-side, checks description CSV)"
            ),
            query("count", "count", int(Some(1), Some(1000)), "Max dashboards per page")
                .or(Fallback::Int(100)),
            query("start", "start", int(Some(0), None), "Offset for pagination")
                .or(Fallback::Int(0)),
            query("shared", "filter[shared]", ParamKind::Flag, "Only shared dashboards")
                .or(Fallback::Flag(false)),
        ],
        DashboardList,
    ),
    curated!(
        "get_dashboard_by_id",
        "Get dashboard by ID",
        "GET",
        "{{baseUrl}}/api/v1/dashboard/:dashboard_id",
        [path("dashboard_id", ParamKind::Text, "Dashboard ID")],
    ),
    curated!(
        "create_dashboard_v1",
        "Create a dashboard",
        "POST",
        "{{baseUrl}}/api/v1/dashboard",
        [body(ParamKind::Object, "Dashboard definition")],
    ),
    curated!(
        "update_dashboard_v1",
        "Update a dashboard",
        "PUT",
        "{{baseUrl}}/api/v1/dashboard/:dashboard_id",
        [
            path("dashboard_id", ParamKind::Text, "Dashboard ID"),
            body(ParamKind::Object, "Dashboard definition"),
        ],
    ),
    curated!(
        "delete_dashboard_v1",
        "Delete a dashboard",
        "DELETE",
        "{{baseUrl}}/api/v1/dashboard/:dashboard_id",
        [path("dashboard_id", ParamKind::Text, "Dashboard ID")],
    ),
    // Monitors
    curated!(
        "list_monitors",
        "List monitors (common filters supported)",
        "GET",
        "{{baseUrl}}/api/v1/monitor",
        [
            query("name", "name", ParamKind::Text, "Search monitors by name"),
            query("tags", "tags", ParamKind::Text, "Comma-separated tags, e.g. team:core,env:prod"),
            query("monitor_tags", "monitor_tags", ParamKind::Text, "Comma-separated monitor tags"),
            query(
                "group_states",
                "group_states",
                ParamKind::Text,
                "Comma-separated states, e.g. alert,ok,no data,warn"
            ),
            query("page", "page", int(Some(0), None), "").or(Fallback::Int(0)),
            query("page_size", "page_size", int(Some(1), Some(1000)), "").or(Fallback::Int(100)),
            query("with_downtimes", "with_downtimes", ParamKind::Flag, "").or(Fallback::Flag(true)),
        ],
        MonitorSummary,
    ),
    curated!(
        "get_monitor_by_id",
        "Get a monitor by ID",
        "GET",
        "{{baseUrl}}/api/v1/monitor/:monitor_id",
        [path("monitor_id", ParamKind::Id, "Monitor ID")],
    ),
    curated!(
        "create_monitor_v1",
        "Create a monitor",
        "POST",
        "{{baseUrl}}/api/v1/monitor",
        [body(ParamKind::Object, "Datadog monitor definition body")],
    ),
    curated!(
        "update_monitor_v1",
        "Update a monitor",
        "PUT",
        "{{baseUrl}}/api/v1/monitor/:monitor_id",
        [
            path("monitor_id", ParamKind::Id, "Monitor ID"),
            body(ParamKind::Object, "Datadog monitor definition body"),
        ],
    ),
    curated!(
        "mute_monitor_v1",
        "Mute a monitor",
        "POST",
        "{{baseUrl}}/api/v1/monitor/:monitor_id/mute",
        [
            path("monitor_id", ParamKind::Id, "Monitor ID"),
            body(ParamKind::Object, "Mute options (scope, end)").or(Fallback::EmptyObject),
        ],
    ),
    curated!(
        "unmute_monitor_v1",
        "Unmute a monitor",
        "POST",
        "{{baseUrl}}/api/v1/monitor/:monitor_id/unmute",
        [path("monitor_id", ParamKind::Id, "Monitor ID")],
    ),
    curated!(
        "delete_monitor_v1",
        "Delete a monitor",
        "DELETE",
        "{{baseUrl}}/api/v1/monitor/:monitor_id",
        [path("monitor_id", ParamKind::Id, "Monitor ID")],
    ),
    // Logs
    curated!(
        "logs_send",
        "Send logs to intake",
        "POST",
        "https://http-intake.logs.{{site}}/api/v2/logs",
        [body(ParamKind::ObjectOrArray, "Array of log events or a single log object")],
    ),
    curated!(
        "logs_search_events",
        "Search logs (events)",
        "POST",
        "{{baseUrl}}/api/v2/logs/events/search",
        [body(
            ParamKind::Object,
            "Search request; page and filter default to limit 25, last 15 minutes"
        )],
        LogsSearch,
    ),
    curated!(
        "logs_aggregate_analytics",
        "Aggregate logs analytics",
        "POST",
        "{{baseUrl}}/api/v2/logs/analytics/aggregate",
        [body(ParamKind::Object, "Aggregate request; filter defaults to the last 15 minutes")],
        LogsAggregate,
    ),
    // Metrics
    curated!(
        "metrics_submit_series",
        "Submit metrics (v2 series)",
        "POST",
        "{{baseUrl}}/api/v2/series",
        [body(ParamKind::Object, "v2 series payload")],
    ),
    curated!(
        "metrics_query_timeseries",
        "Metrics: query timeseries",
        "POST",
        "{{baseUrl}}/api/v2/query/timeseries",
        [body(ParamKind::Object, "Timeseries query request")],
    ),
    curated!(
        "metrics_query_scalars",
        "Metrics: query scalars",
        "POST",
        "{{baseUrl}}/api/v2/query/scalar",
        [body(ParamKind::Object, "Scalar query request")],
    ),
    // Incidents
    curated!(
        "incidents_list",
        "List incidents",
        "GET",
        "{{baseUrl}}/api/v2/incidents",
        [
            query("query", "filter", ParamKind::Text, "Incident filter"),
            query("pageSize", "page[size]", int(Some(1), Some(100)), ""),
            query("pageOffset", "page[offset]", int(Some(0), None), ""),
        ],
    ),
    curated!(
        "incidents_get",
        "Get incident by ID",
        "GET",
        "{{baseUrl}}/api/v2/incidents/:incident_id",
        [path("incident_id", ParamKind::Text, "Incident ID")],
    ),
    curated!(
        "incidents_create",
        "Create incident",
        "POST",
        "{{baseUrl}}/api/v2/incidents",
        [body(ParamKind::Object, "Incident create request")],
    ),
    curated!(
        "incidents_update",
        "Update incident",
        "PATCH",
        "{{baseUrl}}/api/v2/incidents/:incident_id",
        [
            path("incident_id", ParamKind::Text, "Incident ID"),
            body(ParamKind::Object, "Incident update request"),
        ],
    ),
    // Downtimes
    curated!(
        "downtimes_list",
        "List downtimes",
        "GET",
        "{{baseUrl}}/api/v1/downtime",
        [query("current_only", "current_only", ParamKind::Flag, "Only active downtimes")],
    ),
    curated!(
        "downtimes_create",
        "Schedule downtime",
        "POST",
        "{{baseUrl}}/api/v1/downtime",
        [body(ParamKind::Object, "Downtime definition")],
    ),
    curated!(
        "downtimes_cancel",
        "Cancel downtime",
        "DELETE",
        "{{baseUrl}}/api/v1/downtime/:downtime_id",
        [path("downtime_id", ParamKind::Id, "Downtime ID")],
    ),
    // Events
    curated!(
        "events_post",
        "Post event",
        "POST",
        "{{baseUrl}}/api/v1/events",
        [body(ParamKind::Object, "Event payload")],
    ),
    curated!(
        "events_list",
        "List events",
        "GET",
        "{{baseUrl}}/api/v1/events",
        [
            query("start", "start", INT, "POSIX start time (seconds)"),
            query("end", "end", INT, "POSIX end time (seconds)"),
            query("priority", "priority", ParamKind::Text, ""),
            query("sources", "sources", ParamKind::Text, ""),
            query("tags", "tags", ParamKind::Text, ""),
            query("unaggregated", "unaggregated", ParamKind::Flag, ""),
        ],
    ),
    // Notebooks
    curated!(
        "notebooks_list",
        "List notebooks",
        "GET",
        "{{baseUrl}}/api/v1/notebooks",
        [
            query("start", "start", INT, ""),
            query("count", "count", INT, ""),
            query("sort_field", "sort_field", ParamKind::Text, ""),
            query("sort_dir", "sort_dir", ParamKind::Choice(&["asc", "desc"]), ""),
            query("query", "query", ParamKind::Text, ""),
        ],
    ),
    curated!(
        "notebooks_get",
        "Get a notebook by ID",
        "GET",
        "{{baseUrl}}/api/v1/notebooks/:notebook_id",
        [path("notebook_id", ParamKind::Id, "Notebook ID")],
    ),
    curated!(
        "notebooks_create",
        "Create a notebook",
        "POST",
        "{{baseUrl}}/api/v1/notebooks",
        [body(ParamKind::Object, "Notebook definition")],
    ),
    curated!(
        "notebooks_update",
        "Update a notebook",
        "PUT",
        "{{baseUrl}}/api/v1/notebooks/:notebook_id",
        [
            path("notebook_id", ParamKind::Id, "Notebook ID"),
            body(ParamKind::Object, "Notebook definition"),
        ],
    ),
    curated!(
        "notebooks_delete",
        "Delete a notebook",
        "DELETE",
        "{{baseUrl}}/api/v1/notebooks/:notebook_id",
        [path("notebook_id", ParamKind::Id, "Notebook ID")],
    ),
    // Synthetics
    curated!(
        "synthetics_list_tests",
        "List Synthetics tests",
        "GET",
        "{{baseUrl}}/api/v1/synthetics/tests",
        [
            query("page", "page", INT, ""),
            query("page_size", "page_size", INT, ""),
        ],
    ),
    curated!(
        "synthetics_get_test",
        "Get a Synthetics test",
        "GET",
        "{{baseUrl}}/api/v1/synthetics/tests/:public_id",
        [path("public_id", ParamKind::Text, "Public test ID")],
    ),
    curated!(
        "synthetics_create_test",
        "Create a Synthetics test",
        "POST",
        "{{baseUrl}}/api/v1/synthetics/tests",
        [body(ParamKind::Object, "Test definition")],
    ),
    curated!(
        "synthetics_update_test",
        "Update a Synthetics test",
        "PUT",
        "{{baseUrl}}/api/v1/synthetics/tests/:public_id",
        [
            path("public_id", ParamKind::Text, "Public test ID"),
            body(ParamKind::Object, "Test definition"),
        ],
    ),
    curated!(
        "synthetics_delete_test",
        "Delete a Synthetics test",
        "DELETE",
        "{{baseUrl}}/api/v1/synthetics/tests/:public_id",
        [path("public_id", ParamKind::Text, "Public test ID")],
    ),
    // Service level objectives
    curated!(
        "slos_list",
        "List Service Level Objectives",
        "GET",
        "{{baseUrl}}/api/v1/slo",
        [
            query("query", "query", ParamKind::Text, ""),
            query("page", "page", INT, ""),
            query("limit", "limit", INT, ""),
        ],
    ),
    curated!(
        "slos_get",
        "Get SLO by ID",
        "GET",
        "{{baseUrl}}/api/v1/slo/:slo_id",
        [path("slo_id", ParamKind::Text, "SLO ID")],
    ),
    curated!(
        "slos_create",
        "Create SLO",
        "POST",
        "{{baseUrl}}/api/v1/slo",
        [body(ParamKind::Object, "SLO definition")],
    ),
    curated!(
        "slos_update",
        "Update SLO",
        "PUT",
        "{{baseUrl}}/api/v1/slo/:slo_id",
        [
            path("slo_id", ParamKind::Text, "SLO ID"),
            body(ParamKind::Object, "SLO definition"),
        ],
    ),
    curated!(
        "slos_delete",
        "Delete SLO",
        "DELETE",
        "{{baseUrl}}/api/v1/slo/:slo_id",
        [path("slo_id", ParamKind::Text, "SLO ID")],
    ),
    // Users, roles, teams
    curated!(
        "users_list",
        "List users",
        "GET",
        "{{baseUrl}}/api/v2/users",
        [
            query("pageSize", "page[size]", INT, ""),
            query("pageNumber", "page[number]", INT, ""),
            query("filter", "filter", ParamKind::Text, ""),
        ],
    ),
    curated!(
        "users_get",
        "Get a user by ID",
        "GET",
        "{{baseUrl}}/api/v2/users/:user_id",
        [path("user_id", ParamKind::Text, "User ID")],
    ),
    curated!(
        "users_create",
        "Create user",
        "POST",
        "{{baseUrl}}/api/v2/users",
        [body(ParamKind::Object, "User create request")],
    ),
    curated!(
        "users_update",
        "Update user",
        "PATCH",
        "{{baseUrl}}/api/v2/users/:user_id",
        [
            path("user_id", ParamKind::Text, "User ID"),
            body(ParamKind::Object, "User update request"),
        ],
    ),
    curated!(
        "roles_list",
        "List roles",
        "GET",
        "{{baseUrl}}/api/v2/roles",
        [
            query("pageSize", "page[size]", INT, ""),
            query("pageNumber", "page[number]", INT, ""),
        ],
    ),
    curated!(
        "roles_get",
        "Get role by ID",
        "GET",
        "{{baseUrl}}/api/v2/roles/:role_id",
        [path("role_id", ParamKind::Text, "Role ID")],
    ),
    curated!(
        "teams_list",
        "List teams",
        "GET",
        "{{baseUrl}}/api/v2/teams",
        [
            query("filter_keyword", "filter[keyword]", ParamKind::Text, ""),
            query("pageSize", "page[size]", INT, ""),
            query("pageNumber", "page[number]", INT, ""),
        ],
    ),
    curated!(
        "teams_get",
        "Get team by ID",
        "GET",
        "{{baseUrl}}/api/v2/teams/:team_id",
        [path("team_id", ParamKind::Text, "Team ID")],
    ),
];

pub fn curated_tool(name: &str) -> Option<&'static CuratedTool> {
    CURATED_TOOLS.iter().find(|tool| tool.name == name)
}

pub struct CuratedHandler {
    tool: &'static CuratedTool,
    executor: Arc<HttpExecutor>,
}

impl CuratedHandler {
    pub fn new(tool: &'static CuratedTool, executor: Arc<HttpExecutor>) -> Self {
        Self { tool, executor }
    }

    fn shape_success(&self, outcome: RequestOutcome, locals: &Map<String, Value>) -> Value {
        match self.tool.shape {
            Shape::DashboardList => {
                let site = self.executor.site().to_string();
                filter_dashboards(&outcome.data, locals, &site)
            }
            Shape::MonitorSummary => summarize_monitors(&outcome.data),
            _ => outcome.data,
        }
    }
}

#[async_trait]
impl ToolHandler for CuratedHandler {
    async fn handle(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let (call, locals) = self.tool.build_call(&args)?;
        let outcome = self.executor.execute(&call).await?;
        if !outcome.ok {
            return Ok(ToolOutput::error_text(format!(
                "{} failed: HTTP {} {}",
                self.tool.name,
                outcome.status,
                compact(&outcome.data)
            )));
        }
        let data = self.shape_success(outcome, &locals);
        Ok(ToolOutput::text(compact(&data)))
    }
}

fn compact(data: &Value) -> String {
    match data {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Name substring and description-CSV tag filters, plus an app link per
/// dashboard.
pub fn filter_dashboards(data: &Value, locals: &Map<String, Value>, site: &str) -> Value {
    let name = locals
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_lowercase)
        .filter(|n| !n.is_empty());
    let tags: Vec<&str> = locals
        .get("tags")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let dashboards = data
        .get("dashboards")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let filtered: Vec<Value> = dashboards
        .into_iter()
        .filter(|d| match &name {
            Some(needle) => d
                .get("title")
                .and_then(Value::as_str)
                .map(|t| t.to_lowercase().contains(needle))
                .unwrap_or(false),
            None => true,
        })
        .filter(|d| {
            if tags.is_empty() {
                return true;
            }
            let declared: Vec<&str> = d
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("")
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect();
            tags.iter().all(|t| declared.contains(t))
        })
        .map(|mut d| {
            let id = d.get("id").map(crate::http::template::render_scalar).unwrap_or_default();
            if let Value::Object(map) = &mut d {
                map.insert(
                    "url".to_string(),
                    Value::String(format!("https://app.{}/dashboard/{}", site, id)),
                );
            }
            d
        })
        .collect();
    Value::Array(filtered)
}

pub fn summarize_monitors(data: &Value) -> Value {
    let monitors = data.as_array().cloned().unwrap_or_default();
    Value::Array(
        monitors
            .iter()
            .map(|m| {
                json!({
                    "id": m.get("id").cloned().unwrap_or(Value::Null),
                    "name": m.get("name").cloned().unwrap_or(Value::Null),
                    "type": m.get("type").cloned().unwrap_or(Value::Null),
                    "overall_state": m.get("overall_state").cloned().unwrap_or(Value::Null),
                    "tags": m.get("tags").cloned().unwrap_or(Value::Null),
                })
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn curated_names_are_unique_and_schemas_strict() {
        let mut seen = HashSet::new();
        for tool in CURATED_TOOLS {
            assert!(seen.insert(tool.name), "duplicate curated tool {}", tool.name);
            let schema = tool.input_schema();
            assert_eq!(schema["additionalProperties"], false);
            assert!(jsonschema::JSONSchema::compile(&schema).is_ok(), "{}", tool.name);
        }
    }

    #[test]
    fn list_monitors_applies_defaults() {
        let tool = curated_tool("list_monitors").expect("present");
        let (call, _) = tool.build_call(&json!({"name": "cpu"})).expect("call");
        assert_eq!(call.query["name"], "cpu");
        assert_eq!(call.query["page_size"], 100);
        assert_eq!(call.query["with_downtimes"], true);
        assert!(call.body.is_none());
    }

    #[test]
    fn renamed_query_keys_and_required_path() {
        let tool = curated_tool("incidents_list").expect("present");
        let (call, _) = tool.build_call(&json!({"pageSize": 5, "query": "sev1"})).expect("call");
        assert_eq!(call.query["page[size]"], 5);
        assert_eq!(call.query["filter"], "sev1");

        let get = curated_tool("get_monitor_by_id").expect("present");
        assert!(get.build_call(&json!({})).is_err());
        let (call, _) = get.build_call(&json!({"monitor_id": 7})).expect("call");
        assert_eq!(call.path["monitor_id"], 7);
    }

    #[test]
    fn logs_search_fills_page_and_filter() {
        let tool = curated_tool("logs_search_events").expect("present");
        let (call, _) = tool
            .build_call(&json!({"body": {"filter": {"query": "service:web"}}}))
            .expect("call");
        let body = call.body.expect("body");
        assert_eq!(body["page"]["limit"], 25);
        assert_eq!(body["filter"]["query"], "service:web");
    }

    #[test]
    fn dashboard_filters_and_urls() {
        let data = json!({"dashboards": [
            {"id": "abc-123", "title": "Web Overview", "description": "team:web, env:prod"},
            {"id": "def-456", "title": "DB Overview", "description": "team:db"},
        ]});
        let mut locals = Map::new();
        locals.insert("name".to_string(), json!("overview"));
        locals.insert("tags".to_string(), json!(["team:web"]));
        let out = filter_dashboards(&data, &locals, "datadoghq.eu");
        let arr = out.as_array().expect("array");
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0]["url"], "https://app.datadoghq.eu/dashboard/abc-123");
    }

    #[test]
    fn monitor_summary_is_slim() {
        let out = summarize_monitors(&json!([{
            "id": 1,
            "name": "cpu",
            "type": "metric alert",
            "overall_state": "OK",
            "tags": [],
            "query": "avg(...)"
        }]));
        assert!(out[0].get("query").is_none());
        assert_eq!(out[0]["overall_state"], "OK");
    }
}
