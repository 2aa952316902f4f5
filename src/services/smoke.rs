use crate::http::{ApiCall, HttpExecutor, RequestOutcome};
use crate::services::tool_executor::pretty_data;
use crate::utils::text::truncate_chars;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Instant;

const EVENTS_WINDOW_SECS: i64 = 600;
const DETAIL_MAX_CHARS: usize = 300;

#[derive(Debug, Clone, Serialize)]
pub struct SmokeCheck {
    pub name: String,
    pub ok: bool,
    pub status: Option<u16>,
    pub detail: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SmokeReport {
    pub ok: bool,
    pub site: String,
    pub checks: Vec<SmokeCheck>,
}

impl SmokeReport {
    pub fn render_text(&self) -> String {
        let mut out = format!(
            "Smoke test against {}: {}\n",
            self.site,
            if self.ok { "OK" } else { "FAILED" }
        );
        for check in &self.checks {
            let status = check
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(
                "  [{}] {} (HTTP {}, {} ms) {}\n",
                if check.ok { "ok" } else { "FAIL" },
                check.name,
                status,
                check.duration_ms,
                check.detail
            ));
        }
        out
    }
}

/// Read-only calls that prove keys, site and network path work together.
pub fn smoke_calls(now_secs: i64) -> Vec<(&'static str, ApiCall)> {
    vec![
        (
            "validate_api_key",
            ApiCall::new("GET", "{{baseUrl}}/api/v1/validate"),
        ),
        (
            "list_monitors",
            ApiCall::new("GET", "{{baseUrl}}/api/v1/monitor").with_query("page_size", json!(1)),
        ),
        (
            "list_events",
            ApiCall::new("GET", "{{baseUrl}}/api/v1/events")
                .with_query("start", json!(now_secs - EVENTS_WINDOW_SECS))
                .with_query("end", json!(now_secs))
                .with_query("priority", json!("normal")),
        ),
    ]
}

fn judge(name: &str, outcome: &RequestOutcome) -> (bool, String) {
    if !outcome.ok {
        return (
            false,
            truncate_chars(&pretty_data(&outcome.data), DETAIL_MAX_CHARS),
        );
    }
    if name == "validate_api_key" {
        let valid = outcome.data.get("valid").and_then(Value::as_bool) == Some(true);
        let detail = if valid { "valid: true" } else { "response did not report valid: true" };
        return (valid, detail.to_string());
    }
    (true, format!("{} attempt(s)", outcome.attempts))
}

pub async fn run_smoke_checks(executor: &HttpExecutor) -> SmokeReport {
    let now = chrono::Utc::now().timestamp();
    let mut checks = Vec::new();
    for (name, call) in smoke_calls(now) {
        let started = Instant::now();
        let result = executor.execute(&call).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        let check = match result {
            Ok(outcome) => {
                let (ok, detail) = judge(name, &outcome);
                SmokeCheck {
                    name: name.to_string(),
                    ok,
                    status: Some(outcome.status),
                    detail,
                    duration_ms,
                }
            }
            Err(err) => SmokeCheck {
                name: name.to_string(),
                ok: false,
                status: None,
                detail: err.message,
                duration_ms,
            },
        };
        checks.push(check);
    }
    SmokeReport {
        ok: checks.iter().all(|c| c.ok),
        site: executor.site().to_string(),
        checks,
    }
}
