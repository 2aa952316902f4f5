mod common;

use async_trait::async_trait;
use common::{quiet_logger, MockTransport};
use datadog_mcp::errors::{ToolError, ToolErrorKind};
use datadog_mcp::http::{
    ApiCall, Credentials, HttpExecutor, HttpRequest, HttpResponse, HttpTransport, RequestPolicy,
    RetryPolicy,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn credentials() -> Credentials {
    Credentials::new(Some("api-key-0123456".to_string()), Some("app-key-6543210".to_string()))
}

fn executor(transport: Arc<MockTransport>, base_delay_ms: u64) -> HttpExecutor {
    HttpExecutor::new(transport, credentials(), quiet_logger()).with_defaults(RequestPolicy {
        retry: RetryPolicy {
            base_delay_ms,
            ..RetryPolicy::default()
        },
        ..RequestPolicy::default()
    })
}

#[tokio::test(start_paused = true)]
async fn retry_after_seconds_delay_the_next_attempt() {
    let transport = Arc::new(MockTransport::new());
    transport
        .push(HttpResponse::new(429).with_header("Retry-After", "2"))
        .push(HttpResponse::new(200).with_json(&json!({"ok": true})));

    let outcome = executor(transport.clone(), 100)
        .execute(&ApiCall::new("GET", "{{baseUrl}}/api/v1/monitor"))
        .await
        .expect("outcome");

    assert!(outcome.ok);
    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.data, json!({"ok": true}));
    let recorded = transport.recorded();
    let gap = recorded[1].at - recorded[0].at;
    assert!(gap >= Duration::from_millis(2_000), "gap was {:?}", gap);
    assert!(gap < Duration::from_millis(2_100), "gap was {:?}", gap);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_return_the_last_response() {
    let transport = Arc::new(MockTransport::always(
        HttpResponse::new(503).with_json(&json!({"errors": ["unavailable"]})),
    ));

    let outcome = executor(transport.clone(), 100)
        .execute(&ApiCall::new("GET", "{{baseUrl}}/api/v1/hosts"))
        .await
        .expect("outcome");

    assert_eq!(transport.calls(), 3);
    assert_eq!(outcome.status, 503);
    assert!(!outcome.ok);
    assert_eq!(outcome.attempts, 3);

    let recorded = transport.recorded();
    let first = recorded[1].at - recorded[0].at;
    let second = recorded[2].at - recorded[1].at;
    assert!(first >= Duration::from_millis(100) && first < Duration::from_millis(200));
    assert!(second >= Duration::from_millis(200) && second < Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn server_errors_outside_the_retry_set_are_returned_at_once() {
    let transport = Arc::new(MockTransport::always(HttpResponse::new(500).with_text("boom")));
    let outcome = executor(transport.clone(), 100)
        .execute(&ApiCall::new("GET", "{{baseUrl}}/api/v1/hosts"))
        .await
        .expect("outcome");
    assert_eq!(transport.calls(), 1);
    assert_eq!(outcome.data, json!("boom"));
}

#[tokio::test]
async fn missing_credentials_make_no_network_call() {
    let transport = Arc::new(MockTransport::always(HttpResponse::new(200)));
    let exec = HttpExecutor::new(
        transport.clone(),
        Credentials::new(Some("api-key-0123456".to_string()), None),
        quiet_logger(),
    );
    let err = exec
        .execute(&ApiCall::new("GET", "{{baseUrl}}/api/v1/validate"))
        .await
        .expect_err("precondition");
    assert_eq!(err.kind, ToolErrorKind::Precondition);
    assert!(err.message.contains("DD_API_KEY and DD_APP_KEY"));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn url_headers_and_body_reach_the_transport() {
    let transport = Arc::new(MockTransport::always(
        HttpResponse::new(200).with_json(&json!({"id": 123})),
    ));
    let exec = executor(transport.clone(), 100).with_site("example.com", "api");
    let call = ApiCall::new("put", "{{baseUrl}}/api/v1/monitor/:monitor_id")
        .with_path("monitor_id", json!(123))
        .with_query("test", json!(1))
        .with_body(json!({"name": "cpu"}));

    let outcome = exec.execute(&call).await.expect("outcome");
    assert_eq!(outcome.url, "https://api.example.com/api/v1/monitor/123?test=1");
    assert_eq!(outcome.method, "PUT");

    let sent = &transport.recorded()[0].request;
    assert_eq!(sent.header("DD-API-KEY"), Some("api-key-0123456"));
    assert_eq!(sent.header("DD-APPLICATION-KEY"), Some("app-key-6543210"));
    assert_eq!(sent.header("accept"), Some("application/json"));
    assert!(sent.header("user-agent").unwrap_or("").starts_with("datadog-mcp/"));
    assert_eq!(sent.body.as_deref(), Some(r#"{"name":"cpu"}"#));
}

#[tokio::test]
async fn per_call_site_overrides_the_default() {
    let transport = Arc::new(MockTransport::always(HttpResponse::new(202)));
    let mut call = ApiCall::new("POST", "https://http-intake.logs.{{site}}/api/v2/logs")
        .with_body(json!([{"message": "hello"}]));
    call.site = Some("datadoghq.eu".to_string());
    let outcome = executor(transport.clone(), 100).execute(&call).await.expect("outcome");
    assert_eq!(outcome.url, "https://http-intake.logs.datadoghq.eu/api/v2/logs");
    assert!(outcome.ok);
}

#[tokio::test(start_paused = true)]
async fn retryable_transport_errors_are_retried() {
    let transport = Arc::new(MockTransport::new());
    transport
        .push_error(ToolError::retryable("connection reset"))
        .push(HttpResponse::new(200).with_json(&json!([])));
    let outcome = executor(transport.clone(), 50)
        .execute(&ApiCall::new("GET", "{{baseUrl}}/api/v1/dashboard"))
        .await
        .expect("outcome");
    assert_eq!(outcome.attempts, 2);
    assert_eq!(transport.calls(), 2);
}

struct Stalled;

#[async_trait]
impl HttpTransport for Stalled {
    async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, ToolError> {
        tokio::time::sleep(Duration::from_secs(3_600)).await;
        Ok(HttpResponse::new(200))
    }
}

#[tokio::test(start_paused = true)]
async fn attempts_time_out() {
    let exec = HttpExecutor::new(Arc::new(Stalled), credentials(), quiet_logger());
    let policy = RequestPolicy {
        timeout: Duration::from_millis(250),
        retry: RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::default()
        },
        ..RequestPolicy::default()
    };
    let err = exec
        .execute_with(&ApiCall::new("GET", "{{baseUrl}}/api/v1/hosts"), &policy)
        .await
        .expect_err("timeout");
    assert_eq!(err.kind, ToolErrorKind::Timeout);
    assert!(err.retryable);
}
