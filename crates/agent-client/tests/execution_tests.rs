use std::sync::Arc;
use std::time::Duration;

use agent_client::{ExecuteRequest, ExecutionController, LinkMonitor, LinkMonitorConfig};
use agentdeck_core::{ArtifactKind, ExecutionStatus, LinkHealth};
use events::{Event, EventBus};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/event-stream")
}

#[tokio::test]
async fn streaming_execution_accumulates_output_and_artifacts() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"type\":\"status\",\"message\":\"starting\"}\n",
        ": keep-alive\n",
        "data: {\"type\":\"output\",\"content\":\"hello \"}\n",
        "data: {\"type\":\"output\",\"content\":\"world\"}\n",
        "data: {\"type\":\"artifact\",\"artifact\":{\"name\":\"plan.md\",\"kind\":\"file\",\"content\":\"- step\"}}\n",
        "data: [DONE]\n",
    );
    Mock::given(method("POST"))
        .and(path("/execute"))
        .respond_with(sse_response(body))
        .mount(&server)
        .await;

    let controller =
        ExecutionController::new(format!("{}/execute", server.uri()), EventBus::new());
    let session = controller
        .execute(&ExecuteRequest::new("greet"))
        .await
        .unwrap();

    assert_eq!(session.status, ExecutionStatus::Completed);
    assert_eq!(session.output, "hello world");
    assert_eq!(session.artifacts.len(), 1);
    assert_eq!(session.artifacts[0].name, "plan.md");
    assert_eq!(session.artifacts[0].kind, ArtifactKind::File);
}

#[tokio::test]
async fn raw_lines_fall_back_to_plain_output() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: building image...\n",
        "data: {\"type\":\"output\",\"content\":\"done\"}\n",
        "data: [DONE]\n",
    );
    Mock::given(method("POST"))
        .and(path("/execute"))
        .respond_with(sse_response(body))
        .mount(&server)
        .await;

    let controller =
        ExecutionController::new(format!("{}/execute", server.uri()), EventBus::new());
    let session = controller
        .execute(&ExecuteRequest::new("build"))
        .await
        .unwrap();

    assert_eq!(session.status, ExecutionStatus::Completed);
    assert!(session.output.contains("building image..."));
    assert!(session.output.contains("done"));
}

#[tokio::test]
async fn terminal_error_event_fails_the_session() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"type\":\"output\",\"content\":\"partial\"}\n",
        "data: {\"type\":\"error\",\"message\":\"agent crashed\",\"terminal\":true}\n",
    );
    Mock::given(method("POST"))
        .and(path("/execute"))
        .respond_with(sse_response(body))
        .mount(&server)
        .await;

    let controller =
        ExecutionController::new(format!("{}/execute", server.uri()), EventBus::new());
    let session = controller
        .execute(&ExecuteRequest::new("task"))
        .await
        .unwrap();

    assert_eq!(session.status, ExecutionStatus::Failed);
    assert!(session.output.contains("partial"));
    assert!(session.output.contains("agent crashed"));
    assert_eq!(session.error.as_deref(), Some("agent crashed"));
}

#[tokio::test]
async fn non_streaming_json_body_is_first_class() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "reply": "forty-two",
            "artifacts": [{"name": "answer.txt", "kind": "file", "content": "42"}]
        })))
        .mount(&server)
        .await;

    let controller =
        ExecutionController::new(format!("{}/execute", server.uri()), EventBus::new());
    let session = controller
        .execute(&ExecuteRequest::new("question"))
        .await
        .unwrap();

    assert_eq!(session.status, ExecutionStatus::Completed);
    assert_eq!(session.output, "forty-two");
    assert_eq!(session.artifacts.len(), 1);
}

#[tokio::test]
async fn json_body_error_field_is_surfaced_in_band() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "output": "partial result",
            "error": "tool unavailable"
        })))
        .mount(&server)
        .await;

    let controller =
        ExecutionController::new(format!("{}/execute", server.uri()), EventBus::new());
    let session = controller
        .execute(&ExecuteRequest::new("task"))
        .await
        .unwrap();

    // Uniform policy: the error is visible in the output, the session
    // still completes.
    assert_eq!(session.status, ExecutionStatus::Completed);
    assert!(session.output.contains("partial result"));
    assert!(session.output.contains("tool unavailable"));
}

#[tokio::test]
async fn non_success_status_fails_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let controller =
        ExecutionController::new(format!("{}/execute", server.uri()), EventBus::new());
    let session = controller
        .execute(&ExecuteRequest::new("task"))
        .await
        .unwrap();

    assert_eq!(session.status, ExecutionStatus::Failed);
    assert!(session.output.contains("503"));
}

#[tokio::test]
async fn rerun_resets_output_and_artifacts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute"))
        .respond_with(sse_response(
            "data: {\"type\":\"output\",\"content\":\"run output\"}\ndata: [DONE]\n",
        ))
        .mount(&server)
        .await;

    let controller =
        ExecutionController::new(format!("{}/execute", server.uri()), EventBus::new());
    let request = ExecuteRequest::new("task");

    let first = controller.execute(&request).await.unwrap();
    let second = controller.execute(&request).await.unwrap();

    // Fresh session, no carryover: same text, not doubled, new id.
    assert_eq!(second.output, "run output");
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn cancellation_during_connect_yields_cancelled_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute"))
        .respond_with(
            sse_response("data: {\"type\":\"output\",\"content\":\"late\"}\ndata: [DONE]\n")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let controller = Arc::new(ExecutionController::new(
        format!("{}/execute", server.uri()),
        EventBus::new(),
    ));

    let run = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.execute(&ExecuteRequest::new("task")).await })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    controller.cancel();
    // Cancellation is idempotent.
    controller.cancel();

    let session = run.await.unwrap().unwrap();
    assert_eq!(session.status, ExecutionStatus::Cancelled);
    assert!(session.output.ends_with("[cancelled]"));
    assert!(!session.output.contains("late"));

    // Cancelling after the terminal state is a no-op.
    controller.cancel();
    assert_eq!(controller.status(), ExecutionStatus::Cancelled);
}

#[tokio::test]
async fn completion_notification_fires_exactly_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute"))
        .respond_with(sse_response(
            "data: {\"type\":\"output\",\"content\":\"x\"}\ndata: [DONE]\n",
        ))
        .mount(&server)
        .await;

    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    let controller = ExecutionController::new(format!("{}/execute", server.uri()), bus);
    controller.execute(&ExecuteRequest::new("task")).await.unwrap();

    let mut finished = 0;
    while let Ok(envelope) = rx.try_recv() {
        if let Event::SessionFinished { status, output, .. } = envelope.event {
            finished += 1;
            assert_eq!(status, ExecutionStatus::Completed);
            assert_eq!(output, "x");
        }
    }
    assert_eq!(finished, 1);
}

#[tokio::test]
async fn health_monitor_classifies_probe_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "degraded"
        })))
        .mount(&server)
        .await;

    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    let monitor = LinkMonitor::new(
        LinkMonitorConfig::new(format!("{}/health", server.uri()))
            .with_interval(Duration::from_millis(20)),
        bus,
    );
    monitor.start();

    let mut watcher = monitor.subscribe();
    tokio::time::timeout(Duration::from_secs(2), async {
        while *watcher.borrow() != LinkHealth::Degraded {
            watcher.changed().await.unwrap();
        }
    })
    .await
    .expect("monitor should observe degraded health");

    monitor.stop();
    assert_eq!(monitor.status(), LinkHealth::Degraded);

    let envelope = rx.try_recv().expect("health change should be published");
    assert!(matches!(
        envelope.event,
        Event::LinkHealthChanged {
            to: LinkHealth::Degraded,
            ..
        }
    ));
}
