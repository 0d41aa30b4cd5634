//! Execution session lifecycle.
//!
//! One controller owns one session slot. `execute()` drives a full run:
//! reset, connect, stream (or decode a single JSON body), finalize.
//! Re-running from a terminal state is a fresh session with the same
//! configuration, never a resume.

use std::sync::{Arc, Mutex};

use agentdeck_core::{ExecutionSession, ExecutionStatus};
use events::{Event, EventBus};
use reqwest::header::CONTENT_TYPE;
use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::error::{AgentClientError, Result};
use crate::stream::{StreamConsumer, StreamOutcome};
use crate::types::{DirectResponse, ExecuteRequest};

/// Drives executions against one remote endpoint.
///
/// The session state is a plain container: render layers read it through
/// `snapshot()` or subscribe to the bus, and never mutate it directly.
pub struct ExecutionController {
    endpoint: String,
    client: reqwest::Client,
    bus: EventBus,
    session: Arc<Mutex<ExecutionSession>>,
    cancel: Mutex<Arc<CancelToken>>,
}

impl ExecutionController {
    pub fn new(endpoint: impl Into<String>, bus: EventBus) -> Self {
        Self::with_client(endpoint, bus, reqwest::Client::new())
    }

    pub fn with_client(endpoint: impl Into<String>, bus: EventBus, client: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
            bus,
            session: Arc::new(Mutex::new(ExecutionSession::new())),
            cancel: Mutex::new(Arc::new(CancelToken::new())),
        }
    }

    /// Owned view of the current session for display: status, output,
    /// artifacts, elapsed clock.
    pub fn snapshot(&self) -> ExecutionSession {
        self.session.lock().unwrap().clone()
    }

    pub fn status(&self) -> ExecutionStatus {
        self.session.lock().unwrap().status
    }

    /// Trigger cancellation of the in-flight run. Idempotent; a no-op
    /// when nothing is running or the session is already terminal.
    pub fn cancel(&self) {
        self.cancel.lock().unwrap().cancel();
    }

    /// Run one execution to a terminal state and return the final session.
    ///
    /// Valid from idle or any terminal status; calling while a run is
    /// active is a caller error. Transport failures, terminal error
    /// events, and cancellation all come back as `Ok` with the session
    /// in the matching terminal status: the error taxonomy is surfaced
    /// in-band, not thrown.
    pub async fn execute(&self, request: &ExecuteRequest) -> Result<ExecutionSession> {
        let session_id = {
            let mut session = self.session.lock().unwrap();
            if session.status.is_active() {
                return Err(AgentClientError::RunInProgress);
            }
            *session = ExecutionSession::new();
            session.begin();
            session.id
        };

        let cancel = Arc::new(CancelToken::new());
        *self.cancel.lock().unwrap() = cancel.clone();

        info!(session_id = %session_id, endpoint = %self.endpoint, "execution started");
        self.bus.publish(Event::SessionStarted { session_id });

        let consumer = StreamConsumer::new(self.session.clone(), self.bus.clone());

        let response = tokio::select! {
            _ = cancel.cancelled() => {
                return Ok(self.finalize(ExecutionSession::cancel));
            }
            result = self.client.post(&self.endpoint).json(request).send() => result,
        };

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                return Ok(self.finalize(move |s| s.fail(format!("request failed: {e}"))));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Ok(self.finalize(move |s| {
                s.fail(format!("endpoint returned status {status}: {body}"))
            }));
        }

        self.session.lock().unwrap().mark_streaming();

        if is_event_stream(&response) {
            let outcome = consumer.consume(response, &cancel).await;
            let final_session = self.finalize(move |s| match outcome {
                StreamOutcome::Completed => s.complete(),
                StreamOutcome::Cancelled => s.cancel(),
                StreamOutcome::Failed(message) => s.fail(message),
            });
            return Ok(final_session);
        }

        // Non-streaming path: one JSON body decoded synchronously.
        let body = tokio::select! {
            _ = cancel.cancelled() => {
                return Ok(self.finalize(ExecutionSession::cancel));
            }
            body = response.text() => body,
        };

        let final_session = match body {
            Ok(text) => {
                match serde_json::from_str::<DirectResponse>(&text) {
                    Ok(direct) => consumer.apply_direct(direct),
                    // An unstructured body is still output, same rule as
                    // unstructured stream lines.
                    Err(_) => {
                        warn!(session_id = %session_id, "non-JSON response body, kept as plain output");
                        consumer.apply_direct(DirectResponse {
                            output: Some(text),
                            ..Default::default()
                        });
                    }
                }
                self.finalize(ExecutionSession::complete)
            }
            Err(e) => self.finalize(move |s| s.fail(format!("failed to read response: {e}"))),
        };

        Ok(final_session)
    }

    /// Apply the terminal transition and publish the completion
    /// notification. Runs exactly once per `execute()` call; the
    /// is-terminal guard in the session mutators keeps a racing cancel
    /// from overwriting the first terminal status.
    fn finalize(&self, apply: impl FnOnce(&mut ExecutionSession)) -> ExecutionSession {
        let snapshot = {
            let mut session = self.session.lock().unwrap();
            apply(&mut session);
            session.clone()
        };

        info!(
            session_id = %snapshot.id,
            status = snapshot.status.as_str(),
            elapsed_seconds = snapshot.elapsed_seconds(),
            "execution finished"
        );

        self.bus.publish(Event::SessionFinished {
            session_id: snapshot.id,
            status: snapshot.status,
            output: snapshot.output.clone(),
            artifacts: snapshot.artifacts.clone(),
        });

        snapshot
    }
}

fn is_event_stream(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|ct| ct.starts_with("text/event-stream"))
        .unwrap_or(false)
}
