//! Stream consumption: folds decoded events into a session in decode order.

use std::sync::{Arc, Mutex};

use agentdeck_core::{Artifact, ArtifactKind, ExecutionSession};
use events::{Event, EventBus};
use futures::StreamExt;
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::frame::FrameDecoder;
use crate::protocol::{classify_line, StreamEvent};
use crate::types::DirectResponse;

/// How a consumed stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Terminal sentinel seen, or the channel closed without error.
    Completed,
    /// The cancel token fired; remaining buffered events were not applied.
    Cancelled,
    /// Transport error or an envelope flagged as a terminal error.
    Failed(String),
}

/// Applies one execution's decoded events to its session, in order.
///
/// Output deltas and artifacts are appended exactly as decoded; there is
/// no reordering and no coalescing beyond string concatenation.
pub struct StreamConsumer {
    session: Arc<Mutex<ExecutionSession>>,
    bus: EventBus,
}

impl StreamConsumer {
    pub fn new(session: Arc<Mutex<ExecutionSession>>, bus: EventBus) -> Self {
        Self { session, bus }
    }

    /// Drive a chunked response to its end, racing every read against the
    /// cancel token. Events already buffered when the token fires are
    /// dropped, not applied.
    pub async fn consume(
        &self,
        response: reqwest::Response,
        cancel: &CancelToken,
    ) -> StreamOutcome {
        let mut byte_stream = response.bytes_stream();
        let mut decoder = FrameDecoder::new();

        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => return StreamOutcome::Cancelled,
                next = byte_stream.next() => next,
            };

            let chunk = match next {
                None => break,
                Some(Err(e)) => return StreamOutcome::Failed(format!("stream error: {e}")),
                Some(Ok(bytes)) => bytes,
            };

            for line in decoder.push(&chunk) {
                if cancel.is_cancelled() {
                    return StreamOutcome::Cancelled;
                }
                if let Some(outcome) = self.apply_line(&line) {
                    return outcome;
                }
            }
        }

        if let Some(tail) = decoder.finish() {
            // Unterminated frames are dropped by contract.
            warn!(discarded = %tail, "stream ended with unterminated frame");
        }

        StreamOutcome::Completed
    }

    /// Apply one frame line. Returns `Some` when the stream must stop.
    fn apply_line(&self, line: &str) -> Option<StreamOutcome> {
        match classify_line(line)? {
            StreamEvent::Delta(delta) => {
                self.push_output(&delta);
                None
            }
            StreamEvent::Artifact(artifact) => {
                self.push_artifact(artifact);
                None
            }
            StreamEvent::Status(message) => {
                debug!(message = ?message, "status event");
                None
            }
            StreamEvent::ErrorMarker { message, terminal } => {
                if terminal {
                    Some(StreamOutcome::Failed(message))
                } else {
                    self.push_output(&format!("\n[error] {message}\n"));
                    None
                }
            }
            StreamEvent::Done => Some(StreamOutcome::Completed),
        }
    }

    /// Apply a non-streaming JSON body: the primary text field becomes the
    /// whole output and artifacts are copied through unchanged. An `error`
    /// field alongside a success response is surfaced in-band.
    pub fn apply_direct(&self, body: DirectResponse) {
        if let Some(text) = body.text() {
            self.push_output(text);
        }

        if let Some(artifacts) = body.artifacts {
            for entry in artifacts {
                let kind = entry
                    .kind
                    .as_deref()
                    .and_then(ArtifactKind::parse)
                    .unwrap_or(ArtifactKind::File);
                self.push_artifact(Artifact {
                    name: entry.name,
                    kind,
                    content: entry.content,
                });
            }
        }

        if let Some(error) = body.error {
            self.push_output(&format!("\n[error] {error}\n"));
        }
    }

    fn push_output(&self, delta: &str) {
        let session_id = {
            let mut session = self.session.lock().unwrap();
            session.push_output(delta);
            session.id
        };
        self.bus.publish(Event::SessionOutput {
            session_id,
            delta: delta.to_string(),
        });
    }

    fn push_artifact(&self, artifact: Artifact) {
        let session_id = {
            let mut session = self.session.lock().unwrap();
            session.push_artifact(artifact.clone());
            session.id
        };
        self.bus.publish(Event::SessionArtifact {
            session_id,
            artifact,
        });
    }
}
