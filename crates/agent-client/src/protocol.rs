//! Wire envelope classification.
//!
//! Frames look like `data: <json-or-raw-text>`. Structured payloads are
//! dispatched by their `type` discriminant; anything that fails to parse
//! is kept verbatim as plain output. The remote side is allowed to emit
//! unstructured lines and we must not lose them.

use agentdeck_core::{Artifact, ArtifactKind};
use serde::Deserialize;

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// Structured envelope shape emitted by agent endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Envelope {
    Output {
        #[serde(default)]
        content: String,
    },
    Status {
        #[serde(default)]
        message: Option<String>,
    },
    Artifact {
        artifact: ArtifactPayload,
    },
    Error {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        terminal: bool,
    },
    Done,
    Complete,
}

#[derive(Debug, Clone, Deserialize)]
struct ArtifactPayload {
    name: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    content: String,
}

impl From<ArtifactPayload> for Artifact {
    fn from(payload: ArtifactPayload) -> Self {
        // Unknown kinds degrade to `file` rather than dropping the artifact.
        let kind = payload
            .kind
            .as_deref()
            .and_then(ArtifactKind::parse)
            .unwrap_or(ArtifactKind::File);
        Artifact {
            name: payload.name,
            kind,
            content: payload.content,
        }
    }
}

/// One classified event from the execution stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Text delta to append to the output buffer.
    Delta(String),
    /// Side-artifact to append to the artifact list.
    Artifact(Artifact),
    /// Informational status; logged, never accumulated.
    Status(Option<String>),
    /// Visible error marker. Terminates the stream only when `terminal`.
    ErrorMarker { message: String, terminal: bool },
    /// Normal end of stream.
    Done,
}

/// Classify one complete frame line.
///
/// Returns `None` for channel noise: empty lines and anything without
/// the `data:` prefix (keep-alive comments and the like).
pub fn classify_line(line: &str) -> Option<StreamEvent> {
    let payload = line.strip_prefix(DATA_PREFIX)?.trim_start();

    if payload.is_empty() {
        return None;
    }
    if payload == DONE_SENTINEL {
        return Some(StreamEvent::Done);
    }

    match serde_json::from_str::<Envelope>(payload) {
        Ok(Envelope::Output { content }) => Some(StreamEvent::Delta(content)),
        Ok(Envelope::Status { message }) => Some(StreamEvent::Status(message)),
        Ok(Envelope::Artifact { artifact }) => Some(StreamEvent::Artifact(artifact.into())),
        Ok(Envelope::Error { message, terminal }) => Some(StreamEvent::ErrorMarker {
            message: message.unwrap_or_else(|| "unknown error".to_string()),
            terminal,
        }),
        Ok(Envelope::Done) | Ok(Envelope::Complete) => Some(StreamEvent::Done),
        // Not an envelope: keep the raw line as output text, with its
        // terminator restored so consecutive plain lines stay line-broken.
        Err(_) => Some(StreamEvent::Delta(format!("{payload}\n"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_envelope() {
        let event = classify_line(r#"data: {"type":"output","content":"hello"}"#).unwrap();
        assert_eq!(event, StreamEvent::Delta("hello".to_string()));
    }

    #[test]
    fn test_done_sentinel_and_envelopes() {
        assert_eq!(classify_line("data: [DONE]"), Some(StreamEvent::Done));
        assert_eq!(
            classify_line(r#"data: {"type":"done"}"#),
            Some(StreamEvent::Done)
        );
        assert_eq!(
            classify_line(r#"data: {"type":"complete"}"#),
            Some(StreamEvent::Done)
        );
    }

    #[test]
    fn test_noise_ignored() {
        assert_eq!(classify_line(""), None);
        assert_eq!(classify_line(": keep-alive"), None);
        assert_eq!(classify_line("event: ping"), None);
        assert_eq!(classify_line("data:"), None);
    }

    #[test]
    fn test_raw_text_fallback() {
        let event = classify_line("data: plain progress text").unwrap();
        assert_eq!(event, StreamEvent::Delta("plain progress text\n".to_string()));

        // Valid JSON that is not an envelope also falls back.
        let event = classify_line(r#"data: {"progress": 42}"#).unwrap();
        assert_eq!(event, StreamEvent::Delta("{\"progress\": 42}\n".to_string()));
    }

    #[test]
    fn test_artifact_envelope() {
        let line = r##"data: {"type":"artifact","artifact":{"name":"report.md","kind":"file","content":"# hi"}}"##;
        match classify_line(line).unwrap() {
            StreamEvent::Artifact(artifact) => {
                assert_eq!(artifact.name, "report.md");
                assert_eq!(artifact.kind, ArtifactKind::File);
                assert_eq!(artifact.content, "# hi");
            }
            other => panic!("expected artifact, got {other:?}"),
        }
    }

    #[test]
    fn test_artifact_unknown_kind_degrades_to_file() {
        let line = r#"data: {"type":"artifact","artifact":{"name":"x","kind":"hologram","content":""}}"#;
        match classify_line(line).unwrap() {
            StreamEvent::Artifact(artifact) => assert_eq!(artifact.kind, ArtifactKind::File),
            other => panic!("expected artifact, got {other:?}"),
        }
    }

    #[test]
    fn test_error_envelope_terminal_flag() {
        let event = classify_line(r#"data: {"type":"error","message":"boom"}"#).unwrap();
        assert_eq!(
            event,
            StreamEvent::ErrorMarker {
                message: "boom".to_string(),
                terminal: false
            }
        );

        let event =
            classify_line(r#"data: {"type":"error","message":"boom","terminal":true}"#).unwrap();
        assert_eq!(
            event,
            StreamEvent::ErrorMarker {
                message: "boom".to_string(),
                terminal: true
            }
        );
    }

    #[test]
    fn test_status_envelope() {
        let event = classify_line(r#"data: {"type":"status","message":"warming up"}"#).unwrap();
        assert_eq!(event, StreamEvent::Status(Some("warming up".to_string())));
    }

    #[test]
    fn test_missing_content_defaults_empty() {
        let event = classify_line(r#"data: {"type":"output"}"#).unwrap();
        assert_eq!(event, StreamEvent::Delta(String::new()));
    }
}
